use meta_forge_core::types::DialectKind;
use meta_forge_sql::dialect_for;

use crate::output::{OutputContext, OutputMode};

/// Run the `dialects` command: list the generator identifiers.
pub fn run(output: &OutputContext) {
    match output.mode {
        OutputMode::Human => {
            for kind in DialectKind::ALL {
                println!("{:<12} {}", kind.id(), kind.display_name());
            }
        }
        OutputMode::Json => {
            let list: Vec<serde_json::Value> = DialectKind::ALL
                .iter()
                .map(|kind| {
                    let caps = dialect_for(*kind).capabilities();
                    serde_json::json!({
                        "id": kind.id(),
                        "name": kind.display_name(),
                        "hint_keyword": kind.keyword(),
                        "inline_foreign_keys": caps.inline_foreign_keys,
                        "drop_column": caps.drop_column,
                    })
                })
                .collect();
            output.print_json(&serde_json::Value::Array(list));
        }
        OutputMode::Plain => {
            for kind in DialectKind::ALL {
                println!("{}", kind.id());
            }
        }
    }
}
