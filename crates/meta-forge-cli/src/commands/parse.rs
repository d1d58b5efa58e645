use crate::cli::ParseArgs;
use crate::config::CliConfig;
use crate::error::CliError;
use crate::output::{write_stdout, OutputContext, OutputMode};
use crate::sources::SourceSet;

/// Run the `parse` command: validate .meta files and report every error.
pub fn run(args: ParseArgs, config: &CliConfig, output: &OutputContext) -> Result<(), CliError> {
    let sources = SourceSet::load(&args.paths, &config.cli.source_extension)?;
    let files = sources.files().len();
    let meta = sources.parse()?;

    let tables = meta.tables().len();
    let views = meta.views().len();
    let statements = meta.statements().len();

    if args.print {
        write_stdout(&meta_forge_dsl::print(&meta))?;
    }

    match output.mode {
        OutputMode::Human => {
            for table in meta.tables() {
                output.detail(&format!(
                    "  table {} .... {} columns",
                    table.name(),
                    table.columns().len()
                ));
            }
            output.success(&format!(
                "{tables} tables, {views} views, {statements} statements parsed from {files} files, 0 errors"
            ));
        }
        OutputMode::Json => {
            let tables_json: Vec<serde_json::Value> = meta
                .tables()
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name(),
                        "columns": t.columns().len(),
                        "foreign_keys": t.foreign_keys().len(),
                        "indexes": t.indexes().len(),
                    })
                })
                .collect();
            output.print_json(&serde_json::json!({
                "files": files,
                "tables": tables_json,
                "views": views,
                "statements": statements,
                "errors": 0,
            }));
        }
        OutputMode::Plain => {
            if !args.print {
                println!("{files}\t{tables}\t{views}\t{statements}\t0");
            }
        }
    }

    Ok(())
}
