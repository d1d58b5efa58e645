use meta_forge_core::types::DialectKind;
use meta_forge_sql::{dialect_for, MigrationGenerator, MigrationOptions, SqlGenerator};
use proptest::prelude::*;

fn identifier() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9_]{0,160}"
}

fn dialect_kind() -> impl Strategy<Value = DialectKind> {
    prop::sample::select(DialectKind::ALL.to_vec())
}

/// A single-table schema with `Id` plus `columns` nullable integer columns.
fn table_source(columns: usize) -> String {
    let mut defs = vec!["Id INTEGER NOT NULL PRIMARY KEY".to_string()];
    defs.extend((0..columns).map(|i| format!("C{i} INTEGER")));
    format!("CREATE TABLE Item ({});", defs.join(", "))
}

proptest! {
    #[test]
    fn generated_names_fit_the_dialect_limit(name in identifier(), kind in dialect_kind()) {
        let dialect = dialect_for(kind);
        let style = dialect.identifiers();
        let short = style.shorten(&name);
        prop_assert!(short.len() <= style.max_length);
        prop_assert_eq!(&short, &style.shorten(&name));
        if name.len() <= style.max_length {
            prop_assert_eq!(short, name);
        }
    }

    #[test]
    fn each_added_column_is_one_statement(existing in 0usize..6, added in 0usize..6) {
        let old = meta_forge_dsl::parse(&table_source(existing)).unwrap();
        let new = meta_forge_dsl::parse(&table_source(existing + added)).unwrap();
        let script = MigrationGenerator::script(
            &old,
            &new,
            &SqlGenerator::new(DialectKind::PostgreSql),
            1,
            &MigrationOptions::default(),
        )
        .unwrap();
        let adds = script
            .statements()
            .iter()
            .filter(|s| s.sql.contains(" ADD COLUMN "))
            .count();
        prop_assert_eq!(adds, added);
        prop_assert_eq!(script.executable_len(), added + 1);
    }
}
