use meta_forge_core::types::{DialectKind, SqlMeta};
use meta_forge_sql::SqlGenerator;

const SCHEMA: &str = r#"
CREATE TABLE Customer (
    Id    INTEGER     NOT NULL PRIMARY KEY,
    Name  VARCHAR(60) NOT NULL
)
ON DELETE (
    DELETE FROM Orders WHERE CustomerId = OLD.Id
);

CREATE TABLE Orders (
    Id          INTEGER NOT NULL PRIMARY KEY,
    CustomerId  INTEGER NOT NULL REFERENCES Customer(Id)
);
"#;

fn schema() -> SqlMeta {
    meta_forge_dsl::parse(SCHEMA).unwrap_or_else(|errors| panic!("schema should parse: {errors:?}"))
}

fn expected_fragments(kind: DialectKind) -> &'static [&'static str] {
    match kind {
        DialectKind::Oracle => &[
            "CREATE OR REPLACE TRIGGER TRG_Customer_DEL",
            "DELETE FROM Orders WHERE CustomerId = :old.Id;",
            "END;\n/",
        ],
        DialectKind::SqlServer => &[
            "INSTEAD OF DELETE",
            "DELETE Orders FROM Orders, deleted WHERE Orders.CustomerId = deleted.Id;",
        ],
        DialectKind::Sybase => &["FOR DELETE", "deleted.Id"],
        DialectKind::PostgreSql => &[
            "RETURN OLD;",
            "EXECUTE PROCEDURE TRG_Customer_DEL_FN()",
        ],
        DialectKind::MySql => &["DELIMITER //", "CustomerId = OLD.Id;"],
        DialectKind::Db2 => &["REFERENCING OLD AS oldrow", "CustomerId = oldrow.Id"],
        DialectKind::Derby => &["CREATE TRIGGER TRG_Customer_DEL_1", "CustomerId = oldrow.Id"],
        DialectKind::Hsqldb => &["REFERENCING OLD ROW AS oldrow", "CustomerId = oldrow.Id"],
        DialectKind::Sqlite => &["BEFORE DELETE ON Customer", "OLD.Id;\nEND;"],
    }
}

#[test]
fn every_dialect_renders_the_delete_trigger() {
    let meta = schema();
    for kind in DialectKind::ALL {
        let sql = SqlGenerator::new(kind)
            .generate_full_script(&meta)
            .unwrap_or_else(|e| panic!("{kind}: {e}"));
        for fragment in expected_fragments(kind) {
            assert!(sql.contains(fragment), "{kind}: missing {fragment:?} in\n{sql}");
        }
    }
}

#[test]
fn triggers_follow_every_table() {
    let meta = schema();
    for kind in DialectKind::ALL {
        let sql = SqlGenerator::new(kind).generate_full_script(&meta).unwrap();
        let last_table = sql.rfind("CREATE TABLE").unwrap();
        let trigger = sql.find("TRG_Customer_DEL").unwrap();
        assert!(last_table < trigger, "{kind}:\n{sql}");
    }
}

#[test]
fn full_scripts_are_deterministic() {
    for kind in DialectKind::ALL {
        let first = SqlGenerator::new(kind).generate_full_script(&schema()).unwrap();
        let second = SqlGenerator::new(kind).generate_full_script(&schema()).unwrap();
        assert_eq!(first, second, "{kind}");
    }
}
