use meta_forge_core::types::{DialectKind, SqlMeta};
use meta_forge_dsl::parse;
use meta_forge_sql::{GenerateError, MigrationGenerator, MigrationOptions, SqlGenerator};

fn schema(source: &str) -> SqlMeta {
    parse(source).unwrap_or_else(|errors| panic!("schema should parse: {errors:?}"))
}

fn migrate(old: &str, new: &str, kind: DialectKind, version: u32) -> Result<String, GenerateError> {
    MigrationGenerator::generate(
        &schema(old),
        &schema(new),
        &SqlGenerator::new(kind),
        version,
        &MigrationOptions::default(),
    )
}

const PEOPLE: &str = r#"
CREATE TABLE Person (
    Id    INTEGER     NOT NULL PRIMARY KEY,
    Name  VARCHAR(40) NOT NULL
);
"#;

const PEOPLE_WITH_EMAIL: &str = r#"
CREATE TABLE Person (
    Id     INTEGER     NOT NULL PRIMARY KEY,
    Name   VARCHAR(40) NOT NULL,
    Email  VARCHAR(80)
);
"#;

#[test]
fn oracle_end_to_end() {
    let old = "CREATE TABLE T (id INTEGER PRIMARY KEY, name VARCHAR(10));";
    let new = "CREATE TABLE T (id INTEGER PRIMARY KEY, name VARCHAR(20) NOT NULL, email VARCHAR(50));";
    let sql = migrate(old, new, DialectKind::Oracle, 4).unwrap();
    assert_eq!(
        sql,
        "-- Migration from version 3 to 4 for Oracle\n\
         ALTER TABLE T MODIFY (name VARCHAR2(20 CHAR));\n\
         \n\
         ALTER TABLE T MODIFY (name NOT NULL);\n\
         \n\
         ALTER TABLE T ADD email VARCHAR2(50 CHAR);\n\
         \n\
         UPDATE SchemaVersion SET Version = 4;\n"
    );
}

#[test]
fn one_added_column_is_one_add_column() {
    for kind in [
        DialectKind::PostgreSql,
        DialectKind::Db2,
        DialectKind::Hsqldb,
        DialectKind::Sqlite,
        DialectKind::Derby,
    ] {
        let sql = migrate(PEOPLE, PEOPLE_WITH_EMAIL, kind, 2).unwrap();
        assert_eq!(sql.matches("ADD COLUMN").count(), 1, "{kind}:\n{sql}");
        assert_eq!(sql.matches("ALTER TABLE").count(), 1, "{kind}:\n{sql}");
        assert!(!sql.contains("DROP"), "{kind}:\n{sql}");
        assert!(sql.ends_with("UPDATE SchemaVersion SET Version = 2;\n"), "{kind}:\n{sql}");
    }
}

#[test]
fn identical_schemas_yield_only_the_version_update() {
    for kind in DialectKind::ALL {
        let script = MigrationGenerator::script(
            &schema(PEOPLE),
            &schema(PEOPLE),
            &SqlGenerator::new(kind),
            10,
            &MigrationOptions::default(),
        )
        .unwrap();
        let executable: Vec<&str> = script
            .statements()
            .iter()
            .filter(|s| !s.is_comment())
            .map(|s| s.sql.as_str())
            .collect();
        assert_eq!(executable.len(), 1, "{kind}: {executable:?}");
        assert!(executable[0].starts_with("UPDATE "), "{kind}");
        assert!(executable[0].ends_with(" = 10"), "{kind}");
    }
}

#[test]
fn foreign_key_is_dropped_before_its_column_is_retyped() {
    let old = r#"
        CREATE TABLE Parent (Id INTEGER NOT NULL PRIMARY KEY);
        CREATE TABLE Child (
            Id        INTEGER NOT NULL PRIMARY KEY,
            ParentId  INTEGER REFERENCES Parent(Id)
        );
    "#;
    let new = r#"
        CREATE TABLE Parent (Id INTEGER NOT NULL PRIMARY KEY);
        CREATE TABLE Child (
            Id        INTEGER NOT NULL PRIMARY KEY,
            ParentId  BIGINT
        );
    "#;
    let sql = migrate(old, new, DialectKind::PostgreSql, 7).unwrap();
    let drop = sql
        .find("ALTER TABLE Child DROP CONSTRAINT FK_Child_ParentId")
        .unwrap_or_else(|| panic!("foreign key drop missing:\n{sql}"));
    let retype = sql
        .find("ALTER TABLE Child ALTER COLUMN ParentId TYPE BIGINT")
        .unwrap_or_else(|| panic!("retype missing:\n{sql}"));
    assert!(drop < retype, "{sql}");
    assert!(!sql.contains("ADD CONSTRAINT"), "{sql}");
}

#[test]
fn retyped_key_column_is_recreated_around_the_alter() {
    let old = r#"
        CREATE TABLE Parent (Id INTEGER NOT NULL PRIMARY KEY);
        CREATE TABLE Child (
            Id        INTEGER NOT NULL PRIMARY KEY,
            ParentId  INTEGER REFERENCES Parent(Id)
        );
    "#;
    let new = r#"
        CREATE TABLE Parent (Id BIGINT NOT NULL PRIMARY KEY);
        CREATE TABLE Child (
            Id        INTEGER NOT NULL PRIMARY KEY,
            ParentId  BIGINT REFERENCES Parent(Id)
        );
    "#;
    let sql = migrate(old, new, DialectKind::SqlServer, 3).unwrap();
    let order = [
        "ALTER TABLE Child DROP CONSTRAINT FK_Child_ParentId",
        "ALTER TABLE Parent DROP CONSTRAINT PK_Parent",
        "ALTER TABLE Parent ALTER COLUMN Id BIGINT NOT NULL",
        "ALTER TABLE Parent ADD CONSTRAINT PK_Parent PRIMARY KEY (Id)",
        "ALTER TABLE Child ADD CONSTRAINT FK_Child_ParentId FOREIGN KEY (ParentId) REFERENCES Parent (Id)",
        "DROP PROCEDURE DropDefaultConstraint",
        "UPDATE SchemaVersion SET Version = 3",
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|needle| sql.find(needle).unwrap_or_else(|| panic!("missing {needle:?}:\n{sql}")))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{sql}");
    assert!(sql.starts_with("-- Migration from version 2 to 3 for Microsoft SQL Server\nCREATE PROCEDURE DropDefaultConstraint"));
}

#[test]
fn sqlserver_key_width_follows_constraint_changes() {
    let plain = "CREATE TABLE T (Id INTEGER NOT NULL PRIMARY KEY, Code VARCHAR(20) NOT NULL);";
    let unique = "CREATE TABLE T (Id INTEGER NOT NULL PRIMARY KEY, Code VARCHAR(20) NOT NULL, CONSTRAINT UQ_T_Code UNIQUE (Code));";

    let full = SqlGenerator::new(DialectKind::SqlServer)
        .generate_full_script(&schema(unique))
        .unwrap();
    assert!(full.contains("Code VARCHAR(20) NOT NULL"), "{full}");

    let narrowed = migrate(plain, unique, DialectKind::SqlServer, 2).unwrap();
    let alter = narrowed
        .find("ALTER TABLE T ALTER COLUMN Code VARCHAR(20) NOT NULL")
        .unwrap_or_else(|| panic!("missing narrowing alter:\n{narrowed}"));
    let add = narrowed.find("ADD CONSTRAINT UQ_T_Code UNIQUE (Code)").unwrap();
    assert!(alter < add, "{narrowed}");

    let widened = migrate(unique, plain, DialectKind::SqlServer, 3).unwrap();
    let drop = widened.find("ALTER TABLE T DROP CONSTRAINT UQ_T_Code").unwrap();
    let alter = widened
        .find("ALTER TABLE T ALTER COLUMN Code VARCHAR(80) NOT NULL")
        .unwrap_or_else(|| panic!("missing widening alter:\n{widened}"));
    assert!(drop < alter, "{widened}");

    let postgres = migrate(plain, unique, DialectKind::PostgreSql, 2).unwrap();
    assert!(!postgres.contains("ALTER COLUMN"), "{postgres}");
}

#[test]
fn new_and_dropped_tables() {
    let old = r#"
        CREATE TABLE Keep (Id INTEGER NOT NULL PRIMARY KEY);
        CREATE TABLE Gone (Id INTEGER NOT NULL PRIMARY KEY);
    "#;
    let new = r#"
        CREATE TABLE Keep (Id INTEGER NOT NULL PRIMARY KEY);
        CREATE TABLE Fresh (
            Id      INTEGER NOT NULL PRIMARY KEY,
            KeepId  INTEGER REFERENCES Keep(Id),
            INDEX IX_Fresh_Keep (KeepId)
        );
    "#;
    let sql = migrate(old, new, DialectKind::MySql, 9).unwrap();
    let order = [
        "DROP TABLE Gone",
        "CREATE TABLE Fresh (",
        "ALTER TABLE Fresh ADD CONSTRAINT PK_Fresh PRIMARY KEY (Id)",
        "CREATE INDEX IX_Fresh_Keep ON Fresh (KeepId)",
        "ALTER TABLE Fresh ADD CONSTRAINT FK_Fresh_KeepId FOREIGN KEY (KeepId) REFERENCES Keep (Id)",
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|needle| sql.find(needle).unwrap_or_else(|| panic!("missing {needle:?}:\n{sql}")))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{sql}");
}

#[test]
fn unsupported_alter_fails_loudly() {
    let old = "CREATE TABLE T (Id INTEGER NOT NULL PRIMARY KEY, Qty INTEGER);";
    let new = "CREATE TABLE T (Id INTEGER NOT NULL PRIMARY KEY, Qty VARCHAR(10));";
    let err = migrate(old, new, DialectKind::Derby, 2).unwrap_err();
    assert!(
        matches!(&err, GenerateError::UnsupportedAlter { table, column, .. } if table == "T" && column == "Qty"),
        "{err:?}"
    );
    let err = migrate(old, new, DialectKind::Sqlite, 2).unwrap_err();
    assert!(matches!(err, GenerateError::UnsupportedAlter { .. }), "{err:?}");
}

#[test]
fn additional_statements_follow_table_order() {
    let old = r#"
        CREATE TABLE A (Id INTEGER NOT NULL PRIMARY KEY, Flag INTEGER);
        CREATE TABLE B (Id INTEGER NOT NULL PRIMARY KEY, Flag INTEGER);
    "#;
    let additional = schema(
        r#"
        CREATE STATEMENT FixB AS UPDATE B SET Flag = 0 WHERE Flag IS NULL;
        CREATE STATEMENT FixA AS UPDATE A SET Flag = 1 WHERE Flag IS NULL;
        "#,
    );
    let options = MigrationOptions::default().with_additional(additional);
    let sql = MigrationGenerator::generate(
        &schema(old),
        &schema(old),
        &SqlGenerator::new(DialectKind::PostgreSql),
        6,
        &options,
    )
    .unwrap();
    let a = sql.find("UPDATE A SET Flag = 1").expect("FixA present");
    let b = sql.find("UPDATE B SET Flag = 0").expect("FixB present");
    let version = sql.find("UPDATE SchemaVersion").expect("version update present");
    assert!(a < b && b < version, "{sql}");
}

#[test]
fn migrations_are_deterministic() {
    for kind in DialectKind::ALL {
        let first = migrate(PEOPLE, PEOPLE_WITH_EMAIL, kind, 2).unwrap();
        let second = migrate(PEOPLE, PEOPLE_WITH_EMAIL, kind, 2).unwrap();
        assert_eq!(first, second, "{kind}");
    }
}
