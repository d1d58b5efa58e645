use meta_forge_core::types::{
    DataType, DefaultValue, DialectKind, Dml, JoinKind, Literal, ReferentialAction, UnionKind,
};
use meta_forge_dsl::{parse, DslError};

/// An order-management schema exercising every top-level form.
const CUSTOMER_SCHEMA: &str = r#"
-- Line comments
/* Block comments */

CREATE TABLE Kind (
    Id    INTEGER     NOT NULL PRIMARY KEY,
    Name  VARCHAR(40) NOT NULL
);

CREATE TABLE Customer (
    Id        INTEGER      NOT NULL PRIMARY KEY,
    Name      VARCHAR(80)  NOT NULL COMMENT 'display name' DBMS HINTS (ALL TRUNCATE),
    Kind      INTEGER      DEFAULT 0 DBMS HINTS (ALL ENUMERATION = 'CustomerKind'),
    ParentId  INTEGER      REFERENCES Customer(Id) ON DELETE SET NULL,
    Price     DECIMAL(10, 2),
    Created   DATETIME     DEFAULT CURRENT_TIMESTAMP,
    CONSTRAINT UQ_Customer_Name UNIQUE (Name),
    CONSTRAINT FK_Customer_Kind FOREIGN KEY (Kind) REFERENCES Kind(Id),
    INDEX IX_Customer_Parent (ParentId) DBMS HINTS (ORACLE TABLESPACE = 'IDX')
)
COMMENT 'customers'
ON DELETE (
    DELETE FROM Orders WHERE CustomerId = OLD.Id;
    UPDATE Customer SET ParentId = NULL WHERE ParentId = OLD.Id
)
DBMS HINTS (ORACLE TABLESPACE = 'USERS', MYSQL OPTIONS = 'ENGINE=InnoDB');

CREATE TABLE Orders (
    Id          BIGINT   NOT NULL,
    CustomerId  INTEGER  NOT NULL REFERENCES Customer(Id),
    Placed      DATE,
    Total       NUMBER(12, 2) DEFAULT -1.50,
    Note        CLOB,
    PRIMARY KEY (Id)
);

CREATE VIEW CustomerNames (Id, Label) AS
    SELECT c.Id, c.Name || ' (' || CASE WHEN c.Kind = 1 THEN 'A' ELSE 'B' END || ')'
    FROM Customer c WHERE c.ParentId IS NULL
  UNION ALL
    SELECT k.Id, k.Name FROM Kind k
COMMENT 'labels';

CREATE VIEW CustomerOrders (Customer, OrderId) AS
    SELECT c.Name, o.Id FROM Customer c INNER JOIN Orders o ON o.CustomerId = c.Id;

CREATE STATEMENT SeedKinds AS INSERT INTO Kind (Id, Name) VALUES (1, 'Default');
"#;

#[test]
fn parse_full_customer_schema() {
    let meta = parse(CUSTOMER_SCHEMA).expect("customer schema should parse successfully");
    assert_eq!(meta.tables().len(), 3, "expected Kind, Customer, Orders");
    assert_eq!(meta.views().len(), 2);
    assert_eq!(meta.statements().len(), 1);

    // --- Customer ---
    let customer = meta.find_table("Customer").expect("Customer");
    assert_eq!(customer.columns().len(), 6);
    assert_eq!(customer.primary_key().name, "PK_Customer");
    assert_eq!(customer.primary_key().columns, vec!["Id"]);
    assert_eq!(customer.comment(), Some("customers"));

    let name = customer.find_column("Name").expect("Customer.Name");
    assert!(!name.is_nullable());
    assert_eq!(name.comment(), Some("display name"));
    assert!(name.hints().truncate_on_write());

    let kind = customer.find_column("Kind").expect("Customer.Kind");
    assert!(kind.is_nullable());
    assert_eq!(
        kind.default_value(),
        Some(&DefaultValue::Literal(Literal::Integer(0)))
    );
    assert_eq!(kind.hints().enumeration(), Some("CustomerKind"));

    let parent = customer.find_column("ParentId").expect("Customer.ParentId");
    let reference = parent.reference().expect("ParentId references Customer");
    assert_eq!(reference.table, "Customer");
    assert_eq!(reference.on_delete, Some(ReferentialAction::SetNull));

    assert_eq!(
        customer.find_column("Price").unwrap().data_type(),
        &DataType::Decimal {
            precision: 10,
            scale: 2
        }
    );

    // Shorthand foreign keys come before declared ones.
    let fk_names: Vec<String> = customer.foreign_keys().into_iter().map(|fk| fk.name).collect();
    assert_eq!(fk_names, vec!["FK_Customer_ParentId", "FK_Customer_Kind"]);

    assert_eq!(customer.indexes()[0].name, "IX_Customer_Parent");
    assert_eq!(
        customer.indexes()[0].hints.tablespace(DialectKind::Oracle),
        Some("IDX")
    );
    assert_eq!(customer.hints().tablespace(DialectKind::Oracle), Some("USERS"));
    assert_eq!(customer.hints().options(DialectKind::MySql), Some("ENGINE=InnoDB"));
    assert_eq!(customer.hints().options(DialectKind::PostgreSql), None);

    // --- Trigger ---
    let trigger = customer.on_delete();
    assert_eq!(trigger.len(), 2);
    assert!(matches!(&trigger[0], Dml::Delete(d) if d.table() == "Orders"));
    assert!(matches!(&trigger[1], Dml::Update(u) if u.assignments().len() == 1));

    // --- Orders ---
    let orders = meta.find_table("Orders").expect("Orders");
    assert_eq!(orders.primary_key().name, "PK_Orders");
    assert_eq!(
        orders.find_column("Total").unwrap().default_value(),
        Some(&DefaultValue::Literal(Literal::Decimal("-1.50".into())))
    );
    assert_eq!(orders.foreign_keys()[0].name, "FK_Orders_CustomerId");

    // --- Views ---
    let names = meta.find_view("CustomerNames").expect("CustomerNames");
    assert_eq!(names.referenced_tables(), vec!["Customer", "Kind"]);
    assert_eq!(names.query().unions()[0].0, UnionKind::All);
    assert_eq!(names.comment(), Some("labels"));

    let joined = meta.find_view("CustomerOrders").expect("CustomerOrders");
    assert_eq!(joined.query().first().joins[0].kind, JoinKind::Inner);
    assert_eq!(joined.referenced_tables(), vec!["Customer", "Orders"]);

    // --- Statements ---
    let seed = meta.find_statement("SeedKinds").expect("SeedKinds");
    assert_eq!(seed.body().table(), "Kind");
}

#[test]
fn three_independent_mistakes_yield_three_errors() {
    let source = r#"
CREATE TABLE A (
    Id INTEGER NOT NULL PRIMARY KEY,
    Name VARCHR(10)
);

CREATE TABLE B (
    Id INTEGER
);

CREATE VIEW V (X) AS SELECT Id B;

CREATE TABLE C (Id INTEGER PRIMARY KEY);
"#;
    let errors = parse(source).expect_err("three mistakes");
    assert_eq!(errors.len(), 3, "{errors:#?}");
    assert!(matches!(&errors[0], DslError::UnexpectedToken { found, .. } if found.contains("VARCHR")));
    assert!(matches!(&errors[1], DslError::CoreSchemaError { .. }));
    assert!(matches!(&errors[2], DslError::UnexpectedToken { expected, .. } if expected.contains("FROM")));
}

#[test]
fn errors_are_reported_in_source_order_with_spans() {
    let source = "CREATE TABLE A (Id INTEGER PRIMARY KEY DBMS HINTS (OTHERDB TRUNCATE));\nCREATE TABLE A (Id INTEGER PRIMARY KEY);\nCREATE TABLE A (Id INTEGER PRIMARY KEY);";
    let errors = parse(source).expect_err("unknown dialect and duplicate");
    assert_eq!(errors.len(), 2, "{errors:#?}");
    assert!(matches!(&errors[0], DslError::UnknownDialect { .. }));
    assert!(matches!(&errors[1], DslError::DuplicateArtifact { kind: "table", .. }));
    assert!(errors[0].span().start < errors[1].span().start);
    assert_eq!(&source[errors[0].span().start..errors[0].span().end], "OTHERDB");
}

#[test]
fn lexer_errors_are_collected_together() {
    let errors = parse("CREATE TABLE T # (Id INTEGER $ PRIMARY KEY);").expect_err("lexer errors");
    assert_eq!(errors.len(), 2, "{errors:#?}");
    assert!(errors.iter().all(|e| matches!(e, DslError::InvalidToken { .. })));
}

#[test]
fn stray_character_does_not_hide_syntax_errors() {
    let source = r#"
CREATE TABLE A (
    Id INTEGER NOT NULL PRIMARY KEY,
    Name VARCHR(10)
);

CREATE VIEW V (X) AS SELECT Id A;

CREATE TABLE C (Id INTEGER NOT NULL PRIMARY KEY, Code # INTEGER);
"#;
    let errors = parse(source).expect_err("two syntax mistakes and a stray character");
    assert_eq!(errors.len(), 3, "{errors:#?}");
    assert!(matches!(&errors[0], DslError::UnexpectedToken { found, .. } if found.contains("VARCHR")));
    assert!(matches!(&errors[1], DslError::UnexpectedToken { expected, .. } if expected.contains("FROM")));
    assert!(matches!(&errors[2], DslError::InvalidToken { text, .. } if text == "#"));
}

#[test]
fn unclosed_type_parenthesis_is_one_error() {
    let errors = parse("CREATE TABLE T (Id INTEGER, Name VARCHAR(80 NOT NULL, Code INTEGER);")
        .expect_err("unbalanced parenthesis");
    assert_eq!(errors.len(), 1, "{errors:#?}");
    assert!(matches!(&errors[0], DslError::UnexpectedToken { found, .. } if found.contains("NOT")));
}

#[test]
fn unclosed_type_parenthesis_does_not_swallow_next_table() {
    let errors = parse(
        "CREATE TABLE T (Id INTEGER NOT NULL PRIMARY KEY, Name VARCHAR(80 NOT NULL);
         CREATE TABLE U (Id INTEGER);",
    )
    .expect_err("unbalanced parenthesis and missing key");
    assert_eq!(errors.len(), 2, "{errors:#?}");
    assert!(matches!(&errors[1], DslError::CoreSchemaError { .. }));
}

#[test]
fn missing_semicolon_does_not_swallow_next_statement() {
    let errors = parse(
        "CREATE TABLE A (Id INTEGER PRIMARY KEY)
         CREATE TABLE B (Id INTEGER);",
    )
    .expect_err("missing semicolon");
    // The missing terminator and B's missing key are both reported.
    assert_eq!(errors.len(), 2, "{errors:#?}");
}
