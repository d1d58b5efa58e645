use meta_forge_core::migration::{ColumnChange, RecreateOptions};
use meta_forge_core::types::{Column, DataType, DefaultValue, DialectKind, HintTarget, TypeFamily};

use super::{
    alter, numeric, standard_alter, Capabilities, Dialect, StatementResult, TypeContext,
};
use crate::error::GenerateError;
use crate::identifier::{CaseFolding, IdentifierStyle};
use crate::script::{Statement, StatementDelimiter};
use crate::trigger::TriggerStrategy;

const RESERVED: &[&str] = &[
    "ACCESS", "AUDIT", "CLUSTER", "COMMENT", "COMPRESS", "CONNECT", "DATE", "DECIMAL", "EXCLUSIVE",
    "FILE", "FLOAT", "IDENTIFIED", "IMMEDIATE", "INCREMENT", "INITIAL", "INTEGER", "LEVEL",
    "LOCK", "LONG", "MAXEXTENTS", "MINUS", "MODE", "MODIFY", "NOAUDIT", "NOCOMPRESS", "NOWAIT",
    "NUMBER", "OFFLINE", "ONLINE", "OPTION", "PCTFREE", "PRIOR", "PRIVILEGES", "PUBLIC", "RAW",
    "RENAME", "RESOURCE", "REVOKE", "ROW", "ROWID", "ROWNUM", "ROWS", "SESSION", "SHARE", "SIZE",
    "SMALLINT", "START", "SUCCESSFUL", "SYNONYM", "SYSDATE", "UID", "VALIDATE", "VARCHAR",
    "VARCHAR2",
];

const IDENTIFIERS: IdentifierStyle = IdentifierStyle::double_quoted(RESERVED, CaseFolding::Upper, 30);

/// Suffix of the column that holds converted values during a copy retype.
const TEMP_SUFFIX: &str = "_TMP";

/// Oracle Database.
///
/// Retyping within a type family is a `MODIFY`. Crossing families copies
/// the data through a temporary column, since Oracle refuses to change the
/// type of a populated column.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl OracleDialect {
    fn modify(&self, table: &str, clause: String) -> Statement {
        alter(self, table, format!("MODIFY ({clause})"))
    }

    fn check_lob(&self, table: &str, before: &Column, after: &Column) -> Result<(), GenerateError> {
        let from = before.data_type().family();
        let to = after.data_type().family();
        if from != to && (from == TypeFamily::Binary || to == TypeFamily::Binary) {
            return Err(GenerateError::UnsupportedAlter {
                dialect: self.kind(),
                table: table.to_string(),
                column: after.name().to_string(),
                reason: format!(
                    "cannot convert {} to {}",
                    before.data_type(),
                    after.data_type()
                ),
            });
        }
        Ok(())
    }

    /// Expression copying `column` into a column of type `native`.
    fn conversion(&self, column: &str, from: &DataType, to: &DataType, native: &str) -> String {
        match (from.family(), to.family()) {
            (_, TypeFamily::LargeCharacter) => format!("TO_CLOB({column})"),
            (TypeFamily::LargeCharacter, TypeFamily::Character) => {
                format!("DBMS_LOB.SUBSTR({column}, {}, 1)", to.length().unwrap_or(4000))
            }
            (TypeFamily::LargeCharacter, _) => {
                format!("CAST(DBMS_LOB.SUBSTR({column}, 4000, 1) AS {native})")
            }
            _ => format!("CAST({column} AS {native})"),
        }
    }

    /// Add a temporary column, copy, drop the original, rename, then restore
    /// the constraints a fresh column does not have.
    fn copy_retype(
        &self,
        table: &str,
        before: &Column,
        after: &Column,
        ctx: TypeContext,
    ) -> StatementResult {
        let column = self.quote(after.name());
        let temp = self.object_name(&format!("{}{TEMP_SUFFIX}", after.name()));
        let native = self.data_type(after, ctx);
        let mut statements = vec![
            alter(self, table, format!("ADD ({temp} {native})")),
            Statement::plain(format!(
                "UPDATE {} SET {temp} = {}",
                self.quote(table),
                self.conversion(&column, before.data_type(), after.data_type(), &native)
            )),
            alter(self, table, format!("DROP COLUMN {column}")),
            alter(self, table, format!("RENAME COLUMN {temp} TO {column}")),
        ];
        if !after.is_nullable() {
            statements.push(self.modify(table, format!("{column} NOT NULL")));
        }
        if let Some(value) = after.default_value() {
            statements.extend(self.set_default(table, after.name(), value)?);
        }
        if let Some(comment) = after.comment() {
            statements.push(Statement::plain(format!(
                "COMMENT ON COLUMN {}.{column} IS {}",
                self.quote(table),
                self.string_literal(comment)
            )));
        }
        Ok(statements)
    }
}

impl Dialect for OracleDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn delimiter(&self) -> StatementDelimiter {
        StatementDelimiter {
            terminator: ";",
            block_prefix: None,
            block_terminator: "\n/",
            batch_separator: None,
        }
    }

    fn identifiers(&self) -> &IdentifierStyle {
        &IDENTIFIERS
    }

    fn recreate_options(&self) -> RecreateOptions {
        RecreateOptions {
            defaults: false,
            ..RecreateOptions::ALL
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            update_actions: false,
            ..Capabilities::FULL
        }
    }

    fn map_type(&self, data_type: &DataType, _ctx: TypeContext) -> String {
        match data_type {
            DataType::Bit => "NUMBER(1)".into(),
            DataType::Integer => "NUMBER(10)".into(),
            DataType::BigInt => "NUMBER(19)".into(),
            DataType::Float => "FLOAT".into(),
            DataType::Decimal { precision, scale } => format!("NUMBER({precision}, {scale})"),
            DataType::Number { precision, scale } => numeric("NUMBER", *precision, *scale, None),
            DataType::Char { length } => format!("CHAR({length} CHAR)"),
            DataType::Varchar { length } => format!("VARCHAR2({length} CHAR)"),
            DataType::Clob => "CLOB".into(),
            DataType::Date | DataType::Time => "DATE".into(),
            DataType::DateTime => "TIMESTAMP".into(),
            DataType::Blob => "BLOB".into(),
        }
    }

    fn current_timestamp(&self) -> &'static str {
        "SYSTIMESTAMP"
    }

    fn trigger(&self) -> TriggerStrategy {
        TriggerStrategy::PlSql
    }

    fn tablespace_clause(&self, tablespace: &str, _target: HintTarget) -> Option<String> {
        Some(format!("TABLESPACE {tablespace}"))
    }

    fn add_column_clause(&self) -> &'static str {
        "ADD"
    }

    fn alter_column(
        &self,
        table: &str,
        before: &Column,
        after: &Column,
        change: ColumnChange,
        ctx: TypeContext,
    ) -> StatementResult {
        if change.data_type {
            self.check_lob(table, before, after)?;
            if before.data_type().family() != after.data_type().family() {
                return self.copy_retype(table, before, after, ctx);
            }
        }
        standard_alter(self, table, before, after, change, ctx)
    }

    fn retype_column(
        &self,
        table: &str,
        _before: &Column,
        after: &Column,
        ctx: TypeContext,
    ) -> StatementResult {
        Ok(vec![self.modify(
            table,
            format!("{} {}", self.quote(after.name()), self.data_type(after, ctx)),
        )])
    }

    fn set_nullability(&self, table: &str, column: &Column) -> StatementResult {
        let null = if column.is_nullable() { "NULL" } else { "NOT NULL" };
        Ok(vec![self.modify(
            table,
            format!("{} {null}", self.quote(column.name())),
        )])
    }

    fn set_default(&self, table: &str, column: &str, value: &DefaultValue) -> StatementResult {
        Ok(vec![self.modify(
            table,
            format!("{} DEFAULT {}", self.quote(column), self.default_clause(value)),
        )])
    }

    fn drop_default(&self, table: &str, column: &str) -> StatementResult {
        Ok(vec![self.modify(
            table,
            format!("{} DEFAULT NULL", self.quote(column)),
        )])
    }
}

#[cfg(test)]
mod tests {
    use meta_forge_core::types::{Literal, Reference, ReferentialAction, ForeignKey};

    use super::*;

    fn varchar(name: &str, length: u32, nullable: bool) -> Column {
        Column::builder(name, DataType::Varchar { length })
            .nullable(nullable)
            .build()
            .unwrap()
    }

    fn sql(statements: Vec<Statement>) -> Vec<String> {
        statements.into_iter().map(|s| s.sql).collect()
    }

    #[test]
    fn length_and_null_changes_are_separate_modifies() {
        let before = varchar("name", 10, true);
        let after = varchar("name", 20, false);
        let change = ColumnChange::between(&before, &after);
        let statements = OracleDialect
            .alter_column("T", &before, &after, change, TypeContext::default())
            .unwrap();
        assert_eq!(
            sql(statements),
            vec![
                "ALTER TABLE T MODIFY (name VARCHAR2(20 CHAR))",
                "ALTER TABLE T MODIFY (name NOT NULL)",
            ]
        );
    }

    #[test]
    fn numeric_to_character_copies_through_a_temporary_column() {
        let before = Column::builder("Code", DataType::Integer)
            .not_null()
            .build()
            .unwrap();
        let after = Column::builder("Code", DataType::Varchar { length: 12 })
            .not_null()
            .default_value(DefaultValue::Literal(Literal::String("none".into())))
            .build()
            .unwrap();
        let change = ColumnChange::between(&before, &after);
        let statements = OracleDialect
            .alter_column("Item", &before, &after, change, TypeContext::default())
            .unwrap();
        assert_eq!(
            sql(statements),
            vec![
                "ALTER TABLE Item ADD (Code_TMP VARCHAR2(12 CHAR))",
                "UPDATE Item SET Code_TMP = CAST(Code AS VARCHAR2(12 CHAR))",
                "ALTER TABLE Item DROP COLUMN Code",
                "ALTER TABLE Item RENAME COLUMN Code_TMP TO Code",
                "ALTER TABLE Item MODIFY (Code NOT NULL)",
                "ALTER TABLE Item MODIFY (Code DEFAULT 'none')",
            ]
        );
    }

    #[test]
    fn clob_conversions_use_lob_functions() {
        let before = varchar("Note", 200, true);
        let after = Column::builder("Note", DataType::Clob).build().unwrap();
        let change = ColumnChange::between(&before, &after);
        let statements = sql(OracleDialect
            .alter_column("T", &before, &after, change, TypeContext::default())
            .unwrap());
        assert_eq!(statements[1], "UPDATE T SET Note_TMP = TO_CLOB(Note)");

        let change = ColumnChange::between(&after, &before);
        let statements = sql(OracleDialect
            .alter_column("T", &after, &before, change, TypeContext::default())
            .unwrap());
        assert_eq!(statements[1], "UPDATE T SET Note_TMP = DBMS_LOB.SUBSTR(Note, 200, 1)");
    }

    #[test]
    fn blob_conversion_is_rejected() {
        let before = varchar("Data", 10, true);
        let after = Column::builder("Data", DataType::Blob).build().unwrap();
        let change = ColumnChange::between(&before, &after);
        let err = OracleDialect
            .alter_column("T", &before, &after, change, TypeContext::default())
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedAlter { ref column, .. } if column == "Data"));
    }

    #[test]
    fn on_update_cascade_is_unsupported() {
        let fk = ForeignKey::new(
            "FK_T_P",
            "P",
            Reference::new("P", "Id").on_update(ReferentialAction::Cascade),
        );
        assert!(OracleDialect.add_foreign_key("T", &fk).is_err());
    }
}
