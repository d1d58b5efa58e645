use meta_forge_core::migration::{ColumnChange, RecreateOptions};
use meta_forge_core::types::{Column, DataType, DialectKind, ForeignKey};

use super::{alter, Capabilities, CommentStyle, Dialect, StatementResult, TypeContext};
use crate::error::GenerateError;
use crate::identifier::{CaseFolding, IdentifierStyle};
use crate::trigger::TriggerStrategy;

const RESERVED: &[&str] = &[
    "ABORT", "AUTOINCREMENT", "COLLATE", "CONFLICT", "DEFERRABLE", "EXCEPT", "GLOB",
    "IMMEDIATE", "ISNULL", "LIMIT", "NOTNULL", "OFFSET", "PRAGMA", "RAISE", "REGEXP", "REINDEX",
    "RENAME", "REPLACE", "TEMP", "TEMPORARY", "VACUUM",
];

const IDENTIFIERS: IdentifierStyle =
    IdentifierStyle::double_quoted(RESERVED, CaseFolding::Preserve, 1024);

/// SQLite 3.
///
/// Types map onto storage classes. Keys and foreign keys are declared
/// inside `CREATE TABLE`; existing tables accept only new columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn identifiers(&self) -> &IdentifierStyle {
        &IDENTIFIERS
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::ScriptOnly
    }

    fn recreate_options(&self) -> RecreateOptions {
        RecreateOptions::NONE
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            inline_foreign_keys: true,
            alter_constraints: false,
            drop_column: false,
            ..Capabilities::FULL
        }
    }

    fn map_type(&self, data_type: &DataType, _ctx: TypeContext) -> String {
        match data_type {
            DataType::Bit | DataType::Integer | DataType::BigInt => "INTEGER".into(),
            DataType::Float => "REAL".into(),
            DataType::Decimal { .. } | DataType::Number { .. } => "NUMERIC".into(),
            DataType::Char { .. }
            | DataType::Varchar { .. }
            | DataType::Clob
            | DataType::Date
            | DataType::Time
            | DataType::DateTime => "TEXT".into(),
            DataType::Blob => "BLOB".into(),
        }
    }

    fn trigger(&self) -> TriggerStrategy {
        TriggerStrategy::RowBlock
    }

    fn add_column(
        &self,
        table: &str,
        column: &Column,
        foreign_key: Option<&ForeignKey>,
        ctx: TypeContext,
    ) -> StatementResult {
        if !column.is_nullable() && column.default_value().is_none() {
            return Err(GenerateError::unsupported(
                self.kind(),
                "ADD COLUMN ... NOT NULL without a default",
                format!("column {table}.{}", column.name()),
            ));
        }
        let mut definition = self.column_definition(column, ctx);
        if let Some(fk) = foreign_key {
            definition.push(' ');
            definition.push_str(&self.references_clause(fk)?);
        }
        Ok(vec![alter(self, table, format!("ADD COLUMN {definition}"))])
    }

    fn alter_column(
        &self,
        table: &str,
        _before: &Column,
        after: &Column,
        _change: ColumnChange,
        _ctx: TypeContext,
    ) -> StatementResult {
        Err(GenerateError::UnsupportedAlter {
            dialect: self.kind(),
            table: table.to_string(),
            column: after.name().to_string(),
            reason: "existing columns cannot be changed".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use meta_forge_core::types::{DefaultValue, Literal, PrimaryKey, Reference};

    use super::*;

    #[test]
    fn added_column_carries_its_foreign_key() {
        let column = Column::builder("OwnerId", DataType::Integer).build().unwrap();
        let fk = ForeignKey::new("FK_Pet_Owner", "OwnerId", Reference::new("Owner", "Id"));
        let statements = SqliteDialect
            .add_column("Pet", &column, Some(&fk), TypeContext::default())
            .unwrap();
        assert_eq!(
            statements[0].sql,
            "ALTER TABLE Pet ADD COLUMN OwnerId INTEGER REFERENCES Owner (Id)"
        );
    }

    #[test]
    fn not_null_column_needs_a_default() {
        let bare = Column::builder("Flag", DataType::Bit).not_null().build().unwrap();
        assert!(SqliteDialect
            .add_column("T", &bare, None, TypeContext::default())
            .is_err());

        let defaulted = Column::builder("Flag", DataType::Bit)
            .not_null()
            .default_value(DefaultValue::Literal(Literal::Integer(0)))
            .build()
            .unwrap();
        assert_eq!(
            SqliteDialect
                .add_column("T", &defaulted, None, TypeContext::default())
                .unwrap()[0]
                .sql,
            "ALTER TABLE T ADD COLUMN Flag INTEGER DEFAULT 0 NOT NULL"
        );
    }

    #[test]
    fn constraints_cannot_be_altered() {
        let pk = PrimaryKey {
            name: "PK_T".into(),
            columns: vec!["Id".into()],
        };
        assert!(matches!(
            SqliteDialect.add_primary_key("T", &pk),
            Err(GenerateError::UnsupportedOperation { .. })
        ));
        let column = Column::builder("Old", DataType::Integer).build().unwrap();
        assert!(SqliteDialect.drop_column("T", &column).is_err());
    }
}
