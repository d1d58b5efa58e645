use meta_forge_core::types::{Column, DataType, DefaultValue, DialectKind};

use super::{alter, numeric, Capabilities, CommentStyle, Dialect, StatementResult, TypeContext};
use crate::error::GenerateError;
use crate::identifier::{CaseFolding, IdentifierStyle};
use crate::trigger::{ReferencingStyle, TriggerStrategy};

const RESERVED: &[&str] = &[
    "BOOLEAN", "CALL", "CONNECT", "CURSOR", "DATE", "DECIMAL", "DOUBLE", "EXPLAIN", "FLOAT",
    "INT", "INTEGER", "LOWER", "NATIONAL", "OFFSET", "ROWS", "SMALLINT", "SUBSTR", "TIME",
    "TIMESTAMP", "UPPER", "VARCHAR",
];

const IDENTIFIERS: IdentifierStyle =
    IdentifierStyle::double_quoted(RESERVED, CaseFolding::Upper, 128);

/// Apache Derby.
///
/// Triggers hold a single statement, so an action with several statements
/// becomes several numbered triggers. Column types can only be changed by
/// lengthening a `VARCHAR`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerbyDialect;

impl Dialect for DerbyDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Derby
    }

    fn identifiers(&self) -> &IdentifierStyle {
        &IDENTIFIERS
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::ScriptOnly
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            update_actions: false,
            ..Capabilities::FULL
        }
    }

    fn map_type(&self, data_type: &DataType, _ctx: TypeContext) -> String {
        match data_type {
            DataType::Bit => "SMALLINT".into(),
            DataType::Integer => "INTEGER".into(),
            DataType::BigInt => "BIGINT".into(),
            DataType::Float => "DOUBLE".into(),
            DataType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
            DataType::Number { precision, scale } => {
                numeric("DECIMAL", *precision, *scale, Some(31))
            }
            DataType::Char { length } => format!("CHAR({length})"),
            DataType::Varchar { length } => format!("VARCHAR({length})"),
            DataType::Clob => "CLOB".into(),
            DataType::Date => "DATE".into(),
            DataType::Time => "TIME".into(),
            DataType::DateTime => "TIMESTAMP".into(),
            DataType::Blob => "BLOB".into(),
        }
    }

    fn trigger(&self) -> TriggerStrategy {
        TriggerStrategy::Referencing(ReferencingStyle::Derby)
    }

    fn retype_column(
        &self,
        table: &str,
        before: &Column,
        after: &Column,
        ctx: TypeContext,
    ) -> StatementResult {
        match (before.data_type(), after.data_type()) {
            (DataType::Varchar { length: old }, DataType::Varchar { length: new }) if new >= old => {
                Ok(vec![alter(
                    self,
                    table,
                    format!(
                        "ALTER COLUMN {} SET DATA TYPE {}",
                        self.quote(after.name()),
                        self.data_type(after, ctx)
                    ),
                )])
            }
            (from, to) => Err(GenerateError::UnsupportedAlter {
                dialect: self.kind(),
                table: table.to_string(),
                column: after.name().to_string(),
                reason: format!("only VARCHAR columns can be lengthened, not {from} to {to}"),
            }),
        }
    }

    fn set_nullability(&self, table: &str, column: &Column) -> StatementResult {
        let null = if column.is_nullable() { "NULL" } else { "NOT NULL" };
        Ok(vec![alter(
            self,
            table,
            format!("ALTER COLUMN {} {null}", self.quote(column.name())),
        )])
    }

    fn set_default(&self, table: &str, column: &str, value: &DefaultValue) -> StatementResult {
        Ok(vec![alter(
            self,
            table,
            format!(
                "ALTER COLUMN {} DEFAULT {}",
                self.quote(column),
                self.default_clause(value)
            ),
        )])
    }
}
