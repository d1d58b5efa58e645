use meta_forge_core::types::{Column, DataType, DialectKind};

use super::{alter, numeric, Dialect, StatementResult, TypeContext};
use crate::identifier::{CaseFolding, IdentifierStyle};
use crate::trigger::{ReferencingStyle, TriggerStrategy};

const RESERVED: &[&str] = &[
    "ARRAY", "BINARY", "BOOLEAN", "CALL", "CORRESPONDING", "CUBE", "CURSOR", "CYCLE", "DATE",
    "DAY", "DECIMAL", "DOUBLE", "ELEMENT", "FILTER", "FLOAT", "FUNCTION", "HOUR", "INTEGER",
    "INTERVAL", "LIMIT", "MINUTE", "MONTH", "MODULE", "NATURAL", "OFFSET", "OVER", "POSITION",
    "RANGE", "ROW", "ROWS", "SECOND", "SMALLINT", "TIME", "TIMESTAMP", "VARCHAR", "WINDOW",
    "YEAR",
];

const IDENTIFIERS: IdentifierStyle =
    IdentifierStyle::double_quoted(RESERVED, CaseFolding::Upper, 128);

/// HyperSQL 2.x.
#[derive(Debug, Clone, Copy, Default)]
pub struct HsqldbDialect;

impl Dialect for HsqldbDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Hsqldb
    }

    fn identifiers(&self) -> &IdentifierStyle {
        &IDENTIFIERS
    }

    fn map_type(&self, data_type: &DataType, _ctx: TypeContext) -> String {
        match data_type {
            DataType::Bit => "TINYINT".into(),
            DataType::Integer => "INTEGER".into(),
            DataType::BigInt => "BIGINT".into(),
            DataType::Float => "DOUBLE".into(),
            DataType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
            DataType::Number { precision, scale } => {
                numeric("DECIMAL", *precision, *scale, Some(128))
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
        TriggerStrategy::Referencing(ReferencingStyle::Hsqldb)
    }

    fn set_nullability(&self, table: &str, column: &Column) -> StatementResult {
        let clause = if column.is_nullable() { "SET NULL" } else { "SET NOT NULL" };
        Ok(vec![alter(
            self,
            table,
            format!("ALTER COLUMN {} {clause}", self.quote(column.name())),
        )])
    }
}
