use meta_forge_core::types::{Column, DataType, DialectKind, HintTarget};

use super::{alter, numeric, Dialect, StatementResult, TypeContext};
use crate::identifier::{CaseFolding, IdentifierStyle};
use crate::trigger::TriggerStrategy;

const RESERVED: &[&str] = &[
    "ANALYSE", "ANALYZE", "ARRAY", "ASYMMETRIC", "BOTH", "CAST", "COLLATE", "DEFERRABLE", "DO",
    "INITIALLY", "LATERAL", "LEADING", "LIMIT", "LOCALTIME", "LOCALTIMESTAMP", "OFFSET", "ONLY",
    "PLACING", "RETURNING", "SESSION_USER", "SOME", "SYMMETRIC", "TRAILING", "VARIADIC",
    "WINDOW",
];

const IDENTIFIERS: IdentifierStyle = IdentifierStyle::double_quoted(RESERVED, CaseFolding::Lower, 63);

/// PostgreSQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::PostgreSql
    }

    fn identifiers(&self) -> &IdentifierStyle {
        &IDENTIFIERS
    }

    fn map_type(&self, data_type: &DataType, _ctx: TypeContext) -> String {
        match data_type {
            DataType::Bit => "SMALLINT".into(),
            DataType::Integer => "INTEGER".into(),
            DataType::BigInt => "BIGINT".into(),
            DataType::Float => "DOUBLE PRECISION".into(),
            DataType::Decimal { precision, scale } => format!("NUMERIC({precision}, {scale})"),
            DataType::Number { precision, scale } => numeric("NUMERIC", *precision, *scale, None),
            DataType::Char { length } => format!("CHAR({length})"),
            DataType::Varchar { length } => format!("VARCHAR({length})"),
            DataType::Clob => "TEXT".into(),
            DataType::Date => "DATE".into(),
            DataType::Time => "TIME".into(),
            DataType::DateTime => "TIMESTAMP".into(),
            DataType::Blob => "BYTEA".into(),
        }
    }

    fn trigger(&self) -> TriggerStrategy {
        TriggerStrategy::PlPgSql
    }

    fn tablespace_clause(&self, tablespace: &str, _target: HintTarget) -> Option<String> {
        Some(format!("TABLESPACE {tablespace}"))
    }

    fn retype_column(
        &self,
        table: &str,
        _before: &Column,
        after: &Column,
        ctx: TypeContext,
    ) -> StatementResult {
        let column = self.quote(after.name());
        let native = self.data_type(after, ctx);
        Ok(vec![alter(
            self,
            table,
            format!("ALTER COLUMN {column} TYPE {native} USING CAST({column} AS {native})"),
        )])
    }
}
