use meta_forge_core::migration::ColumnChange;
use meta_forge_core::types::{
    Column, DataType, DialectKind, ForeignKey, Index, PrimaryKey, UniqueConstraint,
};

use super::{alter, numeric, CommentStyle, Dialect, StatementResult, TypeContext};
use crate::identifier::{CaseFolding, IdentifierStyle};
use crate::script::{Statement, StatementDelimiter};
use crate::trigger::TriggerStrategy;

const RESERVED: &[&str] = &[
    "ACCESSIBLE", "CHANGE", "DATABASE", "DATABASES", "DELAYED", "DIV", "DUAL", "ENCLOSED",
    "ESCAPED", "EXPLAIN", "HIGH_PRIORITY", "IGNORE", "INTERVAL", "KEYS", "KILL", "LIMIT",
    "LINES", "LOAD", "LOCK", "LONG", "LOW_PRIORITY", "MATCH", "MOD", "OPTIMIZE", "OPTION",
    "OUTFILE", "PURGE", "RANGE", "READ", "REGEXP", "RENAME", "REPEAT", "REPLACE", "REQUIRE",
    "RLIKE", "SCHEMA", "SCHEMAS", "SEPARATOR", "SHOW", "SPATIAL", "STARTING", "STRAIGHT_JOIN",
    "TERMINATED", "UNLOCK", "UNSIGNED", "USAGE", "USE", "WRITE", "XOR", "ZEROFILL",
];

const IDENTIFIERS: IdentifierStyle = IdentifierStyle {
    open: '`',
    close: '`',
    reserved: RESERVED,
    folding: CaseFolding::Preserve,
    max_length: 64,
};

/// MySQL with InnoDB tables.
///
/// Trigger bodies are wrapped in `DELIMITER //` so the client does not split
/// them at the inner semicolons.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn delimiter(&self) -> StatementDelimiter {
        StatementDelimiter {
            terminator: ";",
            block_prefix: Some("DELIMITER //\n"),
            block_terminator: "\n//\nDELIMITER ;",
            batch_separator: None,
        }
    }

    fn identifiers(&self) -> &IdentifierStyle {
        &IDENTIFIERS
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::Inline
    }

    fn map_type(&self, data_type: &DataType, _ctx: TypeContext) -> String {
        match data_type {
            DataType::Bit => "TINYINT(1)".into(),
            DataType::Integer => "INT".into(),
            DataType::BigInt => "BIGINT".into(),
            DataType::Float => "DOUBLE".into(),
            DataType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
            DataType::Number { precision, scale } => {
                numeric("DECIMAL", *precision, *scale, Some(65))
            }
            DataType::Char { length } => format!("CHAR({length})"),
            DataType::Varchar { length } => format!("VARCHAR({length})"),
            DataType::Clob => "LONGTEXT".into(),
            DataType::Date => "DATE".into(),
            DataType::Time => "TIME".into(),
            DataType::DateTime => "DATETIME".into(),
            DataType::Blob => "LONGBLOB".into(),
        }
    }

    fn string_literal(&self, text: &str) -> String {
        format!("'{}'", text.replace('\\', "\\\\").replace('\'', "''"))
    }

    fn concat(&self, left: String, right: String) -> String {
        format!("CONCAT({left}, {right})")
    }

    fn trigger(&self) -> TriggerStrategy {
        TriggerStrategy::RowBlock
    }

    /// `MODIFY COLUMN` restates the whole definition, so one statement
    /// covers every kind of change.
    fn alter_column(
        &self,
        table: &str,
        _before: &Column,
        after: &Column,
        _change: ColumnChange,
        ctx: TypeContext,
    ) -> StatementResult {
        Ok(vec![alter(
            self,
            table,
            format!("MODIFY COLUMN {}", self.column_definition(after, ctx)),
        )])
    }

    fn drop_primary_key(&self, table: &str, _primary_key: &PrimaryKey) -> StatementResult {
        Ok(vec![alter(self, table, "DROP PRIMARY KEY")])
    }

    fn drop_unique(&self, table: &str, unique: &UniqueConstraint) -> StatementResult {
        Ok(vec![alter(
            self,
            table,
            format!("DROP INDEX {}", self.object_name(&unique.name)),
        )])
    }

    fn drop_foreign_key(&self, table: &str, foreign_key: &ForeignKey) -> StatementResult {
        Ok(vec![alter(
            self,
            table,
            format!("DROP FOREIGN KEY {}", self.object_name(&foreign_key.name)),
        )])
    }

    fn drop_index(&self, table: &str, index: &Index) -> StatementResult {
        Ok(vec![Statement::plain(format!(
            "DROP INDEX {} ON {}",
            self.object_name(&index.name),
            self.quote(table)
        ))])
    }
}
