use meta_forge_core::migration::{ColumnChange, RecreateOptions};
use meta_forge_core::types::{Column, DataType, DefaultValue, DialectKind, Index};

use super::{
    alter, default_change, numeric, Capabilities, CommentStyle, Dialect, StatementResult,
    TypeContext,
};
use crate::identifier::{CaseFolding, IdentifierStyle};
use crate::script::{Statement, StatementDelimiter};
use crate::trigger::TriggerStrategy;

const RESERVED: &[&str] = &[
    "BEGIN", "BREAK", "BROWSE", "CHECKPOINT", "CLUSTERED", "COMPUTE", "CONTINUE", "DATABASE",
    "DUMP", "EXEC", "EXECUTE", "EXIT", "FILLFACTOR", "GOTO", "HOLDLOCK", "IDENTITY", "IF",
    "KILL", "LINENO", "LOAD", "MODIFY", "NOHOLDLOCK", "NONCLUSTERED", "OFF", "OFFSETS", "ONLINE",
    "OPEN", "PLAN", "PRINT", "PROC", "PROCEDURE", "PUBLIC", "RAISERROR", "READ", "REPLACE",
    "RETURN", "REVOKE", "ROWCOUNT", "RULE", "SAVE", "SCHEMA", "SHUTDOWN", "STATISTICS",
    "STRINGSIZE", "TEXTSIZE", "TRAN", "TRANSACTION", "TRUNCATE", "TSEQUAL", "USE", "WAITFOR",
    "WHILE", "WRITETEXT",
];

const IDENTIFIERS: IdentifierStyle = IdentifierStyle {
    open: '[',
    close: ']',
    reserved: RESERVED,
    folding: CaseFolding::Preserve,
    max_length: 30,
};

/// Sybase Adaptive Server Enterprise.
///
/// Columns default to `NOT NULL`, so nullable columns say `NULL`
/// explicitly. Cascading referential actions do not exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct SybaseDialect;

impl SybaseDialect {
    fn null_keyword(column: &Column) -> &'static str {
        if column.is_nullable() {
            "NULL"
        } else {
            "NOT NULL"
        }
    }
}

impl Dialect for SybaseDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Sybase
    }

    fn delimiter(&self) -> StatementDelimiter {
        StatementDelimiter {
            terminator: "",
            block_prefix: None,
            block_terminator: "",
            batch_separator: Some("go"),
        }
    }

    fn identifiers(&self) -> &IdentifierStyle {
        &IDENTIFIERS
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::ScriptOnly
    }

    fn recreate_options(&self) -> RecreateOptions {
        RecreateOptions {
            defaults: false,
            ..RecreateOptions::ALL
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            delete_actions: false,
            update_actions: false,
            ..Capabilities::FULL
        }
    }

    fn map_type(&self, data_type: &DataType, _ctx: TypeContext) -> String {
        match data_type {
            DataType::Bit => "BIT".into(),
            DataType::Integer => "INT".into(),
            DataType::BigInt => "BIGINT".into(),
            DataType::Float => "FLOAT".into(),
            DataType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
            DataType::Number { precision, scale } => {
                numeric("NUMERIC", *precision, *scale, Some(38))
            }
            DataType::Char { length } => format!("CHAR({length})"),
            DataType::Varchar { length } => format!("VARCHAR({length})"),
            DataType::Clob => "TEXT".into(),
            DataType::Date => "DATE".into(),
            DataType::Time => "TIME".into(),
            DataType::DateTime => "DATETIME".into(),
            DataType::Blob => "IMAGE".into(),
        }
    }

    fn current_timestamp(&self) -> &'static str {
        "getdate()"
    }

    fn concat(&self, left: String, right: String) -> String {
        format!("{left} + {right}")
    }

    fn trigger(&self) -> TriggerStrategy {
        TriggerStrategy::TransactSql { instead_of: false }
    }

    fn column_definition(&self, column: &Column, ctx: TypeContext) -> String {
        let mut sql = format!(
            "{} {}",
            self.quote(column.name()),
            self.data_type(column, ctx)
        );
        if let Some(default) = column.default_value() {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.default_clause(default));
        }
        sql.push(' ');
        sql.push_str(Self::null_keyword(column));
        sql
    }

    fn add_column_clause(&self) -> &'static str {
        "ADD"
    }

    fn alter_column(
        &self,
        table: &str,
        _before: &Column,
        after: &Column,
        change: ColumnChange,
        ctx: TypeContext,
    ) -> StatementResult {
        let mut statements = Vec::new();
        if change.is_structural() {
            statements.push(alter(
                self,
                table,
                format!(
                    "MODIFY {} {} {}",
                    self.quote(after.name()),
                    self.data_type(after, ctx),
                    Self::null_keyword(after)
                ),
            ));
        }
        if change.default {
            statements.extend(default_change(self, table, after)?);
        }
        Ok(statements)
    }

    fn set_default(&self, table: &str, column: &str, value: &DefaultValue) -> StatementResult {
        Ok(vec![alter(
            self,
            table,
            format!(
                "REPLACE {} DEFAULT {}",
                self.quote(column),
                self.default_clause(value)
            ),
        )])
    }

    fn drop_default(&self, table: &str, column: &str) -> StatementResult {
        Ok(vec![alter(
            self,
            table,
            format!("REPLACE {} DEFAULT NULL", self.quote(column)),
        )])
    }

    fn drop_column(&self, table: &str, column: &Column) -> StatementResult {
        Ok(vec![alter(
            self,
            table,
            format!("DROP {}", self.quote(column.name())),
        )])
    }

    fn drop_index(&self, table: &str, index: &Index) -> StatementResult {
        Ok(vec![Statement::plain(format!(
            "DROP INDEX {}.{}",
            self.quote(table),
            self.object_name(&index.name)
        ))])
    }
}
