use meta_forge_core::migration::ColumnChange;
use meta_forge_core::types::{Column, DataType, DialectKind, HintTarget};

use super::{alter, numeric, standard_alter, Capabilities, Dialect, StatementResult, TypeContext};
use crate::identifier::{CaseFolding, IdentifierStyle};
use crate::script::{Statement, StatementDelimiter};
use crate::trigger::{ReferencingStyle, TriggerStrategy};

const RESERVED: &[&str] = &[
    "AFTER", "ALIAS", "ALLOW", "AUDIT", "BEFORE", "BEGIN", "BUFFERPOOL", "CALL", "CAPTURE",
    "COLLECTION", "CONCAT", "CONDITION", "CONTAINS", "COUNT", "CYCLE", "DATA", "DATABASE",
    "DAYS", "DB2SQL", "DO", "EDITPROC", "ELSEIF", "ENCODING", "ERASE", "EXCLUSIVE", "EXIT",
    "FENCED", "FIELDPROC", "FILE", "FINAL", "GENERATED", "HOURS", "IF", "IMMEDIATE", "INHERIT",
    "ITERATE", "LEAVE", "LOCATOR", "LOCK", "LOOP", "MODE", "MODIFIES", "NODENAME", "NUMPARTS",
    "OBID", "OPTIMIZATION", "OPTIMIZE", "PACKAGE", "PART", "PARTITION", "PIECESIZE", "PLAN",
    "PRIQTY", "PROGRAM", "QUERYNO", "READS", "RECOVERY", "REPEAT", "RESET", "RESIGNAL",
    "RESTART", "RESULT", "RETURN", "ROW", "RRN", "SECQTY", "SIGNAL", "SIMPLE", "SOURCE",
    "STOGROUP", "SUBPAGES", "SYNONYM", "TABLESPACE", "UNDO", "UNTIL", "VALIDPROC", "VARIABLE",
    "VARIANT", "VCAT", "VOLUMES", "WHILE", "WLM", "YEARS",
];

const IDENTIFIERS: IdentifierStyle =
    IdentifierStyle::double_quoted(RESERVED, CaseFolding::Upper, 128);

/// IBM DB2 for Linux, UNIX, and Windows.
///
/// Trigger blocks switch the client terminator to `@`. Structural column
/// changes leave the table in reorg-pending state, so they are followed by a
/// `REORG`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Db2Dialect;

impl Db2Dialect {
    fn reorg(&self, table: &str) -> Statement {
        Statement::plain(format!(
            "CALL SYSPROC.ADMIN_CMD('REORG TABLE {}')",
            self.quote(table).replace('\'', "''")
        ))
    }
}

impl Dialect for Db2Dialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Db2
    }

    fn delimiter(&self) -> StatementDelimiter {
        StatementDelimiter {
            terminator: ";",
            block_prefix: Some("--#SET TERMINATOR @\n"),
            block_terminator: "\n@\n--#SET TERMINATOR ;",
            batch_separator: None,
        }
    }

    fn identifiers(&self) -> &IdentifierStyle {
        &IDENTIFIERS
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

    fn current_timestamp(&self) -> &'static str {
        "CURRENT TIMESTAMP"
    }

    fn trigger(&self) -> TriggerStrategy {
        TriggerStrategy::Referencing(ReferencingStyle::Db2)
    }

    fn tablespace_clause(&self, tablespace: &str, target: HintTarget) -> Option<String> {
        (target == HintTarget::Table).then(|| format!("IN {tablespace}"))
    }

    fn alter_column(
        &self,
        table: &str,
        before: &Column,
        after: &Column,
        change: ColumnChange,
        ctx: TypeContext,
    ) -> StatementResult {
        let mut statements = standard_alter(self, table, before, after, change, ctx)?;
        if change.is_structural() {
            statements.push(self.reorg(table));
        }
        Ok(statements)
    }

    fn drop_column(&self, table: &str, column: &Column) -> StatementResult {
        Ok(vec![
            alter(
                self,
                table,
                format!("DROP COLUMN {}", self.quote(column.name())),
            ),
            self.reorg(table),
        ])
    }
}
