use meta_forge_core::migration::{ColumnChange, MigrationPlan, MigrationStep, RecreateOptions};
use meta_forge_core::types::{Column, DataType, DefaultValue, DialectKind, Index};

use super::{alter, numeric, CommentStyle, Dialect, StatementResult, TypeContext};
use crate::identifier::{CaseFolding, IdentifierStyle};
use crate::script::{Statement, StatementDelimiter};
use crate::trigger::TriggerStrategy;

const RESERVED: &[&str] = &[
    "BACKUP", "BEGIN", "BREAK", "BROWSE", "BULK", "CHECKPOINT", "CLUSTERED", "COMPUTE",
    "CONTAINS", "CONTINUE", "DATABASE", "DBCC", "DENY", "DISK", "DUMP", "ERRLVL", "EXEC",
    "EXECUTE", "EXIT", "FILE", "FILLFACTOR", "FUNCTION", "GOTO", "HOLDLOCK", "IDENTITY", "IF",
    "KILL", "LINENO", "LOAD", "NOCHECK", "NONCLUSTERED", "OFF", "OFFSETS", "OPEN", "OVER",
    "PERCENT", "PIVOT", "PLAN", "PRINT", "PROC", "PROCEDURE", "PUBLIC", "RAISERROR", "READ",
    "RECONFIGURE", "REPLICATION", "RESTORE", "RETURN", "REVOKE", "ROWCOUNT", "RULE", "SAVE",
    "SCHEMA", "SHUTDOWN", "STATISTICS", "TOP", "TRAN", "TRANSACTION", "TRUNCATE", "TSEQUAL",
    "UPDATETEXT", "USE", "WAITFOR", "WHILE", "WRITETEXT",
];

const IDENTIFIERS: IdentifierStyle = IdentifierStyle {
    open: '[',
    close: ']',
    reserved: RESERVED,
    folding: CaseFolding::Preserve,
    max_length: 128,
};

/// Largest non-`MAX` `VARCHAR` length.
const VARCHAR_LIMIT: u32 = 8000;

/// Helper procedure that drops the anonymous default constraint of a column.
pub const DROP_DEFAULT_PROCEDURE: &str = "DropDefaultConstraint";

/// Microsoft SQL Server.
///
/// `VARCHAR` lengths are scaled by four for byte-based storage, except on
/// key columns, which must stay within index size limits; a migration
/// re-types a column whose key status changes. Column defaults
/// are anonymous constraints; migrations that alter or drop columns create
/// a helper procedure that looks them up by column.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    fn needs_default_helper(plan: &MigrationPlan) -> bool {
        plan.iter().any(|step| {
            matches!(
                step,
                MigrationStep::AlterColumn { .. } | MigrationStep::DropColumn { .. }
            )
        })
    }
}

impl Dialect for SqlServerDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::SqlServer
    }

    fn delimiter(&self) -> StatementDelimiter {
        StatementDelimiter {
            terminator: ";",
            block_prefix: None,
            block_terminator: "",
            batch_separator: Some("GO"),
        }
    }

    fn identifiers(&self) -> &IdentifierStyle {
        &IDENTIFIERS
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::ExtendedProperty
    }

    fn recreate_options(&self) -> RecreateOptions {
        RecreateOptions::ALL
    }

    fn map_type(&self, data_type: &DataType, ctx: TypeContext) -> String {
        match data_type {
            DataType::Bit => "BIT".into(),
            DataType::Integer => "INT".into(),
            DataType::BigInt => "BIGINT".into(),
            DataType::Float => "FLOAT".into(),
            DataType::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
            DataType::Number { precision, scale } => {
                numeric("NUMERIC", *precision, *scale, Some(38))
            }
            DataType::Char { length } => format!("NCHAR({length})"),
            DataType::Varchar { length } => {
                let length = if ctx.key_column {
                    *length
                } else {
                    length.saturating_mul(4)
                };
                if length > VARCHAR_LIMIT {
                    "VARCHAR(MAX)".into()
                } else {
                    format!("VARCHAR({length})")
                }
            }
            DataType::Clob => "VARCHAR(MAX)".into(),
            DataType::Date => "DATE".into(),
            DataType::Time => "TIME".into(),
            DataType::DateTime => "DATETIME2".into(),
            DataType::Blob => "VARBINARY(MAX)".into(),
        }
    }

    fn concat(&self, left: String, right: String) -> String {
        format!("{left} + {right}")
    }

    fn trigger(&self) -> TriggerStrategy {
        TriggerStrategy::TransactSql { instead_of: true }
    }

    fn add_column_clause(&self) -> &'static str {
        "ADD"
    }

    /// Drops the default, restates type and nullability, then re-adds the
    /// default. The default is only touched when it changed or blocks the
    /// column change.
    fn alter_column(
        &self,
        table: &str,
        before: &Column,
        after: &Column,
        change: ColumnChange,
        ctx: TypeContext,
    ) -> StatementResult {
        let touches_default = change.default || change.is_structural();
        let mut statements = Vec::new();
        if touches_default && before.default_value().is_some() {
            statements.extend(self.drop_default(table, before.name())?);
        }
        if change.is_structural() {
            let null = if after.is_nullable() { "NULL" } else { "NOT NULL" };
            statements.push(alter(
                self,
                table,
                format!(
                    "ALTER COLUMN {} {} {null}",
                    self.quote(after.name()),
                    self.data_type(after, ctx)
                ),
            ));
        }
        if let Some(value) = after.default_value().filter(|_| touches_default) {
            statements.extend(self.set_default(table, after.name(), value)?);
        }
        Ok(statements)
    }

    fn set_default(&self, table: &str, column: &str, value: &DefaultValue) -> StatementResult {
        Ok(vec![alter(
            self,
            table,
            format!(
                "ADD DEFAULT {} FOR {}",
                self.default_clause(value),
                self.quote(column)
            ),
        )])
    }

    fn drop_default(&self, table: &str, column: &str) -> StatementResult {
        Ok(vec![Statement::plain(format!(
            "EXEC {DROP_DEFAULT_PROCEDURE} {}, {}",
            self.string_literal(table),
            self.string_literal(column)
        ))])
    }

    fn drop_column(&self, table: &str, column: &Column) -> StatementResult {
        let mut statements = Vec::new();
        if column.default_value().is_some() {
            statements.extend(self.drop_default(table, column.name())?);
        }
        statements.push(alter(
            self,
            table,
            format!("DROP COLUMN {}", self.quote(column.name())),
        ));
        Ok(statements)
    }

    fn drop_index(&self, table: &str, index: &Index) -> StatementResult {
        Ok(vec![Statement::plain(format!(
            "DROP INDEX {} ON {}",
            self.object_name(&index.name),
            self.quote(table)
        ))])
    }

    fn migration_prologue(&self, plan: &MigrationPlan) -> Vec<Statement> {
        if !Self::needs_default_helper(plan) {
            return Vec::new();
        }
        vec![Statement::block(format!(
            "CREATE PROCEDURE {DROP_DEFAULT_PROCEDURE} @table NVARCHAR(128), @column NVARCHAR(128)
AS
BEGIN
    DECLARE @name NVARCHAR(128);
    DECLARE @sql NVARCHAR(400);
    SELECT @name = dc.name
      FROM sys.default_constraints dc
      JOIN sys.columns c
        ON c.object_id = dc.parent_object_id AND c.column_id = dc.parent_column_id
     WHERE dc.parent_object_id = OBJECT_ID(@table) AND c.name = @column;
    IF @name IS NOT NULL
    BEGIN
        SET @sql = N'ALTER TABLE ' + QUOTENAME(@table) + N' DROP CONSTRAINT ' + QUOTENAME(@name);
        EXEC sp_executesql @sql;
    END
END"
        ))]
    }

    fn migration_epilogue(&self, plan: &MigrationPlan) -> Vec<Statement> {
        if !Self::needs_default_helper(plan) {
            return Vec::new();
        }
        vec![Statement::plain(format!(
            "DROP PROCEDURE {DROP_DEFAULT_PROCEDURE}"
        ))]
    }
}

#[cfg(test)]
mod tests {
    use meta_forge_core::types::Literal;

    use super::*;

    fn key() -> TypeContext {
        TypeContext { key_column: true }
    }

    #[test]
    fn varchar_is_scaled_except_for_keys() {
        let dialect = SqlServerDialect;
        let v = DataType::Varchar { length: 100 };
        assert_eq!(dialect.map_type(&v, TypeContext::default()), "VARCHAR(400)");
        assert_eq!(dialect.map_type(&v, key()), "VARCHAR(100)");
        let long = DataType::Varchar { length: 2001 };
        assert_eq!(dialect.map_type(&long, TypeContext::default()), "VARCHAR(MAX)");
        assert_eq!(dialect.map_type(&long, key()), "VARCHAR(2001)");
    }

    #[test]
    fn retype_drops_and_restores_the_default() {
        let before = Column::builder("Qty", DataType::Integer)
            .default_value(DefaultValue::Literal(Literal::Integer(0)))
            .build()
            .unwrap();
        let after = Column::builder("Qty", DataType::BigInt)
            .not_null()
            .default_value(DefaultValue::Literal(Literal::Integer(0)))
            .build()
            .unwrap();
        let change = ColumnChange::between(&before, &after);
        let statements: Vec<String> = SqlServerDialect
            .alter_column("Stock", &before, &after, change, TypeContext::default())
            .unwrap()
            .into_iter()
            .map(|s| s.sql)
            .collect();
        assert_eq!(
            statements,
            vec![
                "EXEC DropDefaultConstraint 'Stock', 'Qty'",
                "ALTER TABLE Stock ALTER COLUMN Qty BIGINT NOT NULL",
                "ALTER TABLE Stock ADD DEFAULT 0 FOR Qty",
            ]
        );
    }

    #[test]
    fn helper_procedure_only_when_columns_change() {
        let empty = MigrationPlan::new(Vec::new());
        assert!(SqlServerDialect.migration_prologue(&empty).is_empty());

        let column = Column::builder("Old", DataType::Integer).build().unwrap();
        let plan = MigrationPlan::new(vec![MigrationStep::DropColumn {
            table: "T".into(),
            column,
        }]);
        let prologue = SqlServerDialect.migration_prologue(&plan);
        assert!(prologue[0].sql.starts_with("CREATE PROCEDURE DropDefaultConstraint"));
        assert_eq!(
            SqlServerDialect.migration_epilogue(&plan)[0].sql,
            "DROP PROCEDURE DropDefaultConstraint"
        );
    }

    #[test]
    fn reserved_names_use_brackets() {
        assert_eq!(SqlServerDialect.quote("User"), "[User]");
        assert_eq!(SqlServerDialect.quote("Customer"), "Customer");
    }
}
