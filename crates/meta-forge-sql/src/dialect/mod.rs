//! Dialect strategies.
//!
//! Every target database is one implementation of [`Dialect`]. The trait
//! carries the identifier, delimiter, and type-mapping rules of the dialect
//! plus one method per DDL customization point. Default method bodies emit
//! ANSI-flavoured SQL; a dialect overrides only where its syntax diverges.

mod db2;
mod derby;
mod hsqldb;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlserver;
mod sybase;

pub use db2::Db2Dialect;
pub use derby::DerbyDialect;
pub use hsqldb::HsqldbDialect;
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;
pub use sybase::SybaseDialect;

use std::fmt::Display;

use meta_forge_core::migration::{ColumnChange, MigrationPlan, RecreateOptions};
use meta_forge_core::types::{
    Column, DataType, DefaultValue, DialectKind, ForeignKey, HintTarget, Index, Literal,
    PrimaryKey, ReferentialAction, SqlMeta, SqlStyle, Table, UniqueConstraint, View,
};

use crate::error::GenerateError;
use crate::identifier::IdentifierStyle;
use crate::script::{Statement, StatementDelimiter};
use crate::trigger::{TriggerStrategy, OLD_ROW};

pub type StatementResult = Result<Vec<Statement>, GenerateError>;

/// Returns the strategy for a dialect.
pub fn dialect_for(kind: DialectKind) -> Box<dyn Dialect> {
    match kind {
        DialectKind::Oracle => Box::new(OracleDialect),
        DialectKind::SqlServer => Box::new(SqlServerDialect),
        DialectKind::Sybase => Box::new(SybaseDialect),
        DialectKind::PostgreSql => Box::new(PostgresDialect),
        DialectKind::MySql => Box::new(MySqlDialect),
        DialectKind::Db2 => Box::new(Db2Dialect),
        DialectKind::Derby => Box::new(DerbyDialect),
        DialectKind::Hsqldb => Box::new(HsqldbDialect),
        DialectKind::Sqlite => Box::new(SqliteDialect),
    }
}

// ---------------------------------------------------------------------------
// Strategy records
// ---------------------------------------------------------------------------

/// Where table and column comments go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `COMMENT ON TABLE t IS '...'` statements.
    CommentOn,
    /// `COMMENT '...'` on the column definition and a `COMMENT=` table option.
    Inline,
    /// `sp_addextendedproperty 'MS_Description'` calls.
    ExtendedProperty,
    /// Only `--` lines in the script.
    ScriptOnly,
}

/// What a dialect can express in DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Foreign keys can only be declared inside `CREATE TABLE` or `ADD COLUMN`.
    pub inline_foreign_keys: bool,
    /// Constraints can be added to and dropped from existing tables.
    pub alter_constraints: bool,
    /// `ON DELETE CASCADE` and `ON DELETE SET NULL`.
    pub delete_actions: bool,
    /// `ON UPDATE CASCADE` and `ON UPDATE SET NULL`.
    pub update_actions: bool,
    pub drop_column: bool,
}

impl Capabilities {
    pub const FULL: Self = Self {
        inline_foreign_keys: false,
        alter_constraints: true,
        delete_actions: true,
        update_actions: true,
        drop_column: true,
    };
}

/// Facts about a column's role that influence its native type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeContext {
    /// The column is part of a key, unique constraint, index, or foreign
    /// key, or is the target of another table's foreign key.
    pub key_column: bool,
}

impl TypeContext {
    pub fn for_column(meta: &SqlMeta, table: &Table, column: &str) -> Self {
        Self {
            key_column: table.is_key_column(column) || meta.is_referenced(table.name(), column),
        }
    }
}

// ---------------------------------------------------------------------------
// Dialect
// ---------------------------------------------------------------------------

/// A target SQL dialect.
pub trait Dialect: Send + Sync {
    fn kind(&self) -> DialectKind;

    fn name(&self) -> &'static str {
        self.kind().display_name()
    }

    fn delimiter(&self) -> StatementDelimiter {
        StatementDelimiter::SEMICOLON
    }

    fn identifiers(&self) -> &IdentifierStyle;

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::CommentOn
    }

    /// Dependent objects the diff must drop and re-create around a column
    /// type or nullability change.
    fn recreate_options(&self) -> RecreateOptions {
        RecreateOptions::foreign_keys_only()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FULL
    }

    /// Native spelling of a data type.
    fn map_type(&self, data_type: &DataType, ctx: TypeContext) -> String;

    /// Native type of a column; a `COLUMN_TYPE` hint for this dialect wins.
    fn data_type(&self, column: &Column, ctx: TypeContext) -> String {
        match column.hints().column_type(self.kind()) {
            Some(native) => native.to_string(),
            None => self.map_type(column.data_type(), ctx),
        }
    }

    fn current_timestamp(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    fn concat(&self, left: String, right: String) -> String {
        format!("{left} || {right}")
    }

    fn trigger(&self) -> TriggerStrategy;

    fn string_literal(&self, text: &str) -> String {
        Literal::quote_str(text)
    }

    fn literal(&self, value: &Literal) -> String {
        match value {
            Literal::String(text) => self.string_literal(text),
            other => other.to_string(),
        }
    }

    fn quote(&self, name: &str) -> String {
        self.identifiers().quote(name)
    }

    /// A generated object name, shortened to the dialect's limit and quoted.
    fn object_name(&self, name: &str) -> String {
        self.identifiers().object_name(name)
    }

    fn default_clause(&self, value: &DefaultValue) -> String {
        match value {
            DefaultValue::Literal(literal) => self.literal(literal),
            DefaultValue::CurrentTimestamp => self.current_timestamp().to_string(),
        }
    }

    /// `name type [DEFAULT x] [NOT NULL]`, as used by `CREATE TABLE` and
    /// `ADD COLUMN`.
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
        if !column.is_nullable() {
            sql.push_str(" NOT NULL");
        }
        if self.comment_style() == CommentStyle::Inline {
            if let Some(comment) = column.comment() {
                sql.push_str(" COMMENT ");
                sql.push_str(&self.string_literal(comment));
            }
        }
        sql
    }

    /// Storage clause for a `TABLESPACE` hint, if the dialect has one.
    fn tablespace_clause(&self, _tablespace: &str, _target: HintTarget) -> Option<String> {
        None
    }

    /// `REFERENCES t (c) [ON DELETE ..] [ON UPDATE ..]`.
    ///
    /// `NO ACTION` and `RESTRICT` are the unqualified behaviour and are never
    /// written out. Other actions fail when the dialect cannot express them.
    fn references_clause(&self, fk: &ForeignKey) -> Result<String, GenerateError> {
        let reference = &fk.reference;
        let caps = self.capabilities();
        let mut sql = format!(
            "REFERENCES {} ({})",
            self.quote(&reference.table),
            self.quote(&reference.column)
        );
        if let Some(action) = reference.on_delete {
            sql.push_str(&action_clause(self, "ON DELETE", action, caps.delete_actions, fk)?);
        }
        if let Some(action) = reference.on_update {
            sql.push_str(&action_clause(self, "ON UPDATE", action, caps.update_actions, fk)?);
        }
        Ok(sql)
    }

    // -- customization points ----------------------------------------------

    /// The keyword(s) between the table name and the column definition.
    fn add_column_clause(&self) -> &'static str {
        "ADD COLUMN"
    }

    /// Adds a column. `foreign_key` is the constraint on the new column, for
    /// dialects that can only declare it inline; others add it separately.
    fn add_column(
        &self,
        table: &str,
        column: &Column,
        _foreign_key: Option<&ForeignKey>,
        ctx: TypeContext,
    ) -> StatementResult {
        Ok(vec![alter(
            self,
            table,
            format!(
                "{} {}",
                self.add_column_clause(),
                self.column_definition(column, ctx)
            ),
        )])
    }

    /// Changes type, nullability, and/or default of an existing column.
    fn alter_column(
        &self,
        table: &str,
        before: &Column,
        after: &Column,
        change: ColumnChange,
        ctx: TypeContext,
    ) -> StatementResult {
        standard_alter(self, table, before, after, change, ctx)
    }

    fn retype_column(
        &self,
        table: &str,
        _before: &Column,
        after: &Column,
        ctx: TypeContext,
    ) -> StatementResult {
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

    fn set_nullability(&self, table: &str, column: &Column) -> StatementResult {
        let clause = if column.is_nullable() {
            "DROP NOT NULL"
        } else {
            "SET NOT NULL"
        };
        Ok(vec![alter(
            self,
            table,
            format!("ALTER COLUMN {} {clause}", self.quote(column.name())),
        )])
    }

    fn set_default(&self, table: &str, column: &str, value: &DefaultValue) -> StatementResult {
        Ok(vec![alter(
            self,
            table,
            format!(
                "ALTER COLUMN {} SET DEFAULT {}",
                self.quote(column),
                self.default_clause(value)
            ),
        )])
    }

    fn drop_default(&self, table: &str, column: &str) -> StatementResult {
        Ok(vec![alter(
            self,
            table,
            format!("ALTER COLUMN {} DROP DEFAULT", self.quote(column)),
        )])
    }

    fn drop_column(&self, table: &str, column: &Column) -> StatementResult {
        if !self.capabilities().drop_column {
            return Err(GenerateError::unsupported(
                self.kind(),
                "DROP COLUMN",
                format!("column {table}.{}", column.name()),
            ));
        }
        Ok(vec![alter(
            self,
            table,
            format!("DROP COLUMN {}", self.quote(column.name())),
        )])
    }

    fn add_primary_key(&self, table: &str, primary_key: &PrimaryKey) -> StatementResult {
        require_alter_constraints(self, "ADD PRIMARY KEY", &primary_key.name)?;
        Ok(vec![alter(
            self,
            table,
            format!(
                "ADD CONSTRAINT {} PRIMARY KEY ({})",
                self.object_name(&primary_key.name),
                column_list(self, &primary_key.columns)
            ),
        )])
    }

    fn drop_primary_key(&self, table: &str, primary_key: &PrimaryKey) -> StatementResult {
        require_alter_constraints(self, "DROP PRIMARY KEY", &primary_key.name)?;
        Ok(vec![drop_constraint(self, table, &primary_key.name)])
    }

    fn add_unique(&self, table: &str, unique: &UniqueConstraint) -> StatementResult {
        require_alter_constraints(self, "ADD UNIQUE", &unique.name)?;
        Ok(vec![alter(
            self,
            table,
            format!(
                "ADD CONSTRAINT {} UNIQUE ({})",
                self.object_name(&unique.name),
                column_list(self, &unique.columns)
            ),
        )])
    }

    fn drop_unique(&self, table: &str, unique: &UniqueConstraint) -> StatementResult {
        require_alter_constraints(self, "DROP UNIQUE", &unique.name)?;
        Ok(vec![drop_constraint(self, table, &unique.name)])
    }

    fn create_index(&self, table: &str, index: &Index) -> StatementResult {
        let mut sql = format!(
            "CREATE INDEX {} ON {} ({})",
            self.object_name(&index.name),
            self.quote(table),
            column_list(self, &index.columns)
        );
        if let Some(clause) = index
            .hints
            .tablespace(self.kind())
            .and_then(|ts| self.tablespace_clause(ts, HintTarget::Index))
        {
            sql.push(' ');
            sql.push_str(&clause);
        }
        Ok(vec![Statement::plain(sql)])
    }

    fn drop_index(&self, _table: &str, index: &Index) -> StatementResult {
        Ok(vec![Statement::plain(format!(
            "DROP INDEX {}",
            self.object_name(&index.name)
        ))])
    }

    fn add_foreign_key(&self, table: &str, foreign_key: &ForeignKey) -> StatementResult {
        require_alter_constraints(self, "ADD FOREIGN KEY", &foreign_key.name)?;
        Ok(vec![alter(
            self,
            table,
            format!(
                "ADD CONSTRAINT {} FOREIGN KEY ({}) {}",
                self.object_name(&foreign_key.name),
                self.quote(&foreign_key.column),
                self.references_clause(foreign_key)?
            ),
        )])
    }

    fn drop_foreign_key(&self, table: &str, foreign_key: &ForeignKey) -> StatementResult {
        require_alter_constraints(self, "DROP FOREIGN KEY", &foreign_key.name)?;
        Ok(vec![drop_constraint(self, table, &foreign_key.name)])
    }

    fn drop_trigger(&self, table: &Table) -> StatementResult {
        Ok(self.trigger().drop_statements(self, table))
    }

    fn drop_view(&self, view: &View) -> StatementResult {
        Ok(vec![Statement::plain(format!(
            "DROP VIEW {}",
            self.quote(view.name())
        ))])
    }

    fn drop_table(&self, table: &Table) -> StatementResult {
        Ok(vec![Statement::plain(format!(
            "DROP TABLE {}",
            self.quote(table.name())
        ))])
    }

    /// Statements placed before the first migration step.
    fn migration_prologue(&self, _plan: &MigrationPlan) -> Vec<Statement> {
        Vec::new()
    }

    /// Statements placed after the last migration step.
    fn migration_epilogue(&self, _plan: &MigrationPlan) -> Vec<Statement> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Shared building blocks
// ---------------------------------------------------------------------------

/// `ALTER TABLE <table> <clause>`.
pub(crate) fn alter<D: Dialect + ?Sized>(dialect: &D, table: &str, clause: impl Display) -> Statement {
    Statement::plain(format!("ALTER TABLE {} {clause}", dialect.quote(table)))
}

pub(crate) fn drop_constraint<D: Dialect + ?Sized>(dialect: &D, table: &str, name: &str) -> Statement {
    alter(
        dialect,
        table,
        format!("DROP CONSTRAINT {}", dialect.object_name(name)),
    )
}

pub(crate) fn column_list<D: Dialect + ?Sized>(dialect: &D, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| dialect.quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn action_clause<D: Dialect + ?Sized>(
    dialect: &D,
    clause: &str,
    action: ReferentialAction,
    supported: bool,
    foreign_key: &ForeignKey,
) -> Result<String, GenerateError> {
    if action.is_default() {
        Ok(String::new())
    } else if supported {
        Ok(format!(" {clause} {}", action.as_sql()))
    } else {
        Err(GenerateError::unsupported(
            dialect.kind(),
            format!("{clause} {}", action.as_sql()),
            format!("foreign key {}", foreign_key.name),
        ))
    }
}

fn require_alter_constraints<D: Dialect + ?Sized>(
    dialect: &D,
    operation: &str,
    constraint: &str,
) -> Result<(), GenerateError> {
    if dialect.capabilities().alter_constraints {
        Ok(())
    } else {
        Err(GenerateError::unsupported(
            dialect.kind(),
            format!("{operation} on an existing table"),
            format!("constraint {constraint}"),
        ))
    }
}

/// Retype, then nullability, then default, each through its hook.
pub(crate) fn standard_alter<D: Dialect + ?Sized>(
    dialect: &D,
    table: &str,
    before: &Column,
    after: &Column,
    change: ColumnChange,
    ctx: TypeContext,
) -> StatementResult {
    let mut statements = Vec::new();
    if change.data_type {
        statements.extend(dialect.retype_column(table, before, after, ctx)?);
    }
    if change.nullability {
        statements.extend(dialect.set_nullability(table, after)?);
    }
    if change.default {
        statements.extend(default_change(dialect, table, after)?);
    }
    Ok(statements)
}

/// Sets the column's new default, or drops the old one.
pub(crate) fn default_change<D: Dialect + ?Sized>(
    dialect: &D,
    table: &str,
    after: &Column,
) -> StatementResult {
    match after.default_value() {
        Some(value) => dialect.set_default(table, after.name(), value),
        None => dialect.drop_default(table, after.name()),
    }
}

/// `name[(p[, s])]`, filling in `default_precision` when only a scale is given.
pub(crate) fn numeric(
    name: &str,
    precision: Option<u32>,
    scale: Option<u32>,
    default_precision: Option<u32>,
) -> String {
    match (precision.or(default_precision), scale) {
        (Some(p), Some(s)) => format!("{name}({p}, {s})"),
        (Some(p), None) => format!("{name}({p})"),
        (None, _) => name.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Expression rendering
// ---------------------------------------------------------------------------

/// Renders expressions and DML in a dialect's syntax.
///
/// `OLD.col` references become the dialect's old-row reference when one is
/// set; unqualified columns can be qualified with a fixed table.
pub struct DialectStyle<'a, D: Dialect + ?Sized> {
    dialect: &'a D,
    old_row: Option<&'a str>,
    default_qualifier: Option<&'a str>,
}

impl<'a, D: Dialect + ?Sized> DialectStyle<'a, D> {
    pub fn new(dialect: &'a D) -> Self {
        Self {
            dialect,
            old_row: None,
            default_qualifier: None,
        }
    }

    pub fn with_old_row(mut self, old_row: &'a str) -> Self {
        self.old_row = Some(old_row);
        self
    }

    pub fn qualify_with(mut self, table: &'a str) -> Self {
        self.default_qualifier = Some(table);
        self
    }
}

impl<D: Dialect + ?Sized> SqlStyle for DialectStyle<'_, D> {
    fn identifier(&self, name: &str) -> String {
        self.dialect.quote(name)
    }

    fn column(&self, qualifier: Option<&str>, name: &str) -> String {
        let column = self.dialect.quote(name);
        match (qualifier, self.old_row) {
            (Some(OLD_ROW), Some(old_row)) => format!("{old_row}.{column}"),
            (Some(q), _) => format!("{}.{column}", self.dialect.quote(q)),
            (None, _) => match self.default_qualifier {
                Some(table) => format!("{}.{column}", self.dialect.quote(table)),
                None => column,
            },
        }
    }

    fn concat(&self, left: String, right: String) -> String {
        self.dialect.concat(left, right)
    }

    fn literal(&self, value: &Literal) -> String {
        self.dialect.literal(value)
    }
}

#[cfg(test)]
mod tests {
    use meta_forge_core::types::{render, BinaryOp, Expr, Reference};

    use super::*;

    fn fk(reference: Reference) -> ForeignKey {
        ForeignKey::new("FK_Orders_Customer", "CustomerId", reference)
    }

    #[test]
    fn every_kind_has_a_dialect() {
        for kind in DialectKind::ALL {
            assert_eq!(dialect_for(kind).kind(), kind);
        }
    }

    #[test]
    fn default_actions_are_omitted() {
        let dialect = SybaseDialect;
        let clause = dialect
            .references_clause(&fk(
                Reference::new("Customer", "Id").on_delete(ReferentialAction::NoAction),
            ))
            .unwrap();
        assert_eq!(clause, "REFERENCES Customer (Id)");
    }

    #[test]
    fn unsupported_actions_fail() {
        let err = SybaseDialect
            .references_clause(&fk(
                Reference::new("Customer", "Id").on_delete(ReferentialAction::Cascade),
            ))
            .unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedOperation { .. }));
        assert!(err.to_string().contains("ON DELETE CASCADE"));
    }

    #[test]
    fn supported_actions_are_written() {
        let clause = PostgresDialect
            .references_clause(&fk(Reference::new("Customer", "Id")
                .on_delete(ReferentialAction::SetNull)
                .on_update(ReferentialAction::Cascade)))
            .unwrap();
        assert_eq!(
            clause,
            "REFERENCES Customer (Id) ON DELETE SET NULL ON UPDATE CASCADE"
        );
    }

    #[test]
    fn style_maps_old_row_and_concat() {
        let expr = Expr::binary(
            BinaryOp::Concat,
            Expr::qualified("OLD", "Name"),
            Expr::column("Suffix"),
        );
        let dialect = SqlServerDialect;
        let style = DialectStyle::new(&dialect)
            .with_old_row("deleted")
            .qualify_with("Audit");
        assert_eq!(render(&expr, &style), "deleted.Name + Audit.Suffix");
    }

    #[test]
    fn style_quotes_reserved_qualifiers() {
        let dialect = OracleDialect;
        let style = DialectStyle::new(&dialect);
        assert_eq!(
            render(&Expr::qualified("Order", "Level"), &style),
            "\"ORDER\".\"LEVEL\""
        );
    }

    #[test]
    fn numeric_spelling() {
        assert_eq!(numeric("NUMERIC", None, None, Some(38)), "NUMERIC(38)");
        assert_eq!(numeric("NUMBER", None, None, None), "NUMBER");
        assert_eq!(numeric("DECIMAL", Some(12), Some(2), Some(31)), "DECIMAL(12, 2)");
        assert_eq!(numeric("NUMBER", None, Some(2), None), "NUMBER");
    }
}
