//! Full `CREATE` script generation.

use meta_forge_core::types::{
    Column, Dml, DialectKind, Expr, HintTarget, SqlMeta, Table, View,
};

use crate::dialect::{
    column_list, dialect_for, CommentStyle, Dialect, DialectStyle, StatementResult, TypeContext,
};
use crate::error::GenerateError;
use crate::resolve::resolve;
use crate::script::{Script, Statement};

const INDENT: &str = "    ";

/// Generates SQL for one target dialect.
///
/// The generator owns its dialect strategy and holds no other state, so a
/// single instance can render any number of schemas.
pub struct SqlGenerator {
    dialect: Box<dyn Dialect>,
}

impl SqlGenerator {
    pub fn new(kind: DialectKind) -> Self {
        Self::with_dialect(dialect_for(kind))
    }

    /// Wraps a custom dialect strategy.
    pub fn with_dialect(dialect: Box<dyn Dialect>) -> Self {
        Self { dialect }
    }

    pub fn kind(&self) -> DialectKind {
        self.dialect.kind()
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Renders a script with the dialect's statement delimiters.
    pub fn render(&self, script: &Script) -> String {
        script.render(&self.dialect.delimiter())
    }

    /// The complete `CREATE` script for `meta` as rendered text.
    pub fn generate_full_script(&self, meta: &SqlMeta) -> Result<String, GenerateError> {
        Ok(self.render(&self.full_script(meta)?))
    }

    /// The complete `CREATE` script for `meta`, in fixed phase order: tables,
    /// primary keys, foreign keys, unique constraints, indexes, comments,
    /// views, triggers, then seed statements.
    pub fn full_script(&self, meta: &SqlMeta) -> Result<Script, GenerateError> {
        resolve(meta)?;
        let dialect = self.dialect();
        let inline = dialect.capabilities().inline_foreign_keys;
        let mut script = Script::new();
        script.push(Statement::comment(format!(
            "Generated by meta-forge for {}",
            dialect.name()
        )));

        for table in meta.tables() {
            script.extend(self.script_comment(table));
            script.push(self.create_table(meta, table)?);
        }
        tracing::debug!(dialect = %self.kind(), tables = meta.tables().len(), "tables emitted");

        if !inline {
            for table in meta.tables() {
                script.extend(dialect.add_primary_key(table.name(), table.primary_key())?);
            }
            for table in meta.tables() {
                for fk in table.foreign_keys() {
                    script.extend(dialect.add_foreign_key(table.name(), &fk)?);
                }
            }
            for table in meta.tables() {
                for unique in table.unique_constraints() {
                    script.extend(dialect.add_unique(table.name(), unique)?);
                }
            }
        }
        for table in meta.tables() {
            for index in table.indexes() {
                script.extend(dialect.create_index(table.name(), index)?);
            }
        }
        tracing::debug!(dialect = %self.kind(), "constraints and indexes emitted");

        for table in meta.tables() {
            script.extend(self.comments(table));
        }

        for view in meta.views() {
            script.extend(self.create_view(view)?);
        }
        tracing::debug!(dialect = %self.kind(), views = meta.views().len(), "views emitted");

        for table in meta.tables() {
            script.extend(dialect.trigger().create_statements(dialect, table)?);
        }

        for statement in meta.statements() {
            if has_parameters(statement.body()) {
                tracing::trace!(statement = statement.name(), "skipping parameterised template");
                continue;
            }
            script.push(self.dml(statement.body()));
        }
        tracing::debug!(
            dialect = %self.kind(),
            statements = script.executable_len(),
            "full script generated"
        );
        Ok(script)
    }

    // -- building blocks shared with migrations -----------------------------

    /// `CREATE TABLE` with column definitions. Dialects that declare keys
    /// inline also get the primary key, unique constraints, and foreign keys.
    pub(crate) fn create_table(&self, meta: &SqlMeta, table: &Table) -> Result<Statement, GenerateError> {
        let dialect = self.dialect();
        let mut lines: Vec<String> = table
            .columns()
            .iter()
            .map(|column| {
                dialect.column_definition(column, TypeContext::for_column(meta, table, column.name()))
            })
            .collect();
        if dialect.capabilities().inline_foreign_keys {
            let pk = table.primary_key();
            lines.push(format!(
                "CONSTRAINT {} PRIMARY KEY ({})",
                dialect.object_name(&pk.name),
                column_list(dialect, &pk.columns)
            ));
            for unique in table.unique_constraints() {
                lines.push(format!(
                    "CONSTRAINT {} UNIQUE ({})",
                    dialect.object_name(&unique.name),
                    column_list(dialect, &unique.columns)
                ));
            }
            for fk in table.foreign_keys() {
                lines.push(format!(
                    "CONSTRAINT {} FOREIGN KEY ({}) {}",
                    dialect.object_name(&fk.name),
                    dialect.quote(&fk.column),
                    dialect.references_clause(&fk)?
                ));
            }
        }

        let mut sql = format!(
            "CREATE TABLE {} (\n{INDENT}{}\n)",
            dialect.quote(table.name()),
            lines.join(&format!(",\n{INDENT}"))
        );
        let hints = table.hints();
        if let Some(clause) = hints
            .tablespace(self.kind())
            .and_then(|ts| dialect.tablespace_clause(ts, HintTarget::Table))
        {
            sql.push(' ');
            sql.push_str(&clause);
        }
        if dialect.comment_style() == CommentStyle::Inline {
            if let Some(comment) = table.comment() {
                sql.push_str(" COMMENT=");
                sql.push_str(&dialect.string_literal(comment));
            }
        }
        if let Some(options) = hints.options(self.kind()) {
            sql.push(' ');
            sql.push_str(options);
        }
        Ok(Statement::plain(sql))
    }

    /// Primary key, unique constraints, and indexes of a freshly created
    /// table. Inline dialects only need the indexes.
    pub(crate) fn table_keys(&self, table: &Table) -> StatementResult {
        let dialect = self.dialect();
        let mut statements = Vec::new();
        if !dialect.capabilities().inline_foreign_keys {
            statements.extend(dialect.add_primary_key(table.name(), table.primary_key())?);
            for unique in table.unique_constraints() {
                statements.extend(dialect.add_unique(table.name(), unique)?);
            }
        }
        for index in table.indexes() {
            statements.extend(dialect.create_index(table.name(), index)?);
        }
        Ok(statements)
    }

    /// `--` lines describing a table, for dialects without comment storage.
    pub(crate) fn script_comment(&self, table: &Table) -> Option<Statement> {
        if self.dialect.comment_style() != CommentStyle::ScriptOnly {
            return None;
        }
        let mut lines = Vec::new();
        if let Some(comment) = table.comment() {
            lines.push(format!("{}: {comment}", table.name()));
        }
        for column in table.columns() {
            if let Some(comment) = column.comment() {
                lines.push(format!("{}.{}: {comment}", table.name(), column.name()));
            }
        }
        (!lines.is_empty()).then(|| Statement::comment(lines.join("\n")))
    }

    /// Comment statements for a table and its columns.
    pub(crate) fn comments(&self, table: &Table) -> Vec<Statement> {
        let dialect = self.dialect();
        let mut statements = Vec::new();
        if let Some(comment) = table.comment() {
            match dialect.comment_style() {
                CommentStyle::CommentOn => statements.push(Statement::plain(format!(
                    "COMMENT ON TABLE {} IS {}",
                    dialect.quote(table.name()),
                    dialect.string_literal(comment)
                ))),
                CommentStyle::ExtendedProperty => {
                    statements.push(self.extended_property(comment, table.name(), None))
                }
                CommentStyle::Inline | CommentStyle::ScriptOnly => {}
            }
        }
        statements.extend(
            table
                .columns()
                .iter()
                .filter_map(|column| self.stored_column_comment(table.name(), column)),
        );
        statements
    }

    /// The comment of a column added by a migration.
    pub(crate) fn column_comment(&self, table: &str, column: &Column) -> Option<Statement> {
        match self.dialect.comment_style() {
            CommentStyle::ScriptOnly => column
                .comment()
                .map(|comment| Statement::comment(format!("{table}.{}: {comment}", column.name()))),
            _ => self.stored_column_comment(table, column),
        }
    }

    fn stored_column_comment(&self, table: &str, column: &Column) -> Option<Statement> {
        let dialect = self.dialect();
        let comment = column.comment()?;
        match dialect.comment_style() {
            CommentStyle::CommentOn => Some(Statement::plain(format!(
                "COMMENT ON COLUMN {}.{} IS {}",
                dialect.quote(table),
                dialect.quote(column.name()),
                dialect.string_literal(comment)
            ))),
            CommentStyle::ExtendedProperty => {
                Some(self.extended_property(comment, table, Some(column.name())))
            }
            CommentStyle::Inline | CommentStyle::ScriptOnly => None,
        }
    }

    fn extended_property(&self, comment: &str, table: &str, column: Option<&str>) -> Statement {
        let dialect = self.dialect();
        let mut sql = format!(
            "EXEC sp_addextendedproperty 'MS_Description', {}, 'SCHEMA', 'dbo', 'TABLE', {}",
            dialect.string_literal(comment),
            dialect.string_literal(table)
        );
        if let Some(column) = column {
            sql.push_str(", 'COLUMN', ");
            sql.push_str(&dialect.string_literal(column));
        }
        Statement::plain(sql)
    }

    /// `CREATE VIEW v (cols) AS` followed by the selects, one per line.
    pub(crate) fn create_view(&self, view: &View) -> StatementResult {
        let dialect = self.dialect();
        let style = DialectStyle::new(dialect);
        let mut statements = Vec::new();
        if let Some(comment) = view.comment() {
            statements.push(Statement::comment(format!("{}: {comment}", view.name())));
        }
        let columns: Vec<String> = view.columns().iter().map(|c| dialect.quote(c)).collect();
        let mut sql = format!(
            "CREATE VIEW {} ({}) AS\n{}",
            dialect.quote(view.name()),
            columns.join(", "),
            view.query().first().render(&style)
        );
        for (kind, select) in view.query().unions() {
            sql.push_str(&format!("\n{kind}\n{}", select.render(&style)));
        }
        if let Some(options) = view.hints().options(self.kind()) {
            sql.push('\n');
            sql.push_str(options);
        }
        statements.push(Statement::plain(sql));
        Ok(statements)
    }

    /// A DML statement in dialect syntax.
    pub(crate) fn dml(&self, dml: &Dml) -> Statement {
        Statement::plain(dml.render(&DialectStyle::new(self.dialect())))
    }
}

/// Whether a DML statement contains `:name` placeholders.
pub(crate) fn has_parameters(dml: &Dml) -> bool {
    dml.expressions().into_iter().any(|expr| {
        let mut found = false;
        expr.walk(&mut |e| found |= matches!(e, Expr::Parameter { .. }));
        found
    })
}
