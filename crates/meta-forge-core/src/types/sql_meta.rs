use std::collections::HashSet;

use serde::Serialize;

use crate::error::SchemaError;

use super::column::Column;
use super::constraint::Reference;
use super::dml::DmlStatement;
use super::table::Table;
use super::view::View;

/// The root of a parsed schema: tables, views, and statement templates in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SqlMeta {
    tables: Vec<Table>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    views: Vec<View>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    statements: Vec<DmlStatement>,
}

impl SqlMeta {
    pub fn builder() -> SqlMetaBuilder {
        SqlMetaBuilder::default()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn statements(&self) -> &[DmlStatement] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.views.is_empty() && self.statements.is_empty()
    }

    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    /// Position of a table in declaration order.
    pub fn table_position(&self, name: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.name() == name)
    }

    pub fn find_view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name() == name)
    }

    pub fn find_statement(&self, name: &str) -> Option<&DmlStatement> {
        self.statements.iter().find(|s| s.name() == name)
    }

    pub fn find_column(&self, table: &str, column: &str) -> Option<&Column> {
        self.find_table(table)?.find_column(column)
    }

    /// Resolves a foreign-key target. `from` names the referring artifact
    /// and appears in the error.
    pub fn resolve_reference(
        &self,
        from: &str,
        reference: &Reference,
    ) -> Result<(&Table, &Column), SchemaError> {
        let table = self
            .find_table(&reference.table)
            .ok_or_else(|| SchemaError::UnresolvedTable {
                from: from.to_string(),
                table: reference.table.clone(),
            })?;
        let column =
            table
                .find_column(&reference.column)
                .ok_or_else(|| SchemaError::UnresolvedColumn {
                    from: from.to_string(),
                    table: reference.table.clone(),
                    column: reference.column.clone(),
                })?;
        Ok((table, column))
    }

    /// Whether any foreign key in the schema targets `table.column`.
    pub fn is_referenced(&self, table: &str, column: &str) -> bool {
        self.tables.iter().any(|t| {
            t.foreign_keys()
                .iter()
                .any(|fk| fk.reference.table == table && fk.reference.column == column)
        })
    }
}

/// Collects artifacts in declaration order and checks id uniqueness on `build`.
#[derive(Debug, Clone, Default)]
pub struct SqlMetaBuilder {
    tables: Vec<Table>,
    views: Vec<View>,
    statements: Vec<DmlStatement>,
}

impl SqlMetaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: Table) {
        self.tables.push(table);
    }

    pub fn add_view(&mut self, view: View) {
        self.views.push(view);
    }

    pub fn add_statement(&mut self, statement: DmlStatement) {
        self.statements.push(statement);
    }

    pub fn table(mut self, table: Table) -> Self {
        self.add_table(table);
        self
    }

    pub fn view(mut self, view: View) -> Self {
        self.add_view(view);
        self
    }

    pub fn statement(mut self, statement: DmlStatement) -> Self {
        self.add_statement(statement);
        self
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name() == name)
    }

    pub fn contains_view(&self, name: &str) -> bool {
        self.views.iter().any(|v| v.name() == name)
    }

    pub fn contains_statement(&self, name: &str) -> bool {
        self.statements.iter().any(|s| s.name() == name)
    }

    pub fn build(self) -> Result<SqlMeta, SchemaError> {
        let mut seen = HashSet::new();
        for t in &self.tables {
            if !seen.insert(t.name()) {
                return Err(SchemaError::DuplicateTable(t.name().to_string()));
            }
        }
        seen.clear();
        for v in &self.views {
            if !seen.insert(v.name()) {
                return Err(SchemaError::DuplicateView(v.name().to_string()));
            }
        }
        seen.clear();
        for s in &self.statements {
            if !seen.insert(s.name()) {
                return Err(SchemaError::DuplicateStatement(s.name().to_string()));
            }
        }
        Ok(SqlMeta {
            tables: self.tables,
            views: self.views,
            statements: self.statements,
        })
    }
}
