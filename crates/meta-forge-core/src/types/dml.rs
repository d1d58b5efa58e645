use serde::Serialize;

use crate::error::SchemaError;

use super::expression::{render, Expr, SqlStyle};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Insert {
    table: String,
    columns: Vec<String>,
    values: Vec<Expr>,
}

impl Insert {
    /// Creates an insert, validating that column and value counts agree.
    pub fn new(
        table: impl Into<String>,
        columns: Vec<String>,
        values: Vec<Expr>,
    ) -> Result<Self, SchemaError> {
        let table = table.into();
        if columns.len() != values.len() {
            return Err(SchemaError::InsertArity {
                table,
                columns: columns.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            table,
            columns,
            values,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Expr] {
        &self.values
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Update {
    table: String,
    assignments: Vec<(String, Expr)>,
    filter: Option<Expr>,
}

impl Update {
    pub fn new(table: impl Into<String>, assignments: Vec<(String, Expr)>, filter: Option<Expr>) -> Self {
        Self {
            table: table.into(),
            assignments,
            filter,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn assignments(&self) -> &[(String, Expr)] {
        &self.assignments
    }

    pub fn filter(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Delete {
    table: String,
    filter: Option<Expr>,
}

impl Delete {
    pub fn new(table: impl Into<String>, filter: Option<Expr>) -> Self {
        Self {
            table: table.into(),
            filter,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filter(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }
}

/// A data-manipulation statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "dml", rename_all = "snake_case")]
pub enum Dml {
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl Dml {
    /// The table this statement writes to.
    pub fn table(&self) -> &str {
        match self {
            Self::Insert(i) => i.table(),
            Self::Update(u) => u.table(),
            Self::Delete(d) => d.table(),
        }
    }

    /// Every expression in the statement, in source order.
    pub fn expressions(&self) -> Vec<&Expr> {
        match self {
            Self::Insert(i) => i.values().iter().collect(),
            Self::Update(u) => u
                .assignments()
                .iter()
                .map(|(_, e)| e)
                .chain(u.filter())
                .collect(),
            Self::Delete(d) => d.filter().into_iter().collect(),
        }
    }

    /// Columns of the target table named directly by the statement.
    pub fn target_columns(&self) -> Vec<&str> {
        match self {
            Self::Insert(i) => i.columns().iter().map(String::as_str).collect(),
            Self::Update(u) => u.assignments().iter().map(|(c, _)| c.as_str()).collect(),
            Self::Delete(_) => Vec::new(),
        }
    }

    /// Renders the statement on one line, without a terminator.
    pub fn render(&self, style: &dyn SqlStyle) -> String {
        match self {
            Self::Insert(i) => {
                let columns: Vec<String> = i.columns().iter().map(|c| style.identifier(c)).collect();
                let values: Vec<String> = i.values().iter().map(|v| render(v, style)).collect();
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    style.identifier(i.table()),
                    columns.join(", "),
                    values.join(", ")
                )
            }
            Self::Update(u) => {
                let assignments: Vec<String> = u
                    .assignments()
                    .iter()
                    .map(|(c, e)| format!("{} = {}", style.identifier(c), render(e, style)))
                    .collect();
                let mut out = format!(
                    "UPDATE {} SET {}",
                    style.identifier(u.table()),
                    assignments.join(", ")
                );
                if let Some(filter) = u.filter() {
                    out.push_str(" WHERE ");
                    out.push_str(&render(filter, style));
                }
                out
            }
            Self::Delete(d) => {
                let mut out = format!("DELETE FROM {}", style.identifier(d.table()));
                if let Some(filter) = d.filter() {
                    out.push_str(" WHERE ");
                    out.push_str(&render(filter, style));
                }
                out
            }
        }
    }
}

/// A named DML template declared with `CREATE STATEMENT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DmlStatement {
    name: String,
    body: Dml,
}

impl DmlStatement {
    pub fn new(name: impl Into<String>, body: Dml) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &Dml {
        &self.body
    }
}
