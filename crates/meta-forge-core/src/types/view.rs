use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

use super::expression::{render, Expr, SqlStyle};
use super::hint::Hints;
use super::identifier::validate_identifier;

/// A table in a `FROM` or `JOIN` clause, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
        }
    }

    pub fn aliased(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: Some(alias.into()),
        }
    }

    /// The name other clauses use to qualify this table's columns.
    pub fn binding(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    Inner,
    Left,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "JOIN"),
            Self::Left => write!(f, "LEFT JOIN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    pub on: Expr,
}

/// One `SELECT ... FROM ... [JOIN ...] [WHERE ...]` block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Select {
    pub items: Vec<Expr>,
    pub from: TableRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<Join>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expr>,
}

impl Select {
    pub fn new(items: Vec<Expr>, from: TableRef) -> Self {
        Self {
            items,
            from,
            joins: Vec::new(),
            filter: None,
        }
    }

    pub fn join(mut self, kind: JoinKind, table: TableRef, on: Expr) -> Self {
        self.joins.push(Join { kind, table, on });
        self
    }

    pub fn filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// The `FROM` table followed by every joined table.
    pub fn tables(&self) -> impl Iterator<Item = &TableRef> {
        std::iter::once(&self.from).chain(self.joins.iter().map(|j| &j.table))
    }

    /// Every expression in the block: items, join conditions, then the filter.
    pub fn expressions(&self) -> impl Iterator<Item = &Expr> {
        self.items
            .iter()
            .chain(self.joins.iter().map(|j| &j.on))
            .chain(self.filter.iter())
    }

    /// Renders the block on one line: `SELECT ... FROM ... [JOIN ...] [WHERE ...]`.
    pub fn render(&self, style: &dyn SqlStyle) -> String {
        let table_ref = |t: &TableRef| match &t.alias {
            Some(alias) => format!("{} {}", style.identifier(&t.table), style.identifier(alias)),
            None => style.identifier(&t.table),
        };
        let items: Vec<String> = self.items.iter().map(|e| render(e, style)).collect();
        let mut out = format!("SELECT {} FROM {}", items.join(", "), table_ref(&self.from));
        for join in &self.joins {
            out.push_str(&format!(
                " {} {} ON {}",
                join.kind,
                table_ref(&join.table),
                render(&join.on, style)
            ));
        }
        if let Some(filter) = &self.filter {
            out.push_str(" WHERE ");
            out.push_str(&render(filter, style));
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnionKind {
    Distinct,
    All,
}

impl fmt::Display for UnionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distinct => write!(f, "UNION"),
            Self::All => write!(f, "UNION ALL"),
        }
    }
}

/// A select followed by zero or more `UNION [ALL]` selects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Query {
    first: Select,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unions: Vec<(UnionKind, Select)>,
}

impl Query {
    pub fn first(&self) -> &Select {
        &self.first
    }

    pub fn unions(&self) -> &[(UnionKind, Select)] {
        &self.unions
    }

    pub fn selects(&self) -> impl Iterator<Item = &Select> {
        std::iter::once(&self.first).chain(self.unions.iter().map(|(_, s)| s))
    }
}

/// A frozen view definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct View {
    name: String,
    columns: Vec<String>,
    query: Query,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Hints::is_empty")]
    hints: Hints,
}

impl View {
    pub fn builder(name: impl Into<String>) -> ViewBuilder {
        ViewBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn selects(&self) -> impl Iterator<Item = &Select> {
        self.query.selects()
    }

    /// Distinct table names read by the view, in first-use order.
    pub fn referenced_tables(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.selects()
            .flat_map(|s| s.tables())
            .map(|t| t.table.as_str())
            .filter(|t| seen.insert(*t))
            .collect()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn hints(&self) -> &Hints {
        &self.hints
    }
}

#[derive(Debug, Clone)]
pub struct ViewBuilder {
    name: String,
    columns: Vec<String>,
    selects: Vec<(Option<UnionKind>, Select)>,
    comment: Option<String>,
    hints: Hints,
}

impl ViewBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            selects: Vec::new(),
            comment: None,
            hints: Hints::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn set_columns(&mut self, columns: Vec<String>) {
        self.columns = columns;
    }

    /// Appends a select; the first one ignores `union`.
    pub fn add_select(&mut self, union: Option<UnionKind>, select: Select) {
        self.selects.push((union, select));
    }

    pub fn select(mut self, select: Select) -> Self {
        self.add_select(None, select);
        self
    }

    pub fn union(mut self, kind: UnionKind, select: Select) -> Self {
        self.add_select(Some(kind), select);
        self
    }

    pub fn set_comment(&mut self, comment: String) {
        self.comment = Some(comment);
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.set_comment(comment.into());
        self
    }

    pub fn set_hints(&mut self, hints: Hints) {
        self.hints = hints;
    }

    pub fn hints(mut self, hints: Hints) -> Self {
        self.set_hints(hints);
        self
    }

    pub fn build(self) -> Result<View, SchemaError> {
        validate_identifier(&self.name)?;
        let view = self.name;
        if self.columns.is_empty() || self.selects.is_empty() {
            return Err(SchemaError::EmptyView(view));
        }

        let mut names = HashSet::new();
        for c in &self.columns {
            validate_identifier(c)?;
            if !names.insert(c.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table: view,
                    column: c.clone(),
                });
            }
        }

        for (_, select) in &self.selects {
            if select.items.len() != self.columns.len() {
                return Err(SchemaError::ViewArity {
                    view,
                    expected: self.columns.len(),
                    found: select.items.len(),
                });
            }
        }

        let mut selects = self.selects.into_iter();
        let Some((_, first)) = selects.next() else {
            return Err(SchemaError::EmptyView(view));
        };
        let unions = selects
            .map(|(kind, s)| (kind.unwrap_or(UnionKind::Distinct), s))
            .collect();

        Ok(View {
            name: view,
            columns: self.columns,
            query: Query { first, unions },
            comment: self.comment,
            hints: self.hints,
        })
    }
}
