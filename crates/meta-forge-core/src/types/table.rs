use std::collections::HashSet;

use serde::Serialize;

use crate::error::SchemaError;

use super::column::Column;
use super::constraint::{
    foreign_key_name, primary_key_name, unique_name, ForeignKey, Index, PrimaryKey, Reference,
    UniqueConstraint,
};
use super::dml::Dml;
use super::hint::Hints;
use super::identifier::validate_identifier;

/// A frozen table definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    primary_key: PrimaryKey,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unique_constraints: Vec<UniqueConstraint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    indexes: Vec<Index>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    foreign_keys: Vec<ForeignKey>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    on_delete: Vec<Dml>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Hints::is_empty")]
    hints: Hints,
}

impl Table {
    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }

    pub fn unique_constraints(&self) -> &[UniqueConstraint] {
        &self.unique_constraints
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Foreign keys declared with `FOREIGN KEY (...)` in the table body.
    pub fn declared_foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Every foreign key of the table: column `REFERENCES` shorthands in
    /// column order, then declared foreign keys.
    pub fn foreign_keys(&self) -> Vec<ForeignKey> {
        self.columns
            .iter()
            .filter_map(|c| {
                c.reference().map(|r| {
                    ForeignKey::new(foreign_key_name(&self.name, c.name()), c.name(), r.clone())
                })
            })
            .chain(self.foreign_keys.iter().cloned())
            .collect()
    }

    /// DML run for each deleted row (materialised as a trigger).
    pub fn on_delete(&self) -> &[Dml] {
        &self.on_delete
    }

    pub fn has_trigger(&self) -> bool {
        !self.on_delete.is_empty()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn hints(&self) -> &Hints {
        &self.hints
    }

    /// Names of the keys, indexes, and foreign keys that include `column`.
    pub fn constraints_touching(&self, column: &str) -> Vec<String> {
        let mut names = Vec::new();
        if self.primary_key.columns.iter().any(|c| c == column) {
            names.push(self.primary_key.name.clone());
        }
        for uq in &self.unique_constraints {
            if uq.columns.iter().any(|c| c == column) {
                names.push(uq.name.clone());
            }
        }
        for ix in &self.indexes {
            if ix.columns.iter().any(|c| c == column) {
                names.push(ix.name.clone());
            }
        }
        for fk in self.foreign_keys() {
            if fk.column == column {
                names.push(fk.name);
            }
        }
        names
    }

    /// Whether `column` takes part in any key, index, or foreign key of this table.
    pub fn is_key_column(&self, column: &str) -> bool {
        !self.constraints_touching(column).is_empty()
    }
}

/// Mutable table under construction.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    name: String,
    columns: Vec<Column>,
    primary_keys: Vec<PrimaryKey>,
    unique_constraints: Vec<UniqueConstraint>,
    indexes: Vec<Index>,
    foreign_keys: Vec<ForeignKey>,
    on_delete: Option<Vec<Dml>>,
    comment: Option<String>,
    hints: Hints,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_keys: Vec::new(),
            unique_constraints: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            on_delete: None,
            comment: None,
            hints: Hints::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(mut self, column: Column) -> Self {
        self.add_column(column);
        self
    }

    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Declares the primary key; `None` uses the `PK_<table>` name.
    pub fn add_primary_key(&mut self, name: Option<String>, columns: Vec<String>) {
        let name = name.unwrap_or_else(|| primary_key_name(&self.name));
        self.primary_keys.push(PrimaryKey { name, columns });
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.add_primary_key(None, columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Declares a unique constraint; `None` uses the `UQ_<table>_<columns>` name.
    pub fn add_unique(&mut self, name: Option<String>, columns: Vec<String>) {
        let name = name.unwrap_or_else(|| unique_name(&self.name, &columns));
        self.unique_constraints.push(UniqueConstraint { name, columns });
    }

    pub fn unique(mut self, columns: &[&str]) -> Self {
        self.add_unique(None, columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn add_index(&mut self, index: Index) {
        self.indexes.push(index);
    }

    pub fn index(mut self, name: &str, columns: &[&str]) -> Self {
        self.add_index(Index {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            hints: Hints::default(),
        });
        self
    }

    /// Declares a foreign key; `None` uses the `FK_<table>_<column>` name.
    pub fn add_foreign_key(&mut self, name: Option<String>, column: String, reference: Reference) {
        let name = name.unwrap_or_else(|| foreign_key_name(&self.name, &column));
        self.foreign_keys.push(ForeignKey::new(name, column, reference));
    }

    pub fn foreign_key(mut self, column: &str, reference: Reference) -> Self {
        self.add_foreign_key(None, column.to_string(), reference);
        self
    }

    pub fn set_on_delete(&mut self, statements: Vec<Dml>) {
        self.on_delete = Some(statements);
    }

    pub fn on_delete(mut self, statements: Vec<Dml>) -> Self {
        self.set_on_delete(statements);
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

    /// Freezes the table, validating:
    /// - a valid name and at least one column, all uniquely named
    /// - exactly one primary key
    /// - every key, index, and foreign-key column exists
    /// - constraint and index names are unique within the table
    /// - an `ON DELETE` block, if present, is non-empty
    pub fn build(self) -> Result<Table, SchemaError> {
        validate_identifier(&self.name)?;
        let table = self.name;

        if self.columns.is_empty() {
            return Err(SchemaError::EmptyTable(table));
        }

        let mut column_names = HashSet::with_capacity(self.columns.len());
        for c in &self.columns {
            if !column_names.insert(c.name()) {
                return Err(SchemaError::DuplicateColumn {
                    table,
                    column: c.name().to_string(),
                });
            }
        }

        let mut primary_keys = self.primary_keys.into_iter();
        let primary_key = match (primary_keys.next(), primary_keys.next()) {
            (Some(pk), None) => pk,
            (None, _) => return Err(SchemaError::MissingPrimaryKey(table)),
            (Some(_), Some(_)) => return Err(SchemaError::MultiplePrimaryKeys(table)),
        };

        let check_columns = |name: &str, columns: &[String], context: &str| {
            if columns.is_empty() {
                return Err(SchemaError::EmptyColumnList {
                    table: table.clone(),
                    name: name.to_string(),
                });
            }
            for c in columns {
                if !column_names.contains(c.as_str()) {
                    return Err(SchemaError::UnknownColumn {
                        table: table.clone(),
                        column: c.clone(),
                        context: format!("{context} {name}"),
                    });
                }
            }
            Ok(())
        };

        check_columns(&primary_key.name, &primary_key.columns, "primary key")?;
        for uq in &self.unique_constraints {
            check_columns(&uq.name, &uq.columns, "unique constraint")?;
        }
        for ix in &self.indexes {
            check_columns(&ix.name, &ix.columns, "index")?;
        }
        for fk in &self.foreign_keys {
            check_columns(&fk.name, std::slice::from_ref(&fk.column), "foreign key")?;
        }

        let mut names = HashSet::new();
        let shorthand_fks = self
            .columns
            .iter()
            .filter(|c| c.reference().is_some())
            .map(|c| foreign_key_name(&table, c.name()));
        let all_names = std::iter::once(primary_key.name.clone())
            .chain(self.unique_constraints.iter().map(|u| u.name.clone()))
            .chain(self.indexes.iter().map(|i| i.name.clone()))
            .chain(self.foreign_keys.iter().map(|f| f.name.clone()))
            .chain(shorthand_fks);
        for name in all_names {
            validate_identifier(&name)?;
            if !names.insert(name.clone()) {
                return Err(SchemaError::DuplicateConstraint { table, name });
            }
        }

        let on_delete = match self.on_delete {
            Some(statements) if statements.is_empty() => {
                return Err(SchemaError::EmptyTrigger(table))
            }
            Some(statements) => statements,
            None => Vec::new(),
        };

        Ok(Table {
            name: table,
            columns: self.columns,
            primary_key,
            unique_constraints: self.unique_constraints,
            indexes: self.indexes,
            foreign_keys: self.foreign_keys,
            on_delete,
            comment: self.comment,
            hints: self.hints,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::data_type::DataType;
    use crate::types::dml::Delete;
    use crate::types::expression::Expr;

    fn col(name: &str) -> Column {
        Column::builder(name, DataType::Integer).build().unwrap()
    }

    fn base() -> TableBuilder {
        Table::builder("Customer")
            .column(col("Id"))
            .column(col("ParentId"))
    }

    #[test]
    fn valid_table() {
        let t = base()
            .primary_key(&["Id"])
            .unique(&["ParentId"])
            .index("IX_Customer_Parent", &["ParentId"])
            .build()
            .unwrap();
        assert_eq!(t.primary_key().name, "PK_Customer");
        assert_eq!(t.unique_constraints()[0].name, "UQ_Customer_ParentId");
        assert!(t.find_column("Id").is_some());
        assert!(t.find_column("Missing").is_none());
        assert!(t.is_key_column("ParentId"));
    }

    #[test]
    fn missing_primary_key() {
        assert_eq!(
            base().build().unwrap_err(),
            SchemaError::MissingPrimaryKey("Customer".into())
        );
    }

    #[test]
    fn multiple_primary_keys() {
        let err = base()
            .primary_key(&["Id"])
            .primary_key(&["ParentId"])
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::MultiplePrimaryKeys("Customer".into()));
    }

    #[test]
    fn duplicate_column() {
        let err = base().column(col("Id")).primary_key(&["Id"]).build().unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateColumn { .. }));
    }

    #[test]
    fn unknown_index_column() {
        let err = base()
            .primary_key(&["Id"])
            .index("IX_X", &["Nope"])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownColumn { ref column, .. } if column == "Nope"));
    }

    #[test]
    fn empty_on_delete_rejected() {
        let err = base()
            .primary_key(&["Id"])
            .on_delete(vec![])
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::EmptyTrigger("Customer".into()));
    }

    #[test]
    fn shorthand_and_declared_foreign_keys_are_merged() {
        let parent = Column::builder("ParentId", DataType::Integer)
            .references(Reference::new("Customer", "Id"))
            .build()
            .unwrap();
        let t = Table::builder("Customer")
            .column(col("Id"))
            .column(parent)
            .column(col("KindId"))
            .primary_key(&["Id"])
            .foreign_key("KindId", Reference::new("Kind", "Id"))
            .on_delete(vec![Dml::Delete(Delete::new(
                "Orders",
                Some(Expr::qualified("OLD", "Id")),
            ))])
            .build()
            .unwrap();
        let fks = t.foreign_keys();
        assert_eq!(fks.len(), 2);
        assert_eq!(fks[0].name, "FK_Customer_ParentId");
        assert_eq!(fks[1].name, "FK_Customer_KindId");
        assert_eq!(t.declared_foreign_keys().len(), 1);
        assert!(t.has_trigger());
    }

    #[test]
    fn clashing_constraint_names_rejected() {
        let err = base()
            .primary_key(&["Id"])
            .index("PK_Customer", &["ParentId"])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateConstraint { .. }));
    }
}
