use serde::Serialize;

use crate::error::SchemaError;

use super::constraint::Reference;
use super::data_type::DataType;
use super::hint::Hints;
use super::identifier::validate_identifier;
use super::literal::DefaultValue;

/// A table column.
///
/// Two columns are structurally equal when every attribute matches; the
/// diff engine relies on this to detect changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Column {
    name: String,
    data_type: DataType,
    nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<DefaultValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Hints::is_empty")]
    hints: Hints,
}

impl Column {
    pub fn builder(name: impl Into<String>, data_type: DataType) -> ColumnBuilder {
        ColumnBuilder {
            name: name.into(),
            data_type,
            nullable: true,
            default: None,
            reference: None,
            comment: None,
            hints: Hints::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Column-level `REFERENCES` shorthand.
    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn hints(&self) -> &Hints {
        &self.hints
    }
}

/// Mutable column under construction.
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    name: String,
    data_type: DataType,
    nullable: bool,
    default: Option<DefaultValue>,
    reference: Option<Reference>,
    comment: Option<String>,
    hints: Hints,
}

impl ColumnBuilder {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn not_null(self) -> Self {
        self.nullable(false)
    }

    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn references(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn hints(mut self, hints: Hints) -> Self {
        self.hints = hints;
        self
    }

    pub fn build(self) -> Result<Column, SchemaError> {
        validate_identifier(&self.name)?;
        Ok(Column {
            name: self.name,
            data_type: self.data_type,
            nullable: self.nullable,
            default: self.default,
            reference: self.reference,
            comment: self.comment,
            hints: self.hints,
        })
    }
}
