use std::fmt;

use meta_forge_core::error::SchemaError;
use meta_forge_core::types::DialectKind;

/// Semantic errors raised while generating SQL from a schema.
///
/// Each variant names the artifact involved so a migration author can find
/// the offending definition. A generation run stops at the first error.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GenerateError {
    /// A reference names a table (or view) that does not exist.
    UnresolvedTable { from: String, table: String },

    /// A reference names a column that does not exist on its table.
    UnresolvedColumn {
        from: String,
        table: String,
        column: String,
    },

    /// The dialect cannot express the requested column change.
    UnsupportedAlter {
        dialect: DialectKind,
        table: String,
        column: String,
        reason: String,
    },

    /// The dialect cannot express an operation on an artifact.
    UnsupportedOperation {
        dialect: DialectKind,
        operation: String,
        artifact: String,
    },

    /// An artifact is well-formed syntactically but unusable for generation.
    Malformed { artifact: String, reason: String },

    /// A schema model error surfaced during generation.
    Schema(SchemaError),
}

impl GenerateError {
    pub(crate) fn unsupported(
        dialect: DialectKind,
        operation: impl Into<String>,
        artifact: impl Into<String>,
    ) -> Self {
        Self::UnsupportedOperation {
            dialect,
            operation: operation.into(),
            artifact: artifact.into(),
        }
    }

    pub(crate) fn malformed(artifact: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            artifact: artifact.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedTable { from, table } => {
                write!(f, "{from} references unknown table '{table}'")
            }
            Self::UnresolvedColumn {
                from,
                table,
                column,
            } => {
                write!(f, "{from} references unknown column '{table}.{column}'")
            }
            Self::UnsupportedAlter {
                dialect,
                table,
                column,
                reason,
            } => {
                write!(
                    f,
                    "cannot alter column '{table}.{column}' for {}: {reason}",
                    dialect.display_name()
                )
            }
            Self::UnsupportedOperation {
                dialect,
                operation,
                artifact,
            } => {
                write!(
                    f,
                    "{} does not support {operation} ({artifact})",
                    dialect.display_name()
                )
            }
            Self::Malformed { artifact, reason } => write!(f, "{artifact}: {reason}"),
            Self::Schema(err) => write!(f, "schema error: {err}"),
        }
    }
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SchemaError> for GenerateError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnresolvedTable { from, table } => Self::UnresolvedTable { from, table },
            SchemaError::UnresolvedColumn {
                from,
                table,
                column,
            } => Self::UnresolvedColumn {
                from,
                table,
                column,
            },
            other => Self::Schema(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn unsupported_alter_names_everything() {
        let err = GenerateError::UnsupportedAlter {
            dialect: DialectKind::Derby,
            table: "Customer".into(),
            column: "Name".into(),
            reason: "only VARCHAR columns can be lengthened".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Customer.Name"));
        assert!(msg.contains("Apache Derby"));
        assert!(msg.contains("lengthened"));
    }

    #[test]
    fn unresolved_schema_errors_convert_to_generation_errors() {
        let err: GenerateError = SchemaError::UnresolvedColumn {
            from: "table Orders".into(),
            table: "Customer".into(),
            column: "Uid".into(),
        }
        .into();
        assert!(matches!(err, GenerateError::UnresolvedColumn { .. }));
        assert_eq!(
            err.to_string(),
            "table Orders references unknown column 'Customer.Uid'"
        );
    }

    #[test]
    fn other_schema_errors_keep_their_source() {
        let err: GenerateError = SchemaError::EmptyTable("T".into()).into();
        assert!(err.source().is_some());
    }
}
