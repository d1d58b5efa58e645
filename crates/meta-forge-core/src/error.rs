use std::fmt;

/// Errors that occur when constructing, validating, or resolving schema types.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// Identifier was empty or contained characters outside `[A-Za-z0-9_]`.
    InvalidIdentifier(String),
    /// Two tables share an id.
    DuplicateTable(String),
    /// Two views share an id.
    DuplicateView(String),
    /// Two statement templates share an id.
    DuplicateStatement(String),
    /// Two columns of one table share a name.
    DuplicateColumn { table: String, column: String },
    /// Two constraints or indexes of one table share a name.
    DuplicateConstraint { table: String, name: String },
    /// Table declares no columns.
    EmptyTable(String),
    /// Table declares no primary key.
    MissingPrimaryKey(String),
    /// Table declares more than one primary key.
    MultiplePrimaryKeys(String),
    /// A key, index, or foreign key names a column the table does not have.
    UnknownColumn {
        table: String,
        column: String,
        context: String,
    },
    /// A constraint or index lists no columns.
    EmptyColumnList { table: String, name: String },
    /// `ON DELETE ( ... )` with no statements.
    EmptyTrigger(String),
    /// View declares no output columns or no select.
    EmptyView(String),
    /// A view select yields a different number of values than declared columns.
    ViewArity {
        view: String,
        expected: usize,
        found: usize,
    },
    /// `INSERT` column list and value list differ in length.
    InsertArity {
        table: String,
        columns: usize,
        values: usize,
    },
    /// A reference names a table that does not exist.
    UnresolvedTable { from: String, table: String },
    /// A reference names a column that does not exist on its table.
    UnresolvedColumn {
        from: String,
        table: String,
        column: String,
    },
    /// A decimal type with scale larger than precision.
    InvalidScale { precision: u32, scale: u32 },
    /// A character type with zero length.
    InvalidLength(u32),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIdentifier(s) => {
                write!(f, "invalid identifier '{s}': must match [A-Za-z_][A-Za-z0-9_]*")
            }
            Self::DuplicateTable(t) => write!(f, "duplicate table '{t}'"),
            Self::DuplicateView(v) => write!(f, "duplicate view '{v}'"),
            Self::DuplicateStatement(s) => write!(f, "duplicate statement '{s}'"),
            Self::DuplicateColumn { table, column } => {
                write!(f, "duplicate column '{column}' in table '{table}'")
            }
            Self::DuplicateConstraint { table, name } => {
                write!(f, "duplicate constraint or index '{name}' in table '{table}'")
            }
            Self::EmptyTable(t) => write!(f, "table '{t}' must have at least one column"),
            Self::MissingPrimaryKey(t) => write!(f, "table '{t}' has no primary key"),
            Self::MultiplePrimaryKeys(t) => {
                write!(f, "table '{t}' declares more than one primary key")
            }
            Self::UnknownColumn {
                table,
                column,
                context,
            } => {
                write!(
                    f,
                    "unknown column '{column}' in {context} of table '{table}'"
                )
            }
            Self::EmptyColumnList { table, name } => {
                write!(f, "'{name}' on table '{table}' lists no columns")
            }
            Self::EmptyTrigger(t) => {
                write!(f, "ON DELETE block of table '{t}' contains no statements")
            }
            Self::EmptyView(v) => {
                write!(f, "view '{v}' must declare columns and a select")
            }
            Self::ViewArity {
                view,
                expected,
                found,
            } => {
                write!(
                    f,
                    "view '{view}' declares {expected} columns but a select yields {found}"
                )
            }
            Self::InsertArity {
                table,
                columns,
                values,
            } => {
                write!(
                    f,
                    "insert into '{table}' lists {columns} columns but {values} values"
                )
            }
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
            Self::InvalidScale { precision, scale } => {
                write!(f, "invalid scale {scale}: must not exceed precision {precision}")
            }
            Self::InvalidLength(n) => write!(f, "invalid length {n}: must be >= 1"),
        }
    }
}

impl std::error::Error for SchemaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let cases = vec![
            (
                SchemaError::InvalidIdentifier("1abc".into()),
                "invalid identifier '1abc'",
            ),
            (SchemaError::DuplicateTable("T".into()), "duplicate table 'T'"),
            (
                SchemaError::DuplicateColumn {
                    table: "T".into(),
                    column: "c".into(),
                },
                "duplicate column 'c'",
            ),
            (
                SchemaError::MissingPrimaryKey("T".into()),
                "table 'T' has no primary key",
            ),
            (
                SchemaError::UnknownColumn {
                    table: "T".into(),
                    column: "x".into(),
                    context: "index IX_T".into(),
                },
                "unknown column 'x' in index IX_T",
            ),
            (
                SchemaError::ViewArity {
                    view: "V".into(),
                    expected: 2,
                    found: 3,
                },
                "view 'V' declares 2 columns",
            ),
            (
                SchemaError::UnresolvedColumn {
                    from: "foreign key FK_A_B".into(),
                    table: "B".into(),
                    column: "Id".into(),
                },
                "foreign key FK_A_B references unknown column 'B.Id'",
            ),
        ];

        for (error, expected_prefix) in cases {
            let msg = error.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error display for {error:?} = '{msg}', expected to start with '{expected_prefix}'"
            );
        }
    }

    #[test]
    fn error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(SchemaError::EmptyTable("T".into()));
        assert!(err.to_string().contains("at least one column"));
    }
}
