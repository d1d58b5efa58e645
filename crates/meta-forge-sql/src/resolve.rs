//! Reference resolution.
//!
//! References are checked lazily, right before generation, so a schema can
//! be parsed and printed while still incomplete.

use meta_forge_core::types::{Dml, DmlStatement, Select, SqlMeta, Table, View};

use crate::error::GenerateError;
use crate::trigger::OLD_ROW;

/// Checks every foreign key, view source, trigger statement, and statement
/// template of `meta` against the tables and views it names.
pub fn resolve(meta: &SqlMeta) -> Result<(), GenerateError> {
    for table in meta.tables() {
        let from = format!("table {}", table.name());
        for fk in table.foreign_keys() {
            meta.resolve_reference(&from, &fk.reference)?;
        }
        let trigger = format!("ON DELETE of table {}", table.name());
        for dml in table.on_delete() {
            resolve_dml(meta, &trigger, dml, Some(table))?;
        }
    }
    for view in meta.views() {
        resolve_view(meta, view)?;
    }
    resolve_statements(meta, meta.statements())?;
    tracing::trace!(
        tables = meta.tables().len(),
        views = meta.views().len(),
        "references resolved"
    );
    Ok(())
}

/// Checks statement templates against the tables of `meta`. Templates may
/// come from another schema, such as an additional-conversion file.
pub(crate) fn resolve_statements(
    meta: &SqlMeta,
    statements: &[DmlStatement],
) -> Result<(), GenerateError> {
    for statement in statements {
        let from = format!("statement {}", statement.name());
        resolve_dml(meta, &from, statement.body(), None)?;
    }
    Ok(())
}

/// Output columns of a table or view.
fn source_columns<'a>(meta: &'a SqlMeta, name: &str) -> Option<Vec<&'a str>> {
    if let Some(table) = meta.find_table(name) {
        return Some(table.columns().iter().map(|c| c.name()).collect());
    }
    meta.find_view(name)
        .map(|view| view.columns().iter().map(String::as_str).collect())
}

fn unresolved_column(from: &str, table: &str, column: &str) -> GenerateError {
    GenerateError::UnresolvedColumn {
        from: from.to_string(),
        table: table.to_string(),
        column: column.to_string(),
    }
}

fn unresolved_table(from: &str, table: &str) -> GenerateError {
    GenerateError::UnresolvedTable {
        from: from.to_string(),
        table: table.to_string(),
    }
}

fn resolve_view(meta: &SqlMeta, view: &View) -> Result<(), GenerateError> {
    let from = format!("view {}", view.name());
    for select in view.selects() {
        resolve_select(meta, &from, select)?;
    }
    Ok(())
}

fn resolve_select(meta: &SqlMeta, from: &str, select: &Select) -> Result<(), GenerateError> {
    let mut bindings = Vec::new();
    for table_ref in select.tables() {
        let columns = source_columns(meta, &table_ref.table)
            .ok_or_else(|| unresolved_table(from, &table_ref.table))?;
        bindings.push((table_ref.binding(), table_ref.table.as_str(), columns));
    }
    for expr in select.expressions() {
        for (qualifier, name) in expr.column_refs() {
            match qualifier {
                Some(qualifier) => {
                    let (_, table, columns) = bindings
                        .iter()
                        .find(|(binding, _, _)| *binding == qualifier)
                        .ok_or_else(|| unresolved_table(from, qualifier))?;
                    if !columns.contains(&name) {
                        return Err(unresolved_column(from, table, name));
                    }
                }
                None => {
                    if !bindings.iter().any(|(_, _, columns)| columns.contains(&name)) {
                        return Err(unresolved_column(from, &select.from.table, name));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Checks a DML statement. Inside a trigger, `OLD.col` refers to `owner`,
/// the table whose rows are deleted.
fn resolve_dml(
    meta: &SqlMeta,
    from: &str,
    dml: &Dml,
    owner: Option<&Table>,
) -> Result<(), GenerateError> {
    let target = meta
        .find_table(dml.table())
        .ok_or_else(|| unresolved_table(from, dml.table()))?;
    for column in dml.target_columns() {
        if target.find_column(column).is_none() {
            return Err(unresolved_column(from, target.name(), column));
        }
    }
    for expr in dml.expressions() {
        for (qualifier, name) in expr.column_refs() {
            let table = match (qualifier, owner) {
                (Some(OLD_ROW), Some(owner)) => owner,
                (Some(qualifier), _) => meta
                    .find_table(qualifier)
                    .ok_or_else(|| unresolved_table(from, qualifier))?,
                (None, _) => target,
            };
            if table.find_column(name).is_none() {
                return Err(unresolved_column(from, table.name(), name));
            }
        }
    }
    Ok(())
}
