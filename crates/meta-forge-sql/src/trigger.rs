//! Delete triggers materialised from a table's `ON DELETE` block.

use meta_forge_core::types::{render, Dml, Table};

use crate::dialect::{Dialect, DialectStyle, StatementResult};
use crate::script::Statement;

/// Qualifier that names the deleted row inside an `ON DELETE` block.
pub const OLD_ROW: &str = "OLD";

const INDENT: &str = "    ";

/// Name of the delete trigger generated for a table.
pub fn trigger_name(table: &str) -> String {
    format!("TRG_{table}_DEL")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencingStyle {
    /// `REFERENCING OLD AS oldrow ... MODE DB2SQL BEGIN ATOMIC`.
    Db2,
    /// One single-statement trigger per DML, numbered from 1.
    Derby,
    /// `REFERENCING OLD ROW AS oldrow ... BEGIN ATOMIC`.
    Hsqldb,
}

/// How a dialect spells a row-level delete trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerStrategy {
    /// `BEFORE DELETE ... FOR EACH ROW` PL/SQL block using `:old`.
    PlSql,
    /// Statement trigger joining the `deleted` pseudo-table. With
    /// `instead_of` the trigger replaces the delete and finishes it itself.
    TransactSql { instead_of: bool },
    /// Trigger function returning `OLD`, plus the trigger that calls it.
    PlPgSql,
    /// `BEFORE DELETE ... FOR EACH ROW BEGIN ... END` using `OLD`.
    RowBlock,
    /// `AFTER DELETE` trigger with `REFERENCING OLD ... AS oldrow`.
    Referencing(ReferencingStyle),
}

impl TriggerStrategy {
    /// How trigger bodies refer to the deleted row.
    pub fn old_row(self) -> &'static str {
        match self {
            Self::PlSql => ":old",
            Self::TransactSql { .. } => "deleted",
            Self::PlPgSql | Self::RowBlock => "OLD",
            Self::Referencing(_) => "oldrow",
        }
    }

    /// Statements creating the delete trigger(s) of `table`; empty when the
    /// table has no `ON DELETE` block.
    pub fn create_statements<D: Dialect + ?Sized>(
        self,
        dialect: &D,
        table: &Table,
    ) -> StatementResult {
        if !table.has_trigger() {
            return Ok(Vec::new());
        }
        let name = dialect.object_name(&trigger_name(table.name()));
        let target = dialect.quote(table.name());
        let style = DialectStyle::new(dialect).with_old_row(self.old_row());
        let body = |statements: Vec<String>| -> String {
            statements
                .iter()
                .map(|sql| format!("{INDENT}{sql};\n"))
                .collect()
        };
        let plain_body = || body(table.on_delete().iter().map(|dml| dml.render(&style)).collect());

        let statements = match self {
            Self::PlSql => vec![Statement::block(format!(
                "CREATE OR REPLACE TRIGGER {name}\nBEFORE DELETE ON {target}\nFOR EACH ROW\nBEGIN\n{}END;",
                plain_body()
            ))],
            Self::TransactSql { instead_of } => {
                let mut lines = vec!["SET NOCOUNT ON".to_string()];
                lines.extend(
                    table
                        .on_delete()
                        .iter()
                        .map(|dml| joined_dml(dialect, dml, self.old_row())),
                );
                let timing = if instead_of {
                    lines.push(finish_delete(dialect, table, self.old_row()));
                    "INSTEAD OF DELETE"
                } else {
                    "FOR DELETE"
                };
                vec![Statement::block(format!(
                    "CREATE TRIGGER {name} ON {target}\n{timing}\nAS\nBEGIN\n{}END",
                    body(lines)
                ))]
            }
            Self::PlPgSql => {
                let function = function_name(dialect, table);
                vec![
                    Statement::block(format!(
                        "CREATE OR REPLACE FUNCTION {function}() RETURNS TRIGGER AS $$\nBEGIN\n{}{INDENT}RETURN OLD;\nEND;\n$$ LANGUAGE plpgsql",
                        plain_body()
                    )),
                    Statement::plain(format!(
                        "CREATE TRIGGER {name} BEFORE DELETE ON {target}\nFOR EACH ROW EXECUTE PROCEDURE {function}()"
                    )),
                ]
            }
            Self::RowBlock => vec![Statement::block(format!(
                "CREATE TRIGGER {name} BEFORE DELETE ON {target}\nFOR EACH ROW\nBEGIN\n{}END",
                plain_body()
            ))],
            Self::Referencing(ReferencingStyle::Db2) => vec![Statement::block(format!(
                "CREATE TRIGGER {name}\nAFTER DELETE ON {target}\nREFERENCING OLD AS oldrow\nFOR EACH ROW MODE DB2SQL\nBEGIN ATOMIC\n{}END",
                plain_body()
            ))],
            Self::Referencing(ReferencingStyle::Hsqldb) => vec![Statement::block(format!(
                "CREATE TRIGGER {name}\nAFTER DELETE ON {target}\nREFERENCING OLD ROW AS oldrow\nFOR EACH ROW\nBEGIN ATOMIC\n{}END",
                plain_body()
            ))],
            Self::Referencing(ReferencingStyle::Derby) => table
                .on_delete()
                .iter()
                .enumerate()
                .map(|(i, dml)| {
                    Statement::plain(format!(
                        "CREATE TRIGGER {}\nAFTER DELETE ON {target}\nREFERENCING OLD AS oldrow\nFOR EACH ROW\n{}",
                        numbered_name(dialect, table, i),
                        dml.render(&style)
                    ))
                })
                .collect(),
        };
        tracing::trace!(table = table.name(), count = statements.len(), "rendered delete trigger");
        Ok(statements)
    }

    /// Statements dropping the trigger(s) created for `table`.
    pub fn drop_statements<D: Dialect + ?Sized>(self, dialect: &D, table: &Table) -> Vec<Statement> {
        let name = dialect.object_name(&trigger_name(table.name()));
        match self {
            Self::PlPgSql => vec![
                Statement::plain(format!(
                    "DROP TRIGGER {name} ON {}",
                    dialect.quote(table.name())
                )),
                Statement::plain(format!(
                    "DROP FUNCTION {}()",
                    function_name(dialect, table)
                )),
            ],
            Self::Referencing(ReferencingStyle::Derby) => (0..table.on_delete().len())
                .map(|i| Statement::plain(format!("DROP TRIGGER {}", numbered_name(dialect, table, i))))
                .collect(),
            _ => vec![Statement::plain(format!("DROP TRIGGER {name}"))],
        }
    }
}

fn function_name<D: Dialect + ?Sized>(dialect: &D, table: &Table) -> String {
    dialect.object_name(&format!("{}_FN", trigger_name(table.name())))
}

fn numbered_name<D: Dialect + ?Sized>(dialect: &D, table: &Table, index: usize) -> String {
    dialect.object_name(&format!("{}_{}", trigger_name(table.name()), index + 1))
}

/// Rewrites one `ON DELETE` statement as a join against the pseudo-table
/// that holds the deleted rows. Unqualified columns belong to the target.
fn joined_dml<D: Dialect + ?Sized>(dialect: &D, dml: &Dml, old_row: &str) -> String {
    let target = dml.table();
    let quoted = dialect.quote(target);
    let style = DialectStyle::new(dialect)
        .with_old_row(old_row)
        .qualify_with(target);
    let mut sql = match dml {
        Dml::Delete(_) => format!("DELETE {quoted} FROM {quoted}, {old_row}"),
        Dml::Update(update) => {
            let assignments: Vec<String> = update
                .assignments()
                .iter()
                .map(|(column, expr)| format!("{} = {}", dialect.quote(column), render(expr, &style)))
                .collect();
            format!(
                "UPDATE {quoted} SET {} FROM {quoted}, {old_row}",
                assignments.join(", ")
            )
        }
        Dml::Insert(insert) => {
            let values_style = DialectStyle::new(dialect).with_old_row(old_row);
            let columns: Vec<String> = insert.columns().iter().map(|c| dialect.quote(c)).collect();
            let values: Vec<String> = insert
                .values()
                .iter()
                .map(|v| render(v, &values_style))
                .collect();
            return format!(
                "INSERT INTO {quoted} ({}) SELECT {} FROM {old_row}",
                columns.join(", "),
                values.join(", ")
            );
        }
    };
    let filter = match dml {
        Dml::Delete(delete) => delete.filter(),
        Dml::Update(update) => update.filter(),
        Dml::Insert(_) => None,
    };
    if let Some(filter) = filter {
        sql.push_str(" WHERE ");
        sql.push_str(&render(filter, &style));
    }
    sql
}

/// The delete an `INSTEAD OF` trigger performs after its own statements.
fn finish_delete<D: Dialect + ?Sized>(dialect: &D, table: &Table, old_row: &str) -> String {
    let quoted = dialect.quote(table.name());
    let keys: Vec<String> = table
        .primary_key()
        .columns
        .iter()
        .map(|c| {
            let column = dialect.quote(c);
            format!("{quoted}.{column} = {old_row}.{column}")
        })
        .collect();
    format!(
        "DELETE {quoted} FROM {quoted}, {old_row} WHERE {}",
        keys.join(" AND ")
    )
}

#[cfg(test)]
mod tests {
    use meta_forge_core::types::{BinaryOp, Column, DataType, Delete, Expr, Literal, Update};

    use super::*;
    use crate::dialect::{DerbyDialect, OracleDialect, PostgresDialect, SqlServerDialect};

    fn customer() -> Table {
        Table::builder("Customer")
            .column(Column::builder("Id", DataType::Integer).not_null().build().unwrap())
            .column(Column::builder("ParentId", DataType::Integer).build().unwrap())
            .primary_key(&["Id"])
            .on_delete(vec![
                Dml::Delete(Delete::new(
                    "Orders",
                    Some(Expr::binary(
                        BinaryOp::Eq,
                        Expr::column("CustomerId"),
                        Expr::qualified("OLD", "Id"),
                    )),
                )),
                Dml::Update(Update::new(
                    "Customer",
                    vec![("ParentId".into(), Expr::literal(Literal::Null))],
                    Some(Expr::binary(
                        BinaryOp::Eq,
                        Expr::column("ParentId"),
                        Expr::qualified("OLD", "Id"),
                    )),
                )),
            ])
            .build()
            .unwrap()
    }

    #[test]
    fn oracle_uses_colon_old() {
        let statements = TriggerStrategy::PlSql
            .create_statements(&OracleDialect, &customer())
            .unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].sql,
            "CREATE OR REPLACE TRIGGER TRG_Customer_DEL\nBEFORE DELETE ON Customer\nFOR EACH ROW\nBEGIN\n    DELETE FROM Orders WHERE CustomerId = :old.Id;\n    UPDATE Customer SET ParentId = NULL WHERE ParentId = :old.Id;\nEND;"
        );
    }

    #[test]
    fn sqlserver_joins_deleted_and_finishes_the_delete() {
        let statements = TriggerStrategy::TransactSql { instead_of: true }
            .create_statements(&SqlServerDialect, &customer())
            .unwrap();
        let sql = &statements[0].sql;
        assert!(sql.contains("INSTEAD OF DELETE"));
        assert!(sql.contains(
            "DELETE Orders FROM Orders, deleted WHERE Orders.CustomerId = deleted.Id;"
        ));
        assert!(sql.contains(
            "UPDATE Customer SET ParentId = NULL FROM Customer, deleted WHERE Customer.ParentId = deleted.Id;"
        ));
        assert!(sql.contains("DELETE Customer FROM Customer, deleted WHERE Customer.Id = deleted.Id;\nEND"));
    }

    #[test]
    fn postgres_creates_function_and_trigger() {
        let table = customer();
        let statements = TriggerStrategy::PlPgSql
            .create_statements(&PostgresDialect, &table)
            .unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].sql.contains("RETURN OLD;"));
        assert!(statements[0].sql.contains("CustomerId = OLD.Id"));
        assert!(statements[1].sql.ends_with("EXECUTE PROCEDURE TRG_Customer_DEL_FN()"));

        let drops = TriggerStrategy::PlPgSql.drop_statements(&PostgresDialect, &table);
        assert_eq!(drops[0].sql, "DROP TRIGGER TRG_Customer_DEL ON Customer");
        assert_eq!(drops[1].sql, "DROP FUNCTION TRG_Customer_DEL_FN()");
    }

    #[test]
    fn derby_emits_one_trigger_per_statement() {
        let table = customer();
        let style = TriggerStrategy::Referencing(ReferencingStyle::Derby);
        let statements = style.create_statements(&DerbyDialect, &table).unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].sql.starts_with("CREATE TRIGGER TRG_Customer_DEL_1\n"));
        assert!(statements[1].sql.ends_with("WHERE ParentId = oldrow.Id"));

        let drops = style.drop_statements(&DerbyDialect, &table);
        assert_eq!(drops.len(), 2);
        assert_eq!(drops[1].sql, "DROP TRIGGER TRG_Customer_DEL_2");
    }

    #[test]
    fn tables_without_on_delete_get_no_trigger() {
        let table = Table::builder("Kind")
            .column(Column::builder("Id", DataType::Integer).not_null().build().unwrap())
            .primary_key(&["Id"])
            .build()
            .unwrap();
        assert!(TriggerStrategy::RowBlock
            .create_statements(&PostgresDialect, &table)
            .unwrap()
            .is_empty());
    }
}
