//! Migration script generation.
//!
//! The structural diff lives in `meta_forge_core::migration`; this module
//! renders its plan through a dialect and wraps it with the version marker.

use std::collections::HashSet;

use meta_forge_core::migration::{ColumnChange, DiffEngine, MigrationPlan, MigrationStep};
use meta_forge_core::types::SqlMeta;

use crate::dialect::{Dialect, StatementResult, TypeContext};
use crate::error::GenerateError;
use crate::generator::{has_parameters, SqlGenerator};
use crate::resolve::{resolve, resolve_statements};
use crate::script::{Script, Statement};

pub const DEFAULT_VERSION_TABLE: &str = "SchemaVersion";
pub const DEFAULT_VERSION_COLUMN: &str = "Version";

/// Settings of a migration run.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOptions {
    pub version_table: String,
    pub version_column: String,
    /// Hand-written statements appended after the structural changes.
    pub additional: Option<SqlMeta>,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            version_table: DEFAULT_VERSION_TABLE.to_string(),
            version_column: DEFAULT_VERSION_COLUMN.to_string(),
            additional: None,
        }
    }
}

impl MigrationOptions {
    pub fn with_additional(mut self, additional: SqlMeta) -> Self {
        self.additional = Some(additional);
        self
    }
}

/// Turns two schema snapshots into a migration script.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationGenerator;

impl MigrationGenerator {
    /// The migration from `old` to `new` as rendered text.
    pub fn generate(
        old: &SqlMeta,
        new: &SqlMeta,
        generator: &SqlGenerator,
        new_version: u32,
        options: &MigrationOptions,
    ) -> Result<String, GenerateError> {
        let script = Self::script(old, new, generator, new_version, options)?;
        Ok(generator.render(&script))
    }

    /// The migration from `old` to `new`. The script ends with the update of
    /// the version marker to `new_version`.
    pub fn script(
        old: &SqlMeta,
        new: &SqlMeta,
        generator: &SqlGenerator,
        new_version: u32,
        options: &MigrationOptions,
    ) -> Result<Script, GenerateError> {
        resolve(old)?;
        resolve(new)?;
        if let Some(additional) = &options.additional {
            resolve_statements(new, additional.statements())?;
        }
        let dialect = generator.dialect();
        let mut plan = DiffEngine::diff(old, new, &dialect.recreate_options());
        let widths = key_width_alters(old, new, dialect, &plan);
        plan.insert_column_alters(widths);
        tracing::debug!(
            dialect = %generator.kind(),
            steps = plan.len(),
            "migration plan computed"
        );

        let mut script = Script::new();
        script.push(Statement::comment(header(dialect.name(), new_version)));
        script.extend(dialect.migration_prologue(&plan));
        let renderer = StepRenderer::new(generator, new, &plan);
        for step in plan.iter() {
            script.extend(renderer.render(step)?);
        }
        script.extend(dialect.migration_epilogue(&plan));

        if let Some(additional) = &options.additional {
            script.extend(additional_statements(generator, new, additional)?);
        }

        script.push(Statement::plain(format!(
            "UPDATE {} SET {} = {new_version}",
            dialect.quote(&options.version_table),
            dialect.quote(&options.version_column)
        )));
        tracing::debug!(
            dialect = %generator.kind(),
            statements = script.executable_len(),
            "migration script generated"
        );
        Ok(script)
    }
}

/// Columns whose native type depends on whether they are key columns and
/// whose key status changed while the column itself did not.
fn key_width_alters(
    old: &SqlMeta,
    new: &SqlMeta,
    dialect: &dyn Dialect,
    plan: &MigrationPlan,
) -> Vec<MigrationStep> {
    let altered: HashSet<(&str, &str)> = plan
        .iter()
        .filter_map(|step| match step {
            MigrationStep::AlterColumn { table, after, .. } => Some((table.as_str(), after.name())),
            _ => None,
        })
        .collect();

    let mut alters = Vec::new();
    for table in new.tables() {
        let Some(old_table) = old.find_table(table.name()) else {
            continue;
        };
        for column in table.columns() {
            let Some(before) = old_table.find_column(column.name()) else {
                continue;
            };
            if altered.contains(&(table.name(), column.name())) {
                continue;
            }
            let was = TypeContext::for_column(old, old_table, column.name());
            let now = TypeContext::for_column(new, table, column.name());
            if dialect.data_type(column, was) != dialect.data_type(column, now) {
                alters.push(MigrationStep::AlterColumn {
                    table: table.name().to_string(),
                    before: before.clone(),
                    after: column.clone(),
                    change: ColumnChange {
                        data_type: true,
                        ..ColumnChange::default()
                    },
                });
            }
        }
    }
    alters
}

fn header(dialect: &str, new_version: u32) -> String {
    match new_version.checked_sub(1) {
        Some(old_version) => {
            format!("Migration from version {old_version} to {new_version} for {dialect}")
        }
        None => format!("Migration to version {new_version} for {dialect}"),
    }
}

/// Additional statements grouped by target table in the new schema's
/// declaration order; statements on unknown tables go last.
fn additional_statements(
    generator: &SqlGenerator,
    new: &SqlMeta,
    additional: &SqlMeta,
) -> Result<Vec<Statement>, GenerateError> {
    let mut statements: Vec<_> = additional.statements().iter().collect();
    statements.sort_by_key(|s| new.table_position(s.body().table()).unwrap_or(usize::MAX));
    statements
        .into_iter()
        .map(|statement| {
            if has_parameters(statement.body()) {
                return Err(GenerateError::malformed(
                    format!("statement {}", statement.name()),
                    "additional conversion statements cannot take parameters",
                ));
            }
            Ok(generator.dml(statement.body()))
        })
        .collect()
}

/// Renders plan steps, skipping foreign-key steps that inline dialects
/// already covered in `CREATE TABLE` or `ADD COLUMN`.
struct StepRenderer<'a> {
    generator: &'a SqlGenerator,
    new: &'a SqlMeta,
    created: HashSet<&'a str>,
    dropped: HashSet<&'a str>,
    added_columns: HashSet<(&'a str, &'a str)>,
}

impl<'a> StepRenderer<'a> {
    fn new(generator: &'a SqlGenerator, new: &'a SqlMeta, plan: &'a MigrationPlan) -> Self {
        let added_columns = plan
            .iter()
            .filter_map(|step| match step {
                MigrationStep::AddColumn { table, column } => {
                    Some((table.as_str(), column.name()))
                }
                _ => None,
            })
            .collect();
        Self {
            generator,
            new,
            created: plan.created_tables(),
            dropped: plan.dropped_tables(),
            added_columns,
        }
    }

    fn dialect(&self) -> &'a dyn Dialect {
        self.generator.dialect()
    }

    fn type_context(&self, table: &str, column: &str) -> TypeContext {
        self.new
            .find_table(table)
            .map(|t| TypeContext::for_column(self.new, t, column))
            .unwrap_or_default()
    }

    fn render(&self, step: &MigrationStep) -> StatementResult {
        let dialect = self.dialect();
        let caps = dialect.capabilities();
        tracing::trace!(step = %step, "rendering migration step");
        match step {
            MigrationStep::DropView { view } => dialect.drop_view(view),
            MigrationStep::DropTrigger { table } => dialect.drop_trigger(table),
            MigrationStep::DropForeignKey { table, foreign_key } => {
                if !caps.alter_constraints && self.dropped.contains(table.as_str()) {
                    return Ok(Vec::new());
                }
                dialect.drop_foreign_key(table, foreign_key)
            }
            MigrationStep::DropUnique { table, unique } => dialect.drop_unique(table, unique),
            MigrationStep::DropIndex { table, index } => dialect.drop_index(table, index),
            MigrationStep::DropPrimaryKey { table, primary_key } => {
                dialect.drop_primary_key(table, primary_key)
            }
            MigrationStep::DropTable { table } => dialect.drop_table(table),
            MigrationStep::CreateTable { table } => {
                let mut statements: Vec<Statement> =
                    self.generator.script_comment(table).into_iter().collect();
                statements.push(self.generator.create_table(self.new, table)?);
                statements.extend(self.generator.table_keys(table)?);
                statements.extend(self.generator.comments(table));
                Ok(statements)
            }
            MigrationStep::AlterColumn {
                table,
                before,
                after,
                change,
            } => dialect.alter_column(
                table,
                before,
                after,
                *change,
                self.type_context(table, after.name()),
            ),
            MigrationStep::AddColumn { table, column } => {
                let foreign_key = if caps.inline_foreign_keys {
                    self.new.find_table(table).and_then(|t| {
                        t.foreign_keys()
                            .into_iter()
                            .find(|fk| fk.column == column.name())
                    })
                } else {
                    None
                };
                let mut statements = dialect.add_column(
                    table,
                    column,
                    foreign_key.as_ref(),
                    self.type_context(table, column.name()),
                )?;
                statements.extend(self.generator.column_comment(table, column));
                Ok(statements)
            }
            MigrationStep::DropColumn { table, column } => dialect.drop_column(table, column),
            MigrationStep::AddPrimaryKey { table, primary_key } => {
                dialect.add_primary_key(table, primary_key)
            }
            MigrationStep::AddUnique { table, unique } => dialect.add_unique(table, unique),
            MigrationStep::AddIndex { table, index } => dialect.create_index(table, index),
            MigrationStep::AddForeignKey { table, foreign_key } => {
                let inline = caps.inline_foreign_keys
                    && (self.created.contains(table.as_str())
                        || self
                            .added_columns
                            .contains(&(table.as_str(), foreign_key.column.as_str())));
                if inline {
                    return Ok(Vec::new());
                }
                dialect.add_foreign_key(table, foreign_key)
            }
            MigrationStep::CreateTrigger { table } => {
                dialect.trigger().create_statements(dialect, table)
            }
            MigrationStep::CreateView { view } => self.generator.create_view(view),
            other => Err(GenerateError::malformed(
                format!("migration step {other}"),
                "step kind is not supported by this generator",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use meta_forge_core::types::{Column, DataType, DialectKind, Table};

    use super::*;

    fn person(columns: Vec<Column>) -> SqlMeta {
        let table = columns
            .into_iter()
            .fold(
                Table::builder("Person")
                    .column(Column::builder("Id", DataType::Integer).not_null().build().unwrap()),
                |builder, column| builder.column(column),
            )
            .primary_key(&["Id"])
            .build()
            .unwrap();
        SqlMeta::builder().table(table).build().unwrap()
    }

    #[test]
    fn identical_schemas_only_update_the_version() {
        let schema = person(Vec::new());
        let script = MigrationGenerator::script(
            &schema,
            &schema,
            &SqlGenerator::new(DialectKind::PostgreSql),
            8,
            &MigrationOptions::default(),
        )
        .unwrap();
        assert_eq!(script.executable_len(), 1);
        assert_eq!(
            script.statements().last().map(|s| s.sql.as_str()),
            Some("UPDATE SchemaVersion SET Version = 8")
        );
        assert_eq!(
            script.statements()[0].sql,
            "Migration from version 7 to 8 for PostgreSQL"
        );
    }

    #[test]
    fn version_marker_names_are_configurable() {
        let schema = person(Vec::new());
        let options = MigrationOptions {
            version_table: "Meta".into(),
            version_column: "Level".into(),
            additional: None,
        };
        let sql = MigrationGenerator::generate(
            &schema,
            &schema,
            &SqlGenerator::new(DialectKind::Oracle),
            2,
            &options,
        )
        .unwrap();
        assert!(sql.ends_with("UPDATE Meta SET \"LEVEL\" = 2;\n"), "{sql}");
    }

    #[test]
    fn parameterised_additional_statements_are_rejected() {
        use meta_forge_core::types::{BinaryOp, Delete, Dml, DmlStatement, Expr};

        let schema = person(Vec::new());
        let additional = SqlMeta::builder()
            .statement(DmlStatement::new(
                "Purge",
                Dml::Delete(Delete::new(
                    "Person",
                    Some(Expr::binary(
                        BinaryOp::Eq,
                        Expr::column("Id"),
                        Expr::Parameter { name: "id".into() },
                    )),
                )),
            ))
            .build()
            .unwrap();
        let options = MigrationOptions::default().with_additional(additional);
        let err = MigrationGenerator::generate(
            &schema,
            &schema,
            &SqlGenerator::new(DialectKind::MySql),
            3,
            &options,
        )
        .unwrap_err();
        assert!(matches!(err, GenerateError::Malformed { .. }));
    }

    #[test]
    fn sqlite_added_column_carries_its_reference() {
        use meta_forge_core::types::Reference;

        let old = person(Vec::new());
        let new = person(vec![Column::builder("ParentId", DataType::Integer)
            .references(Reference::new("Person", "Id"))
            .build()
            .unwrap()]);
        let sql = MigrationGenerator::generate(
            &old,
            &new,
            &SqlGenerator::new(DialectKind::Sqlite),
            5,
            &MigrationOptions::default(),
        )
        .unwrap();
        assert!(sql.contains(
            "ALTER TABLE Person ADD COLUMN ParentId INTEGER REFERENCES Person (Id);"
        ), "{sql}");
        assert!(!sql.contains("ADD CONSTRAINT"), "{sql}");
    }
}
