use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::types::{
    Column, ForeignKey, Index, PrimaryKey, SqlMeta, Table, UniqueConstraint, View,
};

// ---------------------------------------------------------------------------
// RecreateOptions
// ---------------------------------------------------------------------------

/// Which dependent objects a dialect must drop before, and re-create after,
/// changing the type or nullability of a column they include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RecreateOptions {
    pub foreign_keys: bool,
    pub primary_keys: bool,
    pub unique_constraints: bool,
    pub indexes: bool,
    /// Column defaults are separate objects and must be re-established after
    /// any type or nullability change.
    pub defaults: bool,
}

impl RecreateOptions {
    pub const ALL: Self = Self {
        foreign_keys: true,
        primary_keys: true,
        unique_constraints: true,
        indexes: true,
        defaults: true,
    };

    pub const NONE: Self = Self {
        foreign_keys: false,
        primary_keys: false,
        unique_constraints: false,
        indexes: false,
        defaults: false,
    };

    pub const fn foreign_keys_only() -> Self {
        Self {
            foreign_keys: true,
            ..Self::NONE
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnChange
// ---------------------------------------------------------------------------

/// The aspects of a column that differ between two schema versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct ColumnChange {
    pub data_type: bool,
    pub nullability: bool,
    pub default: bool,
}

impl ColumnChange {
    pub fn between(before: &Column, after: &Column) -> Self {
        Self {
            data_type: before.data_type() != after.data_type(),
            nullability: before.is_nullable() != after.is_nullable(),
            default: before.default_value() != after.default_value(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.data_type || self.nullability || self.default)
    }

    /// Type or nullability changed; dependent constraints may need recreation.
    pub fn is_structural(&self) -> bool {
        self.data_type || self.nullability
    }
}

impl fmt::Display for ColumnChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [
            (self.data_type, "type"),
            (self.nullability, "nullability"),
            (self.default, "default"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect();
        write!(f, "{}", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// MigrationStep
// ---------------------------------------------------------------------------

/// A single schema mutation. Steps carry the artifacts they act on so a
/// dialect can render them without consulting either schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step")]
#[non_exhaustive]
pub enum MigrationStep {
    DropView {
        view: View,
    },
    /// Drops the delete trigger(s) generated for the old table.
    DropTrigger {
        table: Table,
    },
    DropForeignKey {
        table: String,
        foreign_key: ForeignKey,
    },
    DropUnique {
        table: String,
        unique: UniqueConstraint,
    },
    DropIndex {
        table: String,
        index: Index,
    },
    DropPrimaryKey {
        table: String,
        primary_key: PrimaryKey,
    },
    DropTable {
        table: Table,
    },
    /// Creates a table with its primary key, unique constraints, and indexes.
    CreateTable {
        table: Table,
    },
    AlterColumn {
        table: String,
        before: Column,
        after: Column,
        change: ColumnChange,
    },
    AddColumn {
        table: String,
        column: Column,
    },
    DropColumn {
        table: String,
        column: Column,
    },
    AddPrimaryKey {
        table: String,
        primary_key: PrimaryKey,
    },
    AddUnique {
        table: String,
        unique: UniqueConstraint,
    },
    AddIndex {
        table: String,
        index: Index,
    },
    AddForeignKey {
        table: String,
        foreign_key: ForeignKey,
    },
    CreateTrigger {
        table: Table,
    },
    CreateView {
        view: View,
    },
}

impl MigrationStep {
    /// Steps that create keys, foreign keys, triggers, or views, which all
    /// come after every column change.
    pub fn creates_dependent(&self) -> bool {
        matches!(
            self,
            Self::AddPrimaryKey { .. }
                | Self::AddUnique { .. }
                | Self::AddIndex { .. }
                | Self::AddForeignKey { .. }
                | Self::CreateTrigger { .. }
                | Self::CreateView { .. }
        )
    }

    /// The table the step mutates, if any.
    pub fn table_name(&self) -> Option<&str> {
        match self {
            Self::DropView { .. } | Self::CreateView { .. } => None,
            Self::DropTrigger { table }
            | Self::DropTable { table }
            | Self::CreateTable { table }
            | Self::CreateTrigger { table } => Some(table.name()),
            Self::DropForeignKey { table, .. }
            | Self::DropUnique { table, .. }
            | Self::DropIndex { table, .. }
            | Self::DropPrimaryKey { table, .. }
            | Self::AlterColumn { table, .. }
            | Self::AddColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::AddPrimaryKey { table, .. }
            | Self::AddUnique { table, .. }
            | Self::AddIndex { table, .. }
            | Self::AddForeignKey { table, .. } => Some(table),
        }
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DropView { view } => write!(f, "DROP view '{}'", view.name()),
            Self::DropTrigger { table } => write!(f, "DROP trigger on '{}'", table.name()),
            Self::DropForeignKey { table, foreign_key } => {
                write!(f, "DROP foreign key '{}' on '{table}'", foreign_key.name)
            }
            Self::DropUnique { table, unique } => {
                write!(f, "DROP unique '{}' on '{table}'", unique.name)
            }
            Self::DropIndex { table, index } => {
                write!(f, "DROP index '{}' on '{table}'", index.name)
            }
            Self::DropPrimaryKey { table, primary_key } => {
                write!(f, "DROP primary key '{}' on '{table}'", primary_key.name)
            }
            Self::DropTable { table } => write!(f, "DROP table '{}'", table.name()),
            Self::CreateTable { table } => write!(
                f,
                "CREATE table '{}' with {} columns",
                table.name(),
                table.columns().len()
            ),
            Self::AlterColumn {
                table,
                after,
                change,
                ..
            } => write!(f, "ALTER column '{table}.{}' ({change})", after.name()),
            Self::AddColumn { table, column } => {
                write!(f, "ADD column '{table}.{}'", column.name())
            }
            Self::DropColumn { table, column } => {
                write!(f, "DROP column '{table}.{}'", column.name())
            }
            Self::AddPrimaryKey { table, primary_key } => {
                write!(f, "ADD primary key '{}' on '{table}'", primary_key.name)
            }
            Self::AddUnique { table, unique } => {
                write!(f, "ADD unique '{}' on '{table}'", unique.name)
            }
            Self::AddIndex { table, index } => {
                write!(f, "ADD index '{}' on '{table}'", index.name)
            }
            Self::AddForeignKey { table, foreign_key } => write!(
                f,
                "ADD foreign key '{}' on '{table}' -> {}",
                foreign_key.name, foreign_key.reference
            ),
            Self::CreateTrigger { table } => write!(f, "CREATE trigger on '{}'", table.name()),
            Self::CreateView { view } => write!(f, "CREATE view '{}'", view.name()),
        }
    }
}

// ---------------------------------------------------------------------------
// MigrationPlan
// ---------------------------------------------------------------------------

/// An ordered list of steps turning one schema version into the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationPlan {
    pub steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    pub fn new(steps: Vec<MigrationStep>) -> Self {
        Self { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MigrationStep> + ExactSizeIterator {
        self.steps.iter()
    }

    /// Adds column alters after the existing column changes, ahead of the
    /// steps that re-create keys, foreign keys, triggers, and views.
    pub fn insert_column_alters(&mut self, alters: impl IntoIterator<Item = MigrationStep>) {
        let at = self
            .steps
            .iter()
            .position(MigrationStep::creates_dependent)
            .unwrap_or(self.steps.len());
        self.steps.splice(at..at, alters);
    }

    /// Names of tables created by this plan.
    pub fn created_tables(&self) -> HashSet<&str> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                MigrationStep::CreateTable { table } => Some(table.name()),
                _ => None,
            })
            .collect()
    }

    /// Names of tables dropped by this plan.
    pub fn dropped_tables(&self) -> HashSet<&str> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                MigrationStep::DropTable { table } => Some(table.name()),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for MigrationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Migration plan ({} steps)", self.steps.len())?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "  {}. {step}", i + 1)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DiffEngine
// ---------------------------------------------------------------------------

/// Pure function module for computing schema diffs.
pub struct DiffEngine;

impl DiffEngine {
    /// Compares two schemas and produces a dependency-ordered plan.
    ///
    /// Drops run before the columns they include are altered or dropped;
    /// re-creations run after every referenced column exists. Iteration
    /// follows declaration order, so equal inputs always yield equal plans.
    pub fn diff(old: &SqlMeta, new: &SqlMeta, recreate: &RecreateOptions) -> MigrationPlan {
        let ctx = DiffContext::new(old, new, *recreate);
        let mut steps = Vec::new();

        ctx.drop_views(&mut steps);
        ctx.drop_triggers(&mut steps);
        ctx.drop_foreign_keys(&mut steps);
        ctx.drop_keys_and_indexes(&mut steps);
        ctx.drop_tables(&mut steps);
        ctx.create_tables(&mut steps);
        ctx.change_columns(&mut steps);
        ctx.add_keys_and_indexes(&mut steps);
        ctx.add_foreign_keys(&mut steps);
        ctx.create_triggers(&mut steps);
        ctx.create_views(&mut steps);

        tracing::debug!(steps = steps.len(), "computed schema diff");
        MigrationPlan::new(steps)
    }
}

/// Column-level differences of a table present in both schemas.
struct TableDiff<'a> {
    old: &'a Table,
    new: &'a Table,
    altered: Vec<(&'a Column, &'a Column, ColumnChange)>,
    added: Vec<&'a Column>,
    dropped: Vec<&'a Column>,
}

impl<'a> TableDiff<'a> {
    fn new(old: &'a Table, new: &'a Table, recreate: RecreateOptions) -> Self {
        let mut altered = Vec::new();
        let mut added = Vec::new();
        for after in new.columns() {
            match old.find_column(after.name()) {
                Some(before) => {
                    let mut change = ColumnChange::between(before, after);
                    if recreate.defaults
                        && change.is_structural()
                        && after.default_value().is_some()
                    {
                        change.default = true;
                    }
                    if !change.is_empty() {
                        altered.push((before, after, change));
                    }
                }
                None => added.push(after),
            }
        }
        let dropped = old
            .columns()
            .iter()
            .filter(|c| new.find_column(c.name()).is_none())
            .collect();
        Self {
            old,
            new,
            altered,
            added,
            dropped,
        }
    }

    fn is_restructured(&self, column: &str) -> bool {
        self.altered
            .iter()
            .any(|(_, after, change)| change.is_structural() && after.name() == column)
    }

    fn touches(&self, columns: &[String]) -> bool {
        columns.iter().any(|c| self.is_restructured(c))
    }

    /// Whether views reading this table must be rebuilt.
    fn changes_columns(&self) -> bool {
        !self.altered.is_empty() || !self.dropped.is_empty()
    }
}

/// Keyed-object decisions for one surviving table.
#[derive(Default)]
struct KeyPlan<'a> {
    drop_primary_key: bool,
    drop_uniques: Vec<&'a UniqueConstraint>,
    add_uniques: Vec<&'a UniqueConstraint>,
    drop_indexes: Vec<&'a Index>,
    add_indexes: Vec<&'a Index>,
}

struct DiffContext<'a> {
    old: &'a SqlMeta,
    new: &'a SqlMeta,
    recreate: RecreateOptions,
    surviving: Vec<TableDiff<'a>>,
    keys: Vec<KeyPlan<'a>>,
    dropped_tables: Vec<&'a Table>,
    created_tables: Vec<&'a Table>,
    /// `(table, column)` pairs that lose their primary-key or unique backing.
    unkeyed: HashSet<(&'a str, &'a str)>,
    dropped_views: Vec<&'a View>,
}

impl<'a> DiffContext<'a> {
    fn new(old: &'a SqlMeta, new: &'a SqlMeta, recreate: RecreateOptions) -> Self {
        let surviving: Vec<TableDiff<'a>> = new
            .tables()
            .iter()
            .filter_map(|t| old.find_table(t.name()).map(|o| TableDiff::new(o, t, recreate)))
            .collect();
        let dropped_tables = old
            .tables()
            .iter()
            .filter(|t| new.find_table(t.name()).is_none())
            .collect();
        let created_tables = new
            .tables()
            .iter()
            .filter(|t| old.find_table(t.name()).is_none())
            .collect();

        let keys: Vec<KeyPlan<'a>> = surviving
            .iter()
            .map(|td| Self::plan_keys(td, recreate))
            .collect();

        let mut unkeyed = HashSet::new();
        for (td, kp) in surviving.iter().zip(&keys) {
            let name = td.old.name();
            if kp.drop_primary_key {
                for c in &td.old.primary_key().columns {
                    unkeyed.insert((name, c.as_str()));
                }
            }
            for uq in &kp.drop_uniques {
                for c in &uq.columns {
                    unkeyed.insert((name, c.as_str()));
                }
            }
        }

        let mut ctx = Self {
            old,
            new,
            recreate,
            surviving,
            keys,
            dropped_tables,
            created_tables,
            unkeyed,
            dropped_views: Vec::new(),
        };
        ctx.dropped_views = ctx.plan_view_drops();
        ctx
    }

    fn plan_keys(td: &TableDiff<'a>, recreate: RecreateOptions) -> KeyPlan<'a> {
        let mut kp = KeyPlan {
            drop_primary_key: td.old.primary_key() != td.new.primary_key()
                || (recreate.primary_keys && td.touches(&td.old.primary_key().columns)),
            ..KeyPlan::default()
        };

        let rebuild_unique = |uq: &UniqueConstraint| {
            recreate.unique_constraints && td.touches(&uq.columns)
        };
        for uq in td.old.unique_constraints() {
            let counterpart = td.new.unique_constraints().iter().find(|n| n.name == uq.name);
            if counterpart != Some(uq) || rebuild_unique(uq) {
                kp.drop_uniques.push(uq);
            }
        }
        for uq in td.new.unique_constraints() {
            let counterpart = td.old.unique_constraints().iter().find(|o| o.name == uq.name);
            if counterpart != Some(uq) || rebuild_unique(uq) {
                kp.add_uniques.push(uq);
            }
        }

        let rebuild_index = |ix: &Index| recreate.indexes && td.touches(&ix.columns);
        for ix in td.old.indexes() {
            let counterpart = td.new.indexes().iter().find(|n| n.name == ix.name);
            if counterpart != Some(ix) || rebuild_index(ix) {
                kp.drop_indexes.push(ix);
            }
        }
        for ix in td.new.indexes() {
            let counterpart = td.old.indexes().iter().find(|o| o.name == ix.name);
            if counterpart != Some(ix) || rebuild_index(ix) {
                kp.add_indexes.push(ix);
            }
        }
        kp
    }

    fn surviving(&self, table: &str) -> Option<&TableDiff<'a>> {
        self.surviving.iter().find(|td| td.new.name() == table)
    }

    /// A foreign key of a surviving table that must be dropped and re-added
    /// even though its definition did not change.
    fn must_rebuild(&self, td: &TableDiff<'a>, fk: &ForeignKey) -> bool {
        let target = &fk.reference;
        if self.unkeyed.contains(&(target.table.as_str(), target.column.as_str())) {
            return true;
        }
        if !self.recreate.foreign_keys {
            return false;
        }
        td.is_restructured(&fk.column)
            || self
                .surviving(&target.table)
                .is_some_and(|t| t.is_restructured(&target.column))
    }

    fn plan_view_drops(&self) -> Vec<&'a View> {
        let affected: HashSet<&str> = self
            .dropped_tables
            .iter()
            .map(|t| t.name())
            .chain(
                self.surviving
                    .iter()
                    .filter(|td| td.changes_columns())
                    .map(|td| td.old.name()),
            )
            .collect();

        let mut dropped: HashSet<&str> = HashSet::new();
        loop {
            let before = dropped.len();
            for view in self.old.views() {
                if dropped.contains(view.name()) {
                    continue;
                }
                let changed = self.new.find_view(view.name()) != Some(view);
                let depends = view
                    .referenced_tables()
                    .iter()
                    .any(|t| affected.contains(t) || dropped.contains(t));
                if changed || depends {
                    dropped.insert(view.name());
                }
            }
            if dropped.len() == before {
                break;
            }
        }

        self.old
            .views()
            .iter()
            .filter(|v| dropped.contains(v.name()))
            .collect()
    }

    // Phase 1
    fn drop_views(&self, steps: &mut Vec<MigrationStep>) {
        for view in self.dropped_views.iter().rev() {
            steps.push(MigrationStep::DropView {
                view: (*view).clone(),
            });
        }
    }

    // Phase 2
    fn drop_triggers(&self, steps: &mut Vec<MigrationStep>) {
        for td in &self.surviving {
            if td.old.has_trigger() && td.old.on_delete() != td.new.on_delete() {
                steps.push(MigrationStep::DropTrigger {
                    table: td.old.clone(),
                });
            }
        }
    }

    // Phase 3
    fn drop_foreign_keys(&self, steps: &mut Vec<MigrationStep>) {
        for table in &self.dropped_tables {
            for fk in table.foreign_keys() {
                steps.push(MigrationStep::DropForeignKey {
                    table: table.name().to_string(),
                    foreign_key: fk,
                });
            }
        }
        for td in &self.surviving {
            let new_fks = td.new.foreign_keys();
            for fk in td.old.foreign_keys() {
                let unchanged = new_fks.iter().any(|n| *n == fk);
                if !unchanged || self.must_rebuild(td, &fk) {
                    steps.push(MigrationStep::DropForeignKey {
                        table: td.old.name().to_string(),
                        foreign_key: fk,
                    });
                }
            }
        }
    }

    // Phase 4
    fn drop_keys_and_indexes(&self, steps: &mut Vec<MigrationStep>) {
        for (td, kp) in self.surviving.iter().zip(&self.keys) {
            let table = td.old.name();
            for uq in &kp.drop_uniques {
                steps.push(MigrationStep::DropUnique {
                    table: table.to_string(),
                    unique: (*uq).clone(),
                });
            }
            for ix in &kp.drop_indexes {
                steps.push(MigrationStep::DropIndex {
                    table: table.to_string(),
                    index: (*ix).clone(),
                });
            }
            if kp.drop_primary_key {
                steps.push(MigrationStep::DropPrimaryKey {
                    table: table.to_string(),
                    primary_key: td.old.primary_key().clone(),
                });
            }
        }
    }

    // Phase 5
    fn drop_tables(&self, steps: &mut Vec<MigrationStep>) {
        for table in &self.dropped_tables {
            steps.push(MigrationStep::DropTable {
                table: (*table).clone(),
            });
        }
    }

    // Phase 6
    fn create_tables(&self, steps: &mut Vec<MigrationStep>) {
        for table in &self.created_tables {
            steps.push(MigrationStep::CreateTable {
                table: (*table).clone(),
            });
        }
    }

    // Phase 7
    fn change_columns(&self, steps: &mut Vec<MigrationStep>) {
        for td in &self.surviving {
            let table = td.new.name();
            for (before, after, change) in &td.altered {
                steps.push(MigrationStep::AlterColumn {
                    table: table.to_string(),
                    before: (*before).clone(),
                    after: (*after).clone(),
                    change: *change,
                });
            }
            for column in &td.added {
                steps.push(MigrationStep::AddColumn {
                    table: table.to_string(),
                    column: (*column).clone(),
                });
            }
            for column in &td.dropped {
                steps.push(MigrationStep::DropColumn {
                    table: table.to_string(),
                    column: (*column).clone(),
                });
            }
        }
    }

    // Phase 8
    fn add_keys_and_indexes(&self, steps: &mut Vec<MigrationStep>) {
        for (td, kp) in self.surviving.iter().zip(&self.keys) {
            let table = td.new.name();
            if kp.drop_primary_key {
                steps.push(MigrationStep::AddPrimaryKey {
                    table: table.to_string(),
                    primary_key: td.new.primary_key().clone(),
                });
            }
            for uq in &kp.add_uniques {
                steps.push(MigrationStep::AddUnique {
                    table: table.to_string(),
                    unique: (*uq).clone(),
                });
            }
            for ix in &kp.add_indexes {
                steps.push(MigrationStep::AddIndex {
                    table: table.to_string(),
                    index: (*ix).clone(),
                });
            }
        }
    }

    // Phase 9
    fn add_foreign_keys(&self, steps: &mut Vec<MigrationStep>) {
        let created: HashSet<&str> = self.created_tables.iter().map(|t| t.name()).collect();
        let surviving: HashMap<&str, &TableDiff<'a>> = self
            .surviving
            .iter()
            .map(|td| (td.new.name(), td))
            .collect();

        for table in self.new.tables() {
            let name = table.name();
            let old_fks = match surviving.get(name) {
                Some(td) => td.old.foreign_keys(),
                None if created.contains(name) => Vec::new(),
                None => continue,
            };
            for fk in table.foreign_keys() {
                let unchanged = old_fks.iter().any(|o| *o == fk);
                let rebuild = surviving
                    .get(name)
                    .is_some_and(|td| self.must_rebuild(td, &fk));
                if !unchanged || rebuild {
                    steps.push(MigrationStep::AddForeignKey {
                        table: name.to_string(),
                        foreign_key: fk,
                    });
                }
            }
        }
    }

    // Phase 10
    fn create_triggers(&self, steps: &mut Vec<MigrationStep>) {
        for table in self.new.tables() {
            if !table.has_trigger() {
                continue;
            }
            let changed = match self.old.find_table(table.name()) {
                Some(old) => old.on_delete() != table.on_delete(),
                None => true,
            };
            if changed {
                steps.push(MigrationStep::CreateTrigger {
                    table: table.clone(),
                });
            }
        }
    }

    // Phase 11
    fn create_views(&self, steps: &mut Vec<MigrationStep>) {
        for view in self.new.views() {
            let existed = self.old.find_view(view.name()).is_some();
            let rebuilt = self.dropped_views.iter().any(|d| d.name() == view.name());
            if !existed || rebuilt {
                steps.push(MigrationStep::CreateView { view: view.clone() });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, DefaultValue, Literal, Reference};

    fn int(name: &str) -> Column {
        Column::builder(name, DataType::Integer).not_null().build().unwrap()
    }

    fn varchar(name: &str, len: u32) -> Column {
        Column::builder(name, DataType::Varchar { length: len })
            .build()
            .unwrap()
    }

    fn schema(tables: Vec<Table>) -> SqlMeta {
        tables
            .into_iter()
            .fold(SqlMeta::builder(), |b, t| b.table(t))
            .build()
            .unwrap()
    }

    fn t(name: &str, extra: Vec<Column>) -> Table {
        extra
            .into_iter()
            .fold(Table::builder(name).column(int("Id")), |b, c| b.column(c))
            .primary_key(&["Id"])
            .build()
            .unwrap()
    }

    #[test]
    fn identical_schemas_produce_empty_plan() {
        let s = schema(vec![t("A", vec![varchar("Name", 10)])]);
        let plan = DiffEngine::diff(&s, &s, &RecreateOptions::ALL);
        assert!(plan.is_empty());
    }

    #[test]
    fn added_column_is_the_only_step() {
        let old = schema(vec![t("A", vec![])]);
        let new = schema(vec![t("A", vec![varchar("Name", 10)])]);
        let plan = DiffEngine::diff(&old, &new, &RecreateOptions::ALL);
        assert_eq!(plan.len(), 1);
        assert!(matches!(&plan.steps[0], MigrationStep::AddColumn { column, .. } if column.name() == "Name"));
    }

    #[test]
    fn table_created_and_dropped() {
        let old = schema(vec![t("A", vec![]), t("Gone", vec![])]);
        let new = schema(vec![t("A", vec![]), t("B", vec![])]);
        let plan = DiffEngine::diff(&old, &new, &RecreateOptions::NONE);
        let kinds: Vec<String> = plan.iter().map(|s| s.to_string()).collect();
        assert_eq!(kinds, vec!["DROP table 'Gone'", "CREATE table 'B' with 1 columns"]);
    }

    #[test]
    fn default_only_change_does_not_recreate_constraints() {
        let parent = |default: Option<i64>| {
            let mut col = Column::builder("Code", DataType::Integer).not_null();
            if let Some(d) = default {
                col = col.default_value(DefaultValue::Literal(Literal::Integer(d)));
            }
            Table::builder("P")
                .column(int("Id"))
                .column(col.build().unwrap())
                .primary_key(&["Id"])
                .unique(&["Code"])
                .build()
                .unwrap()
        };
        let old = schema(vec![parent(None)]);
        let new = schema(vec![parent(Some(1))]);
        let plan = DiffEngine::diff(&old, &new, &RecreateOptions::ALL);
        assert_eq!(plan.len(), 1);
        assert!(matches!(
            &plan.steps[0],
            MigrationStep::AlterColumn { change, .. } if change.default && !change.is_structural()
        ));
    }

    #[test]
    fn retyped_referenced_column_rebuilds_foreign_keys() {
        let child = Table::builder("C")
            .column(int("Id"))
            .column(
                Column::builder("PId", DataType::Integer)
                    .references(Reference::new("P", "Id"))
                    .build()
                    .unwrap(),
            )
            .primary_key(&["Id"])
            .build()
            .unwrap();
        let old = schema(vec![t("P", vec![]), child.clone()]);
        let p_new = Table::builder("P")
            .column(Column::builder("Id", DataType::BigInt).not_null().build().unwrap())
            .primary_key(&["Id"])
            .build()
            .unwrap();
        let new = schema(vec![p_new, child]);

        let plan = DiffEngine::diff(&old, &new, &RecreateOptions::foreign_keys_only());
        let names: Vec<String> = plan.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "DROP foreign key 'FK_C_PId' on 'C'",
                "ALTER column 'P.Id' (type)",
                "ADD foreign key 'FK_C_PId' on 'C' -> P(Id)",
            ]
        );
    }

    #[test]
    fn recreate_all_rebuilds_primary_key() {
        let old = schema(vec![t("A", vec![])]);
        let a_new = Table::builder("A")
            .column(Column::builder("Id", DataType::BigInt).not_null().build().unwrap())
            .primary_key(&["Id"])
            .build()
            .unwrap();
        let new = schema(vec![a_new]);
        let plan = DiffEngine::diff(&old, &new, &RecreateOptions::ALL);
        let names: Vec<String> = plan.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "DROP primary key 'PK_A' on 'A'",
                "ALTER column 'A.Id' (type)",
                "ADD primary key 'PK_A' on 'A'",
            ]
        );
    }

    #[test]
    fn recreate_defaults_marks_default_change() {
        let with_default = |dt: DataType| {
            Table::builder("A")
                .column(int("Id"))
                .column(
                    Column::builder("N", dt)
                        .default_value(DefaultValue::Literal(Literal::Integer(0)))
                        .build()
                        .unwrap(),
                )
                .primary_key(&["Id"])
                .build()
                .unwrap()
        };
        let old = schema(vec![with_default(DataType::Integer)]);
        let new = schema(vec![with_default(DataType::BigInt)]);

        let plan = DiffEngine::diff(&old, &new, &RecreateOptions::ALL);
        assert!(matches!(&plan.steps[0], MigrationStep::AlterColumn { change, .. } if change.default));

        let plan = DiffEngine::diff(&old, &new, &RecreateOptions::NONE);
        assert!(matches!(&plan.steps[0], MigrationStep::AlterColumn { change, .. } if !change.default));
    }

    #[test]
    fn plan_display_lists_steps() {
        let old = schema(vec![t("A", vec![])]);
        let new = schema(vec![t("A", vec![varchar("Name", 5)])]);
        let plan = DiffEngine::diff(&old, &new, &RecreateOptions::NONE);
        let text = plan.to_string();
        assert!(text.starts_with("Migration plan (1 steps)"));
        assert!(text.contains("1. ADD column 'A.Name'"));
    }

    #[test]
    fn inserted_alters_precede_new_indexes() {
        let old = schema(vec![t("A", vec![varchar("Name", 10)])]);
        let indexed = Table::builder("A")
            .column(int("Id"))
            .column(varchar("Name", 10))
            .column(varchar("Code", 5))
            .primary_key(&["Id"])
            .index("IX_A_Name", &["Name"])
            .build()
            .unwrap();
        let new = schema(vec![indexed]);
        let mut plan = DiffEngine::diff(&old, &new, &RecreateOptions::ALL);
        let name = varchar("Name", 10);
        plan.insert_column_alters([MigrationStep::AlterColumn {
            table: "A".into(),
            before: name.clone(),
            after: name,
            change: ColumnChange {
                data_type: true,
                ..ColumnChange::default()
            },
        }]);
        let steps: Vec<String> = plan.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            steps,
            vec![
                "ADD column 'A.Code'",
                "ALTER column 'A.Name' (type)",
                "ADD index 'IX_A_Name' on 'A'",
            ]
        );
    }
}
