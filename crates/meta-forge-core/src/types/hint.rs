use std::fmt;

use serde::{Deserialize, Serialize};

use super::dialect_kind::DialectKind;

/// The kind of artifact a hint is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintTarget {
    Table,
    Column,
    Index,
    View,
}

impl fmt::Display for HintTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Column => write!(f, "column"),
            Self::Index => write!(f, "index"),
            Self::View => write!(f, "view"),
        }
    }
}

/// Hint keys, as written in `DBMS HINTS` blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HintKey {
    ColumnType,
    Enumeration,
    Truncate,
    EmptyAsNull,
    Tablespace,
    Options,
}

impl HintKey {
    pub const ALL: [HintKey; 6] = [
        Self::ColumnType,
        Self::Enumeration,
        Self::Truncate,
        Self::EmptyAsNull,
        Self::Tablespace,
        Self::Options,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Self::ColumnType => "COLUMN_TYPE",
            Self::Enumeration => "ENUMERATION",
            Self::Truncate => "TRUNCATE",
            Self::EmptyAsNull => "EMPTY_AS_NULL",
            Self::Tablespace => "TABLESPACE",
            Self::Options => "OPTIONS",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == keyword)
    }

    /// Whether the key carries a `= 'value'` part.
    pub fn takes_value(self) -> bool {
        !matches!(self, Self::Truncate | Self::EmptyAsNull)
    }

    /// Whether the key may appear on the given artifact kind.
    pub fn allowed_on(self, target: HintTarget) -> bool {
        match self {
            Self::ColumnType | Self::Enumeration | Self::Truncate | Self::EmptyAsNull => {
                target == HintTarget::Column
            }
            Self::Tablespace => matches!(target, HintTarget::Table | HintTarget::Index),
            Self::Options => matches!(target, HintTarget::Table | HintTarget::View),
        }
    }
}

impl fmt::Display for HintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// A typed per-artifact annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "hint", content = "value", rename_all = "snake_case")]
pub enum Hint {
    /// Replaces the mapped native column type.
    ColumnType(String),
    /// Maps the column to an application enumeration.
    Enumeration(String),
    /// Values longer than the column are truncated on write.
    TruncateOnWrite,
    /// Empty strings are written as NULL.
    EmptyAsNull,
    /// Storage location for a table or index.
    Tablespace(String),
    /// Raw options appended after a table or view definition.
    Options(String),
}

impl Hint {
    /// Builds a hint from its key and optional value.
    ///
    /// Returns `None` when a value-carrying key has no value.
    pub fn from_parts(key: HintKey, value: Option<String>) -> Option<Self> {
        match key {
            HintKey::ColumnType => value.map(Self::ColumnType),
            HintKey::Enumeration => value.map(Self::Enumeration),
            HintKey::Truncate => Some(Self::TruncateOnWrite),
            HintKey::EmptyAsNull => Some(Self::EmptyAsNull),
            HintKey::Tablespace => value.map(Self::Tablespace),
            HintKey::Options => value.map(Self::Options),
        }
    }

    pub fn key(&self) -> HintKey {
        match self {
            Self::ColumnType(_) => HintKey::ColumnType,
            Self::Enumeration(_) => HintKey::Enumeration,
            Self::TruncateOnWrite => HintKey::Truncate,
            Self::EmptyAsNull => HintKey::EmptyAsNull,
            Self::Tablespace(_) => HintKey::Tablespace,
            Self::Options(_) => HintKey::Options,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::ColumnType(v)
            | Self::Enumeration(v)
            | Self::Tablespace(v)
            | Self::Options(v) => Some(v),
            Self::TruncateOnWrite | Self::EmptyAsNull => None,
        }
    }
}

/// Which dialects a hint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "dialect", rename_all = "lowercase")]
pub enum HintScope {
    All,
    Dialect(DialectKind),
}

impl HintScope {
    pub fn applies_to(self, kind: DialectKind) -> bool {
        match self {
            Self::All => true,
            Self::Dialect(k) => k == kind,
        }
    }
}

impl fmt::Display for HintScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "ALL"),
            Self::Dialect(k) => write!(f, "{}", k.keyword()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopedHint {
    pub scope: HintScope,
    pub hint: Hint,
}

/// The hints owned by one artifact, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hints(Vec<ScopedHint>);

impl Hints {
    pub fn new(entries: Vec<ScopedHint>) -> Self {
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScopedHint> {
        self.0.iter()
    }

    /// The hints that apply to `kind`.
    ///
    /// A dialect-scoped hint shadows an `ALL` hint with the same key.
    pub fn for_dialect(&self, kind: DialectKind) -> Vec<&Hint> {
        let mut result: Vec<&Hint> = Vec::new();
        for entry in self.0.iter().filter(|e| e.scope.applies_to(kind)) {
            let shadowed = entry.scope == HintScope::All
                && self.0.iter().any(|other| {
                    other.scope == HintScope::Dialect(kind) && other.hint.key() == entry.hint.key()
                });
            if !shadowed {
                result.push(&entry.hint);
            }
        }
        result
    }

    fn find(&self, kind: DialectKind, key: HintKey) -> Option<&Hint> {
        self.for_dialect(kind).into_iter().find(|h| h.key() == key)
    }

    fn value_of(&self, kind: DialectKind, key: HintKey) -> Option<&str> {
        self.find(kind, key).and_then(Hint::value)
    }

    pub fn column_type(&self, kind: DialectKind) -> Option<&str> {
        self.value_of(kind, HintKey::ColumnType)
    }

    pub fn tablespace(&self, kind: DialectKind) -> Option<&str> {
        self.value_of(kind, HintKey::Tablespace)
    }

    pub fn options(&self, kind: DialectKind) -> Option<&str> {
        self.value_of(kind, HintKey::Options)
    }

    /// Enumeration mapping; persistence generators read this dialect-independently.
    pub fn enumeration(&self) -> Option<&str> {
        self.0.iter().find_map(|e| match &e.hint {
            Hint::Enumeration(v) => Some(v.as_str()),
            _ => None,
        })
    }

    pub fn truncate_on_write(&self) -> bool {
        self.0.iter().any(|e| e.hint == Hint::TruncateOnWrite)
    }

    pub fn empty_as_null(&self) -> bool {
        self.0.iter().any(|e| e.hint == Hint::EmptyAsNull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scoped(scope: HintScope, hint: Hint) -> ScopedHint {
        ScopedHint { scope, hint }
    }

    #[test]
    fn dialect_hint_shadows_all() {
        let hints = Hints::new(vec![
            scoped(HintScope::All, Hint::ColumnType("TEXT".into())),
            scoped(
                HintScope::Dialect(DialectKind::Oracle),
                Hint::ColumnType("NCLOB".into()),
            ),
        ]);
        assert_eq!(hints.column_type(DialectKind::Oracle), Some("NCLOB"));
        assert_eq!(hints.column_type(DialectKind::MySql), Some("TEXT"));
        assert_eq!(hints.for_dialect(DialectKind::Oracle).len(), 1);
    }

    #[test]
    fn dialect_hint_invisible_to_other_dialects() {
        let hints = Hints::new(vec![scoped(
            HintScope::Dialect(DialectKind::Oracle),
            Hint::Tablespace("USERS".into()),
        )]);
        assert_eq!(hints.tablespace(DialectKind::Oracle), Some("USERS"));
        assert_eq!(hints.tablespace(DialectKind::Db2), None);
    }

    #[test]
    fn flags() {
        let hints = Hints::new(vec![
            scoped(HintScope::All, Hint::TruncateOnWrite),
            scoped(HintScope::All, Hint::Enumeration("Kind".into())),
        ]);
        assert!(hints.truncate_on_write());
        assert!(!hints.empty_as_null());
        assert_eq!(hints.enumeration(), Some("Kind"));
    }

    #[test]
    fn key_placement_rules() {
        assert!(HintKey::ColumnType.allowed_on(HintTarget::Column));
        assert!(!HintKey::ColumnType.allowed_on(HintTarget::Table));
        assert!(HintKey::Tablespace.allowed_on(HintTarget::Index));
        assert!(HintKey::Options.allowed_on(HintTarget::View));
        assert!(!HintKey::Truncate.allowed_on(HintTarget::View));
    }

    #[test]
    fn from_parts_requires_value() {
        assert_eq!(Hint::from_parts(HintKey::Tablespace, None), None);
        assert_eq!(
            Hint::from_parts(HintKey::Truncate, None),
            Some(Hint::TruncateOnWrite)
        );
        for key in HintKey::ALL {
            assert_eq!(HintKey::from_keyword(key.keyword()), Some(key));
        }
    }
}
