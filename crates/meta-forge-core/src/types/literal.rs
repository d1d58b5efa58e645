use std::fmt;

use serde::{Deserialize, Serialize};

/// A constant value in an expression or default clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Null,
    Integer(i64),
    /// Kept as written so precision survives a round trip.
    Decimal(String),
    String(String),
}

impl Literal {
    /// Renders a string as a single-quoted SQL literal, doubling embedded quotes.
    pub fn quote_str(s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "{}", Self::quote_str(s)),
        }
    }
}

/// A column default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    Literal(Literal),
    CurrentTimestamp,
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(l) => write!(f, "{l}"),
            Self::CurrentTimestamp => write!(f, "CURRENT_TIMESTAMP"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literal_escapes_quotes() {
        assert_eq!(Literal::String("it's".into()).to_string(), "'it''s'");
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(Literal::Integer(-3).to_string(), "-3");
        assert_eq!(Literal::Decimal("1.50".into()).to_string(), "1.50");
        assert_eq!(Literal::Null.to_string(), "NULL");
    }

    #[test]
    fn default_display() {
        assert_eq!(DefaultValue::CurrentTimestamp.to_string(), "CURRENT_TIMESTAMP");
        assert_eq!(
            DefaultValue::Literal(Literal::Integer(0)).to_string(),
            "0"
        );
    }
}
