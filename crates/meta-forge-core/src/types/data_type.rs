use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// The closed set of column types understood by every generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataType {
    Bit,
    Integer,
    BigInt,
    Float,
    Decimal { precision: u32, scale: u32 },
    Number {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    Char { length: u32 },
    Varchar { length: u32 },
    Clob,
    Date,
    Time,
    DateTime,
    Blob,
}

/// Groups types whose values convert into each other without data loss
/// concerns beyond length or precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Numeric,
    Character,
    Temporal,
    LargeCharacter,
    Binary,
}

impl DataType {
    /// Creates a `DECIMAL(p, s)`, validating `s <= p`.
    pub fn decimal(precision: u32, scale: u32) -> Result<Self, SchemaError> {
        if scale > precision {
            return Err(SchemaError::InvalidScale { precision, scale });
        }
        Ok(Self::Decimal { precision, scale })
    }

    /// Creates a `VARCHAR(n)`, validating `n >= 1`.
    pub fn varchar(length: u32) -> Result<Self, SchemaError> {
        if length == 0 {
            return Err(SchemaError::InvalidLength(length));
        }
        Ok(Self::Varchar { length })
    }

    /// Creates a `CHAR(n)`, validating `n >= 1`.
    pub fn char(length: u32) -> Result<Self, SchemaError> {
        if length == 0 {
            return Err(SchemaError::InvalidLength(length));
        }
        Ok(Self::Char { length })
    }

    pub fn family(&self) -> TypeFamily {
        match self {
            Self::Bit
            | Self::Integer
            | Self::BigInt
            | Self::Float
            | Self::Decimal { .. }
            | Self::Number { .. } => TypeFamily::Numeric,
            Self::Char { .. } | Self::Varchar { .. } => TypeFamily::Character,
            Self::Date | Self::Time | Self::DateTime => TypeFamily::Temporal,
            Self::Clob => TypeFamily::LargeCharacter,
            Self::Blob => TypeFamily::Binary,
        }
    }

    /// Returns the declared character length, if any.
    pub fn length(&self) -> Option<u32> {
        match self {
            Self::Char { length } | Self::Varchar { length } => Some(*length),
            _ => None,
        }
    }

    pub fn is_lob(&self) -> bool {
        matches!(self, Self::Clob | Self::Blob)
    }
}

/// Prints the type in schema-definition syntax.
impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bit => write!(f, "BIT"),
            Self::Integer => write!(f, "INTEGER"),
            Self::BigInt => write!(f, "BIGINT"),
            Self::Float => write!(f, "FLOAT"),
            Self::Decimal { precision, scale } => write!(f, "DECIMAL({precision}, {scale})"),
            Self::Number { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => write!(f, "NUMBER({p}, {s})"),
                (Some(p), None) => write!(f, "NUMBER({p})"),
                _ => write!(f, "NUMBER"),
            },
            Self::Char { length } => write!(f, "CHAR({length})"),
            Self::Varchar { length } => write!(f, "VARCHAR({length})"),
            Self::Clob => write!(f, "CLOB"),
            Self::Date => write!(f, "DATE"),
            Self::Time => write!(f, "TIME"),
            Self::DateTime => write!(f, "DATETIME"),
            Self::Blob => write!(f, "BLOB"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_rejects_scale_above_precision() {
        assert!(DataType::decimal(10, 2).is_ok());
        assert_eq!(
            DataType::decimal(2, 3),
            Err(SchemaError::InvalidScale {
                precision: 2,
                scale: 3
            })
        );
    }

    #[test]
    fn varchar_rejects_zero_length() {
        assert!(DataType::varchar(0).is_err());
        assert_eq!(DataType::varchar(20).unwrap().length(), Some(20));
    }

    #[test]
    fn families() {
        assert_eq!(DataType::Integer.family(), TypeFamily::Numeric);
        assert_eq!(
            DataType::Varchar { length: 3 }.family(),
            TypeFamily::Character
        );
        assert_eq!(DataType::Clob.family(), TypeFamily::LargeCharacter);
        assert_eq!(DataType::DateTime.family(), TypeFamily::Temporal);
        assert_eq!(DataType::Blob.family(), TypeFamily::Binary);
    }

    #[test]
    fn display_uses_dsl_syntax() {
        assert_eq!(
            DataType::Decimal {
                precision: 10,
                scale: 2
            }
            .to_string(),
            "DECIMAL(10, 2)"
        );
        assert_eq!(
            DataType::Number {
                precision: Some(5),
                scale: None
            }
            .to_string(),
            "NUMBER(5)"
        );
        assert_eq!(DataType::Varchar { length: 80 }.to_string(), "VARCHAR(80)");
    }

    #[test]
    fn serde_is_tagged() {
        let json = serde_json::to_value(DataType::Varchar { length: 4 }).unwrap();
        assert_eq!(json["type"], "varchar");
        assert_eq!(json["length"], 4);
    }
}
