use crate::error::SchemaError;

/// Checks that `s` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate_identifier(s: &str) -> Result<(), SchemaError> {
    if is_identifier(s) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_identifiers() {
        for name in ["Customer", "_x", "a1", "SCHEMA_VERSION"] {
            assert!(is_identifier(name), "expected valid: {name}");
        }
    }

    #[test]
    fn invalid_identifiers() {
        for name in ["", "1a", "a-b", "a b", "ä"] {
            assert!(!is_identifier(name), "expected invalid: {name}");
        }
    }
}
