/// Words every supported dialect treats as reserved.
const COMMON_RESERVED: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CHECK", "COLUMN",
    "CONSTRAINT", "CREATE", "CROSS", "CURRENT", "CURRENT_DATE", "CURRENT_TIME",
    "CURRENT_TIMESTAMP", "CURRENT_USER", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE",
    "END", "EXISTS", "FALSE", "FETCH", "FOR", "FOREIGN", "FROM", "FULL", "GRANT", "GROUP",
    "HAVING", "IN", "INDEX", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "KEY", "LEFT",
    "LIKE", "NOT", "NULL", "OF", "ON", "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES", "RIGHT",
    "SELECT", "SET", "TABLE", "THEN", "TO", "TRIGGER", "TRUE", "UNION", "UNIQUE", "UPDATE",
    "USER", "USING", "VALUES", "VIEW", "WHEN", "WHERE", "WITH",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFolding {
    Preserve,
    Upper,
    Lower,
}

/// Identifier rules of a dialect: quoting, reserved words, case folding of
/// quoted names, and the maximum length of generated names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierStyle {
    pub open: char,
    pub close: char,
    /// Reserved in this dialect in addition to the common SQL keywords.
    pub reserved: &'static [&'static str],
    /// Applied to a name before quoting, so the quoted form matches what the
    /// database stores for the unquoted spelling.
    pub folding: CaseFolding,
    pub max_length: usize,
}

impl IdentifierStyle {
    pub const fn double_quoted(
        reserved: &'static [&'static str],
        folding: CaseFolding,
        max_length: usize,
    ) -> Self {
        Self {
            open: '"',
            close: '"',
            reserved,
            folding,
            max_length,
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        COMMON_RESERVED
            .iter()
            .chain(self.reserved)
            .any(|word| word.eq_ignore_ascii_case(name))
    }

    fn needs_quotes(&self, name: &str) -> bool {
        self.is_reserved(name) || !name.starts_with(|c: char| c.is_ascii_alphabetic())
    }

    /// Quotes `name` when it would not be a valid unquoted identifier.
    pub fn quote(&self, name: &str) -> String {
        if !self.needs_quotes(name) {
            return name.to_string();
        }
        let folded = match self.folding {
            CaseFolding::Preserve => name.to_string(),
            CaseFolding::Upper => name.to_ascii_uppercase(),
            CaseFolding::Lower => name.to_ascii_lowercase(),
        };
        format!("{}{folded}{}", self.open, self.close)
    }

    /// Fits a generated name (constraint, trigger, temporary column) into
    /// `max_length`. Long names keep a prefix and gain a hash suffix, so the
    /// same input always yields the same output.
    pub fn shorten(&self, name: &str) -> String {
        if name.len() <= self.max_length {
            return name.to_string();
        }
        let suffix = format!("_{:08X}", fnv1a(name));
        let keep = self.max_length.saturating_sub(suffix.len());
        let prefix: String = name.chars().take(keep).collect();
        format!("{prefix}{suffix}")
    }

    /// Shortens, then quotes.
    pub fn object_name(&self, name: &str) -> String {
        self.quote(&self.shorten(name))
    }
}

fn fnv1a(text: &str) -> u32 {
    text.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    })
}
