//! The rendered form of a generation run: an ordered list of statements
//! plus the dialect rules for separating them.

/// How a dialect separates statements in a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementDelimiter {
    /// Appended to every plain statement.
    pub terminator: &'static str,
    /// Written before a procedural block, e.g. a `DELIMITER` switch.
    pub block_prefix: Option<&'static str>,
    /// Appended to every procedural block (trigger or routine body).
    pub block_terminator: &'static str,
    /// Written on its own line after every statement, e.g. `GO`.
    pub batch_separator: Option<&'static str>,
}

impl StatementDelimiter {
    /// `;` after every statement, blocks included.
    pub const SEMICOLON: Self = Self {
        terminator: ";",
        block_prefix: None,
        block_terminator: ";",
        batch_separator: None,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Plain,
    /// A procedural body that contains its own `;`-terminated statements.
    Block,
    /// A script comment; never terminated.
    Comment,
}

/// One statement of a script, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: String,
}

impl Statement {
    pub fn plain(sql: impl Into<String>) -> Self {
        Self {
            kind: StatementKind::Plain,
            sql: sql.into(),
        }
    }

    pub fn block(sql: impl Into<String>) -> Self {
        Self {
            kind: StatementKind::Block,
            sql: sql.into(),
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            kind: StatementKind::Comment,
            sql: text.into(),
        }
    }

    pub fn is_comment(&self) -> bool {
        self.kind == StatementKind::Comment
    }

    /// Renders the statement with the dialect's terminators.
    pub fn render(&self, delimiter: &StatementDelimiter) -> String {
        match self.kind {
            StatementKind::Comment => self
                .sql
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        "--".to_string()
                    } else {
                        format!("-- {line}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
            StatementKind::Plain => {
                let mut out = format!("{}{}", self.sql, delimiter.terminator);
                push_batch(&mut out, delimiter);
                out
            }
            StatementKind::Block => {
                let mut out = String::new();
                if let Some(prefix) = delimiter.block_prefix {
                    out.push_str(prefix);
                }
                out.push_str(&self.sql);
                out.push_str(delimiter.block_terminator);
                push_batch(&mut out, delimiter);
                out
            }
        }
    }
}

fn push_batch(out: &mut String, delimiter: &StatementDelimiter) {
    if let Some(separator) = delimiter.batch_separator {
        out.push('\n');
        out.push_str(separator);
    }
}

/// An ordered list of statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    statements: Vec<Statement>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    pub fn extend(&mut self, statements: impl IntoIterator<Item = Statement>) {
        self.statements.extend(statements);
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Number of statements that are not comments.
    pub fn executable_len(&self) -> usize {
        self.statements.iter().filter(|s| !s.is_comment()).count()
    }

    /// Renders the script. A comment sits directly above what follows it;
    /// every other statement is followed by a blank line.
    pub fn render(&self, delimiter: &StatementDelimiter) -> String {
        let mut out = String::new();
        let mut previous_comment = false;
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                out.push('\n');
                if !previous_comment {
                    out.push('\n');
                }
            }
            out.push_str(&statement.render(delimiter));
            previous_comment = statement.is_comment();
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GO: StatementDelimiter = StatementDelimiter {
        terminator: "",
        block_prefix: None,
        block_terminator: "",
        batch_separator: Some("go"),
    };

    const MYSQL: StatementDelimiter = StatementDelimiter {
        terminator: ";",
        block_prefix: Some("DELIMITER //\n"),
        block_terminator: "\n//\nDELIMITER ;",
        batch_separator: None,
    };

    #[test]
    fn plain_statements_get_terminators() {
        let statement = Statement::plain("DROP TABLE T");
        assert_eq!(statement.render(&StatementDelimiter::SEMICOLON), "DROP TABLE T;");
        assert_eq!(statement.render(&GO), "DROP TABLE T\ngo");
    }

    #[test]
    fn blocks_switch_delimiters() {
        let block = Statement::block("CREATE TRIGGER X\nBEGIN\n    DELETE FROM T;\nEND");
        assert_eq!(
            block.render(&MYSQL),
            "DELIMITER //\nCREATE TRIGGER X\nBEGIN\n    DELETE FROM T;\nEND\n//\nDELIMITER ;"
        );
    }

    #[test]
    fn comments_are_never_terminated() {
        let comment = Statement::comment("first\n\nsecond");
        assert_eq!(comment.render(&GO), "-- first\n--\n-- second");
    }

    #[test]
    fn script_layout() {
        let mut script = Script::new();
        script.push(Statement::comment("header"));
        script.push(Statement::comment("Customer: people"));
        script.push(Statement::plain("CREATE TABLE Customer (Id INT)"));
        script.push(Statement::plain("DROP TABLE Old"));
        assert_eq!(script.executable_len(), 2);
        assert_eq!(
            script.render(&StatementDelimiter::SEMICOLON),
            "-- header\n-- Customer: people\nCREATE TABLE Customer (Id INT);\n\nDROP TABLE Old;\n"
        );
    }

    #[test]
    fn empty_script_renders_nothing() {
        assert_eq!(Script::new().render(&StatementDelimiter::SEMICOLON), "");
    }
}
