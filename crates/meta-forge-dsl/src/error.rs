use std::fmt;

use meta_forge_core::error::SchemaError;

/// A byte-offset span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl Span {
    /// Creates a new span from start (inclusive) to end (exclusive).
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Syntax errors produced while parsing `.meta` source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DslError {
    /// The lexer encountered characters that do not match any rule.
    InvalidToken { text: String, span: Span },

    /// The parser encountered an unexpected token.
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    /// The parser reached the end of input when more tokens were expected.
    UnexpectedEndOfInput { expected: String, span: Span },

    /// An integer literal does not fit its target.
    InvalidIntegerLiteral { text: String, span: Span },

    /// A hint block names a dialect that does not exist.
    UnknownDialect { name: String, span: Span },

    /// A hint block uses a key that does not exist.
    UnknownHint { key: String, span: Span },

    /// A hint key is not allowed on this kind of artifact.
    MisplacedHint {
        key: String,
        target: String,
        span: Span,
    },

    /// A hint key that needs `= 'value'` has none.
    MissingHintValue { key: String, span: Span },

    /// A flag hint was given a value.
    UnexpectedHintValue { key: String, span: Span },

    /// Two artifacts of the same kind share an id.
    DuplicateArtifact {
        kind: &'static str,
        name: String,
        span: Span,
    },

    /// A model invariant was violated by an otherwise well-formed artifact.
    CoreSchemaError { source: SchemaError, span: Span },
}

impl DslError {
    /// The source range the error points at.
    pub fn span(&self) -> &Span {
        match self {
            Self::InvalidToken { span, .. }
            | Self::UnexpectedToken { span, .. }
            | Self::UnexpectedEndOfInput { span, .. }
            | Self::InvalidIntegerLiteral { span, .. }
            | Self::UnknownDialect { span, .. }
            | Self::UnknownHint { span, .. }
            | Self::MisplacedHint { span, .. }
            | Self::MissingHintValue { span, .. }
            | Self::UnexpectedHintValue { span, .. }
            | Self::DuplicateArtifact { span, .. }
            | Self::CoreSchemaError { span, .. } => span,
        }
    }
}

impl fmt::Display for DslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken { text, span } => {
                write!(f, "invalid token '{text}' at {span}")
            }
            Self::UnexpectedToken {
                expected,
                found,
                span,
            } => {
                write!(
                    f,
                    "unexpected token at {span}: expected {expected}, found {found}"
                )
            }
            Self::UnexpectedEndOfInput { expected, .. } => {
                write!(f, "unexpected end of input: expected {expected}")
            }
            Self::InvalidIntegerLiteral { text, span } => {
                write!(
                    f,
                    "invalid integer literal '{text}' at {span}: value out of range"
                )
            }
            Self::UnknownDialect { name, span } => {
                write!(f, "unknown dialect '{name}' at {span}")
            }
            Self::UnknownHint { key, span } => {
                write!(f, "unknown hint '{key}' at {span}")
            }
            Self::MisplacedHint { key, target, span } => {
                write!(f, "hint '{key}' at {span} is not allowed on a {target}")
            }
            Self::MissingHintValue { key, span } => {
                write!(f, "hint '{key}' at {span} requires a value: {key} = '...'")
            }
            Self::UnexpectedHintValue { key, span } => {
                write!(f, "hint '{key}' at {span} does not take a value")
            }
            Self::DuplicateArtifact { kind, name, span } => {
                write!(f, "duplicate {kind} '{name}' at {span}")
            }
            Self::CoreSchemaError { source, span } => {
                write!(f, "schema validation error at {span}: {source}")
            }
        }
    }
}

impl std::error::Error for DslError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CoreSchemaError { source, .. } => Some(source),
            _ => None,
        }
    }
}
