use meta_forge_core::error::SchemaError;
use meta_forge_core::types::{DialectKind, HintKey, HintTarget};
use meta_forge_dsl::{DslError, Span};
use miette::{Diagnostic, NamedSource, SourceSpan};

use crate::sources::SourceSet;

/// A diagnostic wrapping a `DslError` for rich miette rendering.
///
/// The module-level `#[allow(unused_assignments)]` in main.rs is required
/// because miette's derive macro generates assignment patterns that rustc
/// flags as unused.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct MetaDiagnostic {
    #[source_code]
    src: NamedSource<String>,

    #[label("{label}")]
    span: SourceSpan,

    message: String,
    label: String,

    #[help]
    suggestion: Option<String>,
}

/// Convert a `DslError` into a miette `MetaDiagnostic`.
///
/// `span` is the error's span relative to `source`, which may differ from
/// the span stored in the error when several files were concatenated.
pub fn dsl_error_to_diagnostic(
    error: &DslError,
    span: &Span,
    source: &str,
    filename: &str,
) -> MetaDiagnostic {
    let named_src = NamedSource::new(filename, source.to_string());
    let at = |span: &Span| -> SourceSpan { (span.start, span.len()).into() };

    let (message, label, suggestion) = match error {
        DslError::InvalidToken { text, .. } => (
            format!("invalid token '{text}'"),
            "unrecognized token".to_string(),
            Some("Check for typos or unsupported characters.".to_string()),
        ),

        DslError::UnexpectedToken {
            expected, found, ..
        } => (
            format!("unexpected token: expected {expected}, found {found}"),
            format!("expected {expected}"),
            None,
        ),

        DslError::UnexpectedEndOfInput { expected, .. } => (
            format!("unexpected end of input: expected {expected}"),
            "input ended here".to_string(),
            Some(format!("Add {expected} to complete the definition.")),
        ),

        DslError::InvalidIntegerLiteral { text, .. } => (
            format!("invalid integer literal '{text}'"),
            "value out of range".to_string(),
            None,
        ),

        DslError::UnknownDialect { name, .. } => (
            format!("unknown dialect '{name}'"),
            "not a dialect name".to_string(),
            Some(format!("Use ALL or one of: {}.", dialect_keywords())),
        ),

        DslError::UnknownHint { key, .. } => (
            format!("unknown hint '{key}'"),
            "not a hint key".to_string(),
            Some(format!("Valid hint keys: {}.", hint_keywords())),
        ),

        DslError::MisplacedHint { key, target, .. } => (
            format!("hint '{key}' is not allowed on a {target}"),
            format!("not valid on a {target}"),
            allowed_targets(key).map(|targets| format!("{key} may be used on: {targets}.")),
        ),

        DslError::MissingHintValue { key, .. } => (
            format!("hint '{key}' requires a value"),
            "value missing".to_string(),
            Some(format!("Write {key} = '...'.")),
        ),

        DslError::UnexpectedHintValue { key, .. } => (
            format!("hint '{key}' does not take a value"),
            "unexpected value".to_string(),
            Some(format!("Remove the value and write {key} alone.")),
        ),

        DslError::DuplicateArtifact { kind, name, .. } => (
            format!("duplicate {kind} '{name}'"),
            "already defined".to_string(),
            Some(format!("Rename one of the {kind}s named '{name}'.")),
        ),

        DslError::CoreSchemaError { source, .. } => (
            format!("schema validation error: {source}"),
            "validation failed".to_string(),
            schema_suggestion(source),
        ),

        _ => (error.to_string(), "error".to_string(), None),
    };

    MetaDiagnostic {
        src: named_src,
        span: at(span),
        message,
        label,
        suggestion,
    }
}

/// Render all parse errors using miette, one report per error, each against
/// the file it points into.
pub fn render_diagnostics(errors: &[DslError], sources: &SourceSet) -> Vec<miette::Report> {
    sources
        .errors_by_file(errors)
        .into_iter()
        .flat_map(|(path, text, list)| {
            let filename = path.display().to_string();
            list.into_iter()
                .map(move |(span, e)| {
                    miette::Report::new(dsl_error_to_diagnostic(e, &span, text, &filename))
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn dialect_keywords() -> String {
    DialectKind::ALL
        .iter()
        .map(|k| k.keyword())
        .collect::<Vec<_>>()
        .join(", ")
}

fn hint_keywords() -> String {
    HintKey::ALL
        .iter()
        .map(|k| k.keyword())
        .collect::<Vec<_>>()
        .join(", ")
}

fn allowed_targets(key: &str) -> Option<String> {
    let key = HintKey::from_keyword(key)?;
    let targets: Vec<String> = [
        HintTarget::Table,
        HintTarget::Column,
        HintTarget::Index,
        HintTarget::View,
    ]
    .into_iter()
    .filter(|t| key.allowed_on(*t))
    .map(|t| t.to_string())
    .collect();
    Some(targets.join(", "))
}

fn schema_suggestion(error: &SchemaError) -> Option<String> {
    let text = match error {
        SchemaError::MissingPrimaryKey(table) => {
            format!("Add PRIMARY KEY to a column of {table} or a PRIMARY KEY (...) element.")
        }
        SchemaError::MultiplePrimaryKeys(table) => {
            format!("Keep a single primary key on {table}; list every key column in it.")
        }
        SchemaError::UnknownColumn { table, column, .. } => {
            format!("Declare column '{column}' in {table} or fix the name.")
        }
        SchemaError::EmptyTrigger(_) => {
            "Add at least one statement inside ON DELETE ( ... ).".to_string()
        }
        SchemaError::ViewArity { expected, .. } => {
            format!("Each SELECT must yield exactly {expected} value(s).")
        }
        SchemaError::InsertArity { .. } => {
            "List one value per column in the INSERT.".to_string()
        }
        _ => return None,
    };
    Some(text)
}
