use std::path::PathBuf;

use meta_forge_core::types::UnknownDialect;
use meta_forge_dsl::DslError;
use meta_forge_sql::GenerateError;

use crate::sources::SourceSet;

/// Process exit status of `meta-forge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// Reading a source or writing a script failed.
    Io = 1,
    /// Bad flags, configuration, dialect names, or source paths.
    Usage = 2,
    /// The schema sources have syntax errors.
    Syntax = 3,
    /// A script could not be generated from a valid schema.
    Generation = 4,
}

/// Every way a `meta-forge` command can fail.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Syntax errors from meta-forge-dsl, with the sources they point into.
    #[error("{} syntax error(s) in {}", .errors.len(), file_list(.sources))]
    Parse {
        errors: Vec<DslError>,
        sources: SourceSet,
    },

    /// Semantic errors raised while generating SQL.
    #[error("generation failed: {0}")]
    Generate(#[from] GenerateError),

    /// A source or output path that could not be read or written.
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A malformed or unreadable `meta-forge.toml`, or an unusable flag value.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// A dialect name that is not one of the supported generators.
    #[error("{0} (run 'meta-forge dialects' for the supported names)")]
    UnknownDialect(#[from] UnknownDialect),

    /// Neither `--generator` nor `[generate] dialect` names a dialect.
    #[error("no target dialect given: pass --generator or set [generate] dialect")]
    NoDialect,

    /// `--output-file` used with more than one dialect.
    #[error("--output-file takes a single dialect, got {count}; use --output-dir")]
    OutputFileNeedsSingleDialect { count: usize },

    /// A source path that matched no files.
    #[error("no .meta sources found at {path}")]
    NoSourceFiles { path: PathBuf },
}

fn file_list(sources: &SourceSet) -> String {
    let names: Vec<String> = sources
        .files()
        .iter()
        .map(|f| f.path.display().to_string())
        .collect();
    if names.is_empty() {
        "input".to_string()
    } else {
        names.join(", ")
    }
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Parse { .. } => ExitCode::Syntax,
            Self::Generate(_) => ExitCode::Generation,
            Self::Config { .. }
            | Self::UnknownDialect(_)
            | Self::NoDialect
            | Self::OutputFileNeedsSingleDialect { .. }
            | Self::NoSourceFiles { .. } => ExitCode::Usage,
            Self::Io { .. } => ExitCode::Io,
        }
    }

    /// The error as printed by `--format json`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Parse { errors, sources } => {
                let error_list: Vec<serde_json::Value> = sources
                    .errors_by_file(errors)
                    .into_iter()
                    .flat_map(|(path, _, list)| {
                        list.into_iter().map(move |(span, e)| {
                            serde_json::json!({
                                "file": path.display().to_string(),
                                "start": span.start,
                                "end": span.end,
                                "message": e.to_string(),
                            })
                        })
                    })
                    .collect();
                serde_json::json!({
                    "error": "parse_error",
                    "errors": error_list,
                })
            }
            Self::Generate(e) => serde_json::json!({
                "error": "generation_error",
                "message": e.to_string(),
            }),
            Self::Io { path, source } => serde_json::json!({
                "error": "io_error",
                "path": path.display().to_string(),
                "message": source.to_string(),
            }),
            Self::Config { message } => serde_json::json!({
                "error": "config_error",
                "message": message,
            }),
            Self::UnknownDialect(_)
            | Self::NoDialect
            | Self::OutputFileNeedsSingleDialect { .. }
            | Self::NoSourceFiles { .. } => serde_json::json!({
                "error": "usage_error",
                "message": self.to_string(),
            }),
        }
    }
}
