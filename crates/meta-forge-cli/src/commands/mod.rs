pub mod completions;
pub mod dialects;
pub mod diff;
pub mod generate;
pub mod parse;

use std::path::PathBuf;

use meta_forge_core::types::{DialectKind, SqlMeta};

use crate::config::CliConfig;
use crate::error::CliError;
use crate::sources::SourceSet;

/// Loads and parses one group of source paths.
pub fn parse_sources(paths: &[PathBuf], config: &CliConfig) -> Result<SqlMeta, CliError> {
    SourceSet::load(paths, &config.cli.source_extension)?.parse()
}

/// Resolves the target dialects from `--generator` values, falling back to
/// `[generate] dialect`. Order is kept and repeats are dropped.
pub fn resolve_dialects(
    requested: &[String],
    config: &CliConfig,
) -> Result<Vec<DialectKind>, CliError> {
    let names: Vec<&str> = if requested.is_empty() {
        config.generate.dialect.as_deref().into_iter().collect()
    } else {
        requested.iter().map(String::as_str).collect()
    };

    let mut kinds = Vec::new();
    for name in names {
        let kind: DialectKind = name.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        return Err(CliError::NoDialect);
    }
    Ok(kinds)
}
