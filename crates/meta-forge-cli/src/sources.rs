use std::path::{Path, PathBuf};

use meta_forge_core::types::SqlMeta;
use meta_forge_dsl::{DslError, Span};

use crate::error::CliError;

/// One input file and where its text starts in the combined source.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub offset: usize,
    pub len: usize,
}

/// Input files concatenated into one parse unit.
///
/// Spans reported against the combined text can be mapped back to the file
/// they came from with [`SourceSet::locate`].
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    files: Vec<SourceFile>,
    text: String,
}

impl SourceSet {
    /// Reads every file matched by `paths` in argument order. Directories are
    /// searched recursively for `*.<extension>`.
    pub fn load(paths: &[PathBuf], extension: &str) -> Result<Self, CliError> {
        let files = discover_source_files(paths, extension)?;
        let mut set = Self::default();
        for file in &files {
            let text = std::fs::read_to_string(file).map_err(|e| CliError::Io {
                path: file.clone(),
                source: e,
            })?;
            set.push(file.clone(), &text);
        }
        tracing::debug!(files = set.files.len(), bytes = set.text.len(), "sources loaded");
        Ok(set)
    }

    /// Appends one file's text. Each file is followed by a newline so a
    /// trailing line comment cannot swallow the next file.
    pub fn push(&mut self, path: PathBuf, text: &str) {
        let offset = self.text.len();
        self.text.push_str(text);
        self.text.push('\n');
        self.files.push(SourceFile {
            path,
            offset,
            len: text.len(),
        });
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parses the combined text.
    pub fn parse(&self) -> Result<SqlMeta, CliError> {
        meta_forge_dsl::parse(&self.text).map_err(|errors| CliError::Parse {
            errors,
            sources: self.clone(),
        })
    }

    /// The file holding `span`, that file's text, and the span relative to it.
    pub fn locate(&self, span: &Span) -> Option<(&Path, &str, Span)> {
        let file = self
            .files
            .iter()
            .rev()
            .find(|f| f.offset <= span.start)?;
        let end = file.offset + file.len;
        let text = &self.text[file.offset..end];
        let local = Span::new(
            span.start - file.offset,
            span.end.min(end).saturating_sub(file.offset),
        );
        Some((&file.path, text, local))
    }

    /// Groups errors by the file they point into, preserving error order.
    pub fn errors_by_file<'a>(
        &'a self,
        errors: &'a [DslError],
    ) -> Vec<(&'a Path, &'a str, Vec<(Span, &'a DslError)>)> {
        let mut grouped: Vec<(&Path, &str, Vec<(Span, &DslError)>)> = Vec::new();
        for error in errors {
            let Some((path, text, span)) = self.locate(error.span()) else {
                continue;
            };
            match grouped.iter_mut().find(|(p, _, _)| *p == path) {
                Some((_, _, list)) => list.push((span, error)),
                None => grouped.push((path, text, vec![(span, error)])),
            }
        }
        grouped
    }
}

/// Resolves file and directory arguments to source files.
///
/// Files are used as given, in argument order; directories contribute their
/// `**/*.<extension>` matches in sorted order. Duplicates keep their first
/// position.
pub fn discover_source_files(paths: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>, CliError> {
    let mut files: Vec<PathBuf> = Vec::new();

    for path in paths {
        if path.is_file() {
            if !files.contains(path) {
                files.push(path.clone());
            }
        } else if path.is_dir() {
            let pattern = format!("{}/**/*.{extension}", path.display());
            let entries = glob::glob(&pattern).map_err(|e| CliError::Config {
                message: format!("invalid source pattern {pattern}: {e}"),
            })?;
            let mut found = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|e| CliError::Io {
                    path: e.path().to_path_buf(),
                    source: e.into_error(),
                })?;
                found.push(entry);
            }
            found.sort();
            for entry in found {
                if !files.contains(&entry) {
                    files.push(entry);
                }
            }
        } else {
            return Err(CliError::NoSourceFiles { path: path.clone() });
        }
    }

    if files.is_empty() {
        let display_path = paths.first().cloned().unwrap_or_else(|| PathBuf::from("."));
        return Err(CliError::NoSourceFiles { path: display_path });
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_nonexistent_path() {
        let result = discover_source_files(&[PathBuf::from("/nonexistent/path")], "meta");
        assert!(matches!(result, Err(CliError::NoSourceFiles { .. })));
    }

    #[test]
    fn discover_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = discover_source_files(&[dir.path().to_path_buf()], "meta");
        assert!(result.is_err());
    }

    #[test]
    fn discover_uses_configured_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.meta"), "").unwrap();
        std::fs::write(dir.path().join("b.sqlmeta"), "").unwrap();
        let files = discover_source_files(&[dir.path().to_path_buf()], "sqlmeta").unwrap();
        assert_eq!(files, vec![dir.path().join("b.sqlmeta")]);
    }

    #[test]
    fn discover_keeps_argument_order_and_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let second = dir.path().join("z.meta");
        let first = dir.path().join("a.meta");
        std::fs::write(&second, "").unwrap();
        std::fs::write(&first, "").unwrap();
        let files =
            discover_source_files(&[second.clone(), first.clone(), second.clone()], "meta")
                .unwrap();
        assert_eq!(files, vec![second, first]);
    }

    #[test]
    fn locate_maps_spans_back_to_their_file() {
        let mut set = SourceSet::default();
        set.push(PathBuf::from("a.meta"), "AAAA");
        set.push(PathBuf::from("b.meta"), "BBBBBB");
        // "AAAA\nBBBBBB\n": b.meta starts at 5.
        let (path, text, span) = set.locate(&Span::new(7, 9)).unwrap();
        assert_eq!(path, Path::new("b.meta"));
        assert_eq!(text, "BBBBBB");
        assert_eq!(span, Span::new(2, 4));

        let (path, _, span) = set.locate(&Span::new(1, 2)).unwrap();
        assert_eq!(path, Path::new("a.meta"));
        assert_eq!(span, Span::new(1, 2));
    }

    #[test]
    fn files_are_concatenated_before_parsing() {
        let mut set = SourceSet::default();
        set.push(
            PathBuf::from("kind.meta"),
            "CREATE TABLE Kind (Id INTEGER NOT NULL PRIMARY KEY); -- trailing",
        );
        set.push(
            PathBuf::from("item.meta"),
            "CREATE TABLE Item (Id INTEGER NOT NULL PRIMARY KEY, KindId INTEGER REFERENCES Kind(Id));",
        );
        let meta = set.parse().unwrap();
        assert_eq!(meta.tables().len(), 2);
    }

    #[test]
    fn parse_errors_are_grouped_by_file() {
        let mut set = SourceSet::default();
        set.push(
            PathBuf::from("good.meta"),
            "CREATE TABLE Kind (Id INTEGER NOT NULL PRIMARY KEY);",
        );
        set.push(PathBuf::from("bad.meta"), "CREATE TABLE ;");
        let Err(CliError::Parse { errors, sources }) = set.parse() else {
            panic!("expected parse errors");
        };
        let grouped = sources.errors_by_file(&errors);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].0, Path::new("bad.meta"));
    }
}
