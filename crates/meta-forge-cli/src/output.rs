use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use console::{Style, Term};

use crate::cli::GlobalOpts;
use crate::diagnostic::render_diagnostics;
use crate::error::CliError;

/// How messages and errors are rendered; selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

impl OutputMode {
    fn from_format(format: &str) -> Self {
        match format {
            "json" => Self::Json,
            "plain" => Self::Plain,
            _ => Self::Human,
        }
    }
}

/// Where the CLI's own messages go.
///
/// Scripts are written to stdout or files; status lines and errors go to
/// stderr so a generated script can be piped.
pub struct OutputContext {
    pub mode: OutputMode,
    pub verbose: u8,
    pub quiet: bool,
    pub use_color: bool,
}

impl OutputContext {
    pub fn from_global(global: &GlobalOpts) -> Self {
        let dumb_terminal = std::env::var("TERM").is_ok_and(|term| term == "dumb");
        Self {
            mode: OutputMode::from_format(&global.format),
            verbose: global.verbose,
            quiet: global.quiet,
            use_color: !global.no_color && !dumb_terminal && Term::stderr().is_term(),
        }
    }

    /// Status lines are only shown to a human who did not ask for quiet.
    fn chatty(&self) -> bool {
        self.mode == OutputMode::Human && !self.quiet
    }

    fn label(&self, text: &str, style: Style) -> String {
        if self.use_color {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Reports a finished parse, generation, or migration.
    pub fn success(&self, msg: &str) {
        if self.chatty() {
            eprintln!("{} {msg}", self.label("ok", Style::new().green().bold()));
        }
    }

    pub fn status(&self, msg: &str) {
        if self.chatty() {
            eprintln!("{msg}");
        }
    }

    /// A status line shown only with `-v`.
    pub fn detail(&self, msg: &str) {
        if self.verbose > 0 {
            self.status(msg);
        }
    }

    pub fn print_json(&self, value: &serde_json::Value) {
        if let Ok(text) = serde_json::to_string_pretty(value) {
            println!("{text}");
        }
    }

    /// Syntax errors get source snippets in human mode and one
    /// `path<TAB>offset<TAB>error<TAB>message` line each in plain mode.
    pub fn print_error(&self, err: &CliError) {
        match (self.mode, err) {
            (OutputMode::Json, _) => eprintln!("{}", err.to_json()),
            (OutputMode::Plain, CliError::Parse { errors, sources }) => {
                for (path, _, located) in sources.errors_by_file(errors) {
                    for (span, error) in located {
                        eprintln!("{}\t{}\terror\t{error}", path.display(), span.start);
                    }
                }
            }
            (OutputMode::Plain, _) => eprintln!("error\t{err}"),
            (OutputMode::Human, _) => {
                if let CliError::Parse { errors, sources } = err {
                    for report in render_diagnostics(errors, sources) {
                        eprintln!("{report:?}");
                    }
                }
                eprintln!("{} {err}", self.label("error:", Style::new().red().bold()));
            }
        }
    }
}

/// Writes a script to `path` in one buffered write, flushed before returning.
pub fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    let io_err = |source: std::io::Error| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    writer.write_all(contents.as_bytes()).map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "script written");
    Ok(())
}

pub fn write_stdout(contents: &str) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    out.write_all(contents.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|source| CliError::Io {
            path: "<stdout>".into(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(format: &str, quiet: bool) -> OutputContext {
        OutputContext::from_global(&GlobalOpts {
            config: None,
            format: format.into(),
            verbose: 0,
            quiet,
            no_color: true,
        })
    }

    #[test]
    fn format_selects_mode() {
        assert_eq!(context("human", false).mode, OutputMode::Human);
        assert_eq!(context("json", false).mode, OutputMode::Json);
        assert_eq!(context("plain", false).mode, OutputMode::Plain);
    }

    #[test]
    fn status_lines_only_for_humans() {
        assert!(context("human", false).chatty());
        assert!(!context("human", true).chatty());
        assert!(!context("json", false).chatty());
        assert!(!context("plain", false).chatty());
    }

    #[test]
    fn no_color_leaves_labels_plain() {
        let ctx = context("human", false);
        assert!(!ctx.use_color);
        assert_eq!(ctx.label("ok", Style::new().green()), "ok");
    }

    #[test]
    fn write_file_replaces_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.sql");
        std::fs::write(&path, "old contents that are longer").unwrap();
        write_file(&path, "SELECT 1;\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "SELECT 1;\n");
    }

    #[test]
    fn write_file_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing/out.sql");
        let err = write_file(&path, "x").unwrap_err();
        assert!(matches!(&err, CliError::Io { path: p, .. } if *p == path));
    }
}
