use std::path::PathBuf;

use meta_forge_sql::SqlGenerator;

use crate::cli::GenerateArgs;
use crate::commands::{parse_sources, resolve_dialects};
use crate::config::CliConfig;
use crate::error::CliError;
use crate::output::{write_file, write_stdout, OutputContext, OutputMode};

/// Run the `generate` command: write one creation script per dialect.
pub fn run(args: GenerateArgs, config: &CliConfig, output: &OutputContext) -> Result<(), CliError> {
    let dialects = resolve_dialects(&args.generators, config)?;
    if args.output_file.is_some() && dialects.len() > 1 {
        return Err(CliError::OutputFileNeedsSingleDialect {
            count: dialects.len(),
        });
    }

    let meta = parse_sources(&args.sql, config)?;

    // Every script is rendered before anything is written, so a failing
    // dialect leaves no partial output behind.
    let mut scripts = Vec::with_capacity(dialects.len());
    for kind in &dialects {
        let generator = SqlGenerator::new(*kind);
        let script = generator.full_script(&meta)?;
        let text = generator.render(&script);
        tracing::info!(
            dialect = %kind,
            statements = script.executable_len(),
            "script generated"
        );
        scripts.push((*kind, script.executable_len(), text));
    }

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir).map_err(|e| CliError::Io {
            path: dir.clone(),
            source: e,
        })?;
    }

    let mut written = Vec::new();
    for (kind, statements, text) in &scripts {
        let target: Option<PathBuf> = match (&args.output_file, &args.output_dir) {
            (Some(file), _) => Some(file.clone()),
            (None, Some(dir)) => Some(dir.join(format!("{}.sql", kind.id()))),
            (None, None) => None,
        };
        match &target {
            Some(path) => {
                write_file(path, text)?;
                output.status(&format!("  {} .... {}", kind.display_name(), path.display()));
            }
            None => write_stdout(text)?,
        }
        written.push(serde_json::json!({
            "dialect": kind.id(),
            "statements": statements,
            "path": target.as_ref().map(|p| p.display().to_string()),
        }));
    }

    let to_files = args.output_file.is_some() || args.output_dir.is_some();
    match output.mode {
        OutputMode::Human => {
            if to_files {
                output.success(&format!("{} script(s) written", scripts.len()));
            }
        }
        OutputMode::Json => {
            if to_files {
                output.print_json(&serde_json::json!({ "scripts": written }));
            }
        }
        OutputMode::Plain => {}
    }

    Ok(())
}
