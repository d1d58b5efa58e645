use meta_forge_sql::{MigrationGenerator, MigrationOptions, SqlGenerator};

use crate::cli::DiffArgs;
use crate::commands::{parse_sources, resolve_dialects};
use crate::config::CliConfig;
use crate::error::CliError;
use crate::output::{write_file, write_stdout, OutputContext, OutputMode};

/// Run the `diff` command: migrate from `--old-version` to the next version.
pub fn run(args: DiffArgs, config: &CliConfig, output: &OutputContext) -> Result<(), CliError> {
    let requested: Vec<String> = args.generator.iter().cloned().collect();
    let kind = *resolve_dialects(&requested, config)?
        .first()
        .ok_or(CliError::NoDialect)?;

    let new_version = args.old_version.checked_add(1).ok_or_else(|| CliError::Config {
        message: format!("--old-version {} has no successor", args.old_version),
    })?;

    let old = parse_sources(&args.from, config)?;
    let new = parse_sources(&args.to, config)?;

    let mut options = MigrationOptions {
        version_table: args
            .version_table
            .unwrap_or_else(|| config.migration.version_table.clone()),
        version_column: args
            .version_column
            .unwrap_or_else(|| config.migration.version_column.clone()),
        additional: None,
    };
    if !args.additional.is_empty() {
        options = options.with_additional(parse_sources(&args.additional, config)?);
    }

    let generator = SqlGenerator::new(kind);
    let script = MigrationGenerator::script(&old, &new, &generator, new_version, &options)?;
    let text = generator.render(&script);
    tracing::info!(
        dialect = %kind,
        from = args.old_version,
        to = new_version,
        statements = script.executable_len(),
        "migration generated"
    );

    match &args.output_file {
        Some(path) => {
            write_file(path, &text)?;
            match output.mode {
                OutputMode::Human => output.success(&format!(
                    "migration {} -> {new_version} for {} written to {}",
                    args.old_version,
                    kind.display_name(),
                    path.display()
                )),
                OutputMode::Json => output.print_json(&serde_json::json!({
                    "dialect": kind.id(),
                    "from": args.old_version,
                    "to": new_version,
                    "statements": script.executable_len(),
                    "path": path.display().to_string(),
                })),
                OutputMode::Plain => {}
            }
        }
        None => write_stdout(&text)?,
    }

    Ok(())
}
