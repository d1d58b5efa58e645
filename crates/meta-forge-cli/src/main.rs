mod cli;
mod commands;
mod config;
#[allow(unused_assignments)]
mod diagnostic;
mod error;
mod output;
mod sources;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::GlobalOpts;
use crate::error::{CliError, ExitCode};
use crate::output::OutputContext;

fn main() {
    let cli = cli::Cli::parse_from(cli::expand_legacy_flags(std::env::args_os()));
    let output = OutputContext::from_global(&cli.global);
    init_logging(&cli.global, &output);

    if !output.use_color {
        let _ = miette::set_hook(Box::new(|_| {
            Box::new(miette::MietteHandlerOpts::new().color(false).build())
        }));
    }

    let result = run(cli, &output);

    match result {
        Ok(()) => std::process::exit(ExitCode::Success as i32),
        Err(e) => {
            output.print_error(&e);
            std::process::exit(e.exit_code() as i32);
        }
    }
}

fn run(cli: cli::Cli, output: &OutputContext) -> Result<(), CliError> {
    let config = config::load_config(cli.global.config.as_deref())?;
    match cli.command {
        cli::Commands::Parse(args) => commands::parse::run(args, &config, output),
        cli::Commands::Generate(args) => commands::generate::run(args, &config, output),
        cli::Commands::Diff(args) => commands::diff::run(args, &config, output),
        cli::Commands::Dialects => {
            commands::dialects::run(output);
            Ok(())
        }
        cli::Commands::Completions(args) => {
            commands::completions::run(args);
            Ok(())
        }
    }
}

/// Logs go to stderr. `RUST_LOG` wins over the verbosity flags.
fn init_logging(global: &GlobalOpts, output: &OutputContext) {
    let default_level = match (global.quiet, global.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(output.use_color)
        .with_target(global.verbose > 1)
        .without_time()
        .compact()
        .try_init();
}
