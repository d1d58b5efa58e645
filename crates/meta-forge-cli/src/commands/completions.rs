use clap::CommandFactory;

use crate::cli::{Cli, CompletionsArgs};

/// Writes the completion script for `args.shell` to stdout.
pub fn run(args: CompletionsArgs) {
    clap_complete::generate(args.shell, &mut Cli::command(), "meta-forge", &mut std::io::stdout());
}
