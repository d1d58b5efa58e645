use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Schema compiler for the `.meta` definition language.
///
/// meta-forge validates `.meta` schema files and turns them into creation
/// scripts and versioned migration scripts for nine SQL databases.
#[derive(Parser)]
#[command(
    name = "meta-forge",
    version,
    about = "Schema compiler for the .meta definition language",
    after_help = "Use 'meta-forge <command> --help' for more information about a command.",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Global options available to all subcommands.
#[derive(Args, Debug)]
pub struct GlobalOpts {
    /// Configuration file path [env: META_FORGE_CONFIG]
    #[arg(short = 'c', long = "config", global = true, env = "META_FORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format: human (default), json, plain
    #[arg(
        long,
        global = true,
        default_value = "human",
        value_parser = ["human", "json", "plain"]
    )]
    pub format: String,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all non-error output
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output [env: NO_COLOR]
    #[arg(long = "no-color", global = true, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,
}

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Parse and validate .meta files
    Parse(ParseArgs),

    /// Generate SQL creation scripts for one or more dialects
    Generate(GenerateArgs),

    /// Generate a migration script between two schema versions
    Diff(DiffArgs),

    /// List the supported SQL dialects
    Dialects,

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

// ---------------------------------------------------------------------------
// Individual command argument structs
// ---------------------------------------------------------------------------

/// Arguments for `meta-forge parse`.
#[derive(Args)]
pub struct ParseArgs {
    /// Schema files or directories to parse
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Print the parsed schema back as canonical .meta text
    #[arg(long = "print")]
    pub print: bool,
}

/// Arguments for `meta-forge generate`.
#[derive(Args)]
pub struct GenerateArgs {
    /// Schema files or directories, concatenated in order before parsing
    #[arg(long = "sql", num_args = 1.., required = true)]
    pub sql: Vec<PathBuf>,

    /// Target dialects, comma separated (default: [generate] dialect from config)
    #[arg(short = 'g', long = "generator", value_delimiter = ',')]
    pub generators: Vec<String>,

    /// Write the script to this file (single dialect only)
    #[arg(
        short = 'o',
        long = "output-file",
        alias = "outputFile",
        conflicts_with = "output_dir"
    )]
    pub output_file: Option<PathBuf>,

    /// Write one `<dialect>.sql` per dialect into this directory
    #[arg(short = 'd', long = "output-dir", alias = "outputDir")]
    pub output_dir: Option<PathBuf>,
}

/// Arguments for `meta-forge diff`.
#[derive(Args)]
pub struct DiffArgs {
    /// Schema files of the deployed version
    #[arg(long = "from", num_args = 1.., required = true)]
    pub from: Vec<PathBuf>,

    /// Schema files of the target version
    #[arg(long = "to", num_args = 1.., required = true)]
    pub to: Vec<PathBuf>,

    /// Version of the deployed schema; the script migrates to the next one
    #[arg(long = "old-version", alias = "oldVersion")]
    pub old_version: u32,

    /// Target dialect (default: [generate] dialect from config)
    #[arg(short = 'g', long = "generator")]
    pub generator: Option<String>,

    /// Write the script to this file (default: stdout)
    #[arg(short = 'o', long = "output-file", alias = "outputFile")]
    pub output_file: Option<PathBuf>,

    /// Schema files whose statements run after the structural changes
    #[arg(long = "additional", num_args = 1..)]
    pub additional: Vec<PathBuf>,

    /// Table holding the schema version (default: [migration] version_table)
    #[arg(long = "version-table", alias = "versionTable")]
    pub version_table: Option<String>,

    /// Column holding the schema version (default: [migration] version_column)
    #[arg(long = "version-column", alias = "versionColumn")]
    pub version_column: Option<String>,
}

/// Arguments for `meta-forge completions`.
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Single-dash long flags accepted for compatibility with build-tool
/// wrappers, e.g. `-sql a.meta -generator oracle -outputFile a.sql`.
const LEGACY_FLAGS: &[(&str, &str)] = &[
    ("-sql", "--sql"),
    ("-generator", "--generator"),
    ("-outputFile", "--output-file"),
    ("-outputDir", "--output-dir"),
    ("-from", "--from"),
    ("-to", "--to"),
    ("-oldVersion", "--old-version"),
    ("-additional", "--additional"),
];

/// Rewrites single-dash long flags to their `--` form. Arguments after a
/// bare `--` are left alone.
pub fn expand_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut options_done = false;
    args.into_iter()
        .map(|arg| {
            let arg = arg.into();
            if options_done {
                return arg;
            }
            if arg == "--" {
                options_done = true;
                return arg;
            }
            LEGACY_FLAGS
                .iter()
                .find(|(legacy, _)| arg == *legacy)
                .map_or(arg, |(_, long)| OsString::from(long))
        })
        .collect()
}
