use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "iforge",
    about = "INCAR tag normalization, site-property resolution and validation",
    version,
    author,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Report findings for an input deck without writing anything
    #[command(visible_alias = "c")]
    Check(CheckArgs),

    /// Apply automatic corrections and write the corrected INCAR
    #[command(visible_alias = "f")]
    Fix(FixArgs),

    /// Write the INCAR using the deck's own validation settings
    #[command(visible_alias = "w")]
    Write(WriteArgs),
}

impl Command {
    pub fn common(&self) -> &CommonOptions {
        match self {
            Command::Check(args) => &args.common,
            Command::Fix(args) => &args.common,
            Command::Write(args) => &args.common,
        }
    }
}

/// Options shared by all commands.
#[derive(Args)]
pub struct CommonOptions {
    /// Input deck (YAML; stdin if omitted)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Base-default tags, overridden by the deck (INCAR, or YAML by extension)
    #[arg(long, value_name = "FILE")]
    pub defaults: Option<PathBuf>,

    /// Custom tag schema (TOML file)
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,

    /// Suppress banner, progress and tables (for scripting)
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Args)]
pub struct FixArgs {
    #[command(flatten)]
    pub common: CommonOptions,

    /// Output INCAR file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct WriteArgs {
    #[command(flatten)]
    pub common: CommonOptions,

    /// Output INCAR file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub policy: PolicyOptions,
}

/// Overrides for the deck's `validation` block.
#[derive(Args)]
#[command(next_help_heading = "Validation")]
pub struct PolicyOptions {
    /// Report findings even if the deck does not ask for it
    #[arg(long)]
    pub warn: bool,

    /// Apply automatic fixes even if the deck does not ask for it
    #[arg(long)]
    pub correct: bool,

    /// Write every built-in schema default not set elsewhere
    #[arg(long)]
    pub fill_defaults: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}
