use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Inspect and rewrite inventory text files",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the folders and items in an inventory text file
    Parse(ParseArgs),
    /// Rewrite an inventory text file in canonical layout
    Fmt(FmtArgs),
    /// Print the update checksum of every item
    Checksum(ChecksumArgs),
}

#[derive(Args)]
pub struct ParseArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct FmtArgs {
    pub file: PathBuf,
    /// Overwrite the file instead of printing to stdout
    #[arg(short, long)]
    pub write: bool,
    /// Exit with an error if the file is not already canonical
    #[arg(long, conflicts_with = "write")]
    pub check: bool,
}

#[derive(Args)]
pub struct ChecksumArgs {
    pub file: PathBuf,
}
