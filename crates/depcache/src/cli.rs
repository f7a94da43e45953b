use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Extract downloaded build dependencies into a validated cache.
#[derive(Debug, Parser)]
#[command(name = "depcache", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
#[command(propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "DEPCACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract an archive, reusing a valid previous extraction
    #[command(alias = "x")]
    Extract(ExtractArg),
    /// Run the two-stage cleanup over a cache root
    Cleanup(CleanupArg),
    /// Print the descriptor an extracted directory would be flagged with
    Descriptor(DescriptorArg),
}

#[derive(Debug, Args)]
pub struct ExtractArg {
    pub archive: PathBuf,
    #[arg(long)]
    pub cache_root: PathBuf,
    /// Extract here instead of a directory derived from the archive name
    #[arg(long)]
    pub target: Option<PathBuf>,
    /// Drop the single top-level directory of the archive
    #[arg(short, long)]
    pub strip_root: bool,
}

#[derive(Debug, Args)]
pub struct CleanupArg {
    #[arg(long)]
    pub cache_root: PathBuf,
    /// Ignore the time since the last pass
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct DescriptorArg {
    pub archive: PathBuf,
    pub target: PathBuf,
    #[arg(short, long)]
    pub strip_root: bool,
}
