//! CLI command definitions.

use clap::{ArgAction, Parser, Subcommand};
use dialcache_cache::CompressionType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dialcache")]
#[command(author, version, about = "Restore and save the Dialyzer PLT cache in CI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Cache store directory
    #[arg(long, env = "DIALCACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Project directory the PLT pattern resolves against
    #[arg(long, env = "DIALCACHE_WORKSPACE", global = true)]
    pub workspace: Option<PathBuf>,

    /// Archive compression
    #[arg(long, env = "DIALCACHE_COMPRESSION", default_value = "zstd", global = true)]
    pub compression: CompressionType,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Restore the PLT from CACHE_KEY, falling back to OTP_PREFIX then SYSTEM_PREFIX
    Restore,

    /// Save the PLT under CACHE_KEY
    Save,
}
