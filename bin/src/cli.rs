use std::path::PathBuf;

use clap::Parser;

/// Rebuild the holder leaderboard of one ERC-1155 token and write it as JSON.
#[derive(Parser, Debug)]
#[command(name = "holdboard", bin_name = "holdboard", version)]
pub struct Cli {
    /// Config file to use instead of ~/.holdboard/config.toml
    #[arg(long, env = "HOLDBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where to write the leaderboard, overrides the configured output
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}
