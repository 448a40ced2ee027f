//! Command line interface

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "foliod", version, about = "Sync-folder snapshot agent")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bind address, overrides the config file
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port, overrides the config file
    #[arg(long)]
    pub port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    pub debug: bool,
}
