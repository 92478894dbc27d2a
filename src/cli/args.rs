//! CLI argument definitions using clap
//!
//! Commands:
//! - aerocluster delete --fixture <path> [--name <collection>] [--async <id>] [--config <path>]
//! - aerocluster check-config --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aerocluster - collection teardown for sharded, replicated clusters
#[derive(Parser, Debug)]
#[command(name = "aerocluster")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Delete a collection from a simulated cluster
    Delete {
        /// Cluster fixture to load into the in-memory collaborators
        #[arg(long)]
        fixture: PathBuf,

        /// Collection to delete; read as a JSON request from stdin when omitted
        #[arg(long)]
        name: Option<String>,

        /// Async tracking id for per-replica requests
        #[arg(long = "async")]
        async_id: Option<String>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Load and validate a configuration file
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./aerocluster.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
