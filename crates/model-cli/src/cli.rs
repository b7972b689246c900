//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Domain model sync - describe, diff and reconcile domain models
#[derive(Parser, Debug)]
#[command(name = "model-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the description of a model file
    ///
    /// Examples:
    ///   model-sync describe domain.json
    ///   model-sync describe domain.json --address /profile=full
    ///   model-sync describe domain.json --for-secondary
    Describe {
        /// Described model to read
        model: PathBuf,

        /// Describe only the subtree at this address
        #[arg(short, long)]
        address: Option<String>,

        /// Leave out host resources and proxies, as sent to a secondary
        #[arg(long)]
        for_secondary: bool,
    },

    /// Print the operations that turn one model into another
    Plan {
        /// Model to start from
        original: PathBuf,

        /// Model to reach
        incoming: PathBuf,

        /// Plan for a model that cannot add at an index
        #[arg(long)]
        no_indexed_add: bool,

        /// Sync configuration (TOML)
        #[arg(short, long, env = "MODEL_SYNC_CONFIG")]
        config: Option<PathBuf>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Reconcile a live model with an incoming description
    ///
    /// The live model file is rewritten unless --dry-run is given.
    Apply {
        /// Live model, updated in place
        live: PathBuf,

        /// Description received from the primary
        incoming: PathBuf,

        /// Local host receiving reload/restart signals
        #[arg(long)]
        host: Option<String>,

        /// Sync configuration (TOML)
        #[arg(short, long, env = "MODEL_SYNC_CONFIG")]
        config: Option<PathBuf>,

        /// Preview the operations without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check includes of every profile and socket binding group
    Validate {
        /// Described model to check
        model: PathBuf,

        /// Sync configuration (TOML)
        #[arg(short, long, env = "MODEL_SYNC_CONFIG")]
        config: Option<PathBuf>,
    },
}
