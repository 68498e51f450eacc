use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Strata - transactional contract-execution engine
#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Strata state store and demo runner")]
#[command(version)]
pub struct Cli {
    /// Path to the durable state file
    #[arg(short, long, default_value = "strata-data/state.bin")]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a store from a genesis configuration
    Init {
        /// Path to genesis configuration file (created if missing)
        #[arg(short, long, default_value = "genesis.json")]
        config: PathBuf,
    },

    /// Show an account's balance
    Balance {
        /// Account address (hex) or a name to derive one from
        address: String,
    },

    /// Read a key from an account's key-value space
    KvGet {
        /// Account address (hex) or a name to derive one from
        address: String,
        /// Key to read
        key: String,
    },

    /// Run a demo scenario
    Demo {
        #[command(subcommand)]
        command: DemoCommands,
    },
}

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Transfer between two demo accounts and print the balances
    Transfer {
        /// Amount to transfer
        #[arg(long, default_value = "10")]
        amount: i64,
    },

    /// Nested calls where a failing callee's writes are discarded
    Revert,
}
