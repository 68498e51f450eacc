use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod config;
mod demos;

use cli::{Cli, Commands, DemoCommands};
use config::{generate_sample_config, parse_address, GenesisFile};
use strata_state::{FileStorage, StateStore};

fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { config } => {
            init_store(cli.store, config)?;
        }
        Commands::Balance { address } => {
            let store = open_store(&cli.store)?;
            let addr = parse_address(&address)?;
            println!("{}", store.balance(&addr));
        }
        Commands::KvGet { address, key } => {
            let store = open_store(&cli.store)?;
            let addr = parse_address(&address)?;
            match store.get(&addr, &key) {
                Some(value) => println!("{}", value),
                None => println!("(absent)"),
            }
        }
        Commands::Demo { command } => {
            let store = open_store(&cli.store)?;
            match command {
                DemoCommands::Transfer { amount } => demos::run_transfer(store, amount)?,
                DemoCommands::Revert => demos::run_revert(store)?,
            }
        }
    }

    Ok(())
}

/// Create a store file from a genesis configuration, writing a sample
/// configuration first if none exists
fn init_store(store_path: PathBuf, config_path: PathBuf) -> Result<()> {
    let config = if config_path.exists() {
        GenesisFile::load(&config_path)?
    } else {
        info!("writing sample genesis configuration to {:?}", config_path);
        let sample = generate_sample_config();
        sample.save(&config_path)?;
        sample
    };

    let mut store = StateStore::new(FileStorage::new(store_path.clone())?);
    for (addr, balance) in config.balances()? {
        store.credit(&addr, balance);
    }
    store.persist()?;

    info!("initialized store at {:?}", store_path);
    println!("Store initialized: {}", store_path.display());
    for entry in &config.initial_balances {
        println!("  {} -> {}", entry.address, entry.balance);
    }
    Ok(())
}

fn open_store(path: &PathBuf) -> Result<StateStore<FileStorage>> {
    Ok(StateStore::open(FileStorage::new(path.clone())?)?)
}
