use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use strata_core::{serialize, Address};

/// Genesis configuration: the balances the durable base starts with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisFile {
    pub initial_balances: Vec<BalanceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub address: String,
    pub balance: u64,
}

impl GenesisFile {
    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GenesisFile = serialize::from_json(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<()> {
        let content = serialize::to_json_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve entries to addresses and amounts
    pub fn balances(&self) -> Result<Vec<(Address, u64)>> {
        self.initial_balances
            .iter()
            .map(|entry| Ok((parse_address(&entry.address)?, entry.balance)))
            .collect()
    }
}

/// Sample genesis funding the two demo accounts
pub fn generate_sample_config() -> GenesisFile {
    GenesisFile {
        initial_balances: vec![
            BalanceEntry {
                address: "alice".to_string(),
                balance: 100,
            },
            BalanceEntry {
                address: "bob".to_string(),
                balance: 0,
            },
        ],
    }
}

/// Accept a 64-char hex address, or derive one from a name
pub fn parse_address(input: &str) -> Result<Address> {
    if input.len() == 64 {
        if let Ok(addr) = Address::from_hex(input) {
            return Ok(addr);
        }
    }
    Ok(Address::from_name(input))
}
