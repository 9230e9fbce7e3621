// lottery-cli/src/config.rs

use devchain::{config::ether_string, DevChainConfig};
use lottery_contract::LotteryConfig;
use lottery_core::Amount;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryNetConfig {
    pub chain: DevChainConfig,
    pub lottery: LotterySettings,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotterySettings {
    #[serde(with = "ether_string")]
    pub minimum_entry: Amount,
    pub max_entrants: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub rounds: u32,
    pub entries: Vec<PlannedEntry>,
}

/// One `enter` call per round: which dev account, and how much ether
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedEntry {
    pub account: u32,
    #[serde(with = "ether_string")]
    pub value: Amount,
}

impl Default for LotterySettings {
    fn default() -> Self {
        let defaults = LotteryConfig::default();
        Self {
            minimum_entry: defaults.minimum_entry,
            max_entrants: defaults.max_entrants,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let entry = |account, value: u64| PlannedEntry {
            account,
            value: Amount::from_u64(value),
        };
        Self {
            rounds: 1,
            // 0.02, 0.03 and 0.04 ether from accounts 1..=3
            entries: vec![
                entry(1, 20_000_000_000_000_000),
                entry(2, 30_000_000_000_000_000),
                entry(3, 40_000_000_000_000_000),
            ],
        }
    }
}

impl LotteryNetConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.chain.validate()?;

        if self.simulation.entries.len() > self.lottery.max_entrants {
            anyhow::bail!(
                "{} entries per round exceed max_entrants {}",
                self.simulation.entries.len(),
                self.lottery.max_entrants
            );
        }
        for entry in &self.simulation.entries {
            if entry.account >= self.chain.account_count {
                anyhow::bail!(
                    "simulation entry uses account {} but only {} accounts exist",
                    entry.account,
                    self.chain.account_count
                );
            }
        }
        Ok(())
    }

    pub fn lottery_config(&self) -> LotteryConfig {
        LotteryConfig::new(self.lottery.minimum_entry.clone())
            .with_max_entrants(self.lottery.max_entrants)
    }
}
