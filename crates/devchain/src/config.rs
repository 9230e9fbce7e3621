// devchain/src/config.rs

use crate::{ChainError, ChainResult};
use lottery_contract::GasConfig;
use lottery_core::{Amount, Gas, GasPrice, WEI_PER_GWEI};
use serde::{Deserialize, Serialize};

/// Seed phrase the default development accounts derive from
pub const DEFAULT_MNEMONIC: &str =
    "candy maple cake sugar pudding cream honey rich smooth crumble sweet treat";

/// How `pickWinner` obtains its randomness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RandomnessMode {
    /// Chain-owned RNG seeded from the operating system at startup
    Entropy,
    /// Chain-owned RNG with a fixed seed; every run draws the same winners
    Seeded { seed: u64 },
    /// Hash of the pending block's context and the entrants (legacy, predictable)
    BlockContext,
}

impl Default for RandomnessMode {
    fn default() -> Self {
        Self::Entropy
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevChainConfig {
    pub mnemonic: String,
    pub account_count: u32,
    /// Starting balance of every development account
    #[serde(with = "ether_string")]
    pub initial_balance: Amount,
    /// Wei per unit of gas
    pub gas_price: GasPrice,
    pub block_gas_limit: Gas,
    /// Gas attached when a transaction does not name a limit
    pub default_gas: Gas,
    pub randomness: RandomnessMode,
    pub gas: GasConfig,
}

impl Default for DevChainConfig {
    fn default() -> Self {
        Self {
            mnemonic: DEFAULT_MNEMONIC.into(),
            account_count: 10,
            initial_balance: Amount::from_ether(100),
            gas_price: 20 * WEI_PER_GWEI,
            block_gas_limit: 6_721_975,
            default_gas: 1_000_000,
            randomness: RandomnessMode::default(),
            gas: GasConfig::mainnet(),
        }
    }
}

impl DevChainConfig {
    pub fn validate(&self) -> ChainResult<()> {
        if self.account_count == 0 {
            return Err(ChainError::InvalidConfig(
                "account_count must be at least 1".into(),
            ));
        }
        if self.mnemonic.trim().is_empty() {
            return Err(ChainError::InvalidConfig("mnemonic must not be empty".into()));
        }
        if self.default_gas > self.block_gas_limit {
            return Err(ChainError::InvalidConfig(format!(
                "default_gas {} exceeds block_gas_limit {}",
                self.default_gas, self.block_gas_limit
            )));
        }
        Ok(())
    }
}

/// Amounts as human readable ether strings (`"100"`, `"0.01"`)
pub mod ether_string {
    use lottery_core::Amount;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_ether_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Amount::parse_ether(&raw).map_err(D::Error::custom)
    }
}
