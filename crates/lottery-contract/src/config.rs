// lottery-contract/src/config.rs

use lottery_core::Amount;
use serde::{Deserialize, Serialize};

/// Entrants accepted per round unless configured otherwise
pub const DEFAULT_MAX_ENTRANTS: usize = 1_000;

/// Parameters fixed when a lottery is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    /// Smallest accepted entry, in wei (inclusive)
    pub minimum_entry: Amount,
    /// Entries accepted per round; bounds the work of one `pickWinner`
    pub max_entrants: usize,
}

impl LotteryConfig {
    pub fn new(minimum_entry: Amount) -> Self {
        Self {
            minimum_entry,
            max_entrants: DEFAULT_MAX_ENTRANTS,
        }
    }

    pub fn with_max_entrants(mut self, max_entrants: usize) -> Self {
        self.max_entrants = max_entrants;
        self
    }
}

impl Default for LotteryConfig {
    /// 0.01 ether
    fn default() -> Self {
        Self::new(Amount::from_u64(10_000_000_000_000_000))
    }
}
