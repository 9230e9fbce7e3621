// lottery-contract/src/gas.rs

use crate::LotteryCall;
use lottery_core::Gas;
use serde::{Deserialize, Serialize};

/// Size of the deployed lottery code, charged per byte at deployment
pub const LOTTERY_CODE_SIZE: u64 = 1_600;

/// Gas configuration (Ethereum-compatible)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasConfig {
    /// Gas per transaction
    pub tx_gas: Gas,
    /// Gas per contract creation
    pub create_gas: Gas,
    /// Gas per byte of deployed code
    pub code_deposit_gas: Gas,
    /// SSTORE writing a zero slot to non-zero
    pub sstore_set_gas: Gas,
    /// SSTORE on an already non-zero slot (or clearing it)
    pub sstore_reset_gas: Gas,
    /// Gas per SLOAD operation
    pub sload_gas: Gas,
    /// Extra gas for a CALL that moves value
    pub call_value_gas: Gas,
    /// Gas for LOG operations
    pub log_gas: Gas,
    /// Gas per LOG topic
    pub log_topic_gas: Gas,
    /// Gas per byte of LOG data
    pub log_data_gas: Gas,
    /// Gas per KECCAK256 operation
    pub keccak256_gas: Gas,
    /// Gas per 32-byte word for KECCAK256
    pub keccak256_word_gas: Gas,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl GasConfig {
    /// Ethereum mainnet gas configuration
    pub fn mainnet() -> Self {
        Self {
            tx_gas: 21000,
            create_gas: 32000,
            code_deposit_gas: 200,
            sstore_set_gas: 20000,
            sstore_reset_gas: 5000,
            sload_gas: 800,
            call_value_gas: 9000,
            log_gas: 375,
            log_topic_gas: 375,
            log_data_gas: 8,
            keccak256_gas: 30,
            keccak256_word_gas: 6,
        }
    }
}

/// Gas calculator for lottery operations
#[derive(Debug, Clone, Default)]
pub struct GasCalculator {
    config: GasConfig,
}

impl GasCalculator {
    pub fn new(config: GasConfig) -> Self {
        Self { config }
    }

    pub fn mainnet() -> Self {
        Self::new(GasConfig::mainnet())
    }

    /// Intrinsic cost every transaction pays, even when it reverts
    pub fn intrinsic_gas(&self) -> Gas {
        self.config.tx_gas
    }

    /// Deploying a ledger: creation, manager and minimum slots, code deposit
    pub fn deploy_cost(&self) -> Gas {
        self.config.tx_gas
            + self.config.create_gas
            + 2 * self.config.sstore_set_gas
            + LOTTERY_CODE_SIZE * self.config.code_deposit_gas
    }

    /// `enter` with `entrants_before` players already in the round
    pub fn enter_cost(&self, entrants_before: usize) -> Gas {
        // Length slot goes from zero to non-zero on the first entry of a round
        let length_write = if entrants_before == 0 {
            self.config.sstore_set_gas
        } else {
            self.config.sstore_reset_gas
        };

        self.config.tx_gas
            + self.config.sload_gas
            + self.config.sstore_set_gas
            + length_write
            + self.log_cost(1, 64)
    }

    /// `pickWinner` over `entrants` players
    pub fn pick_winner_cost(&self, entrants: usize) -> Gas {
        let n = entrants as Gas;
        // Manager check, length, then every entrant slot
        let reads = (n + 2) * self.config.sload_gas;
        // Selection hashes the mix value, the timestamp and each address
        let hashing = self.keccak_cost(32 + 32 + 20 * n);
        // Clearing every entrant slot plus the length slot
        let clearing = (n + 1) * self.config.sstore_reset_gas;

        self.config.tx_gas
            + reads
            + hashing
            + self.config.call_value_gas
            + clearing
            + self.log_cost(1, 96)
    }

    /// Largest round whose `pickWinner` still fits in `gas_limit`
    pub fn max_entrants_within(&self, gas_limit: Gas) -> usize {
        // Every entrant costs at least one read and one slot reset
        let per_entrant = (self.config.sload_gas + self.config.sstore_reset_gas).max(1);
        let mut low = 0usize;
        let mut high = usize::try_from(gas_limit / per_entrant).unwrap_or(usize::MAX);
        while low < high {
            let mid = low + (high - low + 1) / 2;
            if self.pick_winner_cost(mid) <= gas_limit {
                low = mid;
            } else {
                high = mid - 1;
            }
        }
        low
    }

    /// Reads executed inside a transaction
    pub fn view_cost(&self, entrants: usize) -> Gas {
        self.config.tx_gas + (entrants as Gas + 1) * self.config.sload_gas
    }

    /// Gas a call needs given the current number of entrants
    pub fn cost_of(&self, call: LotteryCall, entrants: usize) -> Gas {
        match call {
            LotteryCall::Enter => self.enter_cost(entrants),
            LotteryCall::PickWinner => self.pick_winner_cost(entrants),
            LotteryCall::GetPlayers => self.view_cost(entrants),
            LotteryCall::GetBalance | LotteryCall::Manager => self.view_cost(0),
        }
    }

    fn keccak_cost(&self, bytes: u64) -> Gas {
        let words = bytes.div_ceil(32);
        self.config.keccak256_gas + words * self.config.keccak256_word_gas
    }

    fn log_cost(&self, topics: u64, data_bytes: u64) -> Gas {
        self.config.log_gas
            + topics * self.config.log_topic_gas
            + data_bytes * self.config.log_data_gas
    }
}
