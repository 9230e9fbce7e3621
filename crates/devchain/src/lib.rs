// devchain/src/lib.rs

//! In-process development chain
//!
//! Hosts lottery ledgers the way a local test chain would:
//! - deterministic, pre-funded development accounts
//! - one mined block per transaction, with gas charged to the sender
//! - read-only calls against a scratch copy of the state
//! - a single lock serializing every transaction and call

pub mod chain;
pub mod config;
pub mod transaction;

pub use chain::DevChain;
pub use config::{DevChainConfig, RandomnessMode};
pub use transaction::{DeployReceipt, TransactionReceipt, TxOptions};

use lottery_contract::LotteryError;
use lottery_core::{Amount, CoreError, Gas};
use lottery_crypto::Address;

/// Result type for chain operations
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors surfaced to clients of the development chain
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Unknown account: {0}")]
    UnknownAccount(Address),

    #[error("Unknown contract: {0}")]
    UnknownContract(Address),

    #[error("Insufficient funds in {account}: needed {needed} wei, available {available} wei")]
    InsufficientFunds {
        account: Address,
        needed: Amount,
        available: Amount,
    },

    #[error("Out of gas: limit {limit}, required {required}")]
    OutOfGas { limit: Gas, required: Gas },

    #[error("Gas {requested} exceeds block gas limit {limit}")]
    GasLimitExceeded { requested: Gas, limit: Gas },

    #[error("Transaction reverted: {0}")]
    Reverted(#[from] LotteryError),

    #[error("State error: {0}")]
    State(#[from] CoreError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChainError {
    /// The ledger's rejection reason, if the contract itself refused
    pub fn revert_reason(&self) -> Option<&LotteryError> {
        match self {
            Self::Reverted(reason) => Some(reason),
            _ => None,
        }
    }
}
