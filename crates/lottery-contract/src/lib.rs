// lottery-contract/src/lib.rs

//! Lottery contract logic
//!
//! A single manager collects entries into a pooled balance and pays the
//! whole pool to one uniformly selected entrant, then starts a new round.
//! Every operation receives its execution context explicitly:
//! - the caller and attached value ([`CallContext`])
//! - a capability for moving value out of the contract ([`ValueTransfer`])
//! - a source of randomness for winner selection ([`RandomnessSource`])

pub mod abi;
pub mod config;
pub mod context;
pub mod gas;
pub mod ledger;
pub mod randomness;

pub use abi::{LotteryCall, LotteryEvent, LotteryOutput, Payout};
pub use config::{LotteryConfig, DEFAULT_MAX_ENTRANTS};
pub use context::{CallContext, TransferError, ValueTransfer};
pub use gas::{GasCalculator, GasConfig};
pub use ledger::LotteryLedger;
pub use randomness::{BlockContextSource, FixedIndex, RandomnessSource, RngSource};

use lottery_core::Amount;
use lottery_crypto::Address;

/// Result type for lottery operations
pub type LotteryResult<T> = Result<T, LotteryError>;

/// Reasons a lottery operation is rejected. A rejected operation never
/// changes ledger state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LotteryError {
    #[error("Insufficient contribution: sent {provided} wei, minimum is {minimum} wei")]
    InsufficientContribution { provided: Amount, minimum: Amount },

    #[error("Unauthorized: {caller} is not the manager")]
    Unauthorized { caller: Address },

    #[error("Round is full: {capacity} entrants")]
    RoundFull { capacity: usize },

    #[error("No entrants in the current round")]
    NoEntrants,

    #[error("Operation does not accept value")]
    NonPayable,

    #[error("Payout failed: {0}")]
    TransferFailed(#[from] TransferError),
}
