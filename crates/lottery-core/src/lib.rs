// lottery-core/src/lib.rs

//! Core ledger data structures
//!
//! This crate provides:
//! - Native value amounts (wei / ether)
//! - Block headers and the execution context they expose
//! - Account balances with checkpoint and rollback

pub mod block;
pub mod state;
pub mod types;

pub use block::{Block, BlockContext, BlockHeader};
pub use state::{Account, WorldState};
pub use types::*;

use lottery_crypto::Address;

/// Result type for core ledger operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core ledger operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Insufficient balance in {account}: needed {needed}, available {available}")]
    InsufficientBalance {
        account: Address,
        needed: Amount,
        available: Amount,
    },

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] lottery_crypto::CryptoError),
}
