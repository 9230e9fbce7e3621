// lottery-crypto/src/lib.rs

//! Cryptographic primitives shared by the lottery workspace
//!
//! This crate provides:
//! - Hashing functions (SHA256, Keccak256)
//! - Account identities (20-byte addresses)
//! - Deterministic derivation of development accounts

pub mod address;
pub mod hash;

pub use address::Address;
pub use hash::{Hash, HashAlgorithm, Hashable};

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid hash")]
    InvalidHash,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}
