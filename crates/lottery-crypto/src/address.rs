// lottery-crypto/src/address.rs

use crate::{hash::Hashable, CryptoError, CryptoResult};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address size in bytes
pub const ADDRESS_SIZE: usize = 20;

/// Account identity (Ethereum style, 20 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// Create address from bytes
    pub fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Derive a development account from a seed phrase and an index.
    ///
    /// The address is the low 20 bytes of `keccak256(seed || index)`, with
    /// the index encoded big-endian. The same seed always yields the same
    /// account list.
    pub fn derive(seed: &[u8], index: u32) -> Self {
        let mut data = Vec::with_capacity(seed.len() + 4);
        data.extend_from_slice(seed);
        data.extend_from_slice(&index.to_be_bytes());

        Self::from_hash_tail(data.keccak().as_bytes())
    }

    /// Address of a contract created by `deployer` at `nonce`
    pub fn contract_address(deployer: &Address, nonce: u64) -> Self {
        // Simplified CREATE: keccak256(deployer ++ nonce) instead of the RLP list
        let mut data = Vec::with_capacity(ADDRESS_SIZE + 8);
        data.extend_from_slice(deployer.as_bytes());
        data.extend_from_slice(&nonce.to_be_bytes());

        Self::from_hash_tail(data.keccak().as_bytes())
    }

    /// Random address, mostly useful for tests
    pub fn random() -> Self {
        let mut bytes = [0u8; ADDRESS_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    fn from_hash_tail(hash: &[u8]) -> Self {
        let mut address = [0u8; ADDRESS_SIZE];
        address.copy_from_slice(&hash[hash.len() - ADDRESS_SIZE..]);
        Self(address)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
        if bytes.len() != ADDRESS_SIZE {
            return Err(CryptoError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_SIZE,
                bytes.len()
            )));
        }
        let mut arr = [0u8; ADDRESS_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn zero() -> Self {
        Self([0u8; ADDRESS_SIZE])
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
