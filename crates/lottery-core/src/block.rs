// lottery-core/src/block.rs

use crate::{types::*, CoreError, CoreResult};
use lottery_crypto::{hash::Hashable, Address, Hash};
use serde::{Deserialize, Serialize};

/// Execution context of the block a call runs in.
///
/// Contracts can read these values, which is exactly why they are a poor
/// source of randomness: the block producer chooses or knows all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub number: BlockNumber,
    pub timestamp: Timestamp,
    pub parent_hash: Hash,
    /// Mix value standing in for `block.difficulty` / `prevrandao`
    pub prev_randao: Hash,
}

/// Block header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: BlockNumber,
    pub parent_hash: Hash,
    /// World state root after applying this block
    pub state_root: Hash,
    pub timestamp: Timestamp,
    pub miner: Address,
    pub gas_limit: Gas,
    pub gas_used: Gas,
    pub prev_randao: Hash,
}

impl BlockHeader {
    /// Calculate header hash
    pub fn hash(&self) -> CoreResult<Hash> {
        let bytes = bincode::serialize(self)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        Ok(bytes.hash())
    }

    /// Context a transaction included in this block executes with
    pub fn context(&self) -> BlockContext {
        BlockContext {
            number: self.number,
            timestamp: self.timestamp,
            parent_hash: self.parent_hash,
            prev_randao: self.prev_randao,
        }
    }

    /// Validate header against its parent
    pub fn validate(&self, parent: &BlockHeader) -> CoreResult<()> {
        if self.number != parent.number + 1 {
            return Err(CoreError::InvalidBlock(format!(
                "Invalid block number: expected {}, got {}",
                parent.number + 1,
                self.number
            )));
        }

        if self.parent_hash != parent.hash()? {
            return Err(CoreError::InvalidBlock("Parent hash mismatch".into()));
        }

        if self.timestamp < parent.timestamp {
            return Err(CoreError::InvalidBlock(
                "Block timestamp must not precede parent".into(),
            ));
        }

        if self.gas_used > self.gas_limit {
            return Err(CoreError::InvalidBlock("Gas used exceeds gas limit".into()));
        }

        Ok(())
    }
}

/// A mined block: header plus the hashes of the transactions it carries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Hash>,
}

impl Block {
    /// Genesis block at height 0
    pub fn genesis(timestamp: Timestamp, gas_limit: Gas, state_root: Hash) -> Self {
        Self {
            header: BlockHeader {
                number: 0,
                parent_hash: Hash::zero(),
                state_root,
                timestamp,
                miner: Address::zero(),
                gas_limit,
                gas_used: 0,
                prev_randao: Hash::zero(),
            },
            transactions: Vec::new(),
        }
    }

    /// Header template for the block following `self`.
    ///
    /// The state root and gas used are filled in once the block's
    /// transactions have executed.
    pub fn next_header(&self, timestamp: Timestamp, miner: Address) -> CoreResult<BlockHeader> {
        let parent_hash = self.header.hash()?;
        let number = self.header.number + 1;

        let mut seed = parent_hash.to_bytes().to_vec();
        seed.extend_from_slice(&number.to_be_bytes());

        Ok(BlockHeader {
            number,
            parent_hash,
            state_root: Hash::zero(),
            timestamp: timestamp.max(self.header.timestamp),
            miner,
            gas_limit: self.header.gas_limit,
            gas_used: 0,
            prev_randao: seed.keccak(),
        })
    }

    pub fn number(&self) -> BlockNumber {
        self.header.number
    }
}
