// lottery-contract/src/context.rs

use lottery_core::Amount;
use lottery_crypto::Address;
use serde::{Deserialize, Serialize};

/// Identity and value attached to a single call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub value: Amount,
}

impl CallContext {
    pub fn new(caller: Address, value: Amount) -> Self {
        Self { caller, value }
    }

    /// Call without attached value
    pub fn from_caller(caller: Address) -> Self {
        Self::new(caller, Amount::zero())
    }
}

/// Rejected value transfer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transfer of {amount} wei to {to} failed: {reason}")]
pub struct TransferError {
    pub to: Address,
    pub amount: Amount,
    pub reason: String,
}

/// Capability to move value held by the contract to another account.
///
/// A transfer either fully succeeds or fails without moving anything.
pub trait ValueTransfer {
    fn transfer(&mut self, to: &Address, amount: &Amount) -> Result<(), TransferError>;
}

impl<T: ValueTransfer + ?Sized> ValueTransfer for &mut T {
    fn transfer(&mut self, to: &Address, amount: &Amount) -> Result<(), TransferError> {
        (**self).transfer(to, amount)
    }
}
