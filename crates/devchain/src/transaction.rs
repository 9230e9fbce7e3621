// devchain/src/transaction.rs

use crate::ChainResult;
use lottery_contract::{LotteryCall, LotteryEvent, LotteryOutput};
use lottery_core::{Amount, BlockNumber, CoreError, Gas, GasPrice, Nonce};
use lottery_crypto::{hash::Hashable, Address, Hash};
use serde::{Deserialize, Serialize};

/// Sender-side options of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOptions {
    pub from: Address,
    pub value: Amount,
    /// Gas limit; the chain's default when unset
    pub gas: Option<Gas>,
}

impl TxOptions {
    pub fn sender(from: Address) -> Self {
        Self {
            from,
            value: Amount::zero(),
            gas: None,
        }
    }

    pub fn value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }

    pub fn gas(mut self, gas: Gas) -> Self {
        self.gas = Some(gas);
        self
    }
}

/// What a transaction asks the chain to do; hashed into the transaction id
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TxEnvelope<'a> {
    pub from: &'a Address,
    pub nonce: Nonce,
    /// `None` for a deployment
    pub to: Option<&'a Address>,
    pub call: Option<LotteryCall>,
    pub value: &'a Amount,
    pub gas: Gas,
}

impl TxEnvelope<'_> {
    pub fn hash(&self) -> ChainResult<Hash> {
        let bytes = bincode::serialize(self)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        Ok(bytes.keccak())
    }
}

/// Receipt of a successful contract transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: Hash,
    pub block_number: BlockNumber,
    pub block_hash: Hash,
    pub from: Address,
    pub to: Address,
    pub method: String,
    pub value: Amount,
    pub gas_used: Gas,
    pub effective_gas_price: GasPrice,
    /// Fee paid by the sender (`gas_used * effective_gas_price`)
    pub fee: Amount,
    pub output: LotteryOutput,
    pub events: Vec<LotteryEvent>,
}

/// Receipt of a contract deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployReceipt {
    pub transaction_hash: Hash,
    pub block_number: BlockNumber,
    pub contract_address: Address,
    pub manager: Address,
    pub gas_used: Gas,
    pub fee: Amount,
}
