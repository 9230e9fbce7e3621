// lottery-core/src/state.rs

use crate::{types::*, CoreError, CoreResult};
use lottery_crypto::{hash::Hashable, Address, Hash};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Account state
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Account {
    /// Transaction counter
    pub nonce: Nonce,
    pub balance: Amount,
    /// Code hash if this is a contract account
    pub code_hash: Option<Hash>,
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(balance: Amount) -> Self {
        Self {
            balance,
            ..Self::new()
        }
    }

    pub fn increment_nonce(&mut self) {
        self.nonce += 1;
    }

    pub fn add_balance(&mut self, amount: &Amount) -> CoreResult<()> {
        self.balance = self.balance.checked_add(amount)
            .ok_or_else(|| CoreError::Overflow("Balance overflow".into()))?;
        Ok(())
    }

    /// Subtract from balance; `owner` is only used for the error report
    pub fn sub_balance(&mut self, owner: &Address, amount: &Amount) -> CoreResult<()> {
        self.balance = self.balance.checked_sub(amount)
            .ok_or_else(|| CoreError::InsufficientBalance {
                account: *owner,
                needed: amount.clone(),
                available: self.balance.clone(),
            })?;
        Ok(())
    }
}

/// World state managing all account balances
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldState {
    accounts: HashMap<Address, Account>,
    /// Undo log for checkpoint/rollback
    modifications: Vec<StateModification>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an account has ever been touched
    pub fn exists(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    /// Get account (empty account if unknown)
    pub fn get_account(&self, address: &Address) -> Account {
        self.accounts.get(address).cloned().unwrap_or_default()
    }

    /// Get mutable account reference, creating it if needed
    pub fn get_account_mut(&mut self, address: &Address) -> &mut Account {
        self.record_account_modification(*address);

        self.accounts.entry(*address).or_default()
    }

    pub fn set_account(&mut self, address: Address, account: Account) {
        self.record_account_modification(address);

        self.accounts.insert(address, account);
    }

    pub fn get_balance(&self, address: &Address) -> Amount {
        self.accounts.get(address)
            .map(|acc| acc.balance.clone())
            .unwrap_or_else(Amount::zero)
    }

    pub fn get_nonce(&self, address: &Address) -> Nonce {
        self.accounts.get(address).map(|acc| acc.nonce).unwrap_or(0)
    }

    pub fn credit(&mut self, address: &Address, amount: &Amount) -> CoreResult<()> {
        self.get_account_mut(address).add_balance(amount)
    }

    pub fn debit(&mut self, address: &Address, amount: &Amount) -> CoreResult<()> {
        if self.get_balance(address) < *amount {
            return Err(CoreError::InsufficientBalance {
                account: *address,
                needed: amount.clone(),
                available: self.get_balance(address),
            });
        }
        self.get_account_mut(address).sub_balance(address, amount)
    }

    /// Move value between accounts; either both sides change or neither does
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: &Amount,
    ) -> CoreResult<()> {
        let mut new_from = self.get_account(from);
        new_from.sub_balance(from, amount)?;

        if from == to {
            return Ok(());
        }

        let mut new_to = self.get_account(to);
        new_to.add_balance(amount)?;

        self.set_account(*from, new_from);
        self.set_account(*to, new_to);

        tracing::trace!(%from, %to, %amount, "balance transfer");
        Ok(())
    }

    /// Sum of every balance, used to check value conservation
    pub fn total_supply(&self) -> Amount {
        self.accounts.values().map(|acc| &acc.balance).sum()
    }

    /// Calculate state root hash
    pub fn state_root(&self) -> CoreResult<Hash> {
        // Sort accounts by address for deterministic hashing
        let mut sorted_accounts: Vec<_> = self.accounts.iter().collect();
        sorted_accounts.sort_by_key(|(addr, _)| *addr);

        let mut combined = Vec::new();
        for (addr, account) in sorted_accounts {
            combined.extend_from_slice(addr.as_bytes());
            let encoded = bincode::serialize(account)
                .map_err(|e| CoreError::SerializationError(e.to_string()))?;
            combined.extend_from_slice(&encoded);
        }

        if combined.is_empty() {
            Ok(Hash::zero())
        } else {
            Ok(combined.hash())
        }
    }

    /// Begin an atomic unit of changes
    pub fn checkpoint(&mut self) {
        self.modifications.push(StateModification::Checkpoint);
    }

    /// Keep the changes made since the last checkpoint
    pub fn commit(&mut self) {
        let Some(pos) = self.modifications
            .iter()
            .rposition(|m| matches!(m, StateModification::Checkpoint))
        else {
            return;
        };

        self.modifications.remove(pos);

        // Outside any checkpoint there is nothing left to undo
        if !self.modifications.iter().any(|m| matches!(m, StateModification::Checkpoint)) {
            self.modifications.clear();
        }
    }

    /// Undo every change made since the last checkpoint
    pub fn rollback(&mut self) {
        while let Some(mod_type) = self.modifications.pop() {
            match mod_type {
                StateModification::Checkpoint => break,
                StateModification::AccountSet { address, old_account } => {
                    if let Some(old) = old_account {
                        self.accounts.insert(address, old);
                    } else {
                        self.accounts.remove(&address);
                    }
                }
            }
        }
    }

    /// Record the pre-checkpoint value of `address` once per checkpoint
    fn record_account_modification(&mut self, address: Address) {
        if self.modifications.is_empty() {
            return;
        }

        for mod_entry in self.modifications.iter().rev() {
            match mod_entry {
                StateModification::Checkpoint => break,
                StateModification::AccountSet { address: a, .. } if *a == address => {
                    return;
                }
                _ => {}
            }
        }

        let old = self.accounts.get(&address).cloned();
        self.modifications.push(StateModification::AccountSet {
            address,
            old_account: old,
        });
    }
}

/// State modification for rollback support
#[derive(Debug, Clone, Serialize, Deserialize)]
enum StateModification {
    Checkpoint,
    AccountSet {
        address: Address,
        old_account: Option<Account>,
    },
}
