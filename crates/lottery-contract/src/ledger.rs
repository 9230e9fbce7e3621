// lottery-contract/src/ledger.rs

use crate::{
    abi::{LotteryCall, LotteryEvent, LotteryOutput, Payout},
    CallContext, LotteryConfig, LotteryError, LotteryResult, RandomnessSource, ValueTransfer,
};
use lottery_core::Amount;
use lottery_crypto::Address;
use serde::{Deserialize, Serialize};

/// Lottery state: who entered this round and how much they put in.
///
/// Invariants:
/// - `pooled_value` is the sum of every contribution since the last payout
/// - a payout happens only with at least one entrant, and only at the
///   manager's request
/// - after a payout the entrant list is empty and the pool is zero
/// - a round never holds more than `max_entrants` entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryLedger {
    manager: Address,
    minimum_entry: Amount,
    max_entrants: usize,
    entrants: Vec<Address>,
    pooled_value: Amount,
    /// Completed payouts
    round: u64,
}

impl LotteryLedger {
    /// Create a ledger administered by `manager`
    pub fn new(manager: Address, config: LotteryConfig) -> Self {
        Self {
            manager,
            minimum_entry: config.minimum_entry,
            max_entrants: config.max_entrants,
            entrants: Vec::new(),
            pooled_value: Amount::zero(),
            round: 0,
        }
    }

    /// Join the current round with the value attached to the call
    pub fn enter(&mut self, ctx: &CallContext) -> LotteryResult<LotteryEvent> {
        if ctx.value < self.minimum_entry {
            return Err(LotteryError::InsufficientContribution {
                provided: ctx.value.clone(),
                minimum: self.minimum_entry.clone(),
            });
        }
        if self.entrants.len() >= self.max_entrants {
            return Err(LotteryError::RoundFull {
                capacity: self.max_entrants,
            });
        }

        let position = self.entrants.len();
        self.entrants.push(ctx.caller);
        self.pooled_value = &self.pooled_value + &ctx.value;

        tracing::info!(
            player = %ctx.caller,
            value = %ctx.value,
            position,
            pool = %self.pooled_value,
            "lottery entry accepted"
        );

        Ok(LotteryEvent::Entered {
            player: ctx.caller,
            value: ctx.value.clone(),
            position,
        })
    }

    /// Select a winner, pay out the whole pool and start a new round.
    ///
    /// Nothing changes unless the transfer succeeds; the reset happens in
    /// the same call right after it.
    pub fn pick_winner<R, T>(
        &mut self,
        ctx: &CallContext,
        randomness: &mut R,
        transfer: &mut T,
    ) -> LotteryResult<Payout>
    where
        R: RandomnessSource + ?Sized,
        T: ValueTransfer + ?Sized,
    {
        if ctx.caller != self.manager {
            return Err(LotteryError::Unauthorized { caller: ctx.caller });
        }
        if self.entrants.is_empty() {
            return Err(LotteryError::NoEntrants);
        }
        if !ctx.value.is_zero() {
            return Err(LotteryError::NonPayable);
        }

        let winner_index = randomness.select_index(&self.entrants) % self.entrants.len();
        let winner = self.entrants[winner_index];

        transfer.transfer(&winner, &self.pooled_value)?;

        let payout = Payout {
            winner,
            winner_index,
            amount: std::mem::take(&mut self.pooled_value),
            round: self.round + 1,
            entrants: self.entrants.len(),
        };
        self.entrants.clear();
        self.round += 1;

        tracing::info!(
            winner = %payout.winner,
            amount = %payout.amount,
            round = payout.round,
            entrants = payout.entrants,
            "lottery winner paid"
        );

        Ok(payout)
    }

    /// Current entrants in the order they entered
    pub fn get_players(&self) -> Vec<Address> {
        self.entrants.clone()
    }

    /// Value pooled in the current round
    pub fn get_balance(&self) -> Amount {
        self.pooled_value.clone()
    }

    pub fn player_count(&self) -> usize {
        self.entrants.len()
    }

    pub fn manager(&self) -> Address {
        self.manager
    }

    pub fn minimum_entry(&self) -> &Amount {
        &self.minimum_entry
    }

    pub fn max_entrants(&self) -> usize {
        self.max_entrants
    }

    /// Number of completed rounds
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Route an external call to the matching operation
    pub fn dispatch<R, T>(
        &mut self,
        call: LotteryCall,
        ctx: &CallContext,
        randomness: &mut R,
        transfer: &mut T,
    ) -> LotteryResult<LotteryOutput>
    where
        R: RandomnessSource + ?Sized,
        T: ValueTransfer + ?Sized,
    {
        if call.is_view() && !ctx.value.is_zero() {
            return Err(LotteryError::NonPayable);
        }

        tracing::debug!(method = call.name(), caller = %ctx.caller, "dispatching lottery call");

        let output = match call {
            LotteryCall::Enter => LotteryOutput::Entered(self.enter(ctx)?),
            LotteryCall::PickWinner => {
                LotteryOutput::Payout(self.pick_winner(ctx, randomness, transfer)?)
            }
            LotteryCall::GetPlayers => LotteryOutput::Players(self.get_players()),
            LotteryCall::GetBalance => LotteryOutput::Balance(self.get_balance()),
            LotteryCall::Manager => LotteryOutput::Manager(self.manager),
        };

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedIndex, RngSource, TransferError};
    use proptest::prelude::*;
    use std::collections::HashMap;

    /// Records every payout instead of moving real balances
    #[derive(Default)]
    struct RecordingTransfer {
        paid: HashMap<Address, Amount>,
        fail: bool,
    }

    impl ValueTransfer for RecordingTransfer {
        fn transfer(&mut self, to: &Address, amount: &Amount) -> Result<(), TransferError> {
            if self.fail {
                return Err(TransferError {
                    to: *to,
                    amount: amount.clone(),
                    reason: "recipient rejected value".into(),
                });
            }
            let entry = self.paid.entry(*to).or_insert_with(Amount::zero);
            *entry = &*entry + amount;
            Ok(())
        }
    }

    fn account(i: u8) -> Address {
        Address::new([i; 20])
    }

    fn ether(value: &str) -> Amount {
        Amount::parse_ether(value).unwrap()
    }

    fn new_ledger() -> LotteryLedger {
        LotteryLedger::new(account(0), LotteryConfig::default())
    }

    #[test]
    fn test_one_account_enters() {
        let mut ledger = new_ledger();
        ledger.enter(&CallContext::new(account(0), ether("0.02"))).unwrap();

        assert_eq!(ledger.get_players(), vec![account(0)]);
        assert_eq!(ledger.get_balance(), ether("0.02"));
    }

    #[test]
    fn test_multiple_accounts_enter_in_order() {
        let mut ledger = new_ledger();
        ledger.enter(&CallContext::new(account(0), ether("0.02"))).unwrap();
        ledger.enter(&CallContext::new(account(1), ether("0.03"))).unwrap();
        ledger.enter(&CallContext::new(account(2), ether("0.04"))).unwrap();

        assert_eq!(ledger.get_players(), vec![account(0), account(1), account(2)]);
        assert_eq!(ledger.get_balance(), ether("0.09"));
    }

    #[test]
    fn test_duplicate_entries_are_allowed() {
        let mut ledger = new_ledger();
        ledger.enter(&CallContext::new(account(1), ether("0.01"))).unwrap();
        ledger.enter(&CallContext::new(account(1), ether("0.01"))).unwrap();

        assert_eq!(ledger.player_count(), 2);
    }

    #[test]
    fn test_requires_minimum_entry() {
        let mut ledger = new_ledger();
        let err = ledger
            .enter(&CallContext::new(account(0), ether("0.001")))
            .unwrap_err();

        assert!(matches!(err, LotteryError::InsufficientContribution { .. }));
        assert!(ledger.get_players().is_empty());
        assert!(ledger.get_balance().is_zero());
    }

    #[test]
    fn test_minimum_entry_is_inclusive() {
        let mut ledger = new_ledger();
        assert!(ledger.enter(&CallContext::new(account(3), ether("0.01"))).is_ok());
    }

    #[test]
    fn test_full_round_rejects_entries_until_payout() {
        let config = LotteryConfig::default().with_max_entrants(3);
        let mut ledger = LotteryLedger::new(account(0), config);
        for i in 1..=3 {
            ledger.enter(&CallContext::new(account(i), ether("0.01"))).unwrap();
        }

        let err = ledger
            .enter(&CallContext::new(account(4), ether("1")))
            .unwrap_err();
        assert_eq!(err, LotteryError::RoundFull { capacity: 3 });
        assert_eq!(ledger.player_count(), 3);
        assert_eq!(ledger.get_balance(), ether("0.03"));

        let mut transfer = RecordingTransfer::default();
        ledger
            .pick_winner(&CallContext::from_caller(account(0)), &mut FixedIndex(0), &mut transfer)
            .unwrap();
        assert!(ledger.enter(&CallContext::new(account(4), ether("1"))).is_ok());
    }

    #[test]
    fn test_only_manager_can_pick_winner() {
        let mut ledger = new_ledger();
        ledger.enter(&CallContext::new(account(1), ether("1"))).unwrap();
        let before = ledger.clone();

        let mut transfer = RecordingTransfer::default();
        let err = ledger
            .pick_winner(&CallContext::from_caller(account(1)), &mut FixedIndex(0), &mut transfer)
            .unwrap_err();

        assert_eq!(err, LotteryError::Unauthorized { caller: account(1) });
        assert_eq!(ledger, before);
        assert!(transfer.paid.is_empty());
    }

    #[test]
    fn test_pick_winner_without_entrants() {
        let mut ledger = new_ledger();
        let err = ledger
            .pick_winner(
                &CallContext::from_caller(account(0)),
                &mut FixedIndex(0),
                &mut RecordingTransfer::default(),
            )
            .unwrap_err();

        assert_eq!(err, LotteryError::NoEntrants);
        assert_eq!(ledger.round(), 0);
    }

    #[test]
    fn test_pick_winner_rejects_attached_value() {
        let mut ledger = new_ledger();
        ledger.enter(&CallContext::new(account(1), ether("1"))).unwrap();

        let err = ledger
            .pick_winner(
                &CallContext::new(account(0), ether("1")),
                &mut FixedIndex(0),
                &mut RecordingTransfer::default(),
            )
            .unwrap_err();

        assert_eq!(err, LotteryError::NonPayable);
        assert_eq!(ledger.player_count(), 1);
    }

    #[test]
    fn test_winner_receives_pool_and_ledger_resets() {
        let mut ledger = new_ledger();
        ledger.enter(&CallContext::new(account(1), ether("0.5"))).unwrap();
        ledger.enter(&CallContext::new(account(2), ether("2.5"))).unwrap();

        let mut transfer = RecordingTransfer::default();
        let payout = ledger
            .pick_winner(&CallContext::from_caller(account(0)), &mut FixedIndex(1), &mut transfer)
            .unwrap();

        assert_eq!(payout.winner, account(2));
        assert_eq!(payout.amount, ether("3"));
        assert_eq!(payout.round, 1);
        assert_eq!(transfer.paid.get(&account(2)), Some(&ether("3")));
        assert!(ledger.get_players().is_empty());
        assert!(ledger.get_balance().is_zero());
        assert_eq!(ledger.round(), 1);
    }

    #[test]
    fn test_out_of_range_index_wraps() {
        let mut ledger = new_ledger();
        ledger.enter(&CallContext::new(account(1), ether("1"))).unwrap();
        ledger.enter(&CallContext::new(account(2), ether("1"))).unwrap();

        let payout = ledger
            .pick_winner(
                &CallContext::from_caller(account(0)),
                &mut FixedIndex(5),
                &mut RecordingTransfer::default(),
            )
            .unwrap();

        assert_eq!(payout.winner_index, 1);
        assert_eq!(payout.winner, account(2));
    }

    #[test]
    fn test_failed_transfer_leaves_state_untouched() {
        let mut ledger = new_ledger();
        ledger.enter(&CallContext::new(account(1), ether("1"))).unwrap();
        let before = ledger.clone();

        let mut transfer = RecordingTransfer { fail: true, ..Default::default() };
        let err = ledger
            .pick_winner(&CallContext::from_caller(account(0)), &mut FixedIndex(0), &mut transfer)
            .unwrap_err();

        assert!(matches!(err, LotteryError::TransferFailed(_)));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_rounds_repeat() {
        let mut ledger = new_ledger();
        let mut rng = RngSource::seeded(1);
        let mut transfer = RecordingTransfer::default();

        for round in 1..=3u64 {
            ledger.enter(&CallContext::new(account(1), ether("0.1"))).unwrap();
            ledger.enter(&CallContext::new(account(2), ether("0.2"))).unwrap();
            let payout = ledger
                .pick_winner(&CallContext::from_caller(account(0)), &mut rng, &mut transfer)
                .unwrap();
            assert_eq!(payout.round, round);
            assert_eq!(payout.amount, ether("0.3"));
        }

        let total: Amount = transfer.paid.values().sum();
        assert_eq!(total, ether("0.9"));
    }

    #[test]
    fn test_dispatch_routes_calls() {
        let mut ledger = new_ledger();
        let mut rng = FixedIndex(0);
        let mut transfer = RecordingTransfer::default();

        let out = ledger
            .dispatch(LotteryCall::Enter, &CallContext::new(account(4), ether("0.02")), &mut rng, &mut transfer)
            .unwrap();
        assert!(matches!(out, LotteryOutput::Entered(LotteryEvent::Entered { position: 0, .. })));

        let players = ledger
            .dispatch(LotteryCall::GetPlayers, &CallContext::from_caller(account(9)), &mut rng, &mut transfer)
            .unwrap()
            .into_players()
            .unwrap();
        assert_eq!(players, vec![account(4)]);

        let manager = ledger
            .dispatch(LotteryCall::Manager, &CallContext::from_caller(account(9)), &mut rng, &mut transfer)
            .unwrap()
            .into_manager();
        assert_eq!(manager, Some(account(0)));
    }

    #[test]
    fn test_dispatch_view_rejects_value() {
        let mut ledger = new_ledger();
        let err = ledger
            .dispatch(
                LotteryCall::GetBalance,
                &CallContext::new(account(1), ether("0.02")),
                &mut FixedIndex(0),
                &mut RecordingTransfer::default(),
            )
            .unwrap_err();

        assert_eq!(err, LotteryError::NonPayable);
    }

    proptest! {
        #[test]
        fn prop_entries_accumulate_in_order(
            entries in prop::collection::vec((0u8..10, 0u64..50_000_000_000_000_000), 0..30)
        ) {
            let mut ledger = new_ledger();
            let mut expected_players = Vec::new();
            let mut expected_pool = Amount::zero();

            for (who, wei) in entries {
                let value = Amount::from_u64(wei);
                let result = ledger.enter(&CallContext::new(account(who), value.clone()));
                if value >= *ledger.minimum_entry() {
                    prop_assert!(result.is_ok());
                    expected_players.push(account(who));
                    expected_pool = expected_pool + value;
                } else {
                    prop_assert!(result.is_err());
                }
                prop_assert_eq!(ledger.get_players(), expected_players.clone());
                prop_assert_eq!(ledger.get_balance(), expected_pool.clone());
            }
        }

        #[test]
        fn prop_payout_empties_ledger(count in 1usize..20, seed in any::<u64>()) {
            let mut ledger = new_ledger();
            for i in 0..count {
                ledger.enter(&CallContext::new(account(i as u8 + 1), ether("0.05"))).unwrap();
            }
            let pool = ledger.get_balance();

            let mut transfer = RecordingTransfer::default();
            let payout = ledger
                .pick_winner(&CallContext::from_caller(account(0)), &mut RngSource::seeded(seed), &mut transfer)
                .unwrap();

            prop_assert!(payout.winner_index < count);
            prop_assert_eq!(transfer.paid.get(&payout.winner), Some(&pool));
            prop_assert!(ledger.get_players().is_empty());
            prop_assert!(ledger.get_balance().is_zero());
        }
    }
}
