// lottery-contract/src/abi.rs

use lottery_core::Amount;
use lottery_crypto::Address;
use serde::{Deserialize, Serialize};

/// Externally callable lottery methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LotteryCall {
    Enter,
    PickWinner,
    GetPlayers,
    GetBalance,
    Manager,
}

impl LotteryCall {
    /// Read-only methods never change state
    pub fn is_view(&self) -> bool {
        matches!(self, Self::GetPlayers | Self::GetBalance | Self::Manager)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::PickWinner => "pickWinner",
            Self::GetPlayers => "getPlayers",
            Self::GetBalance => "getBalance",
            Self::Manager => "manager",
        }
    }
}

/// Outcome of a completed round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub winner: Address,
    /// Position of the winner in the entrant list
    pub winner_index: usize,
    /// The whole pool as it stood before the reset
    pub amount: Amount,
    /// Round number this payout closed (1 for the first round)
    pub round: u64,
    pub entrants: usize,
}

/// Events emitted by state-changing methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LotteryEvent {
    Entered {
        player: Address,
        value: Amount,
        /// Position in the entrant list
        position: usize,
    },
    WinnerPicked(Payout),
}

/// Return value of a dispatched call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LotteryOutput {
    Entered(LotteryEvent),
    Payout(Payout),
    Players(Vec<Address>),
    Balance(Amount),
    Manager(Address),
}

impl LotteryOutput {
    pub fn into_players(self) -> Option<Vec<Address>> {
        match self {
            Self::Players(players) => Some(players),
            _ => None,
        }
    }

    pub fn into_balance(self) -> Option<Amount> {
        match self {
            Self::Balance(balance) => Some(balance),
            _ => None,
        }
    }

    pub fn into_payout(self) -> Option<Payout> {
        match self {
            Self::Payout(payout) => Some(payout),
            _ => None,
        }
    }

    pub fn into_manager(self) -> Option<Address> {
        match self {
            Self::Manager(manager) => Some(manager),
            _ => None,
        }
    }

    /// Event to record in a transaction receipt, if any
    pub fn event(&self) -> Option<LotteryEvent> {
        match self {
            Self::Entered(event) => Some(event.clone()),
            Self::Payout(payout) => Some(LotteryEvent::WinnerPicked(payout.clone())),
            _ => None,
        }
    }
}
