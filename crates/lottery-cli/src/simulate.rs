// lottery-cli/src/simulate.rs

use crate::config::LotteryNetConfig;
use anyhow::Context;
use devchain::{DevChain, TxOptions};
use lottery_contract::LotteryCall;
use lottery_core::BlockNumber;
use serde::{Deserialize, Serialize};

/// What one simulated round produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u64,
    pub winner: String,
    /// Prize in ether
    pub prize: String,
    pub players: Vec<String>,
    /// Winner's balance in ether once the payout settled
    pub winner_balance: String,
    pub block_number: BlockNumber,
}

/// Deploy a lottery from the first account and play `rounds` rounds of the
/// configured entries, the deployer picking the winner each time
pub async fn run_simulation(
    config: &LotteryNetConfig,
    rounds: u32,
) -> anyhow::Result<Vec<RoundSummary>> {
    config.validate()?;

    let chain = DevChain::new(config.chain.clone())?;
    let accounts = chain.accounts().await;
    let manager = *accounts.first().context("development chain has no accounts")?;

    let deployed = chain
        .deploy_lottery(config.lottery_config(), TxOptions::sender(manager))
        .await?;
    let lottery = deployed.contract_address;
    tracing::info!(contract = %lottery, %manager, "simulation started");

    let mut summaries = Vec::with_capacity(rounds as usize);
    for _ in 0..rounds {
        for entry in &config.simulation.entries {
            let player = accounts[entry.account as usize];
            chain
                .send(
                    &lottery,
                    LotteryCall::Enter,
                    TxOptions::sender(player).value(entry.value.clone()),
                )
                .await
                .with_context(|| format!("account {} failed to enter", entry.account))?;
        }

        let players = chain.get_players(&lottery, manager).await?;
        let receipt = chain
            .send(&lottery, LotteryCall::PickWinner, TxOptions::sender(manager))
            .await
            .context("pickWinner failed")?;
        let payout = receipt
            .output
            .into_payout()
            .context("pickWinner returned no payout")?;

        let winner_balance = chain.get_balance(&payout.winner).await;
        tracing::info!(
            round = payout.round,
            winner = %payout.winner,
            prize = %payout.amount,
            "round settled"
        );

        summaries.push(RoundSummary {
            round: payout.round,
            winner: payout.winner.to_string(),
            prize: payout.amount.to_ether_string(),
            players: players.iter().map(ToString::to_string).collect(),
            winner_balance: winner_balance.to_ether_string(),
            block_number: receipt.block_number,
        });
    }

    Ok(summaries)
}
