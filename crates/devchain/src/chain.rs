// devchain/src/chain.rs

use crate::{
    transaction::TxEnvelope, ChainError, ChainResult, DeployReceipt, DevChainConfig,
    RandomnessMode, TransactionReceipt, TxOptions,
};
use lottery_contract::{
    BlockContextSource, CallContext, GasCalculator, LotteryCall, LotteryConfig, LotteryLedger,
    LotteryOutput, RandomnessSource, RngSource, TransferError, ValueTransfer,
};
use lottery_core::{Account, Amount, Block, BlockHeader, BlockNumber, Gas, GasPrice, Timestamp, WorldState};
use lottery_crypto::{hash::Hashable, Address, Hash};
use rand::rngs::StdRng;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Local development chain hosting lottery ledgers.
///
/// All state sits behind one async mutex: each transaction or call holds it
/// from validation to mining, so no two operations against a ledger ever
/// interleave.
pub struct DevChain {
    config: DevChainConfig,
    gas: GasCalculator,
    accounts: Vec<Address>,
    state: Mutex<ChainState>,
}

impl DevChain {
    /// Start a chain with funded development accounts and a genesis block
    pub fn new(config: DevChainConfig) -> ChainResult<Self> {
        config.validate()?;

        let accounts: Vec<Address> = (0..config.account_count)
            .map(|i| Address::derive(config.mnemonic.as_bytes(), i))
            .collect();

        let mut world = WorldState::new();
        for account in &accounts {
            world.set_account(*account, Account::with_balance(config.initial_balance.clone()));
        }

        let genesis = Block::genesis(now(), config.block_gas_limit, world.state_root()?);
        let rng = match config.randomness {
            RandomnessMode::Seeded { seed } => RngSource::seeded(seed),
            // Unused by block-context selection, but keeps the state shape uniform
            RandomnessMode::Entropy | RandomnessMode::BlockContext => RngSource::from_entropy(),
        };

        tracing::info!(
            accounts = accounts.len(),
            balance = %config.initial_balance.to_ether_string(),
            gas_price = config.gas_price,
            "development chain started"
        );

        Ok(Self {
            gas: GasCalculator::new(config.gas.clone()),
            state: Mutex::new(ChainState {
                world,
                contracts: HashMap::new(),
                blocks: vec![genesis],
                rng,
                coinbase: Address::zero(),
            }),
            accounts,
            config,
        })
    }

    pub fn config(&self) -> &DevChainConfig {
        &self.config
    }

    /// Unlocked development accounts, in derivation order
    pub async fn accounts(&self) -> Vec<Address> {
        self.accounts.clone()
    }

    pub async fn get_balance(&self, address: &Address) -> Amount {
        self.state.lock().await.world.get_balance(address)
    }

    pub async fn nonce(&self, address: &Address) -> u64 {
        self.state.lock().await.world.get_nonce(address)
    }

    pub async fn block_number(&self) -> BlockNumber {
        self.state.lock().await.head().number()
    }

    pub async fn latest_block(&self) -> Block {
        self.state.lock().await.head().clone()
    }

    /// Sum of every balance on the chain, fees included
    pub async fn total_supply(&self) -> Amount {
        self.state.lock().await.world.total_supply()
    }

    /// Snapshot of a deployed ledger
    pub async fn ledger(&self, contract: &Address) -> ChainResult<LotteryLedger> {
        let state = self.state.lock().await;
        state
            .contracts
            .get(contract)
            .cloned()
            .ok_or(ChainError::UnknownContract(*contract))
    }

    /// Deploy a new lottery; the sender becomes its manager
    pub async fn deploy_lottery(
        &self,
        lottery: LotteryConfig,
        opts: TxOptions,
    ) -> ChainResult<DeployReceipt> {
        let capacity = self.gas.max_entrants_within(self.config.block_gas_limit);
        let lottery = if lottery.max_entrants > capacity {
            tracing::warn!(
                requested = lottery.max_entrants,
                capacity,
                "capping entrants to what one pickWinner can pay out within a block"
            );
            lottery.with_max_entrants(capacity)
        } else {
            lottery
        };

        let mut state = self.state.lock().await;
        let pending = self.begin(&state, &opts, None, None)?;

        let required = self.gas.deploy_cost();
        if pending.gas < required {
            state.settle(&pending, pending.gas)?;
            tracing::warn!(from = %opts.from, limit = pending.gas, required, "deployment ran out of gas");
            return Err(ChainError::OutOfGas { limit: pending.gas, required });
        }
        if !opts.value.is_zero() {
            state.settle(&pending, self.gas.intrinsic_gas())?;
            tracing::warn!(from = %opts.from, "deployment reverted: constructor is not payable");
            return Err(lottery_contract::LotteryError::NonPayable.into());
        }

        let contract_address = Address::contract_address(&opts.from, pending.nonce);

        state.world.checkpoint();
        let mut contract_account = Account::new();
        contract_account.code_hash = Some(b"lottery".keccak());
        state.world.set_account(contract_address, contract_account);

        let block = match state.settle(&pending, required) {
            Ok(block) => block,
            Err(err) => {
                state.world.rollback();
                return Err(err);
            }
        };
        state.world.commit();

        state
            .contracts
            .insert(contract_address, LotteryLedger::new(opts.from, lottery));

        tracing::info!(
            contract = %contract_address,
            manager = %opts.from,
            block = block.number(),
            "lottery deployed"
        );

        Ok(DeployReceipt {
            transaction_hash: pending.hash,
            block_number: block.number(),
            contract_address,
            manager: opts.from,
            gas_used: required,
            fee: Amount::fee(required, pending.gas_price),
        })
    }

    /// Submit a state-changing call as a transaction and mine it
    pub async fn send(
        &self,
        contract: &Address,
        call: LotteryCall,
        opts: TxOptions,
    ) -> ChainResult<TransactionReceipt> {
        let mut state = self.state.lock().await;

        let entrants = state
            .contracts
            .get(contract)
            .map(LotteryLedger::player_count)
            .ok_or(ChainError::UnknownContract(*contract))?;
        let pending = self.begin(&state, &opts, Some(contract), Some(call))?;

        let required = self.gas.cost_of(call, entrants);
        if pending.gas < required {
            state.settle(&pending, pending.gas)?;
            tracing::warn!(
                method = call.name(),
                limit = pending.gas,
                required,
                "transaction ran out of gas"
            );
            return Err(ChainError::OutOfGas { limit: pending.gas, required });
        }

        let ctx = CallContext::new(opts.from, opts.value.clone());

        let executed = state.atomically(contract, |state| {
            let output =
                state.execute(contract, call, &ctx, &self.config.randomness, &pending.header)?;
            let block = state.settle(&pending, required)?;
            Ok((output, block))
        });

        let (output, block) = match executed {
            Ok(done) => done,
            Err(err) => {
                if matches!(err, ChainError::Reverted(_)) {
                    state.settle(&pending, self.gas.intrinsic_gas())?;
                }
                tracing::warn!(method = call.name(), from = %opts.from, error = %err, "transaction reverted");
                return Err(err);
            }
        };

        let events = output.event().into_iter().collect();
        Ok(TransactionReceipt {
            transaction_hash: pending.hash,
            block_number: block.number(),
            block_hash: block.header.hash()?,
            from: opts.from,
            to: *contract,
            method: call.name().into(),
            value: opts.value,
            gas_used: required,
            effective_gas_price: pending.gas_price,
            fee: Amount::fee(required, pending.gas_price),
            output,
            events,
        })
    }

    /// Execute a call against a scratch copy of the state.
    ///
    /// Nothing is persisted, no gas is charged and no block is mined, which
    /// makes this the way to read `getPlayers` / `getBalance`.
    pub async fn call(
        &self,
        contract: &Address,
        call: LotteryCall,
        from: Address,
    ) -> ChainResult<LotteryOutput> {
        let state = self.state.lock().await;
        let mut scratch = ChainState {
            world: state.world.clone(),
            contracts: HashMap::new(),
            blocks: Vec::new(),
            // Never the chain's own RNG: a dry run must not preview the next draw
            rng: RngSource::from_entropy(),
            coinbase: state.coinbase,
        };
        let ledger = state
            .contracts
            .get(contract)
            .cloned()
            .ok_or(ChainError::UnknownContract(*contract))?;
        scratch.contracts.insert(*contract, ledger);

        let header = state.head().next_header(now(), state.coinbase)?;
        drop(state);

        tracing::debug!(method = call.name(), %from, "eth_call");
        scratch.execute(
            contract,
            call,
            &CallContext::from_caller(from),
            &self.config.randomness,
            &header,
        )
    }

    pub async fn get_players(&self, contract: &Address, from: Address) -> ChainResult<Vec<Address>> {
        let output = self.call(contract, LotteryCall::GetPlayers, from).await?;
        Ok(output.into_players().unwrap_or_default())
    }

    pub async fn get_lottery_balance(&self, contract: &Address, from: Address) -> ChainResult<Amount> {
        let output = self.call(contract, LotteryCall::GetBalance, from).await?;
        Ok(output.into_balance().unwrap_or_default())
    }

    /// Validate a transaction before anything executes
    fn begin(
        &self,
        state: &ChainState,
        opts: &TxOptions,
        to: Option<&Address>,
        call: Option<LotteryCall>,
    ) -> ChainResult<PendingTx> {
        if !self.accounts.contains(&opts.from) {
            return Err(ChainError::UnknownAccount(opts.from));
        }

        let gas = opts.gas.unwrap_or(self.config.default_gas);
        if gas > self.config.block_gas_limit {
            return Err(ChainError::GasLimitExceeded {
                requested: gas,
                limit: self.config.block_gas_limit,
            });
        }

        let gas_price = self.config.gas_price;
        let needed = &opts.value + &Amount::fee(gas, gas_price);
        let available = state.world.get_balance(&opts.from);
        if available < needed {
            return Err(ChainError::InsufficientFunds {
                account: opts.from,
                needed,
                available,
            });
        }

        let nonce = state.world.get_nonce(&opts.from);
        let hash = TxEnvelope {
            from: &opts.from,
            nonce,
            to,
            call,
            value: &opts.value,
            gas,
        }
        .hash()?;

        Ok(PendingTx {
            from: opts.from,
            nonce,
            gas,
            gas_price,
            hash,
            header: state.head().next_header(now(), state.coinbase)?,
        })
    }
}

/// Everything guarded by the chain lock
struct ChainState {
    world: WorldState,
    contracts: HashMap<Address, LotteryLedger>,
    blocks: Vec<Block>,
    rng: RngSource<StdRng>,
    /// Receives transaction fees
    coinbase: Address,
}

impl ChainState {
    fn head(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// Run `apply` so that the world state and the ledger at `contract`
    /// either both keep its changes or both lose them
    fn atomically<T>(
        &mut self,
        contract: &Address,
        apply: impl FnOnce(&mut Self) -> ChainResult<T>,
    ) -> ChainResult<T> {
        let snapshot = self.contracts.get(contract).cloned();
        self.world.checkpoint();

        match apply(self) {
            Ok(done) => {
                self.world.commit();
                Ok(done)
            }
            Err(err) => {
                self.world.rollback();
                if let Some(ledger) = snapshot {
                    self.contracts.insert(*contract, ledger);
                }
                Err(err)
            }
        }
    }

    /// Move the attached value into the contract and run the call.
    ///
    /// Callers run this inside `atomically`.
    fn execute(
        &mut self,
        contract: &Address,
        call: LotteryCall,
        ctx: &CallContext,
        mode: &RandomnessMode,
        header: &BlockHeader,
    ) -> ChainResult<LotteryOutput> {
        let ledger = self
            .contracts
            .get_mut(contract)
            .ok_or(ChainError::UnknownContract(*contract))?;

        if !ctx.value.is_zero() {
            self.world.transfer(&ctx.caller, contract, &ctx.value)?;
        }

        let mut treasury = ContractTreasury {
            world: &mut self.world,
            contract: *contract,
        };

        let mut block_source;
        let randomness: &mut dyn RandomnessSource = match mode {
            RandomnessMode::Entropy | RandomnessMode::Seeded { .. } => &mut self.rng,
            RandomnessMode::BlockContext => {
                block_source = BlockContextSource::new(header.context());
                &mut block_source
            }
        };

        Ok(ledger.dispatch(call, ctx, randomness, &mut treasury)?)
    }

    /// Charge the fee, bump the nonce and mine the block carrying `pending`
    fn settle(&mut self, pending: &PendingTx, gas_used: Gas) -> ChainResult<Block> {
        let fee = Amount::fee(gas_used, pending.gas_price);
        self.world.debit(&pending.from, &fee)?;
        self.world.credit(&self.coinbase, &fee)?;
        self.world.get_account_mut(&pending.from).increment_nonce();

        let mut header = pending.header.clone();
        header.gas_used = gas_used;
        header.state_root = self.world.state_root()?;
        header.validate(&self.head().header)?;

        let block = Block {
            header,
            transactions: vec![pending.hash],
        };

        tracing::info!(
            number = block.number(),
            tx = %pending.hash,
            gas_used,
            "block mined"
        );

        self.blocks.push(block.clone());
        Ok(block)
    }
}

/// Validated transaction waiting for execution
struct PendingTx {
    from: Address,
    nonce: u64,
    gas: Gas,
    gas_price: GasPrice,
    hash: Hash,
    /// Header of the block this transaction will be mined in
    header: BlockHeader,
}

/// Payout capability handed to the ledger: moves value out of the
/// contract's own account and nothing else
struct ContractTreasury<'a> {
    world: &'a mut WorldState,
    contract: Address,
}

impl ValueTransfer for ContractTreasury<'_> {
    fn transfer(&mut self, to: &Address, amount: &Amount) -> Result<(), TransferError> {
        self.world
            .transfer(&self.contract, to, amount)
            .map_err(|e| TransferError {
                to: *to,
                amount: amount.clone(),
                reason: e.to_string(),
            })
    }
}

fn now() -> Timestamp {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottery_contract::LotteryError;

    fn ether(value: &str) -> Amount {
        Amount::parse_ether(value).unwrap()
    }

    async fn chain_with_lottery() -> (DevChain, Vec<Address>, Address) {
        let chain = DevChain::new(DevChainConfig::default()).unwrap();
        let accounts = chain.accounts().await;
        let receipt = chain
            .deploy_lottery(LotteryConfig::default(), TxOptions::sender(accounts[0]))
            .await
            .unwrap();
        (chain, accounts, receipt.contract_address)
    }

    #[tokio::test]
    async fn test_accounts_are_funded() {
        let chain = DevChain::new(DevChainConfig::default()).unwrap();
        let accounts = chain.accounts().await;

        assert_eq!(accounts.len(), 10);
        for account in &accounts {
            assert_eq!(chain.get_balance(account).await, Amount::from_ether(100));
        }
        assert_eq!(chain.block_number().await, 0);
    }

    #[tokio::test]
    async fn test_deploy_mines_block_and_charges_gas() {
        let (chain, accounts, contract) = chain_with_lottery().await;

        assert_eq!(chain.block_number().await, 1);
        assert_eq!(chain.nonce(&accounts[0]).await, 1);
        assert!(chain.get_balance(&accounts[0]).await < Amount::from_ether(100));
        assert_eq!(chain.ledger(&contract).await.unwrap().manager(), accounts[0]);
    }

    #[tokio::test]
    async fn test_contract_balance_tracks_pool() {
        let (chain, accounts, contract) = chain_with_lottery().await;

        for (i, value) in ["0.02", "0.03", "0.04"].iter().enumerate() {
            chain
                .send(&contract, LotteryCall::Enter, TxOptions::sender(accounts[i]).value(ether(value)))
                .await
                .unwrap();
            let ledger = chain.ledger(&contract).await.unwrap();
            assert_eq!(chain.get_balance(&contract).await, ledger.get_balance());
        }
    }

    #[tokio::test]
    async fn test_reverted_entry_charges_intrinsic_gas_only() {
        let (chain, accounts, contract) = chain_with_lottery().await;
        let before = chain.get_balance(&accounts[1]).await;

        let err = chain
            .send(&contract, LotteryCall::Enter, TxOptions::sender(accounts[1]).value(ether("0.001")))
            .await
            .unwrap_err();

        assert!(matches!(
            err.revert_reason(),
            Some(LotteryError::InsufficientContribution { .. })
        ));
        let expected = before
            .checked_sub(&Amount::fee(21_000, chain.config().gas_price))
            .unwrap();
        assert_eq!(chain.get_balance(&accounts[1]).await, expected);
        assert!(chain.get_balance(&contract).await.is_zero());
        assert_eq!(chain.nonce(&accounts[1]).await, 1);
    }

    #[tokio::test]
    async fn test_out_of_gas_charges_whole_limit() {
        let (chain, accounts, contract) = chain_with_lottery().await;
        let before = chain.get_balance(&accounts[2]).await;

        let err = chain
            .send(
                &contract,
                LotteryCall::Enter,
                TxOptions::sender(accounts[2]).value(ether("1")).gas(30_000),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::OutOfGas { limit: 30_000, .. }));
        let expected = before
            .checked_sub(&Amount::fee(30_000, chain.config().gas_price))
            .unwrap();
        assert_eq!(chain.get_balance(&accounts[2]).await, expected);
        assert!(chain.ledger(&contract).await.unwrap().get_players().is_empty());
    }

    #[tokio::test]
    async fn test_gas_above_block_limit_is_rejected_for_free() {
        let (chain, accounts, contract) = chain_with_lottery().await;
        let before = chain.get_balance(&accounts[3]).await;

        let err = chain
            .send(&contract, LotteryCall::Enter, TxOptions::sender(accounts[3]).gas(10_000_000))
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::GasLimitExceeded { .. }));
        assert_eq!(chain.get_balance(&accounts[3]).await, before);
    }

    #[tokio::test]
    async fn test_unknown_sender_and_contract() {
        let (chain, accounts, contract) = chain_with_lottery().await;

        let stranger = Address::random();
        assert!(matches!(
            chain.send(&contract, LotteryCall::Enter, TxOptions::sender(stranger)).await,
            Err(ChainError::UnknownAccount(_))
        ));
        assert!(matches!(
            chain.call(&Address::random(), LotteryCall::GetPlayers, accounts[0]).await,
            Err(ChainError::UnknownContract(_))
        ));
    }

    #[tokio::test]
    async fn test_insufficient_funds() {
        let (chain, accounts, contract) = chain_with_lottery().await;

        let err = chain
            .send(&contract, LotteryCall::Enter, TxOptions::sender(accounts[4]).value(ether("150")))
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::InsufficientFunds { .. }));
        assert_eq!(chain.nonce(&accounts[4]).await, 0);
    }

    #[tokio::test]
    async fn test_call_does_not_persist() {
        let (chain, accounts, contract) = chain_with_lottery().await;
        chain
            .send(&contract, LotteryCall::Enter, TxOptions::sender(accounts[1]).value(ether("1")))
            .await
            .unwrap();
        let height = chain.block_number().await;
        let supply = chain.total_supply().await;

        // Simulated payout: reports a winner but moves nothing
        let output = chain.call(&contract, LotteryCall::PickWinner, accounts[0]).await.unwrap();
        assert_eq!(output.into_payout().map(|p| p.winner), Some(accounts[1]));

        assert_eq!(chain.block_number().await, height);
        assert_eq!(chain.total_supply().await, supply);
        assert_eq!(chain.get_players(&contract, accounts[0]).await.unwrap(), vec![accounts[1]]);
    }

    #[tokio::test]
    async fn test_block_context_randomness_mode() {
        let config = DevChainConfig {
            randomness: RandomnessMode::BlockContext,
            ..Default::default()
        };
        let chain = DevChain::new(config).unwrap();
        let accounts = chain.accounts().await;
        let contract = chain
            .deploy_lottery(LotteryConfig::default(), TxOptions::sender(accounts[0]))
            .await
            .unwrap()
            .contract_address;

        for account in &accounts[1..4] {
            chain
                .send(&contract, LotteryCall::Enter, TxOptions::sender(*account).value(ether("0.5")))
                .await
                .unwrap();
        }

        let receipt = chain
            .send(&contract, LotteryCall::PickWinner, TxOptions::sender(accounts[0]))
            .await
            .unwrap();
        let payout = receipt.output.into_payout().unwrap();

        assert!(accounts[1..4].contains(&payout.winner));
        assert_eq!(payout.amount, ether("1.5"));
        assert!(chain.get_balance(&contract).await.is_zero());
    }

    #[tokio::test]
    async fn test_dry_run_payout_leaves_next_draw_alone() {
        let seeded = || DevChainConfig {
            randomness: RandomnessMode::Seeded { seed: 7 },
            ..Default::default()
        };
        let mut winners = Vec::new();

        for dry_runs in [0, 10] {
            let chain = DevChain::new(seeded()).unwrap();
            let accounts = chain.accounts().await;
            let contract = chain
                .deploy_lottery(LotteryConfig::default(), TxOptions::sender(accounts[0]))
                .await
                .unwrap()
                .contract_address;
            for account in &accounts[1..] {
                chain
                    .send(&contract, LotteryCall::Enter, TxOptions::sender(*account).value(ether("0.1")))
                    .await
                    .unwrap();
            }

            for _ in 0..dry_runs {
                chain.call(&contract, LotteryCall::PickWinner, accounts[0]).await.unwrap();
            }

            let payout = chain
                .send(&contract, LotteryCall::PickWinner, TxOptions::sender(accounts[0]))
                .await
                .unwrap()
                .output
                .into_payout()
                .unwrap();
            winners.push(payout.winner);
        }

        // Same seed, same draw, however many calls happened in between
        assert_eq!(winners[0], winners[1]);
    }

    #[tokio::test]
    async fn test_failure_after_dispatch_restores_ledger() {
        let (chain, accounts, contract) = chain_with_lottery().await;
        let mut state = chain.state.lock().await;
        let header = state.head().next_header(now(), state.coinbase).unwrap();
        let ctx = CallContext::new(accounts[1], ether("1"));

        let result: ChainResult<()> = state.atomically(&contract, |state| {
            state.execute(&contract, LotteryCall::Enter, &ctx, &RandomnessMode::Entropy, &header)?;
            Err(ChainError::InvalidConfig("block rejected".into()))
        });

        assert!(result.is_err());
        assert_eq!(state.contracts[&contract].player_count(), 0);
        assert!(state.world.get_balance(&contract).is_zero());
        assert_eq!(state.world.get_balance(&accounts[1]), Amount::from_ether(100));
    }

    #[tokio::test]
    async fn test_deploy_caps_entrants_to_block_gas() {
        let chain = DevChain::new(DevChainConfig::default()).unwrap();
        let accounts = chain.accounts().await;
        let contract = chain
            .deploy_lottery(
                LotteryConfig::default().with_max_entrants(usize::MAX),
                TxOptions::sender(accounts[0]),
            )
            .await
            .unwrap()
            .contract_address;

        let capacity = chain.ledger(&contract).await.unwrap().max_entrants();
        assert_eq!(capacity, chain.gas.max_entrants_within(chain.config().block_gas_limit));
        assert!(chain.gas.pick_winner_cost(capacity) <= chain.config().block_gas_limit);
    }
}
