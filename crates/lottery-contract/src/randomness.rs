// lottery-contract/src/randomness.rs

use lottery_core::BlockContext;
use lottery_crypto::{hash::Hashable, Address};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Picks the winning position among the current entrants.
///
/// Implementations may return any `usize`; the ledger reduces it modulo the
/// number of entrants. `entrants` is never empty when the ledger asks.
pub trait RandomnessSource {
    fn select_index(&mut self, entrants: &[Address]) -> usize;
}

impl<T: RandomnessSource + ?Sized> RandomnessSource for &mut T {
    fn select_index(&mut self, entrants: &[Address]) -> usize {
        (**self).select_index(entrants)
    }
}

impl<T: RandomnessSource + ?Sized> RandomnessSource for Box<T> {
    fn select_index(&mut self, entrants: &[Address]) -> usize {
        (**self).select_index(entrants)
    }
}

/// Uniform selection driven by an injected RNG
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: RngCore> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Reproducible source, for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: RngCore> RandomnessSource for RngSource<R> {
    fn select_index(&mut self, entrants: &[Address]) -> usize {
        if entrants.is_empty() {
            return 0;
        }
        self.rng.gen_range(0..entrants.len())
    }
}

/// Selection derived from the block a call executes in:
/// `keccak256(prev_randao ++ timestamp ++ entrants) mod len`.
///
/// Anyone who can predict or choose the block context can predict or steer
/// the outcome. Only meant for reproducing legacy behaviour.
#[derive(Debug, Clone)]
pub struct BlockContextSource {
    context: BlockContext,
}

impl BlockContextSource {
    pub fn new(context: BlockContext) -> Self {
        Self { context }
    }

    fn seed(&self, entrants: &[Address]) -> BigUint {
        let mut data = Vec::with_capacity(40 + entrants.len() * 20);
        data.extend_from_slice(self.context.prev_randao.as_bytes());
        data.extend_from_slice(&self.context.timestamp.to_be_bytes());
        for entrant in entrants {
            data.extend_from_slice(entrant.as_bytes());
        }
        BigUint::from_bytes_be(data.keccak().as_bytes())
    }
}

impl RandomnessSource for BlockContextSource {
    fn select_index(&mut self, entrants: &[Address]) -> usize {
        if entrants.is_empty() {
            return 0;
        }
        let index = self.seed(entrants) % BigUint::from(entrants.len());
        // The remainder is below entrants.len(), so it always fits
        index.to_usize().unwrap_or_default()
    }
}

/// Always selects the same position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedIndex(pub usize);

impl RandomnessSource for FixedIndex {
    fn select_index(&mut self, _entrants: &[Address]) -> usize {
        self.0
    }
}
