// lottery-cli/src/lib.rs

pub mod config;
pub mod simulate;

pub use config::LotteryNetConfig;
pub use simulate::{run_simulation, RoundSummary};
