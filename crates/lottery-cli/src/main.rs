// lottery-cli/src/main.rs

use clap::{Parser, Subcommand};
use lottery_cli::{run_simulation, LotteryNetConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lottery-devnet")]
#[command(about = "Lottery ledger on an in-process development chain", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./config.toml")]
        output: String,
    },

    /// List the development accounts and their balances
    Accounts {
        /// Configuration file path; defaults are used when omitted
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Deploy a lottery and play the configured rounds
    Simulate {
        /// Configuration file path; defaults are used when omitted
        #[arg(short, long)]
        config: Option<String>,

        /// Override the number of rounds
        #[arg(short, long)]
        rounds: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "lottery_cli={0},devchain={0},lottery_contract={0}",
                    log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init { output } => {
            init_config(&output)?;
        }
        Commands::Accounts { config } => {
            show_accounts(&load_config(config.as_deref())?).await?;
        }
        Commands::Simulate { config, rounds } => {
            let config = load_config(config.as_deref())?;
            let rounds = rounds.unwrap_or(config.simulation.rounds);
            simulate(&config, rounds).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> anyhow::Result<LotteryNetConfig> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path);
            LotteryNetConfig::from_file(path)
        }
        None => Ok(LotteryNetConfig::default()),
    }
}

fn init_config(output: &str) -> anyhow::Result<()> {
    if std::path::Path::new(output).exists() {
        anyhow::bail!("{} already exists", output);
    }

    LotteryNetConfig::default().to_file(output)?;

    tracing::info!("Configuration written to {}", output);
    tracing::info!("Edit {} to change accounts, entries and randomness", output);
    Ok(())
}

async fn show_accounts(config: &LotteryNetConfig) -> anyhow::Result<()> {
    let chain = devchain::DevChain::new(config.chain.clone())?;

    let mut listing = Vec::new();
    for (index, address) in chain.accounts().await.into_iter().enumerate() {
        let balance = chain.get_balance(&address).await;
        listing.push(serde_json::json!({
            "index": index,
            "address": address.to_string(),
            "balance": balance.to_ether_string(),
        }));
    }

    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

async fn simulate(config: &LotteryNetConfig, rounds: u32) -> anyhow::Result<()> {
    tracing::info!(
        rounds,
        entries = config.simulation.entries.len(),
        "Running lottery simulation"
    );

    for summary in run_simulation(config, rounds).await? {
        println!("{}", serde_json::to_string(&summary)?);
    }
    Ok(())
}
