use anyhow::Context;
use clap::Parser;
use commonware_runtime::{tokio, Runner};
use commonware_utils::hex;
use gambit_execution::{Config, Engine, Ledger};
use gambit_simulator::{Scenario, Simulator};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay an escrow scenario.", long_about = None)]
struct Args {
    /// Engine configuration (YAML)
    #[arg(short, long)]
    config: PathBuf,

    /// Scenario script (YAML)
    #[arg(short, long)]
    scenario: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Load config
    let raw = std::fs::read_to_string(&args.config)
        .with_context(|| format!("could not read config file {}", args.config.display()))?;
    let config = Config::from_yaml(&raw)
        .and_then(Config::validate)
        .context("invalid config")?;

    // Load scenario
    let raw = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("could not read scenario {}", args.scenario.display()))?;
    let scenario = Scenario::from_yaml(&raw).context("invalid scenario")?;

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    // Start runtime
    let executor = tokio::Runner::new(tokio::Config::default());
    executor.start(|context| async move {
        let engine = Engine::new(context.clone(), config, Ledger::default());
        let simulator = Simulator::new(context, engine, &scenario.identities)
            .context("invalid identities")?;
        let report = simulator
            .replay(&scenario.steps)
            .await
            .context("replay failed")?;

        for identity in &scenario.identities {
            info!(
                name = %identity.name,
                key = hex(&simulator.public(&identity.name)?),
                balance = simulator.balance(&identity.name)?,
                "final balance"
            );
        }
        info!(
            applied = report.applied,
            rejected = report.rejected.len(),
            platform = simulator.platform_balance(),
            "replay complete"
        );
        Ok::<_, anyhow::Error>(())
    })
}
