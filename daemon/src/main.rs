//! Tint daemon: replays decoded blocks through the overlay ledger.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tint_ledger::Spendability;
use tint_node::{init_logging, load_blocks, NodeConfig, OverlayNode};
use tint_types::{BlockHeight, NetworkId, OutputKey, TxId};

#[derive(Parser)]
#[command(name = "tint-daemon", about = "Tint overlay ledger daemon")]
struct Cli {
    /// Network to follow: "main", "test" or "regtest".
    /// When a config file is provided, defaults to the file's network value.
    #[arg(long, env = "TINT_NETWORK")]
    network: Option<NetworkId>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TINT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TINT_LOG_FORMAT")]
    log_format: Option<String>,

    /// Threads used to classify independent transactions (0 = one per core).
    #[arg(long, env = "TINT_CLASSIFICATION_THREADS")]
    threads: Option<usize>,

    /// Print Prometheus metrics after the command completes.
    #[arg(long, env = "TINT_ENABLE_METRICS")]
    metrics: bool,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Apply a JSON array of blocks and print the resulting ledger summary.
    Replay {
        #[arg(long)]
        blocks: PathBuf,
    },
    /// Apply a JSON array of blocks, then roll back one height.
    Rollback {
        #[arg(long)]
        blocks: PathBuf,
        #[arg(long)]
        height: BlockHeight,
    },
    /// Apply a JSON array of blocks, then ask whether an output may be spent.
    CheckSpend {
        #[arg(long)]
        blocks: PathBuf,
        #[arg(long)]
        tx: TxId,
        #[arg(long)]
        index: u32,
        #[arg(long)]
        height: BlockHeight,
    },
}

fn build_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let base = match &cli.config {
        Some(path) => {
            let path_str = path
                .to_str()
                .with_context(|| format!("config path {} is not UTF-8", path.display()))?;
            NodeConfig::from_toml_file(path_str)
                .with_context(|| format!("loading config from {}", path.display()))?
        }
        None => NodeConfig::default(),
    };

    Ok(NodeConfig {
        network: cli.network.unwrap_or(base.network),
        log_level: cli.log_level.clone().unwrap_or(base.log_level.clone()),
        log_format: cli.log_format.clone().unwrap_or(base.log_format.clone()),
        classification_threads: cli.threads.unwrap_or(base.classification_threads),
        enable_metrics: cli.metrics || base.enable_metrics,
        ..base
    })
}

fn replay(node: &OverlayNode, blocks: &Path) -> anyhow::Result<()> {
    let blocks = load_blocks(blocks)?;
    tracing::info!(count = blocks.len(), "replaying blocks");
    for block in &blocks {
        let receipt = node
            .apply_block(block)
            .with_context(|| format!("applying block at height {}", block.height))?;
        for tx in &receipt.txs {
            if let tint_ledger::CommitOutcome::Rejected(reason) = &tx.outcome {
                tracing::info!(tx_id = %tx.tx_id, %reason, "transaction rejected");
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    init_logging(config.log_format()?, &config.log_level);

    let enable_metrics = config.enable_metrics;
    let node = OverlayNode::new(config)?;

    match &cli.command {
        Command::Replay { blocks } => {
            replay(&node, blocks)?;
            println!("{}", serde_json::to_string_pretty(&node.summary()?)?);
        }
        Command::Rollback { blocks, height } => {
            replay(&node, blocks)?;
            let receipt = node.rollback_block(*height)?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
            println!("{}", serde_json::to_string_pretty(&node.summary()?)?);
        }
        Command::CheckSpend {
            blocks,
            tx,
            index,
            height,
        } => {
            replay(&node, blocks)?;
            let key = OutputKey::new(*tx, *index);
            let verdict = node.check_spend(&key, *height)?;
            let output = node.output(&key)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "output": key.to_string(),
                    "height": height,
                    "spendable": verdict.is_spendable(),
                    "verdict": verdict,
                    "output_type": output.as_ref().map(|o| o.output_type()),
                    "digest": hex::encode(node.digest()?),
                }))?
            );
            if let Spendability::Locked { until } = verdict {
                tracing::warn!(%key, until, "output is still bonded");
            }
        }
    }

    if enable_metrics {
        print!("{}", node.metrics.encode()?);
    }

    tracing::info!("tint daemon exited cleanly");
    Ok(())
}
