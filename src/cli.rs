//! # Reconciler CLI
use crate::{
    config::ReconcilerConfig,
    constants::STABLECOIN_DECIMALS,
    reconciler::Reconciler,
    secrets::Secrets,
    types::{RedistributionRequest, SnapshotRequest, WithdrawalCollectionRequest},
};
use alloy::primitives::{ChainId, utils::format_units};
use clap::{Parser, Subcommand};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::info;

/// Off-chain reconciliation of cross-chain liquidity pools.
///
/// Results are printed to stdout as `0x`-prefixed hex. Logs go to stderr.
#[derive(Debug, Parser)]
#[command(author, about = "Reconciler", long_about = None)]
pub struct Args {
    /// The configuration file.
    ///
    /// If missing, a default one will be used and stored under the given path.
    #[arg(
        long,
        value_name = "CONFIG",
        env = "RECONCILER_CONFIG",
        default_value = "reconciler.yaml"
    )]
    pub config: PathBuf,
    /// Overrides the timeout of a single JSON-RPC request.
    #[arg(long, value_name = "MILLIS", value_parser = parse_duration_millis)]
    pub request_timeout: Option<Duration>,
    /// The use case to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Reconciler use cases.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Aggregate pool liquidity and report finalized pending transfers.
    ///
    /// Positional layout: `reserved reserved reserved chain_id`.
    Snapshot {
        /// Hex-encoded positional arguments.
        #[arg(value_name = "ARGS", required = true)]
        args: Vec<String>,
    },
    /// Redistribute liquidity towards a joining pool.
    ///
    /// Positional layout: `reserved reserved reserved new_pool_selector request_id mode chain_id`.
    Redistribute {
        /// Hex-encoded positional arguments.
        #[arg(value_name = "ARGS", required = true)]
        args: Vec<String>,
    },
    /// Collect a withdrawal from every non-home pool.
    ///
    /// Positional layout: `reserved reserved reserved chain_id amount_per_pool withdrawal_id`.
    CollectWithdrawal {
        /// Hex-encoded positional arguments.
        #[arg(value_name = "ARGS", required = true)]
        args: Vec<String>,
    },
    /// Print balance and loans in use of every pool of a network.
    PoolInfo {
        /// Numeric chain id of the network's home chain.
        #[arg(long, value_name = "CHAIN_ID")]
        chain_id: ChainId,
    },
    /// Write the default configuration.
    Registry {
        /// Output file.
        #[arg(long, value_name = "PATH", default_value = "reconciler.yaml")]
        out: PathBuf,
    },
}

impl Args {
    /// Run the selected use case.
    pub async fn run(self) -> eyre::Result<()> {
        let config = || load_config(&self.config, self.request_timeout);
        let secrets = Secrets::from_env();

        match self.command {
            Command::Snapshot { args } => {
                let request = SnapshotRequest::parse(&args)?;
                let reconciler =
                    Reconciler::connect(&config()?, request.chain_id, &secrets, None)?;
                let result = reconciler.liquidity_snapshot(&request).await?;
                println!("{}", result.encode());
            }
            Command::Redistribute { args } => {
                let request = RedistributionRequest::parse(&args)?;
                let wallet = secrets.pool_messenger_wallet()?;
                let reconciler =
                    Reconciler::connect(&config()?, request.chain_id, &secrets, Some(wallet))?;
                println!("{}", reconciler.redistribute(&request).await?);
            }
            Command::CollectWithdrawal { args } => {
                let request = WithdrawalCollectionRequest::parse(&args)?;
                let wallet = secrets.pool_messenger_wallet()?;
                let reconciler =
                    Reconciler::connect(&config()?, request.chain_id, &secrets, Some(wallet))?;
                println!("{}", reconciler.collect_withdrawal(&request).await?);
            }
            Command::PoolInfo { chain_id } => {
                let reconciler = Reconciler::connect(&config()?, chain_id, &secrets, None)?;
                let home = reconciler.chains().home().selector;
                for pool in reconciler.pool_info().await? {
                    println!(
                        "{}{}: balance {} loans {}",
                        pool.selector,
                        if pool.selector == home { " (home)" } else { "" },
                        format_units(pool.balance, STABLECOIN_DECIMALS)?,
                        format_units(pool.loans, STABLECOIN_DECIMALS)?,
                    );
                }
            }
            Command::Registry { out } => {
                ReconcilerConfig::default().save_to_file(&out)?;
                info!(path = %out.display(), "Wrote default configuration");
            }
        }

        Ok(())
    }
}

/// Loads the configuration, writing the defaults first if the file does not exist.
fn load_config(path: &Path, request_timeout: Option<Duration>) -> eyre::Result<ReconcilerConfig> {
    let config = if !path.exists() {
        let config = ReconcilerConfig::default();
        config.save_to_file(path)?;
        config
    } else {
        ReconcilerConfig::load_from_file(path)?
    };

    Ok(match request_timeout {
        Some(timeout) => config.with_request_timeout(timeout),
        None => config,
    })
}

/// Parses a string representing milliseconds to a [`Duration`].
fn parse_duration_millis(arg: &str) -> Result<Duration, std::num::ParseIntError> {
    let millis = arg.parse()?;
    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_positional_arguments() {
        let args = Args::parse_from([
            "reconciler",
            "--config",
            "custom.yaml",
            "snapshot",
            "0x",
            "0x",
            "0x",
            "0x14a34",
        ]);
        assert_eq!(args.config, PathBuf::from("custom.yaml"));
        let Command::Snapshot { args } = args.command else { panic!("expected snapshot") };
        assert_eq!(SnapshotRequest::parse(&args).unwrap().chain_id, 84532);
    }

    #[test]
    fn parses_request_timeout() {
        let args = Args::parse_from([
            "reconciler",
            "--request-timeout",
            "2500",
            "pool-info",
            "--chain-id",
            "8453",
        ]);
        assert_eq!(args.request_timeout, Some(Duration::from_millis(2500)));
        assert!(matches!(args.command, Command::PoolInfo { chain_id: 8453 }));
    }

    #[tokio::test]
    async fn registry_writes_default_config() {
        let path = std::env::temp_dir().join(format!("reconciler-{}.yaml", std::process::id()));
        let args = Args::parse_from(["reconciler", "registry", "--out", path.to_str().unwrap()]);
        args.run().await.unwrap();
        assert_eq!(ReconcilerConfig::load_from_file(&path).unwrap(), ReconcilerConfig::default());
        std::fs::remove_file(path).unwrap();
    }
}
