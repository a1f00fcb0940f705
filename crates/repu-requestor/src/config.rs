//! Command line configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use repu_client::ClientConfig;
use repu_strategy::StrategyConfig;
use repu_worker::ProtocolConfig;

/// Reputation-aware requestor: scores provider offers and tests the chosen
/// providers with a verified factoring task.
#[derive(Parser, Debug, Clone)]
#[command(name = "a1-requestor")]
#[command(version)]
pub struct Args {
    /// Weight of reputation in provider selection (0 ignores it, 100 is strict)
    #[arg(long, env = "REPU_FACTOR", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub repu_factor: u8,

    /// Offers to collect before the first one is scored
    #[arg(long, env = "REPU_MIN_OFFERS")]
    pub min_offers: usize,

    /// Numbers to factor in the test task
    #[arg(long, env = "REPU_TASK_SIZE", value_parser = clap::value_parser!(u64).range(1..))]
    pub task_size: u64,

    /// Providers to test
    #[arg(long, env = "REPU_NUM_PROVIDERS")]
    pub num_providers: usize,

    /// Longest wait for `--min-offers`, in seconds
    #[arg(long, env = "REPU_OFFERS_WAIT_TIMEOUT", default_value = "60")]
    pub offers_wait_timeout: u64,

    /// Percentage of correct results to fail on purpose
    #[arg(
        long,
        env = "REPU_RANDOM_FAIL_FACTOR",
        default_value = "0",
        value_parser = clap::value_parser!(u8).range(0..=100),
    )]
    pub random_fail_factor: u8,

    /// Reputation service base URL
    #[arg(long, env = "REPU_URL", default_value = "http://reputation.dev.golem.network")]
    pub reputation_url: String,

    /// Treat every provider as unrated instead of querying the reputation service
    #[arg(long)]
    pub offline: bool,

    /// JSON file with the offers to consider; a synthetic market is used when absent
    #[arg(long, env = "REPU_OFFERS")]
    pub offers: Option<PathBuf>,

    /// Seed for every random draw of the run
    #[arg(long, env = "REPU_SEED")]
    pub seed: Option<u64>,

    /// Log file (defaults to a1_requestor-<timestamp>.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            min_offers: self.min_offers,
            repu_factor: self.repu_factor,
            wait_for_offers_timeout: Duration::from_secs(self.offers_wait_timeout),
            seed: self.seed,
            ..StrategyConfig::default()
        }
    }

    pub fn protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig {
            random_fail_factor: self.random_fail_factor,
            seed: self.seed,
            ..ProtocolConfig::default()
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.reputation_url.clone(),
            ..ClientConfig::default()
        }
    }

    /// Log file path, timestamped unless given.
    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            let stamp = chrono::Local::now().format("%Y-%m-%dT%H%M%S");
            PathBuf::from(format!("a1_requestor-{}.log", stamp))
        })
    }
}
