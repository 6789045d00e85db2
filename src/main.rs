use clap::Parser;
use log::{error, info};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use verdict::prelude::*;

/// Ledger-backed two-phase-commit coordinator.
#[derive(Parser, Debug)]
#[command(name = "verdict")]
#[command(about = "Serves the two-phase-commit adapter RPC on top of a ledger")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value_t = CoordinatorConfig::default().listen_addr)]
    listen: SocketAddr,

    /// RocksDB directory for the ledger; keeps records in memory when omitted
    #[arg(long)]
    ledger_path: Option<PathBuf>,

    /// Voting window in seconds for StartVoting requests without a timeout
    #[arg(long, default_value_t = 60)]
    default_vote_timeout: u64,

    /// Server-side per-request deadline in milliseconds (0 disables it)
    #[arg(long, default_value_t = 10_000)]
    request_timeout_ms: u64,

    /// Attempts for a conflicting ledger write before giving up
    #[arg(long, default_value_t = RetryPolicy::default().max_attempts)]
    max_attempts: u32,
}

impl Args {
    fn into_config(self) -> CoordinatorConfig {
        let defaults = CoordinatorConfig::default();
        CoordinatorConfig {
            listen_addr: self.listen,
            ledger: match self.ledger_path {
                Some(path) => LedgerBackend::Rocks { path },
                None => LedgerBackend::Memory,
            },
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                ..defaults.retry
            },
            default_vote_timeout: Duration::from_secs(self.default_vote_timeout),
            request_timeout: (self.request_timeout_ms > 0)
                .then(|| Duration::from_millis(self.request_timeout_ms)),
        }
    }
}

async fn run<L: Ledger>(ledger: Arc<L>, config: CoordinatorConfig) -> Result<()> {
    let coordinator = Arc::new(Coordinator::new(ledger, config.retry));
    serve(coordinator, &config, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown requested");
    })
    .await
}

async fn start(config: CoordinatorConfig) -> Result<()> {
    match config.ledger.clone() {
        LedgerBackend::Memory => {
            info!("Using in-memory ledger");
            run(Arc::new(MemoryLedger::new()), config).await
        }
        #[cfg(feature = "durable")]
        LedgerBackend::Rocks { path } => {
            info!("Using RocksDB ledger at {}", path.display());
            run(Arc::new(RocksLedger::open(&path)?), config).await
        }
        #[cfg(not(feature = "durable"))]
        LedgerBackend::Rocks { .. } => Err(VerdictError::InvalidArgument(
            "--ledger-path needs a build with the `durable` feature".to_string(),
        )),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();
    match start(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
