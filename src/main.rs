use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use mev_bundler::chain::rpc::JsonRpcChainClient;
use mev_bundler::chain::{DryRunSigner, NullSimulator};
use mev_bundler::engine::mempool_scanner::ValueHeuristicAnalyzer;
use mev_bundler::engine::{Engine, EngineDeps};
use mev_bundler::notify::{NotificationSink, TracingSink, WebhookSink};
use mev_bundler::storage::{
    InMemoryBundleRepository, InMemoryExecutionRepository, InMemoryMempoolRepository,
};
use mev_bundler::utils::config::Config;
use mev_bundler::utils::logger::init_logger;

#[derive(Debug, Parser)]
#[command(name = "mev-bundler", about = "MEV bundle construction pipeline")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/config.toml")]
    config: String,

    /// Force dry-run mode regardless of the configuration file
    #[arg(long)]
    dry_run: bool,
}

/// Main entry point for the bundle pipeline
///
/// Starts the mempool scan and gas sampling loops and keeps the strategy
/// executor available to the surrounding orchestration layer. Shuts down
/// gracefully on ctrl-c.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if cli.dry_run {
        config.execution.dry_run = true;
    }
    init_logger(&config.logging)?;
    info!("Starting mev-bundler v{}", env!("CARGO_PKG_VERSION"));

    config.validate()?;

    if config.bot.kill_switch {
        error!("Kill switch is enabled. Bot will not start.");
        return Ok(());
    }

    // Key management and a real simulation backend live outside this crate;
    // the bundled signer and simulator are only safe for dry runs.
    if !config.execution.dry_run {
        anyhow::bail!(
            "live mode requires an external signer and simulation backend; \
             set execution.dry_run = true or pass --dry-run"
        );
    }

    let chain = Arc::new(JsonRpcChainClient::new(&config.chain)?);

    let notifier: Arc<dyn NotificationSink> = if config.notification.webhook_url.is_empty() {
        Arc::new(TracingSink)
    } else {
        Arc::new(WebhookSink::new(&config.notification))
    };

    let deps = EngineDeps {
        chain,
        signer: Arc::new(DryRunSigner),
        simulator: Arc::new(NullSimulator),
        analyzer: Arc::new(ValueHeuristicAnalyzer::default()),
        bundle_repository: Arc::new(InMemoryBundleRepository::new()),
        execution_repository: Arc::new(InMemoryExecutionRepository::new()),
        mempool_repository: Arc::new(InMemoryMempoolRepository::new()),
        notifier,
    };

    let engine = Arc::new(Engine::new(config, deps));

    let shutdown_engine = engine.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Shutdown signal received, stopping bot...");
            shutdown_engine.stop().await;
        }
    });

    engine.run().await?;

    info!("Engine stopped");
    Ok(())
}
