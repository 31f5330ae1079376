//! Logging utilities for structured logging
//!
//! Provides a compact console layer plus JSON-formatted daily log files.

use std::fs;

use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::utils::config::LoggingConfig;

/// Initialize the logging system
pub fn init_logger(config: &LoggingConfig) -> anyhow::Result<()> {
    fs::create_dir_all(&config.file_dir)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .compact();

    let file_appender = tracing_appender::rolling::daily(&config.file_dir, "mev-bundler.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .json()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logger initialized");
    Ok(())
}

/// Log detection of a tracked mempool opportunity
pub fn log_opportunity_detected(tx_hash: &str, reason: &str, priority: u32, estimated_profit: f64) {
    info!(
        tx_hash = tx_hash,
        reason = reason,
        priority = priority,
        estimated_profit = estimated_profit,
        "Mempool opportunity detected"
    );
}

/// Log bundle creation
pub fn log_bundle_created(bundle_id: &str, transaction_count: usize, expected_profit: f64) {
    info!(
        bundle_id = bundle_id,
        transaction_count = transaction_count,
        expected_profit = expected_profit,
        "Bundle created"
    );
}

/// Log a finished strategy execution
pub fn log_execution_finished(
    execution_id: &str,
    strategy: &str,
    success: bool,
    profit: f64,
    gas_used: u64,
) {
    if success {
        info!(
            execution_id = execution_id,
            strategy = strategy,
            profit = profit,
            gas_used = gas_used,
            "Strategy execution completed"
        );
    } else {
        tracing::error!(
            execution_id = execution_id,
            strategy = strategy,
            "Strategy execution failed"
        );
    }
}

/// Log risk gate events
pub fn log_risk_event(event: &str, details: &str) {
    tracing::warn!(event = event, details = details, "Risk gate event");
}

/// Log degraded operation after an infrastructure fallback
pub fn log_degraded(component: &str, detail: &str) {
    tracing::warn!(component = component, detail = detail, "Degraded operation");
}
