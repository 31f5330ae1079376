//! # MEV Bundler
//!
//! Bundle construction and execution pipeline for an automated MEV bot.
//!
//! ## Architecture
//!
//! - `engine`: pipeline components — mempool scanner, gas advisor, bundle
//!   builder, strategy executor — and the orchestrating `Engine`
//! - `strategies`: strategy kinds (flash-loan arbitrage, sandwich,
//!   liquidation) and their transaction-set builders
//! - `chain`: abstract chain node, signer, and simulation interfaces plus
//!   the JSON-RPC client
//! - `storage`: repository interfaces with in-memory implementations
//! - `utils`: configuration, logging, risk gate, shared types
//!
//! ## Safety
//!
//! This software is experimental and carries significant financial risk.
//! The default configuration runs dry: zero-profit estimation keeps every
//! bundle below the submission threshold.

pub mod chain;
pub mod engine;
pub mod notify;
pub mod storage;
pub mod strategies;
pub mod utils;

// Re-export commonly used types
pub use engine::Engine;
pub use strategies::Strategy;
pub use utils::config::Config;
