//! Utility modules shared across the bot
//!
//! - Configuration management
//! - Logging setup
//! - Risk gate
//! - Common types

pub mod config;
pub mod logger;
pub mod risk;
pub mod types;
