//! Farm Connect core — everything the ordering backend needs below the
//! Telegram/HTTP surface.
//!
//! # Module Structure
//!
//! - `config`: environment-driven configuration
//! - `cutoff`: the weekly order-cutoff policy
//! - `error`: centralized error types
//! - `i18n`: localized string resolution (uk/de)
//! - `logging`: logger initialization
//! - `money`: integer-cent money helpers
//! - `storage`: database pool, migrations, and all persistence

pub mod config;
pub mod cutoff;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod money;
pub mod storage;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
