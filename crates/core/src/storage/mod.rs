//! Database pool, migrations, and all persistence

pub mod cart;
pub mod catalog;
pub mod db;
pub mod migrations;
pub mod orders;
pub mod payments;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool};
