//! Farm Connect — Telegram ordering bot for a farm-goods marketplace.
//!
//! # Module Structure
//!
//! - `cli`: command-line interface
//! - `seed`: demo catalog seeding
//! - `telegram`: bot integration and handlers
//! - `web`: HTTP surface (payment webhook, health)

pub mod cli;
pub mod seed;
pub mod telegram;
pub mod web;
