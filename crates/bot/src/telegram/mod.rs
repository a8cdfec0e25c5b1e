//! Telegram bot integration and handlers

pub mod bot;
pub mod callbacks;
pub mod cart;
pub mod catalog;
pub mod menu;
pub mod onboarding;
pub mod orders;
pub mod profile;
pub mod schema;
pub mod types;

use teloxide::types::InlineKeyboardButton;

pub type Bot = teloxide::Bot;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use callbacks::handle_callback;
pub use menu::show_main_menu;
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};

/// Shorthand for an inline callback button.
pub fn cb(text: impl Into<String>, data: impl Into<String>) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.into(), data.into())
}
