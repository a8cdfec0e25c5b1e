//! Bot instance creation and command registration

use teloxide::utils::command::BotCommands;

use farmconnect_core::config;

use crate::telegram::Bot;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Доступні команди:")]
pub enum Command {
    #[command(description = "почати роботу з ботом")]
    Start,
    #[command(description = "головне меню")]
    Menu,
    #[command(description = "каталог продуктів")]
    Catalog,
    #[command(description = "кошик")]
    Cart,
    #[command(description = "мої замовлення")]
    Orders,
    #[command(description = "профіль")]
    Profile,
    #[command(description = "змінити мову")]
    Language,
}

/// Creates a Bot instance from the configured token.
///
/// # Errors
/// Returns an error when no token is configured.
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.clone();
    if token.is_empty() {
        anyhow::bail!("BOT_TOKEN (or TELOXIDE_TOKEN) is not set");
    }
    Ok(Bot::new(token))
}

/// Registers the command list in the Telegram UI.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::types::BotCommand;
    use teloxide::prelude::*;

    bot.set_my_commands(vec![
        BotCommand::new("start", "почати роботу з ботом"),
        BotCommand::new("menu", "головне меню"),
        BotCommand::new("catalog", "каталог продуктів"),
        BotCommand::new("cart", "кошик"),
        BotCommand::new("orders", "мої замовлення"),
        BotCommand::new("profile", "профіль"),
        BotCommand::new("language", "змінити мову"),
    ])
    .await?;

    Ok(())
}
