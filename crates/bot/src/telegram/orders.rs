//! Checkout and order history.
//!
//! Checkout has two entry points with identical semantics: the inline
//! `checkout` button in the cart view and the Telegram web-app payload sent
//! by the storefront. Both only trigger placement; the total and the line
//! set always come from the live cart on the server, never from the client.

use fluent_templates::fluent_bundle::FluentArgs;
use serde::Deserialize;
use teloxide::prelude::*;
use unic_langid::LanguageIdentifier;

use farmconnect_core::storage::orders::{self, Checkout};
use farmconnect_core::storage::get_connection;
use farmconnect_core::{cutoff, i18n, money};

use crate::telegram::types::{HandlerDeps, HandlerError};
use crate::telegram::Bot;

/// Checkout payload posted by the web-app storefront.
///
/// Treated as a trigger only: the client-side total and item list are parsed
/// for validity, logged on mismatch, and otherwise ignored.
#[derive(Debug, Deserialize)]
pub struct WebAppCheckout {
    pub total: f64,
    #[serde(default)]
    pub items: Vec<WebAppItem>,
}

#[derive(Debug, Deserialize)]
pub struct WebAppItem {
    pub id: i64,
    pub qty: f64,
    pub price: f64,
}

/// Places an order from the live cart and reports the outcome to the chat.
pub async fn run_checkout(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    if !cutoff::is_order_allowed() {
        bot.send_message(chat_id, i18n::t(lang, "orders-closed")).await?;
        return Ok(());
    }

    let checkout = {
        let mut conn = get_connection(&deps.db_pool)?;
        orders::place_order_from_cart(&mut conn, user_id, None)?
    };

    match checkout {
        Checkout::Placed { order_id, total_cents } => {
            let mut args = FluentArgs::new();
            args.set("id", order_id);
            args.set("total", money::format_cents(total_cents));

            let text = format!(
                "{}\n{}\n\n{}",
                i18n::t(lang, "order-confirm-header"),
                i18n::t_args(lang, "order-confirm-body", &args),
                i18n::t(lang, "order-confirm-contact"),
            );
            bot.send_message(chat_id, text).await?;
        }
        Checkout::EmptyCart => {
            bot.send_message(chat_id, i18n::t(lang, "cart-empty")).await?;
        }
    }
    Ok(())
}

/// Handles a checkout payload arriving through `msg.web_app_data()`.
pub async fn handle_webapp_checkout(
    bot: &Bot,
    msg: &Message,
    user_id: i64,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let Some(web_app_data) = msg.web_app_data() else {
        return Ok(());
    };

    match serde_json::from_str::<WebAppCheckout>(&web_app_data.data) {
        Ok(payload) => {
            log::info!(
                "Web-app checkout from chat {}: {} item(s), client total {:.2}",
                msg.chat.id,
                payload.items.len(),
                payload.total
            );
        }
        Err(e) => {
            // Still a checkout trigger; the cart is authoritative anyway.
            log::warn!("Unparseable web-app payload from chat {}: {}", msg.chat.id, e);
        }
    }

    run_checkout(bot, msg.chat.id, user_id, lang, deps).await
}

/// Sends the order history, newest first.
pub async fn show_orders(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let order_list = {
        let conn = get_connection(&deps.db_pool)?;
        orders::orders_for_user(&conn, user_id)?
    };

    if order_list.is_empty() {
        bot.send_message(chat_id, i18n::t(lang, "orders-empty")).await?;
        return Ok(());
    }

    let mut text = i18n::t(lang, "orders-title");
    for order in &order_list {
        let mut args = FluentArgs::new();
        args.set("id", order.id);
        args.set("date", order.created_at.clone());
        args.set("total", money::format_cents(order.total_cents));
        args.set("status", i18n::t(lang, order.status.i18n_key()));
        text.push('\n');
        text.push_str(&i18n::t_args(lang, "orders-line", &args));
    }
    bot.send_message(chat_id, text).await?;
    Ok(())
}
