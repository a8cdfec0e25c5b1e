//! Cart handlers: +/- taps from product cards and the cart view.

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, InlineKeyboardMarkup};
use unic_langid::LanguageIdentifier;

use farmconnect_core::storage::{cart, get_connection, DbConnection};
use farmconnect_core::{cutoff, i18n, money, AppError};

use crate::telegram::catalog::update_product_card;
use crate::telegram::types::{HandlerDeps, HandlerError};
use crate::telegram::{cb, Bot};

/// Answers a callback with a popup alert explaining the cutoff window.
///
/// Used for any ordering action that arrives while ordering is closed; a
/// keyboard rendered while ordering was open can still be tapped after it
/// closed, so this gate runs on every mutation regardless of what the
/// keyboard showed.
pub async fn answer_orders_closed(
    bot: &Bot,
    q: &CallbackQuery,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    log::info!(
        "Refused ordering action while closed; reopens in {}s",
        cutoff::seconds_until_reopen_now()
    );
    bot.answer_callback_query(q.id.clone())
        .text(i18n::t(lang, "orders-closed"))
        .show_alert(true)
        .await?;
    Ok(())
}

/// Handles a ➕ tap on a product card.
pub async fn handle_increase(
    bot: &Bot,
    q: &CallbackQuery,
    user_id: i64,
    product_id: i64,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    if !cutoff::is_order_allowed() {
        return answer_orders_closed(bot, q, lang).await;
    }

    let result = {
        let mut conn = get_connection(&deps.db_pool)?;
        cart::increase(&mut conn, user_id, product_id)
    };
    let new_quantity = match result {
        Ok(quantity) => quantity,
        Err(AppError::NotFound(_)) => {
            // The admin panel deleted the product while its card was on
            // screen; the stale keyboard is still tappable.
            bot.answer_callback_query(q.id.clone())
                .text(i18n::t(lang, "catalog-product-not-found"))
                .show_alert(true)
                .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut args = FluentArgs::new();
    args.set("qty", money::format_quantity(new_quantity));
    bot.answer_callback_query(q.id.clone())
        .text(i18n::t_args(lang, "cart-added", &args))
        .await?;

    refresh_card(bot, q, user_id, product_id, lang, deps).await
}

/// Handles a ➖ tap on a product card.
pub async fn handle_decrease(
    bot: &Bot,
    q: &CallbackQuery,
    user_id: i64,
    product_id: i64,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    if !cutoff::is_order_allowed() {
        return answer_orders_closed(bot, q, lang).await;
    }

    let update = {
        let mut conn = get_connection(&deps.db_pool)?;
        cart::decrease(&mut conn, user_id, product_id)?
    };
    bot.answer_callback_query(q.id.clone())
        .text(update_notice(update, lang))
        .await?;

    if update == cart::CartUpdate::NotInCart {
        return Ok(());
    }
    refresh_card(bot, q, user_id, product_id, lang, deps).await
}

/// Handles a per-line ➖ tap inside the cart view; the cart message itself
/// is rewritten in place.
pub async fn handle_cart_decrease(
    bot: &Bot,
    q: &CallbackQuery,
    user_id: i64,
    product_id: i64,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    if !cutoff::is_order_allowed() {
        return answer_orders_closed(bot, q, lang).await;
    }

    let update = {
        let mut conn = get_connection(&deps.db_pool)?;
        cart::decrease(&mut conn, user_id, product_id)?
    };
    bot.answer_callback_query(q.id.clone())
        .text(update_notice(update, lang))
        .await?;

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let view = {
        let conn = get_connection(&deps.db_pool)?;
        build_cart_view(&conn, user_id, lang, cutoff::is_order_allowed())?
    };
    match view {
        Some(view) => {
            bot.edit_message_text(message.chat().id, message.id(), view.text)
                .reply_markup(view.keyboard)
                .await?;
        }
        None => {
            bot.edit_message_text(message.chat().id, message.id(), i18n::t(lang, "cart-empty"))
                .await?;
        }
    }
    Ok(())
}

fn update_notice(update: cart::CartUpdate, lang: &LanguageIdentifier) -> String {
    match update {
        cart::CartUpdate::Decremented(new_quantity) => {
            let mut args = FluentArgs::new();
            args.set("qty", money::format_quantity(new_quantity));
            i18n::t_args(lang, "cart-decreased", &args)
        }
        cart::CartUpdate::Removed => i18n::t(lang, "cart-removed"),
        cart::CartUpdate::NotInCart => i18n::t(lang, "cart-not-found"),
    }
}

async fn refresh_card(
    bot: &Bot,
    q: &CallbackQuery,
    user_id: i64,
    product_id: i64,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    if let Some(message) = q.message.as_ref() {
        update_product_card(bot, message.chat().id, message.id(), user_id, product_id, lang, deps).await?;
    }
    Ok(())
}

struct CartView {
    text: String,
    keyboard: InlineKeyboardMarkup,
}

/// Builds the cart text and keyboard; `None` for an empty cart. Keyboard
/// rows: one ➖ per line, then checkout when ordering is open.
fn build_cart_view(
    conn: &DbConnection,
    user_id: i64,
    lang: &LanguageIdentifier,
    ordering_open: bool,
) -> Result<Option<CartView>, HandlerError> {
    let lines = cart::cart_lines(conn, user_id)?;
    if lines.is_empty() {
        return Ok(None);
    }

    let mut text = i18n::t(lang, "cart-title");
    let mut rows = Vec::with_capacity(lines.len() + 1);
    let mut total_cents = 0i64;
    for line in &lines {
        let line_total = line.total_cents();
        total_cents += line_total;

        let name = if lang.language.as_str() == "de" {
            &line.name_de
        } else {
            &line.name_uk
        };
        let mut args = FluentArgs::new();
        args.set("name", name.clone());
        args.set("qty", money::format_quantity(line.quantity));
        args.set("unit", line.unit.clone());
        args.set("price", money::format_cents(line.price_cents));
        args.set("total", money::format_cents(line_total));
        text.push('\n');
        text.push_str(&i18n::t_args(lang, "cart-line", &args));

        rows.push(vec![cb(format!("➖ {}", name), format!("cartdec_{}", line.product_id))]);
    }

    let mut total_args = FluentArgs::new();
    total_args.set("total", money::format_cents(total_cents));
    text.push_str("\n\n");
    text.push_str(&i18n::t_args(lang, "cart-total", &total_args));

    if ordering_open {
        rows.push(vec![cb(i18n::t(lang, "cart-checkout-button"), "checkout")]);
    }

    Ok(Some(CartView {
        text,
        keyboard: InlineKeyboardMarkup::new(rows),
    }))
}

/// Renders the cart: one line per product with quantity and line total, a
/// grand total, per-line decrement buttons, and a checkout button when
/// ordering is open.
pub async fn show_cart(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let ordering_open = cutoff::is_order_allowed();
    let view = {
        let conn = get_connection(&deps.db_pool)?;
        build_cart_view(&conn, user_id, lang, ordering_open)?
    };

    let Some(view) = view else {
        bot.send_message(chat_id, i18n::t(lang, "cart-empty")).await?;
        return Ok(());
    };

    bot.send_message(chat_id, view.text).reply_markup(view.keyboard).await?;
    if !ordering_open {
        bot.send_message(chat_id, i18n::t(lang, "orders-closed")).await?;
    }
    Ok(())
}
