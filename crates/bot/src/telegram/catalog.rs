//! Catalog browsing: category list and per-product cards.

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId};
use unic_langid::LanguageIdentifier;

use farmconnect_core::storage::{cart, catalog, get_connection};
use farmconnect_core::{cutoff, i18n, money};

use crate::telegram::types::{HandlerDeps, HandlerError};
use crate::telegram::{cb, Bot};

/// Sends the category list as an inline keyboard.
pub async fn show_categories(
    bot: &Bot,
    chat_id: ChatId,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let conn = get_connection(&deps.db_pool)?;
    let categories = catalog::categories(&conn)?;

    if categories.is_empty() {
        bot.send_message(chat_id, i18n::t(lang, "catalog-no-categories")).await?;
        return Ok(());
    }

    let rows = categories
        .iter()
        .map(|c| vec![cb(c.name(lang).to_string(), format!("category_{}", c.id))])
        .collect::<Vec<_>>();
    bot.send_message(chat_id, i18n::t(lang, "catalog-choose-category"))
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

/// Sends one card per in-stock product of a category, followed by a
/// navigation row back to the category list and into the cart.
pub async fn show_category_products(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    category_id: i64,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let conn = get_connection(&deps.db_pool)?;

    let Some(category) = catalog::category_by_id(&conn, category_id)? else {
        bot.send_message(chat_id, i18n::t(lang, "catalog-category-not-found"))
            .await?;
        return Ok(());
    };

    let products = catalog::products_in_category(&conn, category_id)?;
    if products.is_empty() {
        bot.send_message(chat_id, i18n::t(lang, "catalog-no-products")).await?;
        return Ok(());
    }

    let ordering_open = cutoff::is_order_allowed();
    for product in &products {
        let quantity = cart::line_quantity(&conn, user_id, product.id)?;
        bot.send_message(chat_id, product_card_text(product, quantity, lang))
            .reply_markup(product_keyboard(product.id, ordering_open))
            .await?;
    }

    let mut nav_row = vec![cb(i18n::t(lang, "catalog-back-to-categories"), "back_to_categories")];
    if cart::cart_count(&conn, user_id)? > 0 {
        nav_row.push(cb(i18n::t(lang, "catalog-go-to-cart"), "go_to_cart"));
    }
    bot.send_message(chat_id, category.name(lang).to_string())
        .reply_markup(InlineKeyboardMarkup::new(vec![nav_row]))
        .await?;
    Ok(())
}

/// Card text: localized name, price per unit, optional description, and the
/// current cart quantity when the product is already in the cart.
pub fn product_card_text(product: &catalog::Product, quantity: f64, lang: &LanguageIdentifier) -> String {
    let mut args = FluentArgs::new();
    args.set("price", money::format_cents(product.price_cents));
    args.set("unit", product.unit.clone());

    let mut text = format!("{}\n{}", product.name(lang), i18n::t_args(lang, "catalog-price", &args));
    if let Some(description) = &product.description {
        text.push('\n');
        text.push_str(description);
    }
    if quantity > 0.0 {
        let mut qty_args = FluentArgs::new();
        qty_args.set("qty", money::format_quantity(quantity));
        text.push('\n');
        text.push_str(&i18n::t_args(lang, "catalog-in-cart", &qty_args));
    }
    text
}

/// The +/- row under a product card.
///
/// While ordering is closed the buttons render as `noop`. The callback
/// handlers still gate on the cutoff themselves: a keyboard rendered while
/// ordering was open can be tapped after it closed.
pub fn product_keyboard(product_id: i64, ordering_open: bool) -> InlineKeyboardMarkup {
    let row = if ordering_open {
        vec![
            cb("➖", format!("decrease_{}", product_id)),
            cb("➕", format!("increase_{}", product_id)),
        ]
    } else {
        vec![cb("🔒", "noop")]
    };
    InlineKeyboardMarkup::new(vec![row])
}

/// Rewrites a product card in place after a cart mutation.
pub async fn update_product_card(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    user_id: i64,
    product_id: i64,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let conn = get_connection(&deps.db_pool)?;
    let Some(product) = catalog::product_by_id(&conn, product_id)? else {
        return Ok(());
    };
    let quantity = cart::line_quantity(&conn, user_id, product_id)?;

    bot.edit_message_text(chat_id, message_id, product_card_text(&product, quantity, lang))
        .reply_markup(product_keyboard(product_id, cutoff::is_order_allowed()))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmconnect_core::storage::catalog::{Availability, Product};

    fn product() -> Product {
        Product {
            id: 7,
            sku: Some("TOM-1".to_string()),
            name_uk: "Помідори".to_string(),
            name_de: "Tomaten".to_string(),
            price_cents: 950,
            unit: "kg".to_string(),
            availability: Availability::InStock,
            description: None,
            farm_id: None,
        }
    }

    #[test]
    fn card_shows_localized_name_and_price() {
        let de = i18n::lang_from_code("de");
        let text = product_card_text(&product(), 0.0, &de);
        assert!(text.starts_with("Tomaten"));
        assert!(text.contains("9.50"));
        assert!(!text.contains("Korb")); // no cart line at zero quantity
    }

    #[test]
    fn card_shows_cart_quantity_when_present() {
        let uk = i18n::lang_from_code("uk");
        let text = product_card_text(&product(), 2.0, &uk);
        assert!(text.contains('2'));
    }
}
