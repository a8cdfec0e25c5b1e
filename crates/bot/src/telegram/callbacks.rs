//! Inline keyboard callbacks: typed parsing and dispatch.
//!
//! Every callback payload is parsed into `CallbackAction` exactly once, at
//! the edge; handlers match on the variant and never see raw strings. An
//! unknown payload (stale keyboard from an older build) is answered silently.

use teloxide::prelude::*;
use teloxide::types::CallbackQuery;

use farmconnect_core::storage::{db, get_connection};
use farmconnect_core::i18n;

use crate::telegram::types::{HandlerDeps, HandlerError};
use crate::telegram::{cart, catalog, onboarding, orders, profile, Bot};

/// All actions reachable through inline keyboards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// `lang_{code}`: language choice (onboarding and the /language menu).
    Language(String),
    /// Agreement acknowledgement during onboarding.
    Agree,
    /// Accept the Telegram-suggested name during onboarding.
    KeepName,
    /// Switch to typed name entry during onboarding.
    EditName,
    /// `category_{id}`: open a category's product cards.
    Category(i64),
    /// `increase_{id}`: add one quantity step of a product.
    Increase(i64),
    /// `decrease_{id}`: remove one quantity step of a product.
    Decrease(i64),
    /// `cartdec_{id}`: remove one quantity step from inside the cart view.
    CartDecrease(i64),
    /// Return to the category list.
    BackToCategories,
    /// Open the cart view.
    GoToCart,
    /// Place an order from the live cart.
    Checkout,
    /// Display-only button.
    Noop,
}

impl CallbackAction {
    /// Parses a callback payload. Exact matches first, then the prefixed
    /// forms carrying an id.
    pub fn parse(data: &str) -> Option<CallbackAction> {
        match data {
            "agree" => return Some(CallbackAction::Agree),
            "name_keep" => return Some(CallbackAction::KeepName),
            "name_edit" => return Some(CallbackAction::EditName),
            "back_to_categories" => return Some(CallbackAction::BackToCategories),
            "go_to_cart" => return Some(CallbackAction::GoToCart),
            "checkout" => return Some(CallbackAction::Checkout),
            "noop" => return Some(CallbackAction::Noop),
            _ => {}
        }

        let (prefix, rest) = data.split_once('_')?;
        match prefix {
            "lang" => Some(CallbackAction::Language(rest.to_string())),
            "category" => rest.parse().ok().map(CallbackAction::Category),
            "increase" => rest.parse().ok().map(CallbackAction::Increase),
            "decrease" => rest.parse().ok().map(CallbackAction::Decrease),
            "cartdec" => rest.parse().ok().map(CallbackAction::CartDecrease),
            _ => None,
        }
    }
}

/// Central callback handler wired into the dispatcher schema.
///
/// Failures inside the dispatched action are logged and reported to the
/// user as a generic localized notice; they never bubble past this
/// endpoint.
pub async fn handle_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> Result<(), HandlerError> {
    let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        log::debug!("Ignoring unknown callback payload from chat {}", chat_id);
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };

    if let Err(e) = dispatch_action(&bot, &q, chat_id, action, &deps).await {
        log::error!("Callback handler failed for chat {}: {}", chat_id, e);
        let lang = i18n::user_lang_from_pool(&deps.db_pool, chat_id.0);
        let _ = bot.send_message(chat_id, i18n::t(&lang, "error-generic")).await;
    }
    Ok(())
}

async fn dispatch_action(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    action: CallbackAction,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    // An active onboarding dialogue consumes its own callbacks.
    if deps.onboarding.get(chat_id).await.is_some() {
        let input = match &action {
            CallbackAction::Language(code) => Some(onboarding::OnboardingInput::Language(code)),
            CallbackAction::Agree => Some(onboarding::OnboardingInput::Agree),
            CallbackAction::KeepName => Some(onboarding::OnboardingInput::KeepName),
            CallbackAction::EditName => Some(onboarding::OnboardingInput::EditName),
            _ => None,
        };
        bot.answer_callback_query(q.id.clone()).await?;
        if let Some(input) = input {
            onboarding::drive(bot, chat_id, input, deps).await?;
        }
        return Ok(());
    }

    let lang = i18n::user_lang_from_pool(&deps.db_pool, chat_id.0);

    // Language switching is the one action open to incomplete profiles.
    if let CallbackAction::Language(code) = &action {
        bot.answer_callback_query(q.id.clone()).await?;
        profile::change_language(bot, chat_id, code, deps).await?;
        return Ok(());
    }

    let suggested = suggested_name(&q.from);
    let user = {
        let conn = get_connection(&deps.db_pool)?;
        match db::get_user(&conn, chat_id.0)? {
            Some(user) => user,
            None => {
                // Callback from a chat we have never seen (wiped database).
                db::create_user(&conn, chat_id.0, &suggested)?;
                db::get_user(&conn, chat_id.0)?.ok_or("user row missing after insert")?
            }
        }
    };
    if !user.is_onboarded() {
        bot.answer_callback_query(q.id.clone()).await?;
        onboarding::start_onboarding(bot, chat_id, suggested, deps).await?;
        return Ok(());
    }

    match action {
        CallbackAction::Category(category_id) => {
            bot.answer_callback_query(q.id.clone()).await?;
            catalog::show_category_products(bot, chat_id, user.id, category_id, &lang, deps).await?;
        }
        CallbackAction::Increase(product_id) => {
            cart::handle_increase(bot, q, user.id, product_id, &lang, deps).await?;
        }
        CallbackAction::Decrease(product_id) => {
            cart::handle_decrease(bot, q, user.id, product_id, &lang, deps).await?;
        }
        CallbackAction::CartDecrease(product_id) => {
            cart::handle_cart_decrease(bot, q, user.id, product_id, &lang, deps).await?;
        }
        CallbackAction::BackToCategories => {
            bot.answer_callback_query(q.id.clone()).await?;
            catalog::show_categories(bot, chat_id, &lang, deps).await?;
        }
        CallbackAction::GoToCart => {
            bot.answer_callback_query(q.id.clone()).await?;
            cart::show_cart(bot, chat_id, user.id, &lang, deps).await?;
        }
        CallbackAction::Checkout => {
            bot.answer_callback_query(q.id.clone()).await?;
            orders::run_checkout(bot, chat_id, user.id, &lang, deps).await?;
        }
        CallbackAction::Noop => {
            bot.answer_callback_query(q.id.clone()).await?;
        }
        // Handled above; unreachable here.
        CallbackAction::Language(_)
        | CallbackAction::Agree
        | CallbackAction::KeepName
        | CallbackAction::EditName => {
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }

    Ok(())
}

/// Display name Telegram supplies for the user, used as the onboarding
/// suggestion.
pub fn suggested_name(user: &teloxide::types::User) -> String {
    match &user.last_name {
        Some(last_name) => format!("{} {}", user.first_name, last_name),
        None => user.first_name.clone(),
    }
}
