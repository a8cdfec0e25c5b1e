//! Dispatcher schema: the handler tree wired into teloxide's Dispatcher.
//!
//! Branch order matters: contact shares and web-app payloads are structured
//! updates and must win over the plain-text branch; commands win over menu
//! button text.

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use farmconnect_core::storage::{db, get_connection};
use farmconnect_core::i18n;

use crate::telegram::callbacks::{handle_callback, suggested_name};
use crate::telegram::types::{HandlerDeps, HandlerError};
use crate::telegram::{cart, catalog, menu, onboarding, orders, profile, Bot, Command};

/// Builds the complete handler tree. The same schema serves production and
/// integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_contact = deps.clone();
    let deps_webapp = deps.clone();
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        // Structured updates first
        .branch(contact_handler(deps_contact))
        .branch(webapp_handler(deps_webapp))
        // Commands
        .branch(command_handler(deps_commands))
        // Menu buttons and onboarding text
        .branch(message_handler(deps_messages))
        // Inline keyboard callbacks
        .branch(callback_handler(deps_callback))
}

/// Logs a handler failure and answers the chat with the generic localized
/// failure notice. A storage hiccup must never end as silence in the chat.
async fn report_failure(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, context: &str, e: HandlerError) {
    log::error!("{} failed for chat {}: {}", context, chat_id, e);
    let lang = i18n::user_lang_from_pool(&deps.db_pool, chat_id.0);
    let _ = bot.send_message(chat_id, i18n::t(&lang, "error-generic")).await;
}

/// Contact shares feed the onboarding phone step.
fn contact_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.contact().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = onboarding::handle_contact(&bot, &msg, &deps).await {
                    report_failure(&bot, msg.chat.id, &deps, "Contact handler", e).await;
                }
                Ok(())
            }
        })
}

/// Web-app checkout payloads from the storefront.
fn webapp_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.web_app_data().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = run_webapp_checkout(&bot, &msg, &deps).await {
                    report_failure(&bot, msg.chat.id, &deps, "Web-app checkout", e).await;
                }
                Ok(())
            }
        })
}

async fn run_webapp_checkout(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(user) = onboarded_user(bot, msg, deps).await? else {
        return Ok(());
    };
    let lang = i18n::user_lang_from_pool(&deps.db_pool, msg.chat.id.0);
    orders::handle_webapp_checkout(bot, msg, user.id, &lang, deps).await
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                if let Err(e) = handle_command(&bot, &msg, cmd, &deps).await {
                    report_failure(&bot, msg.chat.id, &deps, "Command handler", e).await;
                }
                Ok(())
            }
        },
    ))
}

async fn handle_command(bot: &Bot, msg: &Message, cmd: Command, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let lang = i18n::user_lang_from_pool(&deps.db_pool, chat_id.0);

    if let Command::Start = cmd {
        let user = ensure_user(msg, deps)?;
        if user.is_onboarded() {
            menu::show_main_menu(bot, chat_id, &lang).await?;
        } else {
            let suggested = msg.from.as_ref().map(|u| suggested_name(u)).unwrap_or_default();
            onboarding::start_onboarding(bot, chat_id, suggested, deps).await?;
        }
        return Ok(());
    }

    if let Command::Language = cmd {
        profile::show_language_menu(bot, chat_id, &lang).await?;
        return Ok(());
    }

    let Some(user) = onboarded_user(bot, msg, deps).await? else {
        return Ok(());
    };

    match cmd {
        Command::Menu => menu::show_main_menu(bot, chat_id, &lang).await?,
        Command::Catalog => catalog::show_categories(bot, chat_id, &lang, deps).await?,
        Command::Cart => cart::show_cart(bot, chat_id, user.id, &lang, deps).await?,
        Command::Orders => orders::show_orders(bot, chat_id, user.id, &lang, deps).await?,
        Command::Profile => profile::show_profile(bot, chat_id, &lang, deps).await?,
        Command::Start | Command::Language => {}
    }
    Ok(())
}

/// Plain text: onboarding replies first, then menu button labels.
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = handle_text(&bot, &msg, &deps).await {
                    report_failure(&bot, msg.chat.id, &deps, "Text handler", e).await;
                }
                Ok(())
            }
        })
}

async fn handle_text(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let chat_id = msg.chat.id;
    let text = msg.text().unwrap_or_default();

    if onboarding::drive(bot, chat_id, onboarding::OnboardingInput::Text(text), deps).await? {
        return Ok(());
    }

    let Some(action) = menu::menu_action_for_text(text) else {
        // Free text outside any dialogue is ignored.
        return Ok(());
    };
    let Some(user) = onboarded_user(bot, msg, deps).await? else {
        return Ok(());
    };
    let lang = i18n::user_lang_from_pool(&deps.db_pool, chat_id.0);
    match action {
        menu::MenuAction::Catalog => catalog::show_categories(bot, chat_id, &lang, deps).await?,
        menu::MenuAction::Cart => cart::show_cart(bot, chat_id, user.id, &lang, deps).await?,
        menu::MenuAction::Orders => orders::show_orders(bot, chat_id, user.id, &lang, deps).await?,
        menu::MenuAction::Profile => profile::show_profile(bot, chat_id, &lang, deps).await?,
    }
    Ok(())
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: teloxide::types::CallbackQuery| {
        let deps = deps.clone();
        async move { handle_callback(bot, q, deps).await }
    })
}

/// Looks up (creating on first contact) the user row for a message's chat.
fn ensure_user(msg: &Message, deps: &HandlerDeps) -> Result<db::User, HandlerError> {
    let conn = get_connection(&deps.db_pool)?;
    if let Some(user) = db::get_user(&conn, msg.chat.id.0)? {
        return Ok(user);
    }

    let suggested = msg.from.as_ref().map(|u| suggested_name(u)).unwrap_or_default();
    db::create_user(&conn, msg.chat.id.0, &suggested)?;
    let user = db::get_user(&conn, msg.chat.id.0)?.ok_or("user row missing after insert")?;
    Ok(user)
}

/// Returns the onboarded user for a message, starting (or resuming)
/// onboarding when the profile is incomplete.
async fn onboarded_user(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<Option<db::User>, HandlerError> {
    let user = ensure_user(msg, deps)?;
    if user.is_onboarded() {
        return Ok(Some(user));
    }

    let suggested = msg.from.as_ref().map(|u| suggested_name(u)).unwrap_or_default();
    onboarding::start_onboarding(bot, msg.chat.id, suggested, deps).await?;
    Ok(None)
}
