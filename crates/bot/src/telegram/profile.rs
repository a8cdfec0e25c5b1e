//! Profile view and the standalone language switcher.

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use unic_langid::LanguageIdentifier;

use farmconnect_core::storage::{db, get_connection};
use farmconnect_core::{i18n, money};

use crate::telegram::menu::show_main_menu;
use crate::telegram::onboarding::language_keyboard;
use crate::telegram::types::{HandlerDeps, HandlerError};
use crate::telegram::Bot;

/// Sends the profile card: name, phone, prepaid balance.
pub async fn show_profile(
    bot: &Bot,
    chat_id: ChatId,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let user = {
        let conn = get_connection(&deps.db_pool)?;
        db::get_user(&conn, chat_id.0)?
    };
    let Some(user) = user else {
        bot.send_message(chat_id, i18n::t(lang, "error-generic")).await?;
        return Ok(());
    };

    let mut args = FluentArgs::new();
    args.set("name", user.full_name.clone());
    args.set(
        "phone",
        user.phone.clone().unwrap_or_else(|| i18n::t(lang, "profile-no-phone")),
    );
    args.set("balance", money::format_cents(user.balance_cents));
    bot.send_message(chat_id, i18n::t_args(lang, "profile-info", &args))
        .await?;
    Ok(())
}

/// Sends the language picker (same keyboard onboarding uses).
pub async fn show_language_menu(bot: &Bot, chat_id: ChatId, lang: &LanguageIdentifier) -> Result<(), HandlerError> {
    bot.send_message(chat_id, i18n::t(lang, "onboarding-choose-language"))
        .reply_markup(language_keyboard())
        .await?;
    Ok(())
}

/// Applies a `lang_*` callback outside of onboarding: persists the choice,
/// confirms in the new language, and re-sends the menu keyboard so its
/// button labels switch too.
pub async fn change_language(
    bot: &Bot,
    chat_id: ChatId,
    code: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let Some(normalized) = i18n::is_language_supported(code) else {
        return Ok(());
    };

    {
        let conn = get_connection(&deps.db_pool)?;
        db::set_user_language(&conn, chat_id.0, normalized)?;
    }

    let new_lang = i18n::lang_from_code(normalized);
    bot.send_message(chat_id, i18n::t(&new_lang, "language-updated")).await?;
    show_main_menu(bot, chat_id, &new_lang).await?;
    Ok(())
}
