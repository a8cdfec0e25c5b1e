//! Main menu: the persistent reply keyboard and its text-button routing.

use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup};
use unic_langid::LanguageIdentifier;

use farmconnect_core::i18n;

use crate::telegram::types::HandlerError;
use crate::telegram::Bot;

/// Menu destinations reachable from the reply keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Catalog,
    Cart,
    Orders,
    Profile,
}

const MENU_KEYS: &[(&str, MenuAction)] = &[
    ("menu-catalog", MenuAction::Catalog),
    ("menu-cart", MenuAction::Cart),
    ("menu-orders", MenuAction::Orders),
    ("menu-profile", MenuAction::Profile),
];

/// Persistent 2x2 reply keyboard with the four menu buttons.
pub fn main_menu_keyboard(lang: &LanguageIdentifier) -> KeyboardMarkup {
    let rows = vec![
        vec![
            KeyboardButton::new(i18n::t(lang, "menu-catalog")),
            KeyboardButton::new(i18n::t(lang, "menu-cart")),
        ],
        vec![
            KeyboardButton::new(i18n::t(lang, "menu-orders")),
            KeyboardButton::new(i18n::t(lang, "menu-profile")),
        ],
    ];
    KeyboardMarkup::new(rows).resize_keyboard().persistent()
}

/// Sends the menu prompt with the persistent keyboard attached.
pub async fn show_main_menu(bot: &Bot, chat_id: ChatId, lang: &LanguageIdentifier) -> Result<(), HandlerError> {
    bot.send_message(chat_id, i18n::t(lang, "menu-title"))
        .reply_markup(main_menu_keyboard(lang))
        .await?;
    Ok(())
}

/// Maps a free-text message onto a menu action.
///
/// Reply-keyboard presses arrive as plain text, so the match runs over every
/// supported locale's button labels. The stored language only affects which
/// keyboard is shown, not which presses are understood.
pub fn menu_action_for_text(text: &str) -> Option<MenuAction> {
    let trimmed = text.trim();
    for (code, _) in i18n::SUPPORTED_LANGS {
        let lang = i18n::lang_from_code(code);
        for (key, action) in MENU_KEYS {
            if i18n::t(&lang, key) == trimmed {
                return Some(*action);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn recognizes_buttons_in_every_locale() {
        assert_eq!(menu_action_for_text("🛒 Кошик"), Some(MenuAction::Cart));
        assert_eq!(menu_action_for_text("🛒 Warenkorb"), Some(MenuAction::Cart));
    }

    #[test]
    fn ignores_unrelated_text() {
        assert_eq!(menu_action_for_text("hello"), None);
    }

    #[test]
    fn keyboard_has_four_buttons_in_two_rows() {
        let lang = i18n::lang_from_code("uk");
        let keyboard = main_menu_keyboard(&lang);
        assert_eq!(keyboard.keyboard.len(), 2);
        assert_eq!(keyboard.keyboard[0].len(), 2);
        assert_eq!(keyboard.keyboard[1].len(), 2);
    }
}
