//! Onboarding conversation: language → agreement → name → phone.
//!
//! The dialogue state lives in an explicit per-chat store owned by the
//! process (no framework state blob). The transition logic itself is a pure
//! function over `(state, input)` so each step is unit-testable without
//! Telegram or a database; the driver interprets the resulting `Step`,
//! performs the persistence, and sends the localized prompts.
//!
//! Persistence failures never advance the state: the user sees a generic
//! localized error and can retry the same step.

use std::collections::HashMap;
use std::sync::Arc;

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::{ButtonRequest, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove};
use tokio::sync::Mutex;
use tokio::time::Instant;
use unic_langid::LanguageIdentifier;

use farmconnect_core::storage::{db, get_connection};
use farmconnect_core::{config, i18n};

use crate::telegram::menu::main_menu_keyboard;
use crate::telegram::types::{HandlerDeps, HandlerError};
use crate::telegram::{cb, Bot};

/// Conversation states of the onboarding dialogue.
///
/// The Telegram-supplied display name is captured at entry and carried
/// through the states as a suggestion; the accepted name travels in
/// `AwaitingPhone` until the terminal write stores name and phone together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingState {
    AwaitingLanguage { suggested: String },
    AwaitingAgreement { suggested: String },
    AwaitingNameConfirm { suggested: String },
    AwaitingNameInput,
    AwaitingPhone { full_name: String },
}

/// One user action fed into the state machine.
#[derive(Debug, Clone, Copy)]
pub enum OnboardingInput<'a> {
    /// A `lang_*` callback carrying a locale code.
    Language(&'a str),
    /// The agreement acknowledgement callback.
    Agree,
    /// Accept the suggested display name.
    KeepName,
    /// Switch to free-text name entry.
    EditName,
    /// Free-form message text.
    Text(&'a str),
    /// A structured contact share (phone number).
    Contact(&'a str),
}

/// What the driver must do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Persist the language choice, then move to the next state.
    SetLanguage { code: String, next: OnboardingState },
    /// Move to a new state and send its prompt.
    Advance(OnboardingState),
    /// Stay in the current state; send the given validation notice key.
    Reprompt(&'static str),
    /// Persist name and phone atomically, clear the session.
    Finish { full_name: String, phone: String },
    /// Input that does not belong to the current step; repeat the prompt.
    Ignore,
}

/// Minimum accepted name length (characters, after trimming).
const MIN_NAME_CHARS: usize = 2;
/// Minimum accepted phone length (characters, after trimming).
const MIN_PHONE_CHARS: usize = 7;

/// Pure transition function.
pub fn apply(state: &OnboardingState, input: OnboardingInput<'_>) -> Step {
    match (state, input) {
        (OnboardingState::AwaitingLanguage { suggested }, OnboardingInput::Language(code)) => {
            match i18n::is_language_supported(code) {
                Some(normalized) => Step::SetLanguage {
                    code: normalized.to_string(),
                    next: OnboardingState::AwaitingAgreement {
                        suggested: suggested.clone(),
                    },
                },
                None => Step::Ignore,
            }
        }
        (OnboardingState::AwaitingAgreement { suggested }, OnboardingInput::Agree) => {
            Step::Advance(OnboardingState::AwaitingNameConfirm {
                suggested: suggested.clone(),
            })
        }
        (OnboardingState::AwaitingNameConfirm { suggested }, OnboardingInput::KeepName) => {
            Step::Advance(OnboardingState::AwaitingPhone {
                full_name: suggested.clone(),
            })
        }
        (OnboardingState::AwaitingNameConfirm { .. }, OnboardingInput::EditName) => {
            Step::Advance(OnboardingState::AwaitingNameInput)
        }
        (OnboardingState::AwaitingNameInput, OnboardingInput::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.chars().count() >= MIN_NAME_CHARS {
                Step::Advance(OnboardingState::AwaitingPhone {
                    full_name: trimmed.to_string(),
                })
            } else {
                Step::Reprompt("onboarding-name-too-short")
            }
        }
        (OnboardingState::AwaitingPhone { full_name }, OnboardingInput::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.chars().count() >= MIN_PHONE_CHARS {
                Step::Finish {
                    full_name: full_name.clone(),
                    phone: trimmed.to_string(),
                }
            } else {
                Step::Reprompt("onboarding-phone-too-short")
            }
        }
        (OnboardingState::AwaitingPhone { full_name }, OnboardingInput::Contact(phone)) => Step::Finish {
            full_name: full_name.clone(),
            phone: phone.trim().to_string(),
        },
        _ => Step::Ignore,
    }
}

struct Session {
    state: OnboardingState,
    updated_at: Instant,
}

/// Explicit store mapping chat id → onboarding state.
///
/// Sessions of abandoned dialogues expire after
/// `config::onboarding::SESSION_TTL_SECS`; the sweep runs opportunistically
/// on every store access, which is enough at this bot's scale.
#[derive(Clone, Default)]
pub struct OnboardingStore {
    sessions: Arc<Mutex<HashMap<ChatId, Session>>>,
}

impl OnboardingStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current state for a chat, if an unexpired session exists.
    pub async fn get(&self, chat_id: ChatId) -> Option<OnboardingState> {
        let mut sessions = self.sessions.lock().await;
        Self::sweep(&mut sessions);
        sessions.get(&chat_id).map(|s| s.state.clone())
    }

    /// Stores (or replaces) the state for a chat.
    pub async fn set(&self, chat_id: ChatId, state: OnboardingState) {
        let mut sessions = self.sessions.lock().await;
        Self::sweep(&mut sessions);
        sessions.insert(
            chat_id,
            Session {
                state,
                updated_at: Instant::now(),
            },
        );
    }

    /// Drops the session (onboarding finished or aborted).
    pub async fn clear(&self, chat_id: ChatId) {
        self.sessions.lock().await.remove(&chat_id);
    }

    fn sweep(sessions: &mut HashMap<ChatId, Session>) {
        let ttl = config::onboarding::session_ttl();
        sessions.retain(|_, session| session.updated_at.elapsed() < ttl);
    }
}

/// Opens a fresh onboarding dialogue and sends the language prompt.
pub async fn start_onboarding(
    bot: &Bot,
    chat_id: ChatId,
    suggested_name: String,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    deps.onboarding
        .set(chat_id, OnboardingState::AwaitingLanguage { suggested: suggested_name })
        .await;

    let lang = i18n::user_lang_from_pool(&deps.db_pool, chat_id.0);
    bot.send_message(chat_id, i18n::t(&lang, "onboarding-choose-language"))
        .reply_markup(language_keyboard())
        .await?;
    Ok(())
}

/// Inline keyboard with one button per supported locale.
pub fn language_keyboard() -> InlineKeyboardMarkup {
    let row = i18n::SUPPORTED_LANGS
        .iter()
        .map(|(code, name)| cb(name.to_string(), format!("lang_{}", code)))
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(vec![row])
}

/// Feeds one input into the active session of `chat_id`, if any.
///
/// Returns `true` when an active session consumed the input.
pub async fn drive(
    bot: &Bot,
    chat_id: ChatId,
    input: OnboardingInput<'_>,
    deps: &HandlerDeps,
) -> Result<bool, HandlerError> {
    let Some(state) = deps.onboarding.get(chat_id).await else {
        return Ok(false);
    };

    let lang = i18n::user_lang_from_pool(&deps.db_pool, chat_id.0);

    match apply(&state, input) {
        Step::SetLanguage { code, next } => {
            let persisted = get_connection(&deps.db_pool)
                .map_err(farmconnect_core::AppError::from)
                .and_then(|conn| Ok(db::set_user_language(&conn, chat_id.0, &code)?));
            match persisted {
                Ok(()) => {
                    let new_lang = i18n::lang_from_code(&code);
                    deps.onboarding.set(chat_id, next.clone()).await;
                    send_prompt(bot, chat_id, &new_lang, &next).await?;
                }
                Err(e) => {
                    // State unchanged: the user can tap the language again.
                    log::error!("Failed to persist language for chat {}: {}", chat_id.0, e);
                    bot.send_message(chat_id, i18n::t(&lang, "error-generic")).await?;
                }
            }
        }
        Step::Advance(next) => {
            deps.onboarding.set(chat_id, next.clone()).await;
            send_prompt(bot, chat_id, &lang, &next).await?;
        }
        Step::Reprompt(notice_key) => {
            bot.send_message(chat_id, i18n::t(&lang, notice_key)).await?;
        }
        Step::Finish { full_name, phone } => {
            let persisted = get_connection(&deps.db_pool)
                .map_err(farmconnect_core::AppError::from)
                .and_then(|conn| Ok(db::complete_user_profile(&conn, chat_id.0, &full_name, &phone)?));
            match persisted {
                Ok(()) => {
                    deps.onboarding.clear(chat_id).await;

                    let mut args = FluentArgs::new();
                    args.set("name", full_name);
                    bot.send_message(chat_id, i18n::t_args(&lang, "onboarding-complete", &args))
                        .reply_markup(KeyboardRemove::new())
                        .await?;
                    crate::telegram::menu::show_main_menu(bot, chat_id, &lang).await?;
                }
                Err(e) => {
                    // State unchanged: re-sending the phone retries the write.
                    log::error!("Failed to complete profile for chat {}: {}", chat_id.0, e);
                    bot.send_message(chat_id, i18n::t(&lang, "error-generic")).await?;
                }
            }
        }
        Step::Ignore => {
            // Unrelated input mid-dialogue: repeat the current prompt.
            send_prompt(bot, chat_id, &lang, &state).await?;
        }
    }

    Ok(true)
}

/// Handles a contact share; consumed only while a session awaits the phone.
pub async fn handle_contact(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<bool, HandlerError> {
    let Some(contact) = msg.contact() else {
        return Ok(false);
    };
    let phone = contact.phone_number.clone();
    drive(bot, msg.chat.id, OnboardingInput::Contact(&phone), deps).await
}

/// Sends the prompt belonging to a state.
async fn send_prompt(
    bot: &Bot,
    chat_id: ChatId,
    lang: &LanguageIdentifier,
    state: &OnboardingState,
) -> Result<(), HandlerError> {
    match state {
        OnboardingState::AwaitingLanguage { .. } => {
            bot.send_message(chat_id, i18n::t(lang, "onboarding-choose-language"))
                .reply_markup(language_keyboard())
                .await?;
        }
        OnboardingState::AwaitingAgreement { .. } => {
            let keyboard =
                InlineKeyboardMarkup::new(vec![vec![cb(i18n::t(lang, "onboarding-agree-button"), "agree")]]);
            bot.send_message(chat_id, i18n::t(lang, "onboarding-agreement"))
                .reply_markup(keyboard)
                .await?;
        }
        OnboardingState::AwaitingNameConfirm { suggested } => {
            let mut args = FluentArgs::new();
            args.set("name", suggested.clone());
            let keyboard = InlineKeyboardMarkup::new(vec![vec![
                cb(i18n::t(lang, "onboarding-name-keep-button"), "name_keep"),
                cb(i18n::t(lang, "onboarding-name-edit-button"), "name_edit"),
            ]]);
            bot.send_message(chat_id, i18n::t_args(lang, "onboarding-name-confirm", &args))
                .reply_markup(keyboard)
                .await?;
        }
        OnboardingState::AwaitingNameInput => {
            bot.send_message(chat_id, i18n::t(lang, "onboarding-name-prompt")).await?;
        }
        OnboardingState::AwaitingPhone { .. } => {
            let share_button =
                KeyboardButton::new(i18n::t(lang, "onboarding-phone-share-button")).request(ButtonRequest::Contact);
            let keyboard = KeyboardMarkup::new(vec![vec![share_button]]).resize_keyboard();
            bot.send_message(chat_id, i18n::t(lang, "onboarding-phone-prompt"))
                .reply_markup(keyboard)
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lang_state() -> OnboardingState {
        OnboardingState::AwaitingLanguage {
            suggested: "Taras".to_string(),
        }
    }

    #[test]
    fn language_selection_persists_and_advances_to_agreement() {
        let step = apply(&lang_state(), OnboardingInput::Language("de"));
        assert_eq!(
            step,
            Step::SetLanguage {
                code: "de".to_string(),
                next: OnboardingState::AwaitingAgreement {
                    suggested: "Taras".to_string()
                },
            }
        );
    }

    #[test]
    fn unsupported_language_is_ignored() {
        assert_eq!(apply(&lang_state(), OnboardingInput::Language("fr")), Step::Ignore);
    }

    #[test]
    fn agreement_advances_to_name_confirmation_with_suggestion() {
        let state = OnboardingState::AwaitingAgreement {
            suggested: "Taras".to_string(),
        };
        assert_eq!(
            apply(&state, OnboardingInput::Agree),
            Step::Advance(OnboardingState::AwaitingNameConfirm {
                suggested: "Taras".to_string()
            })
        );
    }

    #[test]
    fn keeping_the_suggested_name_skips_to_phone() {
        let state = OnboardingState::AwaitingNameConfirm {
            suggested: "Taras".to_string(),
        };
        assert_eq!(
            apply(&state, OnboardingInput::KeepName),
            Step::Advance(OnboardingState::AwaitingPhone {
                full_name: "Taras".to_string()
            })
        );
    }

    #[test]
    fn one_char_name_reprompts_in_place() {
        let step = apply(&OnboardingState::AwaitingNameInput, OnboardingInput::Text(" a "));
        assert_eq!(step, Step::Reprompt("onboarding-name-too-short"));
    }

    #[test]
    fn two_char_name_advances_to_phone() {
        let step = apply(&OnboardingState::AwaitingNameInput, OnboardingInput::Text("Ян"));
        assert_eq!(
            step,
            Step::Advance(OnboardingState::AwaitingPhone {
                full_name: "Ян".to_string()
            })
        );
    }

    #[test]
    fn short_phone_reprompts_in_place() {
        let state = OnboardingState::AwaitingPhone {
            full_name: "Taras".to_string(),
        };
        assert_eq!(
            apply(&state, OnboardingInput::Text("12345")),
            Step::Reprompt("onboarding-phone-too-short")
        );
    }

    #[test]
    fn valid_phone_text_finishes_with_carried_name() {
        let state = OnboardingState::AwaitingPhone {
            full_name: "Taras".to_string(),
        };
        assert_eq!(
            apply(&state, OnboardingInput::Text(" +380501234567 ")),
            Step::Finish {
                full_name: "Taras".to_string(),
                phone: "+380501234567".to_string(),
            }
        );
    }

    #[test]
    fn contact_share_finishes_immediately() {
        let state = OnboardingState::AwaitingPhone {
            full_name: "Taras".to_string(),
        };
        assert_eq!(
            apply(&state, OnboardingInput::Contact("+4915112345678")),
            Step::Finish {
                full_name: "Taras".to_string(),
                phone: "+4915112345678".to_string(),
            }
        );
    }

    #[test]
    fn out_of_step_inputs_are_ignored() {
        assert_eq!(apply(&lang_state(), OnboardingInput::Agree), Step::Ignore);
        assert_eq!(
            apply(&OnboardingState::AwaitingNameInput, OnboardingInput::KeepName),
            Step::Ignore
        );
    }

    #[tokio::test]
    async fn store_round_trips_and_clears() {
        let store = OnboardingStore::new();
        let chat = ChatId(1);

        assert_eq!(store.get(chat).await, None);
        store.set(chat, OnboardingState::AwaitingNameInput).await;
        assert_eq!(store.get(chat).await, Some(OnboardingState::AwaitingNameInput));
        store.clear(chat).await;
        assert_eq!(store.get(chat).await, None);
    }
}
