//! Conversation controller: maps an inbound message plus the stored session
//! to a state transition, an outbound keyboard and any side effect.

use std::sync::Arc;
use teloxide::types::ChatId;
use tracing::{debug, error, info};

use super::input::{Command, IncomingMessage, Input};
use super::transport::{ChatTransport, TextFormat};
use super::ui_builder::{
    action_keyboard, category_keyboard, complaints_keyboard, dish_keyboard, language_keyboard,
};
use crate::catalog::{ActionKind, Catalog};
use crate::config::BotConfig;
use crate::errors::{BotError, BotResult};
use crate::images::ImageStore;
use crate::localization::LocalizationManager;
use crate::session::{ConversationState, SessionRegistry, UserSession};

/// Catalog message keys
pub mod keys {
    pub const SELECT_ACTION: &str = "select_action";
    pub const SELECT_CATEGORY: &str = "select_category";
    pub const CHOOSE_DISH: &str = "choose_dish";
    pub const WRITE_COMPLAINT: &str = "write_complaint";
    pub const COMPLAINT_CONSIDERATION: &str = "complaint_consideration";
}

/// Settings the controller needs besides its collaborators
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerSettings {
    pub admin_chat_id: ChatId,
    pub admin_locale: String,
}

impl ControllerSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            admin_chat_id: ChatId(config.admin_chat_id),
            admin_locale: config.admin_locale.clone(),
        }
    }
}

pub struct ConversationController {
    catalog: Arc<Catalog>,
    sessions: Arc<SessionRegistry>,
    transport: Arc<dyn ChatTransport>,
    images: Arc<dyn ImageStore>,
    localization: LocalizationManager,
    settings: ControllerSettings,
}

impl ConversationController {
    pub fn new(
        catalog: Arc<Catalog>,
        sessions: Arc<SessionRegistry>,
        transport: Arc<dyn ChatTransport>,
        images: Arc<dyn ImageStore>,
        settings: ControllerSettings,
    ) -> BotResult<Self> {
        let localization = LocalizationManager::new()
            .map_err(|e| BotError::Config(format!("Failed to load localization: {e}")))?;

        Ok(Self {
            catalog,
            sessions,
            transport,
            images,
            localization,
            settings,
        })
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Handle one inbound message.
    ///
    /// The user's session stays locked for the whole event. On success the
    /// session is persisted; on any failure every cached session is flushed
    /// before the original error is returned.
    pub async fn handle(&self, message: &IncomingMessage) -> BotResult<()> {
        let user_id = message.user_id();
        let handle = match self.sessions.session(&user_id).await {
            Ok(handle) => handle,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to load session");
                if let Err(save_err) = self.sessions.save_all(None).await {
                    error!(error = %save_err, "Failed to save sessions after error");
                }
                return Err(e);
            }
        };
        let mut session = handle.lock().await;

        let input = Input::classify(&message.text, &self.catalog);
        debug!(user_id = %user_id, state = ?session.current_state, input = ?input, "Handling message");

        let outcome = match self.dispatch(&mut session, message, input).await {
            Ok(()) => self.sessions.save(&session).await,
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            error!(user_id = %user_id, error = %e, "Failed to handle message");
            if let Err(save_err) = self.sessions.save_all(Some(&*session)).await {
                error!(error = %save_err, "Failed to save sessions after error");
            }
            return Err(e);
        }

        Ok(())
    }

    async fn dispatch(
        &self,
        session: &mut UserSession,
        message: &IncomingMessage,
        input: Input,
    ) -> BotResult<()> {
        let chat_id = message.chat_id;
        match input {
            Input::Command(Command::Start) => self.start(session, chat_id).await,
            Input::Back => self.back(session, chat_id).await,
            Input::Language(label) => self.select_language(session, chat_id, &label).await,
            Input::MenuAction(_) => self.select_menu(session, chat_id).await,
            Input::ComplaintsAction(_) => self.select_complaints(session, chat_id).await,
            Input::Category(name) => self.select_category(session, chat_id, &name).await,
            Input::Dish(title) => self.show_dish(session, chat_id, &title).await,
            Input::FreeText(text) => self.relay_free_text(session, message, &text).await,
        }
    }

    fn transition(&self, session: &mut UserSession, to: ConversationState) {
        if session.current_state != to {
            info!(
                user_id = %session.user_id,
                from = session.current_state.as_str(),
                to = to.as_str(),
                "State transition"
            );
        }
        session.current_state = to;
    }

    /// `/start`: fresh session and the language picker
    async fn start(&self, session: &mut UserSession, chat_id: ChatId) -> BotResult<()> {
        session.reset();
        self.transition(session, ConversationState::Start);

        let keyboard = language_keyboard(&self.catalog);
        self.transport
            .send_text(
                chat_id,
                &self.localization.choose_language(),
                Some(&keyboard),
                TextFormat::Plain,
            )
            .await
    }

    async fn back(&self, session: &mut UserSession, chat_id: ChatId) -> BotResult<()> {
        let target = session.current_state.parent();
        debug!(user_id = %session.user_id, from = ?session.current_state, target = ?target, "Back navigation");

        let Some(language) = session.selected_language.clone() else {
            return self.start(session, chat_id).await;
        };

        match target {
            ConversationState::LanguageSelected => {
                self.show_actions(session, chat_id, &language).await
            }
            // Replays the menu button of the stored language
            ConversationState::MenuSelected => {
                match self.catalog.button_label_for(ActionKind::Menu, &language) {
                    Some(label) => {
                        debug!(user_id = %session.user_id, label = %label, "Replaying menu selection");
                        self.show_categories(session, chat_id, &language).await
                    }
                    None => self.start(session, chat_id).await,
                }
            }
            _ => self.start(session, chat_id).await,
        }
    }

    async fn select_language(
        &self,
        session: &mut UserSession,
        chat_id: ChatId,
        label: &str,
    ) -> BotResult<()> {
        let code = self
            .catalog
            .language_by_label(label)
            .map(|language| language.code.clone())
            .ok_or_else(|| BotError::Catalog(format!("Unknown language label '{label}'")))?;

        self.show_actions(session, chat_id, &code).await
    }

    /// Action buttons for a language
    async fn show_actions(
        &self,
        session: &mut UserSession,
        chat_id: ChatId,
        language: &str,
    ) -> BotResult<()> {
        let text = self.catalog.message_for(keys::SELECT_ACTION, language)?;
        let keyboard = action_keyboard(&self.catalog, language);

        session.selected_language = Some(language.to_string());
        self.transition(session, ConversationState::LanguageSelected);

        self.transport
            .send_text(chat_id, text, Some(&keyboard), TextFormat::Plain)
            .await
    }

    async fn select_menu(&self, session: &mut UserSession, chat_id: ChatId) -> BotResult<()> {
        let Some(language) = session.selected_language.clone() else {
            return self.start(session, chat_id).await;
        };
        self.show_categories(session, chat_id, &language).await
    }

    /// Menu categories for a language
    async fn show_categories(
        &self,
        session: &mut UserSession,
        chat_id: ChatId,
        language: &str,
    ) -> BotResult<()> {
        let text = self.catalog.message_for(keys::SELECT_CATEGORY, language)?;
        let keyboard = category_keyboard(&self.catalog, language);

        session.selected_action = Some(ActionKind::Menu.as_str().to_string());
        self.transition(session, ConversationState::MenuSelected);

        self.transport
            .send_text(chat_id, text, Some(&keyboard), TextFormat::Plain)
            .await
    }

    async fn select_category(
        &self,
        session: &mut UserSession,
        chat_id: ChatId,
        category: &str,
    ) -> BotResult<()> {
        let Some(language) = session.selected_language.clone() else {
            return self.start(session, chat_id).await;
        };

        let text = self.catalog.message_for(keys::CHOOSE_DISH, &language)?;
        let keyboard = dish_keyboard(&self.catalog, category, &language);

        session.selected_category = Some(category.to_string());
        self.transition(session, ConversationState::CategorySelected);

        self.transport
            .send_text(chat_id, text, Some(&keyboard), TextFormat::Plain)
            .await
    }

    /// Dish details. Query only: the stored state is left as it was.
    async fn show_dish(
        &self,
        session: &mut UserSession,
        chat_id: ChatId,
        title: &str,
    ) -> BotResult<()> {
        let dish = session
            .selected_language
            .as_deref()
            .and_then(|language| self.catalog.dish_for(title, language));

        let Some(dish) = dish else {
            debug!(user_id = %session.user_id, title = %title, "Dish not available in selected language");
            return Ok(());
        };

        match &dish.image {
            Some(reference) => {
                let image = self.images.fetch(reference).await?;
                self.transport
                    .send_photo(chat_id, image, &dish.text, TextFormat::Html)
                    .await
            }
            None => {
                self.transport
                    .send_text(chat_id, &dish.text, None, TextFormat::Html)
                    .await
            }
        }
    }

    async fn select_complaints(&self, session: &mut UserSession, chat_id: ChatId) -> BotResult<()> {
        let Some(language) = session.selected_language.clone() else {
            return self.start(session, chat_id).await;
        };

        let text = self.catalog.message_for(keys::WRITE_COMPLAINT, &language)?;
        self.transition(session, ConversationState::ComplaintsMode);

        self.transport
            .send_text(
                chat_id,
                text,
                Some(&complaints_keyboard()),
                TextFormat::Plain,
            )
            .await
    }

    /// Catch-all: forward the text to the admin chat, acknowledge, and go
    /// back to the action buttons.
    async fn relay_free_text(
        &self,
        session: &mut UserSession,
        message: &IncomingMessage,
        text: &str,
    ) -> BotResult<()> {
        let language = session.selected_language.clone();
        let acknowledgment = match &language {
            Some(language) => Some(
                self.catalog
                    .message_for(keys::COMPLAINT_CONSIDERATION, language)?,
            ),
            None => None,
        };

        let notification = self.localization.admin_relay(
            &self.settings.admin_locale,
            &message.sender_name(),
            text,
        );
        self.transport
            .send_text(
                self.settings.admin_chat_id,
                &notification,
                None,
                TextFormat::Plain,
            )
            .await?;
        info!(user_id = %session.user_id, admin_chat_id = %self.settings.admin_chat_id, "Relayed user message to admin");

        match (language, acknowledgment) {
            (Some(language), Some(acknowledgment)) => {
                self.transport
                    .send_text(message.chat_id, acknowledgment, None, TextFormat::Plain)
                    .await?;
                self.show_actions(session, message.chat_id, &language).await
            }
            _ => self.start(session, message.chat_id).await,
        }
    }
}
