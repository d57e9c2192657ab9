//! Inbound events and their classification into routed inputs.

use teloxide::types::{ChatId, Message};

use crate::catalog::{ActionKind, Catalog, BACK_CONTROL};

/// Inbound chat message, independent of the transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub sender_first_name: String,
    pub sender_last_name: String,
}

impl IncomingMessage {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            sender_first_name: String::new(),
            sender_last_name: String::new(),
        }
    }

    pub fn with_sender(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.sender_first_name = first.into();
        self.sender_last_name = last.into();
        self
    }

    /// Text messages only; anything else is not routed
    pub fn from_telegram(msg: &Message) -> Option<Self> {
        let text = msg.text()?;
        let (first, last) = msg
            .from
            .as_ref()
            .map(|user| {
                (
                    user.first_name.clone(),
                    user.last_name.clone().unwrap_or_default(),
                )
            })
            .unwrap_or_default();

        Some(Self::new(msg.chat.id, text).with_sender(first, last))
    }

    /// Sender's display name from the parts that are present
    pub fn sender_name(&self) -> String {
        [
            self.sender_first_name.trim(),
            self.sender_last_name.trim(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Session key for this chat
    pub fn user_id(&self) -> String {
        self.chat_id.to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
}

impl Command {
    /// Parse `/start` or `/start@botname`
    pub fn parse(text: &str) -> Option<Self> {
        let command = text.trim().strip_prefix('/')?;
        let name = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default();

        match name {
            "start" => Some(Command::Start),
            _ => None,
        }
    }
}

/// Routed meaning of one inbound text, resolved once per event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Back,
    Language(String),
    MenuAction(String),
    ComplaintsAction(String),
    Category(String),
    Dish(String),
    FreeText(String),
}

impl Input {
    /// Resolve text against the catalogs in dispatch priority order:
    /// commands, back control, languages, menu buttons, categories,
    /// dish titles, complaints buttons, then free text.
    pub fn classify(text: &str, catalog: &Catalog) -> Self {
        if let Some(command) = Command::parse(text) {
            return Input::Command(command);
        }
        if text == BACK_CONTROL {
            return Input::Back;
        }
        if catalog.language_by_label(text).is_some() {
            return Input::Language(text.to_string());
        }

        let action_kind = catalog.resolve_action_kind(text);
        if action_kind == Some(ActionKind::Menu) {
            return Input::MenuAction(text.to_string());
        }
        if catalog.is_category(text) {
            return Input::Category(text.to_string());
        }
        if catalog.is_dish_title(text) {
            return Input::Dish(text.to_string());
        }
        if action_kind == Some(ActionKind::ComplaintsAndSuggestions) {
            return Input::ComplaintsAction(text.to_string());
        }

        Input::FreeText(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_json(include_str!("../../tests/fixtures/catalog.json")).unwrap()
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/start@bar_bot"), Some(Command::Start));
        assert_eq!(Command::parse("/start now"), Some(Command::Start));
        assert_eq!(Command::parse("/help"), None);
        assert_eq!(Command::parse("start"), None);
    }

    #[test]
    fn test_classification_order() {
        let catalog = catalog();

        assert_eq!(Input::classify("/start", &catalog), Input::Command(Command::Start));
        assert_eq!(Input::classify("↩", &catalog), Input::Back);
        assert_eq!(
            Input::classify("EN", &catalog),
            Input::Language("EN".to_string())
        );
        assert_eq!(
            Input::classify("Меню", &catalog),
            Input::MenuAction("Меню".to_string())
        );
        assert_eq!(
            Input::classify("Drinks", &catalog),
            Input::Category("Drinks".to_string())
        );
        assert_eq!(
            Input::classify("Lemonade", &catalog),
            Input::Dish("Lemonade".to_string())
        );
        assert_eq!(
            Input::classify("Complaints", &catalog),
            Input::ComplaintsAction("Complaints".to_string())
        );
        assert_eq!(
            Input::classify("too salty", &catalog),
            Input::FreeText("too salty".to_string())
        );
    }

    #[test]
    fn test_labels_match_exactly() {
        let catalog = catalog();
        assert_eq!(
            Input::classify("drinks", &catalog),
            Input::FreeText("drinks".to_string())
        );
        assert_eq!(
            Input::classify(" EN", &catalog),
            Input::FreeText(" EN".to_string())
        );
    }

    #[test]
    fn test_sender_name_skips_missing_parts() {
        let message = IncomingMessage::new(ChatId(1), "hi");
        assert_eq!(message.clone().with_sender("Ivan", "").sender_name(), "Ivan");
        assert_eq!(
            message.clone().with_sender("Ivan", "Petrov").sender_name(),
            "Ivan Petrov"
        );
        assert_eq!(message.with_sender("", "").sender_name(), "");
    }

    #[test]
    fn test_other_action_kind_is_free_text() {
        let json = include_str!("../../tests/fixtures/catalog.json").replace(
            r#"{ "label": "Complaints", "action": "complaints_and_suggestions", "language": "en" }"#,
            r#"{ "label": "Complaints", "action": "wifi", "language": "en" }"#,
        );
        let catalog = Catalog::from_json(&json).unwrap();
        assert_eq!(
            Input::classify("Complaints", &catalog),
            Input::FreeText("Complaints".to_string())
        );
    }
}
