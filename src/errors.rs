//! # Bot Error Types Module
//!
//! Error taxonomy for the conversation controller and its collaborators:
//! lookup misses, transport failures and persistence failures.

use thiserror::Error;

/// Errors raised while configuring or running the bot
#[derive(Debug, Error)]
pub enum BotError {
    /// Missing or malformed startup configuration
    #[error("Configuration error: {0}")]
    Config(String),
    /// Catalog could not be loaded or violates label uniqueness
    #[error("Catalog error: {0}")]
    Catalog(String),
    /// Message text absent for a key/language pair
    #[error("Missing message '{key}' for language '{language}'")]
    MissingMessage { key: String, language: String },
    /// Sending through the chat transport failed
    #[error("Transport error: {0}")]
    Transport(String),
    /// Dish image could not be fetched
    #[error("Image error: {0}")]
    Image(String),
    /// Session store read or write failed
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<sqlx::Error> for BotError {
    fn from(err: sqlx::Error) -> Self {
        BotError::Persistence(err.to_string())
    }
}

impl From<teloxide::RequestError> for BotError {
    fn from(err: teloxide::RequestError) -> Self {
        BotError::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::Image(err.to_string())
    }
}

pub type BotResult<T> = Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting() {
        let err = BotError::MissingMessage {
            key: "select_action".to_string(),
            language: "en".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing message 'select_action' for language 'en'"
        );

        let err = BotError::Persistence("connection reset".to_string());
        assert_eq!(err.to_string(), "Persistence error: connection reset");
    }
}
