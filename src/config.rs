//! # Bot Configuration Module
//!
//! Startup configuration read once from the process environment.

use std::collections::HashMap;
use std::env;

use crate::errors::{BotError, BotResult};

pub const DEFAULT_CATALOG_PATH: &str = "data/catalog.json";
pub const DEFAULT_ADMIN_LOCALE: &str = "ru";

/// Runtime configuration for the bot
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    /// Telegram bot token
    pub bot_token: String,
    /// Chat that receives relayed complaints and suggestions
    pub admin_chat_id: i64,
    /// PostgreSQL URL for session persistence; in-memory sessions when absent
    pub database_url: Option<String>,
    /// Path of the exported catalog tables
    pub catalog_path: String,
    /// Base URL dish image references are resolved against
    pub image_base_url: Option<String>,
    /// Locale of the admin notification phrase
    pub admin_locale: String,
}

impl BotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> BotResult<Self> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Build configuration from an explicit variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> BotResult<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = get("TELEGRAM_BOT_TOKEN")
            .ok_or_else(|| BotError::Config("TELEGRAM_BOT_TOKEN must be set".to_string()))?;

        let admin_chat_id = get("ADMIN_CHAT_ID")
            .ok_or_else(|| BotError::Config("ADMIN_CHAT_ID must be set".to_string()))?
            .parse::<i64>()
            .map_err(|e| BotError::Config(format!("ADMIN_CHAT_ID is not a chat id: {e}")))?;

        Ok(Self {
            bot_token,
            admin_chat_id,
            database_url: get("DATABASE_URL"),
            catalog_path: get("CATALOG_PATH").unwrap_or_else(|| DEFAULT_CATALOG_PATH.to_string()),
            image_base_url: get("IMAGE_BASE_URL"),
            admin_locale: get("ADMIN_LOCALE").unwrap_or_else(|| DEFAULT_ADMIN_LOCALE.to_string()),
        })
    }
}
