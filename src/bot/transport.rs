//! Outbound chat transport.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};

use super::ui_builder::Keyboard;
use crate::errors::BotResult;

/// How message text is interpreted by the client
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextFormat {
    #[default]
    Plain,
    Html,
}

/// Send operations the controller needs from a chat platform
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
        format: TextFormat,
    ) -> BotResult<()>;

    async fn send_photo(
        &self,
        chat_id: ChatId,
        image: Vec<u8>,
        caption: &str,
        format: TextFormat,
    ) -> BotResult<()>;
}

/// Telegram transport over a teloxide [`Bot`]
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
        format: TextFormat,
    ) -> BotResult<()> {
        let mut request = self.bot.send_message(chat_id, text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard.to_markup());
        }
        if format == TextFormat::Html {
            request = request.parse_mode(ParseMode::Html);
        }
        request.await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        image: Vec<u8>,
        caption: &str,
        format: TextFormat,
    ) -> BotResult<()> {
        let mut request = self
            .bot
            .send_photo(chat_id, InputFile::memory(image))
            .caption(caption);
        if format == TextFormat::Html {
            request = request.parse_mode(ParseMode::Html);
        }
        request.await?;
        Ok(())
    }
}
