//! Message Handler module adapting Telegram updates to the controller

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error};

use super::controller::ConversationController;
use super::input::IncomingMessage;

/// Dispatcher endpoint for incoming messages.
///
/// A failed event is logged and dropped; the user gets no reply.
pub async fn message_handler(msg: Message, controller: Arc<ConversationController>) -> Result<()> {
    let Some(incoming) = IncomingMessage::from_telegram(&msg) else {
        debug!(user_id = %msg.chat.id, "Ignoring non-text message");
        return Ok(());
    };

    if let Err(e) = controller.handle(&incoming).await {
        error!(user_id = %incoming.chat_id, error = %e, "Dropping message after handler failure");
    }

    Ok(())
}
