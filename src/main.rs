use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bar_bot::bot::{message_handler, ControllerSettings, ConversationController, TelegramTransport};
use bar_bot::catalog::Catalog;
use bar_bot::config::BotConfig;
use bar_bot::db::PgSessionStore;
use bar_bot::images::HttpImageStore;
use bar_bot::session::{InMemorySessionStore, SessionRegistry, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Bar Bot");

    let config = BotConfig::from_env()?;

    let catalog = Arc::new(Catalog::load(&config.catalog_path)?);

    let store: Arc<dyn SessionStore> = match &config.database_url {
        Some(url) => {
            info!("Connecting session store to database");
            Arc::new(PgSessionStore::connect(url).await?)
        }
        None => {
            warn!("DATABASE_URL not set, sessions will not survive a restart");
            Arc::new(InMemorySessionStore::new())
        }
    };
    let sessions = Arc::new(SessionRegistry::new(store));

    let bot = Bot::new(config.bot_token.clone());
    let controller = Arc::new(ConversationController::new(
        catalog,
        Arc::clone(&sessions),
        Arc::new(TelegramTransport::new(bot.clone())),
        Arc::new(HttpImageStore::new(config.image_base_url.clone())),
        ControllerSettings::from_config(&config),
    )?);

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry().branch(Update::filter_message().endpoint({
        let controller = Arc::clone(&controller);
        move |msg: Message| {
            let controller = Arc::clone(&controller);
            async move { message_handler(msg, controller).await }
        }
    }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped, flushing sessions");
    sessions.close().await;

    Ok(())
}
