use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::{debug, info};

use crate::errors::{BotError, BotResult};
use crate::session::{ConversationState, SessionStore, UserSession};

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> BotResult<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_sessions (
            user_id TEXT PRIMARY KEY,
            current_state TEXT NOT NULL DEFAULT 'start',
            selected_language TEXT,
            selected_action TEXT,
            selected_category TEXT,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| BotError::Persistence(format!("Failed to create user_sessions table: {e}")))?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Session store backed by the `user_sessions` table
#[derive(Clone, Debug)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and make sure the schema exists
    pub async fn connect(database_url: &str) -> BotResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        init_database_schema(&pool).await?;
        Ok(Self::new(pool))
    }
}

const UPSERT_SESSION: &str = "INSERT INTO user_sessions
        (user_id, current_state, selected_language, selected_action, selected_category, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (user_id) DO UPDATE SET
        current_state = EXCLUDED.current_state,
        selected_language = EXCLUDED.selected_language,
        selected_action = EXCLUDED.selected_action,
        selected_category = EXCLUDED.selected_category,
        updated_at = EXCLUDED.updated_at";

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, user_id: &str) -> BotResult<Option<UserSession>> {
        let row = sqlx::query(
            "SELECT user_id, current_state, selected_language, selected_action, selected_category
             FROM user_sessions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let state: String = row.get("current_state");
                Ok(Some(UserSession {
                    user_id: row.get("user_id"),
                    current_state: ConversationState::parse(&state),
                    selected_language: row.get("selected_language"),
                    selected_action: row.get("selected_action"),
                    selected_category: row.get("selected_category"),
                }))
            }
            None => {
                debug!(user_id = %user_id, "No stored session");
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &UserSession) -> BotResult<()> {
        sqlx::query(UPSERT_SESSION)
            .bind(&session.user_id)
            .bind(session.current_state.as_str())
            .bind(&session.selected_language)
            .bind(&session.selected_action)
            .bind(&session.selected_category)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_all(&self, sessions: &[UserSession]) -> BotResult<()> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        for session in sessions {
            sqlx::query(UPSERT_SESSION)
                .bind(&session.user_id)
                .bind(session.current_state.as_str())
                .bind(&session.selected_language)
                .bind(&session.selected_action)
                .bind(&session.selected_category)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        info!(sessions = sessions.len(), "Sessions saved to database");
        Ok(())
    }
}
