//! Per-user conversation state and the session registry that owns it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::errors::BotResult;

/// Screen the user is currently on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Start,
    LanguageSelected,
    MenuSelected,
    CategorySelected,
    ComplaintsMode,
}

impl ConversationState {
    pub const ALL: [ConversationState; 5] = [
        ConversationState::Start,
        ConversationState::LanguageSelected,
        ConversationState::MenuSelected,
        ConversationState::CategorySelected,
        ConversationState::ComplaintsMode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Start => "start",
            ConversationState::LanguageSelected => "language_selected",
            ConversationState::MenuSelected => "menu_selected",
            ConversationState::CategorySelected => "category_selected",
            ConversationState::ComplaintsMode => "complaints_mode",
        }
    }

    /// Parse a stored state; unknown values restart the conversation
    pub fn parse(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == value)
            .unwrap_or_default()
    }

    /// Screen the back control returns to
    pub fn parent(&self) -> Self {
        match self {
            ConversationState::MenuSelected => ConversationState::LanguageSelected,
            ConversationState::CategorySelected => ConversationState::MenuSelected,
            ConversationState::ComplaintsMode => ConversationState::LanguageSelected,
            ConversationState::Start | ConversationState::LanguageSelected => {
                ConversationState::Start
            }
        }
    }
}

/// Conversation state held between messages for one chat
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    pub current_state: ConversationState,
    /// Language code
    pub selected_language: Option<String>,
    pub selected_action: Option<String>,
    pub selected_category: Option<String>,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    /// Back to a fresh conversation, keeping the identity
    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.user_id));
    }
}

/// Passive backend holding one record per user session
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, user_id: &str) -> BotResult<Option<UserSession>>;

    async fn save(&self, session: &UserSession) -> BotResult<()>;

    async fn save_all(&self, sessions: &[UserSession]) -> BotResult<()> {
        for session in sessions {
            self.save(session).await?;
        }
        Ok(())
    }
}

/// Store used when no database is configured, and in tests
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, UserSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, user_id: &str) -> BotResult<Option<UserSession>> {
        Ok(self.sessions.lock().await.get(user_id).cloned())
    }

    async fn save(&self, session: &UserSession) -> BotResult<()> {
        self.sessions
            .lock()
            .await
            .insert(session.user_id.clone(), session.clone());
        Ok(())
    }
}

pub type SessionHandle = Arc<Mutex<UserSession>>;

/// Cache of live sessions in front of a [`SessionStore`].
///
/// Each user gets one exclusive async lock that the controller holds for the
/// whole event, so read-modify-write on a session never interleaves.
/// [`SessionRegistry::close`] is the release path: it flushes every cached
/// session once and reports failures only through the log.
pub struct SessionRegistry {
    store: Arc<dyn SessionStore>,
    sessions: Mutex<HashMap<String, SessionHandle>>,
    closed: Mutex<bool>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
            closed: Mutex::new(false),
        }
    }

    /// Session for a user, read from the store on first reference.
    ///
    /// The map lock is not held while the store is read. If two events for
    /// the same new user race, the first inserted session wins.
    pub async fn session(&self, user_id: &str) -> BotResult<SessionHandle> {
        if let Some(handle) = self.sessions.lock().await.get(user_id) {
            return Ok(Arc::clone(handle));
        }

        let session = match self.store.load(user_id).await? {
            Some(session) => {
                debug!(user_id = %user_id, state = ?session.current_state, "Session restored from store");
                session
            }
            None => {
                debug!(user_id = %user_id, "Creating new session");
                UserSession::new(user_id)
            }
        };

        let mut sessions = self.sessions.lock().await;
        let handle = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(session)));
        Ok(Arc::clone(handle))
    }

    /// Persist one session
    pub async fn save(&self, session: &UserSession) -> BotResult<()> {
        self.store.save(session).await
    }

    /// Persist every cached session.
    ///
    /// `held` is the session whose lock the caller already owns. Sessions
    /// locked by another in-flight event are skipped; that event persists
    /// its own session when it finishes.
    pub async fn save_all(&self, held: Option<&UserSession>) -> BotResult<()> {
        let handles: Vec<(String, SessionHandle)> = self
            .sessions
            .lock()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect();

        let mut snapshot = Vec::with_capacity(handles.len());
        for (user_id, handle) in handles {
            match held {
                Some(session) if session.user_id == user_id => snapshot.push(session.clone()),
                _ => match handle.try_lock() {
                    Ok(session) => snapshot.push(session.clone()),
                    Err(_) => debug!(user_id = %user_id, "Session busy, skipped in flush"),
                },
            }
        }

        self.store.save_all(&snapshot).await?;
        debug!(sessions = snapshot.len(), "Flushed all sessions");
        Ok(())
    }

    /// Flush once on shutdown; failures are logged, never raised
    pub async fn close(&self) {
        let mut closed = self.closed.lock().await;
        if *closed {
            return;
        }
        *closed = true;

        match self.save_all(None).await {
            Ok(()) => info!("Session store flushed on shutdown"),
            Err(e) => error!(error = %e, "Failed to flush sessions on shutdown"),
        }
    }

    pub async fn cached_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip_names() {
        for state in ConversationState::ALL {
            assert_eq!(ConversationState::parse(state.as_str()), state);
        }
        assert_eq!(
            ConversationState::parse("handle_menu_selection"),
            ConversationState::Start
        );
    }

    #[test]
    fn test_parent_table() {
        use ConversationState::*;
        assert_eq!(MenuSelected.parent(), LanguageSelected);
        assert_eq!(CategorySelected.parent(), MenuSelected);
        assert_eq!(ComplaintsMode.parent(), LanguageSelected);
        assert_eq!(LanguageSelected.parent(), Start);
        assert_eq!(Start.parent(), Start);
    }

    #[test]
    fn test_reset_keeps_user_id() {
        let mut session = UserSession {
            user_id: "42".to_string(),
            current_state: ConversationState::CategorySelected,
            selected_language: Some("en".to_string()),
            selected_action: Some("menu".to_string()),
            selected_category: Some("Drinks".to_string()),
        };
        session.reset();
        assert_eq!(session, UserSession::new("42"));
    }

    #[tokio::test]
    async fn test_registry_loads_from_store_once() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut stored = UserSession::new("7");
        stored.current_state = ConversationState::MenuSelected;
        store.save(&stored).await.unwrap();

        let registry = SessionRegistry::new(store.clone());
        let first = registry.session("7").await.unwrap();
        assert_eq!(first.lock().await.current_state, ConversationState::MenuSelected);

        first.lock().await.current_state = ConversationState::ComplaintsMode;
        let second = registry.session("7").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.cached_count().await, 1);
    }

    #[tokio::test]
    async fn test_save_all_uses_held_snapshot() {
        let store = Arc::new(InMemorySessionStore::new());
        let registry = SessionRegistry::new(store.clone());

        let handle = registry.session("1").await.unwrap();
        registry.session("2").await.unwrap();

        let mut guard = handle.lock().await;
        guard.current_state = ConversationState::LanguageSelected;
        registry.save_all(Some(&guard)).await.unwrap();
        drop(guard);

        assert_eq!(store.len().await, 2);
        let saved = store.load("1").await.unwrap().unwrap();
        assert_eq!(saved.current_state, ConversationState::LanguageSelected);
    }

    /// Store whose first load of one user blocks until released
    struct GatedStore {
        inner: InMemorySessionStore,
        gated_user: String,
        entered: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl SessionStore for GatedStore {
        async fn load(&self, user_id: &str) -> BotResult<Option<UserSession>> {
            if user_id == self.gated_user {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.load(user_id).await
        }

        async fn save(&self, session: &UserSession) -> BotResult<()> {
            self.inner.save(session).await
        }
    }

    #[tokio::test]
    async fn test_slow_load_does_not_block_cached_sessions() {
        let store = Arc::new(GatedStore {
            inner: InMemorySessionStore::new(),
            gated_user: "2".to_string(),
            entered: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        });
        let registry = Arc::new(SessionRegistry::new(store.clone()));
        let cached = registry.session("1").await.unwrap();

        let slow = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.session("2").await })
        };
        store.entered.notified().await;

        let again = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            registry.session("1"),
        )
        .await
        .expect("cached lookup waited behind another user's load")
        .unwrap();
        assert!(Arc::ptr_eq(&cached, &again));

        tokio::time::timeout(std::time::Duration::from_secs(1), registry.save_all(None))
            .await
            .expect("flush waited behind another user's load")
            .unwrap();

        store.release.notify_one();
        slow.await.unwrap().unwrap();
        assert_eq!(registry.cached_count().await, 2);
    }

    #[tokio::test]
    async fn test_racing_first_loads_share_one_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let registry = Arc::new(SessionRegistry::new(store));

        let (a, b) = tokio::join!(registry.session("5"), registry.session("5"));
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(registry.cached_count().await, 1);
    }

    #[tokio::test]
    async fn test_close_flushes_once() {
        let store = Arc::new(InMemorySessionStore::new());
        let registry = SessionRegistry::new(store.clone());
        registry.session("9").await.unwrap();

        registry.close().await;
        registry.close().await;
        assert_eq!(store.len().await, 1);
    }
}
