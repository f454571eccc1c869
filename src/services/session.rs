//! Session lifecycle and flash messages
//!
//! The browser holds an opaque token in a signed cookie; everything else
//! lives in the store, so sessions survive process restarts. The session
//! payload maps to a user id only; the full user record is re-fetched on
//! every request, making store-side updates visible without re-login.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        session::{Flash, Session},
        user::User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct SessionService {
    repository: Repository,
}

impl SessionService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Look up a session by token
    pub async fn get(&self, token: &str) -> AppResult<Option<Session>> {
        self.repository.sessions.get(token).await
    }

    /// Start a fresh anonymous session with a new opaque token
    pub async fn start(&self) -> AppResult<Session> {
        let token = Uuid::new_v4().to_string();
        self.repository.sessions.create(&token).await
    }

    /// Bind an authenticated user to an existing session.
    /// The token is deliberately not rotated, matching the source system.
    pub async fn attach_user(&self, token: &str, user_id: i32) -> AppResult<()> {
        self.repository.sessions.attach_user(token, user_id).await
    }

    /// Destroy a session entirely (logout)
    pub async fn destroy(&self, token: &str) -> AppResult<()> {
        self.repository.sessions.delete(token).await
    }

    /// Resolve the session's identity, fetched fresh from the store
    pub async fn current_user(&self, session: &Session) -> AppResult<Option<User>> {
        let Some(user_id) = session.user_id else {
            return Ok(None);
        };
        match self.repository.users.get_by_id(user_id).await {
            Ok(user) => Ok(Some(user)),
            // Stale session pointing at a vanished user resolves to anonymous
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Queue a one-time notice for the next rendered page
    pub async fn push_flash(&self, token: &str, flash: Flash) -> AppResult<()> {
        let value = serde_json::to_value(&flash)
            .map_err(|e| AppError::Internal(format!("Failed to serialize flash: {}", e)))?;
        self.repository.sessions.push_flash(token, value).await
    }

    /// Drain pending notices (single-read)
    pub async fn take_flashes(&self, token: &str) -> AppResult<Vec<Flash>> {
        let value = self.repository.sessions.take_flash(token).await?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    /// Remember the CSRF state of a pending GitHub handshake
    pub async fn set_oauth_state(&self, token: &str, state: &str) -> AppResult<()> {
        self.repository.sessions.set_oauth_state(token, state).await
    }

    /// Consume the pending CSRF state
    pub async fn take_oauth_state(&self, token: &str) -> AppResult<Option<String>> {
        self.repository.sessions.take_oauth_state(token).await
    }
}
