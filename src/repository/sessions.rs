//! Sessions repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::session::Session};

#[derive(Clone)]
pub struct SessionsRepository {
    pool: Pool<Postgres>,
}

impl SessionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Look up a session by its opaque token
    pub async fn get(&self, token: &str) -> AppResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Create a new (anonymous) session record
    pub async fn create(&self, token: &str) -> AppResult<Session> {
        let session = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (token) VALUES ($1) RETURNING *",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    /// Bind an authenticated identity to the session
    pub async fn attach_user(&self, token: &str, user_id: i32) -> AppResult<()> {
        sqlx::query("UPDATE sessions SET user_id = $1, updated_at = $2 WHERE token = $3")
            .bind(user_id)
            .bind(Utc::now())
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove a session record entirely
    pub async fn delete(&self, token: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Append a flash entry to the session's pending list
    pub async fn push_flash(&self, token: &str, flash: serde_json::Value) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET flash = flash || jsonb_build_array($1::jsonb), updated_at = $2
            WHERE token = $3
            "#,
        )
        .bind(flash)
        .bind(Utc::now())
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drain the pending flash list, returning what was stored
    pub async fn take_flash(&self, token: &str) -> AppResult<serde_json::Value> {
        let flash: Option<serde_json::Value> = sqlx::query_scalar(
            r#"
            WITH drained AS (
                UPDATE sessions
                SET flash = '[]'::jsonb, updated_at = $1
                WHERE token = $2 AND flash <> '[]'::jsonb
                RETURNING (SELECT flash FROM sessions WHERE token = $2)
            )
            SELECT flash FROM drained
            "#,
        )
        .bind(Utc::now())
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(flash.unwrap_or_else(|| serde_json::json!([])))
    }

    /// Store the CSRF state of a pending GitHub handshake
    pub async fn set_oauth_state(&self, token: &str, state: &str) -> AppResult<()> {
        sqlx::query("UPDATE sessions SET oauth_state = $1, updated_at = $2 WHERE token = $3")
            .bind(state)
            .bind(Utc::now())
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Consume the pending CSRF state, clearing it in the same statement
    pub async fn take_oauth_state(&self, token: &str) -> AppResult<Option<String>> {
        let state: Option<Option<String>> = sqlx::query_scalar(
            r#"
            UPDATE sessions
            SET oauth_state = NULL, updated_at = $1
            WHERE token = $2
            RETURNING (SELECT oauth_state FROM sessions WHERE token = $2)
            "#,
        )
        .bind(Utc::now())
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state.flatten())
    }
}
