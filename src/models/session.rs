//! Session model and flash messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Server-persisted session record. The cookie only carries the opaque
/// token; the user is re-fetched from the store on each request.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    /// NULL while the browser is anonymous
    pub user_id: Option<i32>,
    /// One-time messages, drained on the next rendered page
    pub flash: serde_json::Value,
    /// CSRF state of a pending GitHub handshake
    pub oauth_state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn flashes(&self) -> Vec<Flash> {
        serde_json::from_value(self.flash.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// A one-time user-facing notice surfaced on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_list_round_trips_through_json() {
        let flashes = vec![
            Flash::success("Book added successfully"),
            Flash::error("Not authorized"),
        ];
        let value = serde_json::to_value(&flashes).unwrap();
        let back: Vec<Flash> = serde_json::from_value(value).unwrap();
        assert_eq!(back, flashes);
    }

    #[test]
    fn malformed_flash_payload_yields_empty_list() {
        let session = Session {
            token: "t".to_string(),
            user_id: None,
            flash: serde_json::json!({"not": "a list"}),
            oauth_state: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(session.flashes().is_empty());
    }
}
