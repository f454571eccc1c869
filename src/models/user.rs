//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Full user model from database.
///
/// Exactly one authentication method class is present: a local account has a
/// password hash and no GitHub identity, a GitHub account the reverse. The
/// two are never linked, even when they share an email address.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2); absent for GitHub-only accounts
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub github_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Registration form payload
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "Please fill in all fields"))]
    pub username: String,
    #[validate(
        length(min = 1, message = "Please fill in all fields"),
        email(message = "Invalid email format")
    )]
    pub email: String,
    #[validate(
        length(min = 8, message = "Password should be at least 8 characters"),
        must_match(other = "password2", message = "Passwords do not match")
    )]
    pub password: String,
    #[validate(length(min = 1, message = "Please fill in all fields"))]
    pub password2: String,
}

impl RegisterForm {
    /// Canonical form of the submitted identity fields: trimmed username,
    /// trimmed lowercase email.
    pub fn normalized(&self) -> (String, String) {
        (
            self.username.trim().to_string(),
            self.email.trim().to_lowercase(),
        )
    }
}

/// Login form payload
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Profile fields resolved from a completed GitHub handshake
#[derive(Debug, Clone)]
pub struct GithubProfile {
    pub id: String,
    pub login: String,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::validation_messages;

    fn form(username: &str, email: &str, password: &str, password2: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password2: password2.to_string(),
        }
    }

    #[test]
    fn rejects_short_password() {
        let errors = form("alice", "alice@x.com", "short", "short")
            .validate()
            .unwrap_err();
        assert!(validation_messages(&errors)
            .iter()
            .any(|m| m.contains("at least 8 characters")));
    }

    #[test]
    fn rejects_password_mismatch() {
        let errors = form("alice", "alice@x.com", "password1", "password2")
            .validate()
            .unwrap_err();
        assert!(validation_messages(&errors)
            .iter()
            .any(|m| m.contains("do not match")));
    }

    #[test]
    fn rejects_missing_fields() {
        let errors = form("", "", "", "").validate().unwrap_err();
        assert!(validation_messages(&errors)
            .iter()
            .any(|m| m.contains("fill in all fields")));
    }

    #[test]
    fn accepts_valid_registration() {
        assert!(form("alice", "alice@x.com", "password1", "password1")
            .validate()
            .is_ok());
    }

    #[test]
    fn normalized_trims_and_lowercases() {
        let (username, email) = form("  alice ", " Alice@X.COM ", "password1", "password1")
            .normalized();
        assert_eq!(username, "alice");
        assert_eq!(email, "alice@x.com");
    }
}
