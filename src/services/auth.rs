//! Identity verification and account registration

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{GithubProfile, RegisterForm, User},
        validation_messages,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
}

impl AuthService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Verify a local email/password pair.
    ///
    /// The two failure reasons are surfaced as distinct user-facing
    /// messages, matching the login flash behavior of the product.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self
            .repository
            .users
            .get_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Email not registered".to_string()))?;

        // GitHub-only accounts carry no hash and can never match
        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Password incorrect".to_string()));
        }

        Ok(user)
    }

    /// Register a local account. The raw password is never stored.
    pub async fn register(&self, form: RegisterForm) -> AppResult<User> {
        if let Err(errors) = form.validate() {
            return Err(AppError::Validation(validation_messages(&errors)));
        }

        let (username, email) = form.normalized();

        if self.repository.users.identity_exists(&email, &username).await? {
            return Err(AppError::Conflict(
                "Email or username already registered".to_string(),
            ));
        }

        let password_hash = self.hash_password(&form.password)?;

        self.repository
            .users
            .create_local(&username, &email, &password_hash)
            .await
    }

    /// Resolve a completed GitHub handshake to a user, creating one on
    /// first login. Accounts are keyed on the GitHub id only; a local
    /// account with the same email stays a separate, unlinked record.
    pub async fn resolve_github(&self, profile: GithubProfile) -> AppResult<User> {
        if let Some(user) = self.repository.users.get_by_github_id(&profile.id).await? {
            return Ok(user);
        }

        let email = profile
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                AppError::Authentication("GitHub profile has no usable email address".to_string())
            })?;

        let username = self.derive_username(&profile).await?;

        self.repository
            .users
            .create_github(&username, &email, &profile.id)
            .await
    }

    /// Derive a username from the GitHub login, suffixing with the GitHub id
    /// when the plain login is already taken.
    async fn derive_username(&self, profile: &GithubProfile) -> AppResult<String> {
        let login = profile.login.trim().to_string();
        if !self.repository.users.username_exists(&login).await? {
            return Ok(login);
        }
        Ok(format!("{}-gh{}", login, profile.id))
    }

    /// Verify a password against the stored hash, if any.
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        if let Some(ref hash) = user.password_hash {
            let parsed_hash = PasswordHash::new(hash)
                .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
            return Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok());
        }

        Ok(false)
    }

    /// Hash a password using Argon2 with a fresh random salt
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> AuthService {
        // Lazy pool: never connects, good enough for the pure password paths.
        let pool = PgPoolOptions::new().connect_lazy("postgres://localhost/unused");
        AuthService::new(Repository::new(pool.expect("lazy pool")))
    }

    fn user_with_hash(hash: Option<String>) -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: hash,
            github_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn hash_and_verify_round_trip() {
        let service = service();
        let hash = service.hash_password("password1").unwrap();
        assert_ne!(hash, "password1");

        let user = user_with_hash(Some(hash));
        assert!(service.verify_password(&user, "password1").unwrap());
        assert!(!service.verify_password(&user, "password2").unwrap());
    }

    #[tokio::test]
    async fn hashing_salts_every_call() {
        let service = service();
        let a = service.hash_password("password1").unwrap();
        let b = service.hash_password("password1").unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn accounts_without_a_hash_never_verify() {
        let service = service();
        let user = user_with_hash(None);
        assert!(!service.verify_password(&user, "anything").unwrap());
    }
}
