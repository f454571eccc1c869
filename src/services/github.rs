//! GitHub OAuth handshake
//!
//! Implements the authorization-code flow directly against the GitHub
//! endpoints: redirect to authorize, exchange the callback code for an
//! access token, then fetch the profile (and primary email when the
//! profile hides it).

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;

use crate::{
    config::GithubConfig,
    error::{AppError, AppResult},
    models::user::GithubProfile,
};

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_URL: &str = "https://api.github.com/user";
const EMAILS_URL: &str = "https://api.github.com/user/emails";

// GitHub rejects requests without a User-Agent.
const AGENT: &str = concat!("booktrack-server/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: i64,
    login: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

#[derive(Clone)]
pub struct GithubService {
    http: reqwest::Client,
    config: GithubConfig,
}

impl GithubService {
    pub fn new(config: GithubConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Authorization URL the login entry point redirects to
    pub fn authorize_url(&self, state: &str) -> AppResult<String> {
        let url = reqwest::Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("scope", "user:email"),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to build authorize URL: {}", e)))?;

        Ok(url.into())
    }

    /// Exchange the callback code for an access token
    pub async fn exchange_code(&self, code: &str) -> AppResult<String> {
        let response = self
            .http
            .post(TOKEN_URL)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, AGENT)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.callback_url.as_str()),
            ])
            .send()
            .await
            .map_err(handshake_error)?;

        let token: AccessTokenResponse = response.json().await.map_err(handshake_error)?;

        token.access_token.ok_or_else(|| {
            tracing::warn!(
                "GitHub token exchange rejected: {}",
                token.error_description.as_deref().unwrap_or("no detail")
            );
            AppError::Authentication("GitHub sign-in failed".to_string())
        })
    }

    /// Fetch the authenticated profile, resolving the primary email when
    /// the public profile omits it.
    pub async fn fetch_profile(&self, access_token: &str) -> AppResult<GithubProfile> {
        let user: GithubUser = self
            .get_json(USER_URL, access_token)
            .await?;

        let email = match user.email {
            Some(email) => Some(email),
            None => self.primary_email(access_token).await?,
        };

        Ok(GithubProfile {
            id: user.id.to_string(),
            login: user.login,
            email,
        })
    }

    async fn primary_email(&self, access_token: &str) -> AppResult<Option<String>> {
        let emails: Vec<GithubEmail> = self.get_json(EMAILS_URL, access_token).await?;

        Ok(emails
            .iter()
            .find(|e| e.primary && e.verified)
            .or_else(|| emails.first())
            .map(|e| e.email.clone()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> AppResult<T> {
        self.http
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .header(USER_AGENT, AGENT)
            .send()
            .await
            .map_err(handshake_error)?
            .json()
            .await
            .map_err(handshake_error)
    }
}

fn handshake_error(e: reqwest::Error) -> AppError {
    tracing::warn!("GitHub handshake request failed: {}", e);
    AppError::Authentication("GitHub sign-in failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_client_id_state_and_scope() {
        let service = GithubService::new(GithubConfig {
            client_id: "cid123".to_string(),
            client_secret: "secret".to_string(),
            callback_url: "http://localhost:3000/auth/github/callback".to_string(),
        });

        let url = service.authorize_url("state-token").unwrap();
        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=cid123"));
        assert!(url.contains("state=state-token"));
        assert!(url.contains("scope=user%3Aemail"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fgithub%2Fcallback"));
    }
}
