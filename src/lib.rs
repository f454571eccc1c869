//! BookTrack Server - Personal Book Collection Tracker
//!
//! A server-rendered Rust web application where authenticated users register
//! the books they own or have read, browse a public aggregated library, and
//! search across all users' entries.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod views;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    cookie_key: Key,
}

impl AppState {
    pub fn new(config: AppConfig, services: services::Services) -> Self {
        let cookie_key = config.session.cookie_key();
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
            cookie_key,
        }
    }
}

// Lets the signed cookie jar extractor find the signing key in state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.cookie_key.clone()
    }
}
