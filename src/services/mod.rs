//! Business logic services

pub mod auth;
pub mod books;
pub mod github;
pub mod session;

use crate::{config::GithubConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub auth: auth::AuthService,
    pub books: books::BooksService,
    pub github: github::GithubService,
    pub sessions: session::SessionService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, github_config: GithubConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone()),
            books: books::BooksService::new(repository.clone()),
            github: github::GithubService::new(github_config),
            sessions: session::SessionService::new(repository.clone()),
            repository,
        }
    }
}
