//! Public pages: landing and the aggregated library

use axum::{
    extract::{Query, State},
    response::Html,
};

use crate::{error::AppResult, models::book::LibraryQuery, views, AppState};

use super::MaybeIdentity;

/// Landing page
pub async fn home(
    State(state): State<AppState>,
    identity: MaybeIdentity,
) -> AppResult<Html<String>> {
    let flashes = match &identity.session {
        Some(session) => state.services.sessions.take_flashes(&session.token).await?,
        None => Vec::new(),
    };
    let username = identity.user.as_ref().map(|u| u.username.as_str());

    Ok(Html(views::home_page(username, &flashes)))
}

/// Public library: searches the entire collection across all users
pub async fn library(
    State(state): State<AppState>,
    identity: MaybeIdentity,
    Query(query): Query<LibraryQuery>,
) -> AppResult<Html<String>> {
    let library = state.services.books.search_public(&query).await?;
    let username = identity.user.as_ref().map(|u| u.username.as_str());

    Ok(Html(views::library_page(&library, &query, username)))
}
