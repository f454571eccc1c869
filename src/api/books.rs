//! Book collection endpoints (all owner-scoped)

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};

use crate::{
    error::{AppError, AppResult},
    models::{book::BookForm, session::Flash},
    views, AppState,
};

use super::{flash_and_redirect, CurrentUser};

/// Owner's dashboard: their books newest-first plus collection stats
pub async fn dashboard(
    State(state): State<AppState>,
    identity: CurrentUser,
) -> AppResult<Html<String>> {
    let flashes = state
        .services
        .sessions
        .take_flashes(&identity.session.token)
        .await?;
    let dashboard = state.services.books.dashboard(identity.user.id).await?;

    Ok(Html(views::dashboard_page(
        &identity.user.username,
        &dashboard,
        &flashes,
    )))
}

/// Render the creation form with the genre enumeration
pub async fn add_form(
    State(state): State<AppState>,
    identity: CurrentUser,
) -> AppResult<Html<String>> {
    let flashes = state
        .services
        .sessions
        .take_flashes(&identity.session.token)
        .await?;
    Ok(Html(views::add_book_page(&identity.user.username, &flashes)))
}

/// Create a book owned by the requester
pub async fn create(
    State(state): State<AppState>,
    identity: CurrentUser,
    Form(form): Form<BookForm>,
) -> AppResult<Redirect> {
    let token = &identity.session.token;

    match state.services.books.create(identity.user.id, form).await {
        Ok(book) => {
            tracing::info!(book_id = book.id, user_id = identity.user.id, "book added");
            flash_and_redirect(
                &state,
                token,
                Flash::success("Book added successfully"),
                "/books/dashboard",
            )
            .await
        }
        Err(AppError::Validation(errors)) => {
            for message in errors {
                state
                    .services
                    .sessions
                    .push_flash(token, Flash::error(message))
                    .await?;
            }
            Ok(Redirect::to("/books/add"))
        }
        Err(e) => {
            tracing::error!("failed to add book: {}", e);
            flash_and_redirect(&state, token, Flash::error("Failed to add book"), "/books/add")
                .await
        }
    }
}

/// Render the edit form pre-filled with the book's current fields
pub async fn edit_form(
    State(state): State<AppState>,
    identity: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    let token = &identity.session.token;

    match state
        .services
        .books
        .fetch_for_edit(id, identity.user.id)
        .await
    {
        Ok(book) => Ok(Html(views::edit_book_page(&identity.user.username, &book)).into_response()),
        Err(e) => Ok(recover_to_dashboard(&state, token, e).await?.into_response()),
    }
}

/// Replace a book's fields (owner only)
pub async fn update(
    State(state): State<AppState>,
    identity: CurrentUser,
    Path(id): Path<i32>,
    Form(form): Form<BookForm>,
) -> AppResult<Redirect> {
    let token = &identity.session.token;

    match state
        .services
        .books
        .update(id, identity.user.id, form)
        .await
    {
        Ok(book) => {
            tracing::info!(book_id = book.id, user_id = identity.user.id, "book updated");
            flash_and_redirect(
                &state,
                token,
                Flash::success("Book updated successfully"),
                "/books/dashboard",
            )
            .await
        }
        Err(e) => recover_to_dashboard(&state, token, e).await,
    }
}

/// Permanently remove a book (owner only)
pub async fn delete(
    State(state): State<AppState>,
    identity: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    let token = &identity.session.token;

    match state.services.books.delete(id, identity.user.id).await {
        Ok(()) => {
            tracing::info!(book_id = id, user_id = identity.user.id, "book deleted");
            flash_and_redirect(
                &state,
                token,
                Flash::success("Book deleted successfully"),
                "/books/dashboard",
            )
            .await
        }
        Err(e) => recover_to_dashboard(&state, token, e).await,
    }
}

/// Convert a book-operation failure into the flash + dashboard redirect
/// the pages expect. Ownership mismatches never disclose the actual owner.
async fn recover_to_dashboard(
    state: &AppState,
    token: &str,
    error: AppError,
) -> AppResult<Redirect> {
    let flash = match error {
        AppError::NotFound(_) => Flash::error("Book not found"),
        AppError::Authorization(_) => Flash::error("Not authorized"),
        AppError::Validation(errors) => Flash::error(errors.join(", ")),
        e => {
            tracing::error!("book operation failed: {}", e);
            Flash::error("Something went wrong")
        }
    };

    flash_and_redirect(state, token, flash, "/books/dashboard").await
}
