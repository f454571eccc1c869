//! Authentication endpoints: local login/register, GitHub OAuth, logout

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        session::Flash,
        user::{LoginForm, RegisterForm},
    },
    views, AppState,
};

use super::{ensure_session, flash_and_redirect, RequireGuest};

/// Render the login form (guest-only)
pub async fn login_form(
    State(state): State<AppState>,
    guest: RequireGuest,
) -> AppResult<Html<String>> {
    let flashes = match guest.session {
        Some(session) => state.services.sessions.take_flashes(&session.token).await?,
        None => Vec::new(),
    };
    Ok(Html(views::login_page(&flashes)))
}

/// Authenticate a local email/password pair
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<(SignedCookieJar, Redirect)> {
    let (session, jar) = ensure_session(&state, jar).await?;

    match state
        .services
        .auth
        .authenticate(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            state
                .services
                .sessions
                .attach_user(&session.token, user.id)
                .await?;
            tracing::info!(user_id = user.id, "user logged in");
            Ok((jar, Redirect::to("/books/dashboard")))
        }
        Err(AppError::Authentication(message)) => {
            let redirect =
                flash_and_redirect(&state, &session.token, Flash::error(message), "/auth/login")
                    .await?;
            Ok((jar, redirect))
        }
        Err(e) => Err(e),
    }
}

/// Render the registration form (guest-only)
pub async fn register_form(
    State(state): State<AppState>,
    guest: RequireGuest,
) -> AppResult<Html<String>> {
    let flashes = match guest.session {
        Some(session) => state.services.sessions.take_flashes(&session.token).await?,
        None => Vec::new(),
    };
    Ok(Html(views::register_page(&flashes, &[], "", "")))
}

/// Validate and create a local account
pub async fn register(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<RegisterForm>,
) -> AppResult<(SignedCookieJar, Response)> {
    let (session, jar) = ensure_session(&state, jar).await?;

    // Echoed back into the re-rendered form on failure
    let (username, email) = form.normalized();

    match state.services.auth.register(form).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "user registered");
            let redirect = flash_and_redirect(
                &state,
                &session.token,
                Flash::success("You are now registered and can log in"),
                "/auth/login",
            )
            .await?;
            Ok((jar, redirect.into_response()))
        }
        Err(AppError::Validation(errors)) => Ok((
            jar,
            Html(views::register_page(&[], &errors, &username, &email)).into_response(),
        )),
        Err(AppError::Conflict(message)) => Ok((
            jar,
            Html(views::register_page(&[], &[message], &username, &email)).into_response(),
        )),
        Err(e) => Err(e),
    }
}

/// Begin the GitHub handshake: park a CSRF state in the session and
/// redirect to the authorize endpoint.
pub async fn github(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> AppResult<(SignedCookieJar, Redirect)> {
    let (session, jar) = ensure_session(&state, jar).await?;

    if !state.services.github.is_configured() {
        let redirect = flash_and_redirect(
            &state,
            &session.token,
            Flash::error("GitHub sign-in is not configured"),
            "/auth/login",
        )
        .await?;
        return Ok((jar, redirect));
    }

    let csrf_state = Uuid::new_v4().to_string();
    state
        .services
        .sessions
        .set_oauth_state(&session.token, &csrf_state)
        .await?;

    let url = state.services.github.authorize_url(&csrf_state)?;
    Ok((jar, Redirect::to(&url)))
}

#[derive(Debug, Deserialize)]
pub struct GithubCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Complete the GitHub handshake: verify the CSRF state, exchange the code,
/// resolve (or create) the user, and log the session in.
pub async fn github_callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<GithubCallbackQuery>,
) -> AppResult<(SignedCookieJar, Redirect)> {
    let (session, jar) = ensure_session(&state, jar).await?;

    let result = complete_github(&state, &session.token, &query).await;
    match result {
        Ok(user_id) => {
            state
                .services
                .sessions
                .attach_user(&session.token, user_id)
                .await?;
            tracing::info!(user_id, "user logged in via GitHub");
            Ok((jar, Redirect::to("/books/dashboard")))
        }
        Err(AppError::Authentication(message)) => {
            let redirect =
                flash_and_redirect(&state, &session.token, Flash::error(message), "/auth/login")
                    .await?;
            Ok((jar, redirect))
        }
        Err(e) => Err(e),
    }
}

async fn complete_github(
    state: &AppState,
    session_token: &str,
    query: &GithubCallbackQuery,
) -> AppResult<i32> {
    let expected = state
        .services
        .sessions
        .take_oauth_state(session_token)
        .await?;

    let valid_state = match (&expected, &query.state) {
        (Some(expected), Some(received)) => expected == received,
        _ => false,
    };
    if !valid_state {
        return Err(AppError::Authentication(
            "GitHub sign-in failed".to_string(),
        ));
    }

    let code = query
        .code
        .as_deref()
        .ok_or_else(|| AppError::Authentication("GitHub sign-in failed".to_string()))?;

    let access_token = state.services.github.exchange_code(code).await?;
    let profile = state.services.github.fetch_profile(&access_token).await?;
    let user = state.services.auth.resolve_github(profile).await?;

    Ok(user.id)
}

/// Destroy the session and return to the landing page. A fresh anonymous
/// session carries the goodbye notice.
pub async fn logout(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> AppResult<(SignedCookieJar, Redirect)> {
    if let Some(cookie) = jar.get(super::SESSION_COOKIE) {
        state.services.sessions.destroy(cookie.value()).await?;
    }

    let session = state.services.sessions.start().await?;
    state
        .services
        .sessions
        .push_flash(&session.token, Flash::success("You are logged out"))
        .await?;

    let jar = jar.add(super::session_cookie(session.token));
    Ok((jar, Redirect::to("/")))
}
