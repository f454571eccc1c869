//! HTTP handlers and request-entry guards

pub mod auth;
pub mod books;
pub mod health;
pub mod pages;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRef, FromRequestParts, Request},
    http::{request::Parts, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, Key, SignedCookieJar};

use crate::{
    error::AppResult,
    models::{
        session::{Flash, Session},
        user::User,
    },
    AppState,
};

/// Name of the signed cookie carrying the opaque session token
pub const SESSION_COOKIE: &str = "booktrack.sid";

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build()
}

/// Get the request's session, creating one (and setting the cookie) when
/// the browser doesn't hold a valid token yet.
pub async fn ensure_session(
    state: &AppState,
    jar: SignedCookieJar,
) -> AppResult<(Session, SignedCookieJar)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(session) = state.services.sessions.get(cookie.value()).await? {
            return Ok((session, jar));
        }
    }

    let session = state.services.sessions.start().await?;
    let jar = jar.add(session_cookie(session.token.clone()));
    Ok((session, jar))
}

/// Rewrite `POST …?_method=PUT|DELETE` to the named method before routing,
/// so plain HTML forms can reach the update and delete routes.
pub async fn method_override(mut request: Request<Body>, next: Next) -> Response {
    if request.method() == Method::POST {
        let overridden = request
            .uri()
            .query()
            .and_then(|q| q.split('&').find_map(|pair| pair.strip_prefix("_method=")))
            .and_then(|m| match m.to_ascii_uppercase().as_str() {
                "PUT" => Some(Method::PUT),
                "DELETE" => Some(Method::DELETE),
                _ => None,
            });
        if let Some(method) = overridden {
            *request.method_mut() = method;
        }
    }

    next.run(request).await
}

/// Queue a one-time notice and redirect, the shape every recoverable
/// failure takes at the route boundary.
pub(crate) async fn flash_and_redirect(
    state: &AppState,
    token: &str,
    flash: Flash,
    to: &str,
) -> AppResult<Redirect> {
    state.services.sessions.push_flash(token, flash).await?;
    Ok(Redirect::to(to))
}

/// Resolve the request's session and identity without enforcing either.
/// The user record is fetched fresh from the store on every request.
async fn resolve_identity(
    headers: &HeaderMap,
    state: &AppState,
) -> AppResult<(Option<Session>, Option<User>)> {
    let jar = SignedCookieJar::from_headers(headers, Key::from_ref(state));

    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok((None, None));
    };
    let Some(session) = state.services.sessions.get(cookie.value()).await? else {
        return Ok((None, None));
    };

    let user = state.services.sessions.current_user(&session).await?;
    Ok((Some(session), user))
}

/// Extractor gating authenticated routes: resolves the session to a fresh
/// user record, or redirects anonymous callers to the login entry point.
/// The originally requested URL is discarded.
pub struct CurrentUser {
    pub session: Session,
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve_identity(&parts.headers, state).await {
            Ok((Some(session), Some(user))) => Ok(CurrentUser { session, user }),
            Ok(_) => Err(Redirect::to("/auth/login").into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}

/// Extractor gating guest-only routes (login/register forms): an already
/// authenticated caller is bounced to the dashboard. Carries the session,
/// if any, so the page can drain pending flashes.
pub struct RequireGuest {
    pub session: Option<Session>,
}

#[async_trait]
impl FromRequestParts<AppState> for RequireGuest {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve_identity(&parts.headers, state).await {
            Ok((_, Some(_))) => Err(Redirect::to("/books/dashboard").into_response()),
            Ok((session, None)) => Ok(RequireGuest { session }),
            Err(e) => Err(e.into_response()),
        }
    }
}

/// Optional identity for public pages
pub struct MaybeIdentity {
    pub session: Option<Session>,
    pub user: Option<User>,
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeIdentity {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve_identity(&parts.headers, state).await {
            Ok((session, user)) => Ok(MaybeIdentity { session, user }),
            Err(e) => Err(e.into_response()),
        }
    }
}
