//! Admin route guard.
//!
//! The decision waits for the first settled auth state (a restored session
//! may still be refreshing at startup) and then reads the current user.
//! Over HTTP the browser also has to present the session cookie issued at
//! sign-in.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tracing::debug;

use super::Route;
use crate::auth::{AuthClient, AuthState};
use crate::backend::Connection;

/// Cookie holding the browser session token
pub const SESSION_COOKIE: &str = "menu_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(Route),
}

/// Decide whether navigation to `route` may proceed.
///
/// Public routes always proceed. Guarded routes need an auth handle, a
/// signed-in user and the session token that user was issued.
pub async fn check(route: Route, auth: Option<&AuthClient>, session: Option<&str>) -> Navigation {
    if !route.requires_auth() {
        return Navigation::Proceed;
    }
    let Some(auth) = auth else {
        return Navigation::Redirect(Route::Login);
    };

    // One-shot: the receiver is dropped as soon as the state settles
    {
        let mut states = auth.on_auth_state_changed();
        let _ = states.wait_for(AuthState::is_settled).await;
    }

    match auth.current_user() {
        Some(user) if session.is_some_and(|token| user.owns_session(token)) => Navigation::Proceed,
        _ => Navigation::Redirect(Route::Login),
    }
}

/// Middleware for the admin routes. On success the signed-in
/// [`AuthUser`](crate::auth::AuthUser) is added to the request extensions.
pub async fn require_auth(
    State(connection): State<Arc<Connection>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let route = Route::from_path(request.uri().path()).unwrap_or(Route::Admin);
    let auth = connection.auth().await;
    let session = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string());

    match check(route, auth.as_deref(), session.as_deref()).await {
        Navigation::Proceed => {
            if let Some(user) = auth.as_ref().and_then(|auth| auth.current_user()) {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
        Navigation::Redirect(to) => {
            debug!("Redirecting {} to {}", request.uri().path(), to.path());
            Redirect::to(to.path()).into_response()
        }
    }
}
