//! Translation of guard outcomes into HTTP responses.
//!
//! Only `Allowed` reaches the route's own response. Every other outcome is a
//! `303 See Other` carrying the user-facing message as a `message` query
//! parameter:
//!
//! - `Unauthenticated` → login page; a stale session also clears the cookie
//! - `Denied` / `NotFound` → dashboard

use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Redirect, Response};
use strata_auth::GuardOutcome;

use crate::config::SessionConfig;

/// Builds `path?message=<urlencoded>`.
pub fn redirect_location(path: &str, message: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("message", message)
        .finish();
    format!("{path}?{query}")
}

/// Responds to a guard outcome, rendering `Allowed` with `on_allowed`.
pub fn respond<T>(
    outcome: GuardOutcome<T>,
    session: &SessionConfig,
    on_allowed: impl FnOnce(T) -> Response,
) -> Response {
    let message = outcome.message().unwrap_or_default();
    match outcome {
        GuardOutcome::Allowed(value) => on_allowed(value),
        GuardOutcome::Unauthenticated(reason) => {
            let mut response =
                Redirect::to(&redirect_location(&session.login_path, &message)).into_response();
            if reason.clears_session()
                && let Ok(cookie) = HeaderValue::from_str(&format!(
                    "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
                    session.session_cookie
                ))
            {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            response
        }
        GuardOutcome::Denied(_) | GuardOutcome::NotFound { .. } => {
            Redirect::to(&redirect_location(&session.dashboard_path, &message)).into_response()
        }
    }
}
