//! Access guards run at the start of handlers.
//!
//! A guard inspects the requester and yields an [`Access`]: either the
//! handler may proceed, or the request must be redirected. Anonymous users
//! are sent to the login page with a `next` parameter pointing back to the
//! original URL; authenticated users who may not act on a resource are sent
//! to its read view.

use axum::http::Uri;
use quire_db::entities::user;

use crate::response::ViewError;

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access<T> {
    /// The handler may continue with `T`.
    Allowed(T),
    /// Not logged in: redirect to this login URL.
    Redirect(String),
    /// Logged in but not permitted: redirect to this read view.
    Denied(String),
}

impl<T> Access<T> {
    /// Turn a refusal into a redirecting [`ViewError`] for use with `?`.
    pub fn into_result(self) -> Result<T, ViewError> {
        match self {
            Self::Allowed(value) => Ok(value),
            Self::Redirect(to) | Self::Denied(to) => Err(ViewError::Redirect(to)),
        }
    }
}

/// Require an authenticated requester.
#[must_use]
pub fn login_required(
    user: Option<user::Model>,
    uri: &Uri,
    login_url: &str,
) -> Access<user::Model> {
    match user {
        Some(user) => Access::Allowed(user),
        None => Access::Redirect(login_redirect(login_url, uri)),
    }
}

/// Require that `user` wrote the resource owned by `author_id`.
#[must_use]
pub fn author_only(user: user::Model, author_id: &str, read_url: String) -> Access<user::Model> {
    if user.id == author_id {
        Access::Allowed(user)
    } else {
        Access::Denied(read_url)
    }
}

/// Build `<login_url>?next=<path and query>`.
///
/// `next` is percent-encoded except for `/`, so `/new/` stays readable.
#[must_use]
pub fn login_redirect(login_url: &str, uri: &Uri) -> String {
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string);
    let next = urlencoding::encode(&target).replace("%2F", "/");
    format!("{login_url}?next={next}")
}

/// Where to send a user after login.
///
/// Only local absolute paths are honoured; anything else falls back to `/`.
#[must_use]
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

/// Path of a profile page.
#[must_use]
pub fn profile_url(username: &str) -> String {
    format!("/{}/", urlencoding::encode(username))
}

/// Path of a post's read view.
#[must_use]
pub fn post_url(username: &str, post_id: &str) -> String {
    format!(
        "/{}/{}/",
        urlencoding::encode(username),
        urlencoding::encode(post_id)
    )
}
