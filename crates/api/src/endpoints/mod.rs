//! Page endpoints.

mod auth;
mod contact;
mod feed;
mod posts;
mod profile;

use axum::{
    Json, Router,
    http::Uri,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use quire_common::AppError;

use crate::middleware::AppState;
use crate::views::{NotFoundError, NotFoundPage};

/// Create the page router.
///
/// Fixed first segments (`new`, `follow`, `group`, `auth`, `contact`,
/// `thank-you`) win over the `{username}` routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed::index))
        .route("/group/{slug}/", get(feed::group_posts))
        .route("/new/", get(posts::new_form).post(posts::create))
        .route("/follow/", get(feed::follow_index))
        .route("/auth/signup/", get(auth::signup_form).post(auth::signup))
        .route("/auth/login/", get(auth::login_form).post(auth::login))
        .route("/auth/logout/", post(auth::logout))
        .route("/contact/", get(contact::contact_form).post(contact::submit))
        .route("/thank-you/", get(contact::thank_you))
        .route("/{username}/", get(profile::profile))
        .route("/{username}/follow/", post(profile::follow))
        .route("/{username}/unfollow/", post(profile::unfollow))
        .route("/{username}/{post_id}/", get(posts::show))
        .route(
            "/{username}/{post_id}/edit/",
            get(posts::edit_form).post(posts::edit),
        )
        .route("/{username}/{post_id}/comment/", post(posts::add_comment))
        .fallback(not_found)
}

/// 404 page naming the path that matched nothing.
async fn not_found(uri: Uri) -> Response {
    let path = uri.path().to_string();
    let err = AppError::NotFound(path.clone());
    tracing::debug!(error = %err, "No route matched");
    (
        err.status_code(),
        Json(NotFoundPage {
            error: NotFoundError {
                code: err.error_code(),
                message: err.to_string(),
            },
            path,
        }),
    )
        .into_response()
}
