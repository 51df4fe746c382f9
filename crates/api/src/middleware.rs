//! Application state and request middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::extract::CookieJar;
use quire_common::config::AuthConfig;
use quire_core::{
    CommentService, ContactService, FeedService, FollowingService, GroupService, PostService,
    UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub group_service: GroupService,
    pub feed_service: FeedService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub following_service: FollowingService,
    pub contact_service: ContactService,
    pub auth: Arc<AuthConfig>,
}

/// Authentication middleware.
///
/// Resolves the session token from an `Authorization: Bearer` header or the
/// session cookie and stores the user in the request extensions. Requests
/// with a missing or stale token continue anonymously.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(ToString::to_string);

    let token = bearer.or_else(|| {
        CookieJar::from_headers(req.headers())
            .get(&state.auth.cookie_name)
            .map(|cookie| cookie.value().to_string())
    });

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => {
                tracing::warn!(error = %e, "Failed to resolve session token");
            }
            Err(_) => {}
        }
    }

    next.run(req).await
}
