//! HTTP layer for quire.
//!
//! Every page is a JSON view model served by axum:
//!
//! - **Endpoints**: feeds, profiles, posts, comments, follows and accounts
//! - **Guards**: login and author checks that redirect instead of failing
//! - **Middleware**: session token resolution
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod guard;
pub mod middleware;
pub mod response;
pub mod views;

use axum::{Router, extract::DefaultBodyLimit, middleware::from_fn_with_state};
use tower_http::trace::TraceLayer;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};

/// Headroom over the image limit for the other multipart fields.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the application with session resolution and request tracing.
pub fn app(state: AppState, max_image_bytes: usize) -> Router {
    router()
        .layer(DefaultBodyLimit::max(max_image_bytes + FORM_OVERHEAD_BYTES))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
