//! Response helpers shared by the page handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use quire_common::AppError;
use serde::Serialize;

/// Why a handler did not render its page.
#[derive(Debug)]
pub enum ViewError {
    /// A domain error rendered as a JSON error page.
    App(AppError),
    /// A `303 See Other` to another page.
    Redirect(String),
}

impl From<AppError> for ViewError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        match self {
            Self::App(err) => err.into_response(),
            Self::Redirect(to) => Redirect::to(&to).into_response(),
        }
    }
}

/// Result type for page handlers.
pub type ViewResult<T = Response> = Result<T, ViewError>;

/// A form page redisplayed with field errors.
pub fn invalid_form<T: Serialize>(context: T) -> Response {
    (StatusCode::BAD_REQUEST, Json(context)).into_response()
}

/// Redirect after a successful POST.
#[must_use]
pub fn see_other(to: &str) -> Response {
    Redirect::to(to).into_response()
}
