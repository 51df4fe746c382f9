//! Contact page.

use axum::{Form, Json, extract::State, response::Response};
use quire_common::AppError;
use quire_core::ContactForm;

use crate::{
    middleware::AppState,
    response::{ViewResult, invalid_form, see_other},
    views::{ContactPage, ThankYouPage},
};

const THANK_YOU_URL: &str = "/thank-you/";

/// Empty contact form.
pub async fn contact_form() -> Json<ContactPage> {
    Json(ContactPage {
        form: ContactForm::default(),
        errors: None,
    })
}

/// Store the message and send the visitor to the thank-you page.
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<ContactForm>,
) -> ViewResult<Response> {
    let submitted = form.clone();

    match state.contact_service.submit(form).await {
        Ok(_) => Ok(see_other(THANK_YOU_URL)),
        Err(AppError::Validation(errors)) => Ok(invalid_form(ContactPage {
            form: submitted,
            errors: Some(errors),
        })),
        Err(e) => Err(e.into()),
    }
}

pub async fn thank_you() -> Json<ThankYouPage> {
    Json(ThankYouPage {
        message: "Thank you for your message.",
    })
}
