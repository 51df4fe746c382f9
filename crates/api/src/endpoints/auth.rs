//! Account pages: sign-up, login and logout.

use axum::{
    Form, Json,
    extract::{OriginalUri, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use quire_common::AppError;
use quire_core::{LoginForm, SignupForm};
use validator::{ValidationError, ValidationErrors};

use crate::{
    extractors::{MaybeAuthUser, NextQuery},
    guard::{login_required, safe_next},
    middleware::AppState,
    response::{ViewResult, invalid_form, see_other},
    views::AccountFormPage,
};

/// Empty sign-up form.
pub async fn signup_form() -> Json<AccountFormPage<SignupForm>> {
    Json(AccountFormPage {
        form: SignupForm::default(),
        errors: None,
        next: None,
    })
}

/// Create an account, then send the new user to the login page.
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> ViewResult<Response> {
    let submitted = form.clone();

    match state.user_service.signup(form).await {
        Ok(_) => Ok(see_other(&state.auth.login_url)),
        Err(AppError::Validation(errors)) => Ok(invalid_form(AccountFormPage {
            form: submitted,
            errors: Some(errors),
            next: None,
        })),
        Err(e) => Err(e.into()),
    }
}

/// Empty login form, remembering where to go afterwards.
pub async fn login_form(Query(query): Query<NextQuery>) -> Json<AccountFormPage<LoginForm>> {
    Json(AccountFormPage {
        form: LoginForm::default(),
        errors: None,
        next: query.next,
    })
}

/// Exchange credentials for a session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> ViewResult<Response> {
    let token = match state.user_service.login(&form).await {
        Ok(token) => token,
        Err(AppError::Unauthorized) => {
            let mut errors = ValidationErrors::new();
            errors.add(
                "__all__",
                ValidationError::new("invalid_login").with_message(
                    "Please enter a correct username and password. Note that both fields may be case-sensitive."
                        .into(),
                ),
            );
            return Ok(invalid_form(AccountFormPage {
                form,
                errors: Some(errors),
                next: query.next,
            }));
        }
        Err(e) => return Err(e.into()),
    };

    let cookie = Cookie::build((state.auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    let next = safe_next(query.next.as_deref());

    Ok((jar.add(cookie), Redirect::to(&next)).into_response())
}

/// End the session everywhere by rotating the token.
pub async fn logout(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    OriginalUri(uri): OriginalUri,
    jar: CookieJar,
) -> ViewResult<Response> {
    let user = login_required(user, &uri, &state.auth.login_url).into_result()?;

    state.user_service.regenerate_token(&user.id).await?;
    tracing::info!(user_id = %user.id, "User logged out");

    let removal = Cookie::build(state.auth.cookie_name.clone()).path("/").build();
    Ok((jar.remove(removal), Redirect::to("/")).into_response())
}
