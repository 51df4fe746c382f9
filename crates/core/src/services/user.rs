//! User service: accounts and sessions.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use quire_common::{AppError, AppResult, IdGenerator};
use quire_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

/// Sign-up form.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 150),
        custom(function = "validate_username_chars")
    )]
    pub username: String,

    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email: String,

    #[serde(default, skip_serializing)]
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

/// First path segments taken by fixed routes; a profile under one of these
/// names would be unreachable.
const RESERVED_USERNAMES: &[&str] = &[
    "auth",
    "contact",
    "follow",
    "group",
    "media",
    "new",
    "thank-you",
];

fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || email.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email").with_message("Enter a valid email address.".into()))
    }
}

fn validate_username_chars(username: &str) -> Result<(), ValidationError> {
    if RESERVED_USERNAMES.contains(&username) {
        return Err(ValidationError::new("reserved")
            .with_message("This username is not available.".into()));
    }

    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("username").with_message(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        ))
    }
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account.
    ///
    /// Field problems, including a taken username, are a `Validation`
    /// error carrying every field message.
    pub async fn signup(&self, form: SignupForm) -> AppResult<user::Model> {
        form.validate()?;

        if self.user_repo.find_by_username(&form.username).await?.is_some() {
            let mut errors = ValidationErrors::new();
            errors.add(
                "username",
                ValidationError::new("unique")
                    .with_message("A user with that username already exists.".into()),
            );
            return Err(AppError::Validation(errors));
        }

        let password_hash = hash_password(&form.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(form.username),
            first_name: Set(form.first_name.trim().to_string()),
            last_name: Set(form.last_name.trim().to_string()),
            email: Set(form.email.trim().to_string()),
            password_hash: Set(password_hash),
            token: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        info!(user_id = %user.id, username = %user.username, "User signed up");

        Ok(user)
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_username(username).await
    }

    /// Authenticate a user by session token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Authenticate a user by username and password.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Check credentials and open a session, returning the new token.
    pub async fn login(&self, form: &LoginForm) -> AppResult<String> {
        let user = self.authenticate(&form.username, &form.password).await?;
        let token = self.regenerate_token(&user.id).await?;
        info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    /// Regenerate a user's authentication token.
    ///
    /// Any cookie holding the previous token stops working.
    pub async fn regenerate_token(&self, user_id: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let new_token = self.id_gen.generate_token();

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(new_token.clone()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await?;

        Ok(new_token)
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
