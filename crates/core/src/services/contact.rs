//! Contact service: messages from site visitors.

use quire_common::{AppResult, IdGenerator};
use quire_db::{entities::contact, repositories::ContactRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::services::validate_not_blank;

/// Contact form. Every field is required.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct ContactForm {
    #[serde(default)]
    #[validate(
        length(max = 100),
        custom(function = "validate_not_blank")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[serde(default)]
    #[validate(
        length(max = 200),
        custom(function = "validate_not_blank")
    )]
    pub subject: String,

    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub body: String,
}

#[derive(Clone)]
pub struct ContactService {
    contact_repo: ContactRepository,
    id_gen: IdGenerator,
}

impl ContactService {
    #[must_use]
    pub fn new(contact_repo: ContactRepository) -> Self {
        Self {
            contact_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Store a contact message; an invalid form is a `Validation` error.
    pub async fn submit(&self, form: ContactForm) -> AppResult<contact::Model> {
        form.validate()?;

        let model = contact::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(form.name.trim().to_string()),
            email: Set(form.email.trim().to_string()),
            subject: Set(form.subject.trim().to_string()),
            body: Set(form.body),
            created_at: Set(chrono::Utc::now().into()),
        };

        let message = self.contact_repo.create(model).await?;
        info!(contact_id = %message.id, "Contact message received");

        Ok(message)
    }
}
