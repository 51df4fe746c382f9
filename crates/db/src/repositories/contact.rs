//! Contact repository.

use std::sync::Arc;

use quire_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection};

use crate::entities::contact;

/// Repository for contact messages.
#[derive(Clone)]
pub struct ContactRepository {
    db: Arc<DatabaseConnection>,
}

impl ContactRepository {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store a contact message.
    pub async fn create(&self, model: contact::ActiveModel) -> AppResult<contact::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
