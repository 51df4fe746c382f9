//! Group service.

use chrono::Utc;
use quire_common::{AppError, AppResult, config::GroupSeed, id::IdGenerator};
use quire_db::entities::group;
use quire_db::repositories::GroupRepository;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::{Validate, ValidationError};

/// Editorial input for a group.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GroupInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 40), custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(max = 5000))]
    pub description: String,
}

impl From<&GroupSeed> for GroupInput {
    fn from(seed: &GroupSeed) -> Self {
        Self {
            title: seed.title.clone(),
            slug: seed.slug.clone(),
            description: seed.description.clone(),
        }
    }
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("slug"))
    }
}

/// Service for group lookups and editorial seeding.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    id_gen: IdGenerator,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub fn new(group_repo: GroupRepository) -> Self {
        Self {
            group_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Groups a post can be filed under, by title.
    pub async fn list(&self) -> AppResult<Vec<group::Model>> {
        self.group_repo.list_all().await
    }

    /// Create or refresh a group keyed by slug.
    pub async fn upsert(&self, input: GroupInput) -> AppResult<group::Model> {
        input.validate()?;

        match self.group_repo.find_by_slug(&input.slug).await? {
            Some(existing) => {
                if existing.title == input.title && existing.description == input.description {
                    return Ok(existing);
                }
                let mut active: group::ActiveModel = existing.into();
                active.title = Set(input.title);
                active.description = Set(input.description);
                let updated = self.group_repo.update(active).await?;
                info!(group_id = %updated.id, slug = %updated.slug, "Group updated");
                Ok(updated)
            }
            None => {
                let created = self
                    .group_repo
                    .create(group::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        title: Set(input.title),
                        slug: Set(input.slug),
                        description: Set(input.description),
                        created_at: Set(Utc::now().into()),
                    })
                    .await?;
                info!(group_id = %created.id, slug = %created.slug, "Group created");
                Ok(created)
            }
        }
    }

    /// Upsert every configured group.
    pub async fn seed(&self, seeds: &[GroupSeed]) -> AppResult<Vec<group::Model>> {
        let mut groups = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let group = self.upsert(seed.into()).await.map_err(|e| match e {
                AppError::Validation(errors) => {
                    AppError::Config(format!("invalid group seed '{}': {errors}", seed.slug))
                }
                other => other,
            })?;
            groups.push(group);
        }
        Ok(groups)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_group(id: &str, slug: &str, title: &str) -> group::Model {
        group::Model {
            id: id.to_string(),
            title: title.to_string(),
            slug: slug.to_string(),
            description: String::new(),
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> GroupService {
        GroupService::new(GroupRepository::new(Arc::new(db.into_connection())))
    }

    fn seed(slug: &str, title: &str) -> GroupSeed {
        GroupSeed {
            slug: slug.to_string(),
            title: title.to_string(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_seed_creates_unknown_slug() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<group::Model>::new()])
                .append_query_results([[create_test_group("g1", "cats", "Cats")]]),
        );

        let groups = service.seed(&[seed("cats", "Cats")]).await.unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].slug, "cats");
    }

    #[tokio::test]
    async fn test_seed_unchanged_group_skips_update() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "cats", "Cats")]]),
        );

        let groups = service.seed(&[seed("cats", "Cats")]).await.unwrap();

        assert_eq!(groups[0].id, "g1");
    }

    #[tokio::test]
    async fn test_seed_refreshes_title() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group("g1", "cats", "Cats")]])
                .append_query_results([[create_test_group("g1", "cats", "All about cats")]]),
        );

        let groups = service.seed(&[seed("cats", "All about cats")]).await.unwrap();

        assert_eq!(groups[0].title, "All about cats");
    }

    #[tokio::test]
    async fn test_seed_rejects_bad_slug() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.seed(&[seed("not a slug", "Broken")]).await;

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
