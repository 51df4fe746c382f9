//! Following service.

use quire_common::{AppResult, IdGenerator};
use quire_db::{entities::follow, entities::user, repositories::FollowRepository};
use sea_orm::Set;
use serde::Serialize;
use tracing::info;

/// Follower and following totals for a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowCounts {
    pub followers_count: u64,
    pub following_count: u64,
}

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    follow_repo: FollowRepository,
    id_gen: IdGenerator,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub fn new(follow_repo: FollowRepository) -> Self {
        Self {
            follow_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Make `user` follow `author`.
    ///
    /// Following yourself or an author you already follow is a no-op.
    /// Returns whether a new edge was created.
    pub async fn follow(&self, user: &user::Model, author: &user::Model) -> AppResult<bool> {
        if user.id == author.id {
            return Ok(false);
        }

        if self.follow_repo.is_following(&user.id, &author.id).await? {
            return Ok(false);
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            author_id: Set(author.id.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = self.follow_repo.create_if_absent(model).await?.is_some();
        if created {
            info!(user_id = %user.id, author_id = %author.id, "Followed author");
        }
        Ok(created)
    }

    /// Remove the edge from `user` to `author` if there is one.
    ///
    /// Returns whether an edge was removed.
    pub async fn unfollow(&self, user: &user::Model, author: &user::Model) -> AppResult<bool> {
        if user.id == author.id {
            return Ok(false);
        }

        let removed = self.follow_repo.delete_by_pair(&user.id, &author.id).await? > 0;
        if removed {
            info!(user_id = %user.id, author_id = %author.id, "Unfollowed author");
        }
        Ok(removed)
    }

    /// Whether `user` follows `author`. Always `false` for an anonymous user.
    pub async fn is_following(
        &self,
        user: Option<&user::Model>,
        author: &user::Model,
    ) -> AppResult<bool> {
        match user {
            None => Ok(false),
            Some(user) => self.follow_repo.is_following(&user.id, &author.id).await,
        }
    }

    /// Number of users following `author`.
    pub async fn followers_count(&self, author: &user::Model) -> AppResult<u64> {
        self.follow_repo.count_followers(&author.id).await
    }

    /// Number of authors `user` follows.
    pub async fn following_count(&self, user: &user::Model) -> AppResult<u64> {
        self.follow_repo.count_following(&user.id).await
    }

    /// Both counts for a profile.
    pub async fn counts(&self, user: &user::Model) -> AppResult<FollowCounts> {
        Ok(FollowCounts {
            followers_count: self.followers_count(user).await?,
            following_count: self.following_count(user).await?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::sync::Arc;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: id.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_follow(user_id: &str, author_id: &str) -> follow::Model {
        follow::Model {
            id: "f1".to_string(),
            user_id: user_id.to_string(),
            author_id: author_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> FollowingService {
        FollowingService::new(FollowRepository::new(Arc::new(db.into_connection())))
    }

    #[tokio::test]
    async fn test_follow_creates_edge() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<follow::Model>::new()])
                .append_query_results([[create_test_follow("reader", "writer")]]),
        );

        let created = service
            .follow(&create_test_user("reader"), &create_test_user("writer"))
            .await
            .unwrap();

        assert!(created);
    }

    #[tokio::test]
    async fn test_follow_twice_is_noop() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_follow("reader", "writer")]]),
        );

        let created = service
            .follow(&create_test_user("reader"), &create_test_user("writer"))
            .await
            .unwrap();

        assert!(!created);
    }

    #[tokio::test]
    async fn test_follow_self_touches_nothing() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));
        let me = create_test_user("me");

        assert!(!service.follow(&me, &me).await.unwrap());
        assert!(!service.unfollow(&me, &me).await.unwrap());
    }

    #[tokio::test]
    async fn test_unfollow_without_edge_is_noop() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }]),
        );

        let removed = service
            .unfollow(&create_test_user("reader"), &create_test_user("writer"))
            .await
            .unwrap();

        assert!(!removed);
    }

    #[tokio::test]
    async fn test_follow_then_unfollow() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_follow("reader", "writer")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([Vec::<follow::Model>::new()]),
        );
        let reader = create_test_user("reader");
        let writer = create_test_user("writer");

        assert!(service.is_following(Some(&reader), &writer).await.unwrap());
        assert!(service.unfollow(&reader, &writer).await.unwrap());
        assert!(!service.is_following(Some(&reader), &writer).await.unwrap());
    }

    #[tokio::test]
    async fn test_anonymous_is_never_following() {
        // The mock would answer "following" if it were ever asked.
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_follow("reader", "writer")]]),
        );

        assert!(
            !service
                .is_following(None, &create_test_user("writer"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_counts() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    [btreemap! { "num_items" => Value::BigInt(Some(7)) }],
                    [btreemap! { "num_items" => Value::BigInt(Some(3)) }],
                ]),
        );

        let counts = service.counts(&create_test_user("writer")).await.unwrap();

        assert_eq!(
            counts,
            FollowCounts {
                followers_count: 7,
                following_count: 3,
            }
        );
    }
}
