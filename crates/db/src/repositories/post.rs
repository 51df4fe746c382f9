//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, follow, post};
use quire_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::Query,
};

/// Which posts a feed draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    /// Every post.
    All,
    /// Posts filed under a group.
    Group(String),
    /// Posts written by one author.
    Author(String),
    /// Posts by every author the given user follows.
    FollowedBy(String),
}

impl PostFilter {
    fn condition(&self) -> Condition {
        match self {
            Self::All => Condition::all(),
            Self::Group(group_id) => Condition::all().add(post::Column::GroupId.eq(group_id.as_str())),
            Self::Author(author_id) => {
                Condition::all().add(post::Column::AuthorId.eq(author_id.as_str()))
            }
            Self::FollowedBy(user_id) => Condition::all().add(
                post::Column::AuthorId.in_subquery(
                    Query::select()
                        .column(follow::Column::AuthorId)
                        .from(follow::Entity)
                        .and_where(follow::Column::UserId.eq(user_id.as_str()))
                        .to_owned(),
                ),
            ),
        }
    }
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post only if it was written by the given author.
    pub async fn find_by_author_and_id(
        &self,
        author_id: &str,
        id: &str,
    ) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .filter(post::Column::AuthorId.eq(author_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count the posts matching a filter.
    pub async fn count(&self, filter: &PostFilter) -> AppResult<u64> {
        Post::find()
            .filter(filter.condition())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch one window of posts, newest first.
    ///
    /// Ties on `pub_date` are broken by ID so that adjacent pages never
    /// overlap.
    pub async fn find_page(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(filter.condition())
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts written by a user.
    pub async fn count_by_author(&self, author_id: &str) -> AppResult<u64> {
        self.count(&PostFilter::Author(author_id.to_string())).await
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait, Value};

    fn create_test_post(id: &str, author_id: &str, group_id: Option<&str>) -> post::Model {
        post::Model {
            id: id.to_string(),
            text: format!("text of {id}"),
            pub_date: Utc::now().into(),
            author_id: author_id.to_string(),
            group_id: group_id.map(ToString::to_string),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_author_and_id_found() {
        let post = create_test_post("p1", "user1", None);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post.clone()]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.find_by_author_and_id("user1", "p1").await.unwrap();

        assert_eq!(result, Some(post));
    }

    #[tokio::test]
    async fn test_find_by_author_and_id_other_author() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.find_by_author_and_id("someone-else", "p1").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_count_all() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "num_items" => Value::BigInt(Some(13)),
                }]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert_eq!(repo.count(&PostFilter::All).await.unwrap(), 13);
    }

    #[tokio::test]
    async fn test_find_page_returns_window() {
        let posts = vec![
            create_test_post("p3", "user1", Some("g1")),
            create_test_post("p2", "user2", Some("g1")),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([posts])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo
            .find_page(&PostFilter::Group("g1".to_string()), 10, 10)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "p3");
    }

    #[test]
    fn test_followed_by_filter_uses_follow_subquery() {
        let sql = Post::find()
            .filter(PostFilter::FollowedBy("reader".to_string()).condition())
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""author_id" IN (SELECT "author_id" FROM "follow""#));
        assert!(sql.contains(r#""user_id" = 'reader'"#));
    }

    #[test]
    fn test_all_filter_has_no_where_clause() {
        let sql = Post::find()
            .filter(PostFilter::All.condition())
            .build(DatabaseBackend::Postgres)
            .to_string();

        assert!(!sql.contains("WHERE"));
    }
}
