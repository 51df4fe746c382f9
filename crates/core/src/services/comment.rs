//! Comment service.

use std::collections::HashMap;

use quire_common::{AppError, AppResult, IdGenerator};
use quire_db::{
    entities::{comment, post, user},
    repositories::{CommentRepository, UserRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::services::feed::AuthorSummary;
use crate::services::validate_not_blank;

/// Comment form.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub text: String,
}

/// A comment with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub id: String,
    pub text: String,
    pub created: chrono::DateTime<chrono::FixedOffset>,
    pub author: AuthorSummary,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(comment_repo: CommentRepository, user_repo: UserRepository) -> Self {
        Self {
            comment_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Attach a comment by `author` to `post`.
    ///
    /// Blank text is a `Validation` error and nothing is written.
    pub async fn add(
        &self,
        post: &post::Model,
        author: &user::Model,
        form: CommentForm,
    ) -> AppResult<comment::Model> {
        form.validate()?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(Some(post.id.clone())),
            author_id: Set(author.id.clone()),
            text: Set(form.text),
            created: Set(chrono::Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        info!(comment_id = %comment.id, post_id = %post.id, user_id = %author.id, "Comment added");

        Ok(comment)
    }

    /// Comments on `post` in the order they were written.
    pub async fn comments_for(&self, post: &post::Model) -> AppResult<Vec<CommentView>> {
        let comments = self.comment_repo.find_by_post(&post.id).await?;

        let mut author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        comments
            .into_iter()
            .map(|c| {
                let author = authors.get(&c.author_id).ok_or_else(|| {
                    AppError::Internal(format!("author of comment {} is missing", c.id))
                })?;
                Ok(CommentView {
                    id: c.id,
                    text: c.text,
                    created: c.created,
                    author: author.into(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
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

    fn create_test_post() -> post::Model {
        post::Model {
            id: "p1".to_string(),
            text: "hello".to_string(),
            pub_date: Utc::now().into(),
            author_id: "writer".to_string(),
            group_id: None,
            image: None,
        }
    }

    fn create_test_comment(id: &str, author_id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            post_id: Some("p1".to_string()),
            author_id: author_id.to_string(),
            text: format!("comment {id}"),
            created: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> CommentService {
        let conn = Arc::new(db.into_connection());
        CommentService::new(
            CommentRepository::new(conn.clone()),
            UserRepository::new(conn),
        )
    }

    #[tokio::test]
    async fn test_add_comment() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_comment("c1", "reader")]]),
        );

        let comment = service
            .add(
                &create_test_post(),
                &create_test_user("reader"),
                CommentForm {
                    text: "nice".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(comment.post_id.as_deref(), Some("p1"));
    }

    #[tokio::test]
    async fn test_blank_comment_is_rejected_without_write() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .add(
                &create_test_post(),
                &create_test_user("reader"),
                CommentForm {
                    text: "   \n".to_string(),
                },
            )
            .await;
        let Err(AppError::Validation(errors)) = result else {
            panic!("Expected Validation error");
        };

        assert!(errors.field_errors().contains_key("text"));
    }

    #[tokio::test]
    async fn test_comments_for_keeps_order_and_authors() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_comment("c1", "reader"),
                    create_test_comment("c2", "writer"),
                    create_test_comment("c3", "reader"),
                ]])
                .append_query_results([[create_test_user("reader"), create_test_user("writer")]]),
        );

        let comments = service.comments_for(&create_test_post()).await.unwrap();

        assert_eq!(
            comments
                .iter()
                .map(|c| (c.id.as_str(), c.author.username.as_str()))
                .collect::<Vec<_>>(),
            vec![("c1", "reader"), ("c2", "writer"), ("c3", "reader")]
        );
    }
}
