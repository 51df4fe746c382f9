//! Post authoring.

use std::sync::Arc;

use quire_common::{AppError, AppResult, IdGenerator, StorageBackend};
use quire_db::{
    entities::{post, user},
    repositories::{GroupRepository, PostRepository, UserRepository},
};
use sea_orm::{ActiveValue::NotSet, Set};
use serde::Serialize;
use tracing::{info, warn};
use validator::{ValidationError, ValidationErrors};

use crate::services::media::{ValidImage, validate_image};

/// Raw bytes of a multipart `image` field.
///
/// The client's file name and content type are not trusted; the format is
/// sniffed from the data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageUpload {
    pub data: Vec<u8>,
}

/// Submitted post form, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostForm {
    pub text: String,
    /// Group ID; `None` or empty means no group
    pub group: Option<String>,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

/// A post form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<String>,
    pub image: Option<ValidImage>,
}

fn field_error(code: &'static str, message: impl Into<String>) -> ValidationError {
    let message: String = message.into();
    ValidationError::new(code).with_message(message.into())
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
    max_image_bytes: usize,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        storage: Arc<dyn StorageBackend>,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            storage,
            id_gen: IdGenerator::new(),
            max_image_bytes,
        }
    }

    /// Validate a submitted form.
    ///
    /// Every field is checked so the form can be redisplayed with all of its
    /// problems at once. Nothing is written here; the image is only decoded.
    pub async fn clean(&self, form: PostForm) -> AppResult<CleanPost> {
        let mut errors = ValidationErrors::new();

        if form.text.trim().is_empty() {
            errors.add("text", field_error("required", "This field is required."));
        }

        let group_id = match form.group.filter(|g| !g.trim().is_empty()) {
            Some(id) => {
                if self.group_repo.find_by_id(&id).await?.is_none() {
                    errors.add(
                        "group",
                        field_error(
                            "invalid_choice",
                            "Select a valid choice. That choice is not one of the available choices.",
                        ),
                    );
                }
                Some(id)
            }
            None => None,
        };

        let image = match form.image.filter(|upload| !upload.data.is_empty()) {
            Some(upload) => match validate_image(upload.data, self.max_image_bytes) {
                Ok(image) => Some(image),
                Err(message) => {
                    errors.add("image", field_error("invalid_image", message));
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(CleanPost {
            text: form.text,
            group_id,
            image,
        })
    }

    /// Find the post `post_id` written by `username`.
    ///
    /// A post that exists under a different author is reported as missing.
    pub async fn get_by_author(
        &self,
        username: &str,
        post_id: &str,
    ) -> AppResult<(user::Model, post::Model)> {
        let author = self.user_repo.get_by_username(username).await?;
        let post = self
            .post_repo
            .find_by_author_and_id(&author.id, post_id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))?;
        Ok((author, post))
    }

    /// Number of posts written by `author`.
    pub async fn count_by_author(&self, author: &user::Model) -> AppResult<u64> {
        self.post_repo.count_by_author(&author.id).await
    }

    /// Public URL of a stored image.
    #[must_use]
    pub fn image_url(&self, key: &str) -> String {
        self.storage.public_url(key)
    }

    /// Publish a new post by `author`.
    pub async fn create(&self, author: &user::Model, clean: CleanPost) -> AppResult<post::Model> {
        let id = self.id_gen.generate();
        let image_key = match &clean.image {
            Some(image) => Some(self.store_image(&id, image).await?),
            None => None,
        };

        let model = post::ActiveModel {
            id: Set(id),
            text: Set(clean.text),
            pub_date: NotSet,
            author_id: Set(author.id.clone()),
            group_id: Set(clean.group_id),
            image: Set(image_key.clone()),
        };

        match self.post_repo.create(model).await {
            Ok(post) => {
                info!(post_id = %post.id, user_id = %author.id, "Post created");
                Ok(post)
            }
            Err(e) => {
                if let Some(key) = image_key {
                    self.discard_image(&key).await;
                }
                Err(e)
            }
        }
    }

    /// Apply an edit by `requester` to `post`.
    ///
    /// Only the author may edit. Text and group are replaced; the image is
    /// replaced only when a new one was uploaded. `pub_date` never changes.
    pub async fn edit(
        &self,
        requester: &user::Model,
        post: post::Model,
        clean: CleanPost,
    ) -> AppResult<post::Model> {
        if requester.id != post.author_id {
            return Err(AppError::Forbidden(format!(
                "post {} belongs to another author",
                post.id
            )));
        }

        let new_image = match &clean.image {
            Some(image) => Some(self.store_image(&self.id_gen.generate(), image).await?),
            None => None,
        };

        let post_id = post.id.clone();
        let mut active: post::ActiveModel = post.into();
        active.text = Set(clean.text);
        active.group_id = Set(clean.group_id);
        if let Some(key) = &new_image {
            active.image = Set(Some(key.clone()));
        }

        match self.post_repo.update(active).await {
            Ok(updated) => {
                info!(post_id = %post_id, user_id = %requester.id, "Post edited");
                Ok(updated)
            }
            Err(e) => {
                if let Some(key) = new_image {
                    self.discard_image(&key).await;
                }
                Err(e)
            }
        }
    }

    async fn store_image(&self, name: &str, image: &ValidImage) -> AppResult<String> {
        let key = format!("posts/{name}.{}", image.format.extension());
        let stored = self
            .storage
            .upload(&key, &image.data, image.format.mime_type())
            .await?;
        Ok(stored.key)
    }

    async fn discard_image(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            warn!(key = %key, error = %e, "Failed to remove orphaned image");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::media::tests::TINY_GIF;
    use chrono::Utc;
    use quire_common::StoredFile;
    use quire_db::entities::group;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStorage {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MemoryStorage {
        fn keys(&self) -> Vec<String> {
            self.files.lock().unwrap().keys().cloned().collect()
        }
    }

    #[async_trait::async_trait]
    impl StorageBackend for MemoryStorage {
        async fn upload(
            &self,
            key: &str,
            data: &[u8],
            content_type: &str,
        ) -> AppResult<StoredFile> {
            self.files
                .lock()
                .unwrap()
                .insert(key.to_string(), data.to_vec());
            Ok(StoredFile {
                key: key.to_string(),
                url: self.public_url(key),
                size: data.len() as u64,
                content_type: content_type.to_string(),
            })
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.files.lock().unwrap().remove(key);
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("/media/{key}")
        }

        async fn exists(&self, key: &str) -> AppResult<bool> {
            Ok(self.files.lock().unwrap().contains_key(key))
        }
    }

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

    fn create_test_post(id: &str, author_id: &str, image: Option<&str>) -> post::Model {
        post::Model {
            id: id.to_string(),
            text: "original".to_string(),
            pub_date: Utc::now().into(),
            author_id: author_id.to_string(),
            group_id: None,
            image: image.map(ToString::to_string),
        }
    }

    fn service(db: MockDatabase, storage: Arc<MemoryStorage>) -> PostService {
        let conn = Arc::new(db.into_connection());
        PostService::new(
            PostRepository::new(conn.clone()),
            UserRepository::new(conn.clone()),
            GroupRepository::new(conn),
            storage,
            1024,
        )
    }

    fn clean_text(text: &str) -> CleanPost {
        CleanPost {
            text: text.to_string(),
            group_id: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_clean_collects_every_error() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<group::Model>::new()]),
            Arc::default(),
        );

        let result = service
            .clean(PostForm {
                text: "  ".to_string(),
                group: Some("nope".to_string()),
                image: Some(ImageUpload {
                    data: b"not an image, just some text".to_vec(),
                }),
            })
            .await;
        let Err(AppError::Validation(errors)) = result else {
            panic!("Expected Validation error");
        };

        let fields = errors.field_errors();
        assert!(fields.contains_key("text"));
        assert!(fields.contains_key("group"));
        assert!(fields.contains_key("image"));
    }

    #[tokio::test]
    async fn test_clean_ignores_empty_group_and_image() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres), Arc::default());

        let clean = service
            .clean(PostForm {
                text: "hello".to_string(),
                group: Some(String::new()),
                image: Some(ImageUpload::default()),
            })
            .await
            .unwrap();

        assert_eq!(clean, clean_text("hello"));
    }

    #[tokio::test]
    async fn test_create_sets_author() {
        let author = create_test_user("writer");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "writer", None)]]),
            Arc::default(),
        );

        let post = service.create(&author, clean_text("hello")).await.unwrap();

        assert_eq!(post.author_id, "writer");
    }

    #[tokio::test]
    async fn test_create_stores_image_under_posts() {
        let storage = Arc::new(MemoryStorage::default());
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "writer", Some("posts/x.gif"))]]),
            storage.clone(),
        );

        let clean = service
            .clean(PostForm {
                text: "with picture".to_string(),
                group: None,
                image: Some(ImageUpload {
                    data: TINY_GIF.to_vec(),
                }),
            })
            .await
            .unwrap();
        service
            .create(&create_test_user("writer"), clean)
            .await
            .unwrap();

        let keys = storage.keys();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with("posts/"));
        assert!(keys[0].ends_with(".gif"));
    }

    #[tokio::test]
    async fn test_create_failure_removes_stored_image() {
        let storage = Arc::new(MemoryStorage::default());
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([sea_orm::DbErr::Custom("boom".to_string())]),
            storage.clone(),
        );

        let clean = CleanPost {
            text: "with picture".to_string(),
            group_id: None,
            image: Some(validate_image(TINY_GIF.to_vec(), 1024).unwrap()),
        };
        let result = service.create(&create_test_user("writer"), clean).await;

        assert!(result.is_err());
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_edit_by_other_user_is_forbidden() {
        // No query results: any write would fail the test with a mock error.
        let service = service(MockDatabase::new(DatabaseBackend::Postgres), Arc::default());

        let result = service
            .edit(
                &create_test_user("intruder"),
                create_test_post("p1", "writer", None),
                clean_text("defaced"),
            )
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_edit_keeps_image_and_pub_date() {
        let original = create_test_post("p1", "writer", Some("posts/old.gif"));
        let mut updated = original.clone();
        updated.text = "edited".to_string();

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[updated]]),
            Arc::default(),
        );

        let post = service
            .edit(&create_test_user("writer"), original.clone(), clean_text("edited"))
            .await
            .unwrap();

        assert_eq!(post.text, "edited");
        assert_eq!(post.image.as_deref(), Some("posts/old.gif"));
        assert_eq!(post.pub_date, original.pub_date);
    }

    #[tokio::test]
    async fn test_get_by_author_rejects_other_authors_post() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("writer")]])
                .append_query_results([Vec::<post::Model>::new()]),
            Arc::default(),
        );

        let result = service.get_by_author("writer", "someone-elses").await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }
}
