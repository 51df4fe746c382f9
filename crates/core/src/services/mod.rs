//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod contact;
pub mod feed;
pub mod following;
pub mod group;
pub mod media;
pub mod pagination;
pub mod post;
pub mod user;

pub use comment::{CommentForm, CommentService, CommentView};
pub use contact::{ContactForm, ContactService};
pub use feed::{AuthorSummary, FeedItem, FeedService, GroupSummary};
pub use following::{FollowCounts, FollowingService};
pub use group::{GroupInput, GroupService};
pub use media::{ImageFormat, ValidImage, validate_image};
pub use pagination::{PAGE_SIZE, Page, Paginator};
pub use post::{CleanPost, ImageUpload, PostForm, PostService};
pub use user::{LoginForm, SignupForm, UserService};

use validator::ValidationError;

/// Reject empty or whitespace-only text.
pub(crate) fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        Err(ValidationError::new("required").with_message("This field is required.".into()))
    } else {
        Ok(())
    }
}
