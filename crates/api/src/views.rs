//! JSON view models returned by the page handlers.

#![allow(missing_docs)]

use chrono::{DateTime, FixedOffset};
use quire_core::{
    AuthorSummary, CommentForm, CommentView, ContactForm, FeedItem, GroupSummary, Page,
    PostForm, PostService,
};
use quire_db::entities::group;
use serde::Serialize;
use validator::ValidationErrors;

use crate::guard::post_url;

/// A post as shown in a listing or on its own page.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: String,
    pub text: String,
    pub pub_date: DateTime<FixedOffset>,
    pub author: AuthorSummary,
    pub group: Option<GroupSummary>,
    pub image_url: Option<String>,
    pub url: String,
}

impl PostView {
    pub fn new(item: FeedItem, posts: &PostService) -> Self {
        let url = post_url(&item.author.username, &item.post.id);
        Self {
            image_url: item.post.image.as_deref().map(|key| posts.image_url(key)),
            id: item.post.id,
            text: item.post.text,
            pub_date: item.post.pub_date,
            author: item.author,
            group: item.group,
            url,
        }
    }
}

/// Convert a page of feed items.
pub fn post_page(page: Page<FeedItem>, posts: &PostService) -> Page<PostView> {
    page.map(|item| PostView::new(item, posts))
}

#[derive(Debug, Serialize)]
pub struct FeedPage {
    pub page: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct GroupPage {
    pub group: GroupView,
    pub page: Page<PostView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<group::Model> for GroupView {
    fn from(group: group::Model) -> Self {
        Self {
            id: group.id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub author: AuthorSummary,
    pub count: u64,
    pub page: Page<PostView>,
    pub following: bool,
    pub followers_count: u64,
    pub following_count: u64,
}

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub post: PostView,
    pub author: AuthorSummary,
    pub count: u64,
    pub comments: Vec<CommentView>,
    pub form: CommentForm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
    pub followers_count: u64,
    pub following_count: u64,
}

/// Context of the new/edit post form.
#[derive(Debug, Serialize)]
pub struct PostFormPage {
    pub form: PostForm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
    pub groups: Vec<GroupView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostView>,
    pub is_edit: bool,
}

/// Context of an account form (sign-up or login).
#[derive(Debug, Serialize)]
pub struct AccountFormPage<F: Serialize> {
    pub form: F,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactPage {
    pub form: ContactForm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

#[derive(Debug, Serialize)]
pub struct ThankYouPage {
    pub message: &'static str,
}

/// Body of the custom 404 page.
#[derive(Debug, Serialize)]
pub struct NotFoundPage {
    pub error: NotFoundError,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct NotFoundError {
    pub code: &'static str,
    pub message: String,
}
