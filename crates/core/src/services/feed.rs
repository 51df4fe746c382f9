//! Feed composition.
//!
//! Every listing in the application (the front page, group pages, profiles
//! and the follow feed) is a [`PostFilter`] run through the same pipeline:
//! count, clamp the requested page, fetch one window newest-first, then load
//! the authors and groups of that window in two batched queries.

use std::collections::HashMap;

use quire_common::{AppError, AppResult};
use quire_db::{
    entities::{group, post, user},
    repositories::{GroupRepository, PostFilter, PostRepository, UserRepository},
};
use serde::Serialize;

use crate::services::pagination::{PAGE_SIZE, Page, Paginator};

/// Author fields shown next to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
    pub id: String,
    pub username: String,
    pub full_name: String,
}

impl From<&user::Model> for AuthorSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name(),
        }
    }
}

/// Group fields shown next to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
}

impl From<&group::Model> for GroupSummary {
    fn from(group: &group::Model) -> Self {
        Self {
            id: group.id.clone(),
            title: group.title.clone(),
            slug: group.slug.clone(),
        }
    }
}

/// A post together with its author and group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub post: post::Model,
    pub author: AuthorSummary,
    pub group: Option<GroupSummary>,
}

/// Feed service composing paginated post listings.
#[derive(Clone)]
pub struct FeedService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
        }
    }

    /// Compose one page of the posts matching `filter`.
    ///
    /// `raw_page` is the untrusted `?page=` value; it is clamped, never
    /// rejected.
    pub async fn compose(
        &self,
        filter: &PostFilter,
        raw_page: Option<&str>,
    ) -> AppResult<Page<FeedItem>> {
        let count = self.post_repo.count(filter).await?;
        let paginator = Paginator::new(count, PAGE_SIZE);
        let number = paginator.clamp(raw_page);

        let posts = if count == 0 {
            vec![]
        } else {
            self.post_repo
                .find_page(filter, paginator.offset(number), paginator.per_page())
                .await?
        };

        let items = self.hydrate(posts).await?;
        Ok(paginator.page(number, items))
    }

    /// The front page: every post.
    pub async fn global(&self, raw_page: Option<&str>) -> AppResult<Page<FeedItem>> {
        self.compose(&PostFilter::All, raw_page).await
    }

    /// Posts filed under the group with `slug`.
    pub async fn group(
        &self,
        slug: &str,
        raw_page: Option<&str>,
    ) -> AppResult<(group::Model, Page<FeedItem>)> {
        let group = self.group_repo.get_by_slug(slug).await?;
        let page = self
            .compose(&PostFilter::Group(group.id.clone()), raw_page)
            .await?;
        Ok((group, page))
    }

    /// Posts written by `author`.
    pub async fn author(
        &self,
        author: &user::Model,
        raw_page: Option<&str>,
    ) -> AppResult<Page<FeedItem>> {
        self.compose(&PostFilter::Author(author.id.clone()), raw_page)
            .await
    }

    /// Posts by every author the requester follows.
    ///
    /// An anonymous requester is `Unauthorized`; following nobody yields an
    /// empty page.
    pub async fn following(
        &self,
        requester: Option<&user::Model>,
        raw_page: Option<&str>,
    ) -> AppResult<Page<FeedItem>> {
        let requester = requester.ok_or(AppError::Unauthorized)?;
        self.compose(&PostFilter::FollowedBy(requester.id.clone()), raw_page)
            .await
    }

    /// Attach authors and groups to a window of posts.
    pub async fn hydrate(&self, posts: Vec<post::Model>) -> AppResult<Vec<FeedItem>> {
        let mut author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let mut group_ids: Vec<String> = posts.iter().filter_map(|p| p.group_id.clone()).collect();
        group_ids.sort_unstable();
        group_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let groups: HashMap<String, group::Model> = self
            .group_repo
            .find_by_ids(&group_ids)
            .await?
            .into_iter()
            .map(|g| (g.id.clone(), g))
            .collect();

        posts
            .into_iter()
            .map(|post| {
                let author = authors
                    .get(&post.author_id)
                    .map(AuthorSummary::from)
                    .ok_or_else(|| {
                        AppError::Internal(format!("author of post {} is missing", post.id))
                    })?;
                let group = post
                    .group_id
                    .as_ref()
                    .and_then(|id| groups.get(id))
                    .map(GroupSummary::from);
                Ok(FeedItem {
                    post,
                    author,
                    group,
                })
            })
            .collect()
    }
}
