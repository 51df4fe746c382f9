//! Feed pages.

use axum::{
    Json,
    extract::{OriginalUri, Path, Query, State},
};

use crate::{
    extractors::{MaybeAuthUser, PageQuery},
    guard::login_required,
    middleware::AppState,
    response::ViewResult,
    views::{FeedPage, GroupPage, post_page},
};

/// Front page: every post, newest first.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ViewResult<Json<FeedPage>> {
    let page = state.feed_service.global(query.raw()).await?;

    Ok(Json(FeedPage {
        page: post_page(page, &state.post_service),
    }))
}

/// Posts filed under one group.
pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> ViewResult<Json<GroupPage>> {
    let (group, page) = state.feed_service.group(&slug, query.raw()).await?;

    Ok(Json(GroupPage {
        group: group.into(),
        page: post_page(page, &state.post_service),
    }))
}

/// Posts by the authors the requester follows.
pub async fn follow_index(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PageQuery>,
) -> ViewResult<Json<FeedPage>> {
    let user = login_required(user, &uri, &state.auth.login_url).into_result()?;

    let page = state
        .feed_service
        .following(Some(&user), query.raw())
        .await?;

    Ok(Json(FeedPage {
        page: post_page(page, &state.post_service),
    }))
}
