//! Profile page and follow actions.

use axum::{
    Json,
    extract::{OriginalUri, Path, Query, State},
    response::Response,
};

use crate::{
    extractors::{MaybeAuthUser, PageQuery},
    guard::{login_required, profile_url},
    middleware::AppState,
    response::{ViewResult, see_other},
    views::{ProfilePage, post_page},
};

/// An author's posts with their follow statistics.
pub async fn profile(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ViewResult<Json<ProfilePage>> {
    let author = state.user_service.get_by_username(&username).await?;
    let page = state.feed_service.author(&author, query.raw()).await?;
    let following = state
        .following_service
        .is_following(user.as_ref(), &author)
        .await?;
    let counts = state.following_service.counts(&author).await?;

    Ok(Json(ProfilePage {
        author: (&author).into(),
        count: page.count,
        page: post_page(page, &state.post_service),
        following,
        followers_count: counts.followers_count,
        following_count: counts.following_count,
    }))
}

pub async fn follow(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    OriginalUri(uri): OriginalUri,
    Path(username): Path<String>,
) -> ViewResult<Response> {
    let user = login_required(user, &uri, &state.auth.login_url).into_result()?;
    let author = state.user_service.get_by_username(&username).await?;

    state.following_service.follow(&user, &author).await?;

    Ok(see_other(&profile_url(&author.username)))
}

pub async fn unfollow(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    OriginalUri(uri): OriginalUri,
    Path(username): Path<String>,
) -> ViewResult<Response> {
    let user = login_required(user, &uri, &state.auth.login_url).into_result()?;
    let author = state.user_service.get_by_username(&username).await?;

    state.following_service.unfollow(&user, &author).await?;

    Ok(see_other(&profile_url(&author.username)))
}
