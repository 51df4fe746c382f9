//! Post pages: authoring, reading and commenting.

use axum::{
    Form, Json,
    extract::{
        Multipart, OriginalUri, Path, State,
        multipart::MultipartRejection,
        rejection::FormRejection,
    },
    response::{IntoResponse, Response},
};
use quire_common::{AppError, AppResult};
use quire_core::{CommentForm, ImageUpload, PostForm};
use quire_db::entities::{post, user};
use validator::ValidationErrors;

use crate::{
    extractors::MaybeAuthUser,
    guard::{author_only, login_required, post_url},
    middleware::AppState,
    response::{ViewResult, invalid_form, see_other},
    views::{GroupView, PostFormPage, PostPage, PostView},
};

/// Read the `text`, `group` and `image` fields of a post form.
async fn read_post_form(mut multipart: Multipart) -> AppResult<PostForm> {
    let mut form = PostForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("text") => {
                form.text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
            }
            Some("group") => {
                form.group = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?,
                );
            }
            Some("image") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.image = Some(ImageUpload {
                    data: data.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

/// The submitted form without its upload, for redisplay.
fn echo(form: &PostForm) -> PostForm {
    PostForm {
        text: form.text.clone(),
        group: form.group.clone(),
        image: None,
    }
}

async fn group_choices(state: &AppState) -> AppResult<Vec<GroupView>> {
    Ok(state
        .group_service
        .list()
        .await?
        .into_iter()
        .map(GroupView::from)
        .collect())
}

async fn post_view(state: &AppState, post: post::Model) -> AppResult<PostView> {
    let post_id = post.id.clone();
    let item = state
        .feed_service
        .hydrate(vec![post])
        .await?
        .into_iter()
        .next()
        .ok_or(AppError::PostNotFound(post_id))?;
    Ok(PostView::new(item, &state.post_service))
}

async fn post_page(
    state: &AppState,
    author: &user::Model,
    post: post::Model,
    form: CommentForm,
    errors: Option<ValidationErrors>,
) -> AppResult<PostPage> {
    let count = state.post_service.count_by_author(author).await?;
    let comments = state.comment_service.comments_for(&post).await?;
    let counts = state.following_service.counts(author).await?;

    Ok(PostPage {
        post: post_view(state, post).await?,
        author: author.into(),
        count,
        comments,
        form,
        errors,
        followers_count: counts.followers_count,
        following_count: counts.following_count,
    })
}

/// Empty form for a new post.
pub async fn new_form(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    OriginalUri(uri): OriginalUri,
) -> ViewResult<Json<PostFormPage>> {
    login_required(user, &uri, &state.auth.login_url).into_result()?;

    Ok(Json(PostFormPage {
        form: PostForm::default(),
        errors: None,
        groups: group_choices(&state).await?,
        post: None,
        is_edit: false,
    }))
}

/// Publish a new post.
///
/// The body is only looked at once the requester is known, so a bad or
/// missing body never hides the login redirect.
pub async fn create(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    OriginalUri(uri): OriginalUri,
    multipart: Result<Multipart, MultipartRejection>,
) -> ViewResult<Response> {
    let user = login_required(user, &uri, &state.auth.login_url).into_result()?;
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let form = read_post_form(multipart).await?;
    let submitted = echo(&form);

    let clean = match state.post_service.clean(form).await {
        Ok(clean) => clean,
        Err(AppError::Validation(errors)) => {
            return Ok(invalid_form(PostFormPage {
                form: submitted,
                errors: Some(errors),
                groups: group_choices(&state).await?,
                post: None,
                is_edit: false,
            }));
        }
        Err(e) => return Err(e.into()),
    };

    state.post_service.create(&user, clean).await?;

    Ok(see_other("/"))
}

/// A single post with its comments.
pub async fn show(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
) -> ViewResult<Json<PostPage>> {
    let (author, post) = state
        .post_service
        .get_by_author(&username, &post_id)
        .await?;

    Ok(Json(
        post_page(&state, &author, post, CommentForm::default(), None).await?,
    ))
}

/// The edit form, prefilled with the stored post.
pub async fn edit_form(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    OriginalUri(uri): OriginalUri,
    Path((username, post_id)): Path<(String, String)>,
) -> ViewResult<Json<PostFormPage>> {
    let user = login_required(user, &uri, &state.auth.login_url).into_result()?;
    let (author, post) = state
        .post_service
        .get_by_author(&username, &post_id)
        .await?;
    author_only(user, &post.author_id, post_url(&author.username, &post.id)).into_result()?;

    let form = PostForm {
        text: post.text.clone(),
        group: post.group_id.clone(),
        image: None,
    };

    Ok(Json(PostFormPage {
        form,
        errors: None,
        groups: group_choices(&state).await?,
        post: Some(post_view(&state, post).await?),
        is_edit: true,
    }))
}

/// Apply an edit; only the author gets this far.
pub async fn edit(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    OriginalUri(uri): OriginalUri,
    Path((username, post_id)): Path<(String, String)>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ViewResult<Response> {
    let user = login_required(user, &uri, &state.auth.login_url).into_result()?;
    let (author, post) = state
        .post_service
        .get_by_author(&username, &post_id)
        .await?;
    let read_url = post_url(&author.username, &post.id);
    let user = author_only(user, &post.author_id, read_url.clone()).into_result()?;

    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let form = read_post_form(multipart).await?;
    let submitted = echo(&form);

    let clean = match state.post_service.clean(form).await {
        Ok(clean) => clean,
        Err(AppError::Validation(errors)) => {
            return Ok(invalid_form(PostFormPage {
                form: submitted,
                errors: Some(errors),
                groups: group_choices(&state).await?,
                post: Some(post_view(&state, post).await?),
                is_edit: true,
            }));
        }
        Err(e) => return Err(e.into()),
    };

    state.post_service.edit(&user, post, clean).await?;

    Ok(see_other(&read_url))
}

/// Attach a comment to a post.
pub async fn add_comment(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    OriginalUri(uri): OriginalUri,
    Path((username, post_id)): Path<(String, String)>,
    form: Result<Form<CommentForm>, FormRejection>,
) -> ViewResult<Response> {
    let user = login_required(user, &uri, &state.auth.login_url).into_result()?;
    let (author, post) = state
        .post_service
        .get_by_author(&username, &post_id)
        .await?;
    let read_url = post_url(&author.username, &post.id);

    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let submitted = form.clone();
    match state.comment_service.add(&post, &user, form).await {
        Ok(_) => Ok(see_other(&read_url)),
        Err(AppError::Validation(errors)) => {
            let page = post_page(&state, &author, post, submitted, Some(errors)).await?;
            Ok(invalid_form(page))
        }
        Err(e) => Err(e.into()),
    }
}
