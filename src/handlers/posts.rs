use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::database::models::{NewPost, Post, PostChanges, PostFilter};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Empty};
use crate::state::AppState;

use super::validate::{parse_author_filter, parse_object_id, parse_page, parse_post_sort, read_body, require_text};

const MISSING_FIELDS: &str = "All fields are required.";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    /// Case-insensitive substring of the title
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostBody {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total_pages: u64,
}

/// GET /posts - List posts with optional filtering, sorting and paging
pub async fn list(State(state): State<AppState>, Query(query): Query<ListPostsQuery>) -> ApiResult<PostPage> {
    let filter = PostFilter {
        title_contains: query.query.filter(|q| !q.is_empty()),
        author: parse_author_filter(query.author.as_deref())?,
    };
    let page = parse_page(query.page.as_deref(), query.limit.as_deref(), &state.config.api)?;
    let sort = parse_post_sort(query.sort_by.as_deref(), query.sort_type.as_deref())?;

    let posts = state.store.find_posts(&filter, sort, page).await?;
    // independent of the fetch above; the two may see different snapshots
    let count = state.store.count_posts(&filter).await?;

    Ok(ApiResponse::success(
        PostPage {
            posts,
            total_pages: page.total_pages(count),
        },
        "Posts fetched successfully.",
    ))
}

/// POST /posts - Publish a post authored by the caller
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<PostBody>, JsonRejection>,
) -> ApiResult<Post> {
    let body = read_body(body)?;
    let title = require_text(body.title, "title", MISSING_FIELDS)?;
    let content = require_text(body.content, "content", MISSING_FIELDS)?;

    let post = state
        .store
        .create_post(NewPost {
            title,
            content,
            author: Some(user.user_id),
        })
        .await?;

    // read back to catch writes the store silently dropped
    let published = state
        .store
        .find_post(post.id)
        .await?
        .ok_or_else(|| ApiError::internal_server_error("Something went wrong while publishing post."))?;

    tracing::info!(post_id = %published.id, author = %user.user_id, "Post published");
    Ok(ApiResponse::created(published, "Post published successfully."))
}

/// GET /posts/:postId - Fetch one post
pub async fn get(State(state): State<AppState>, Path(post_id): Path<String>) -> ApiResult<Post> {
    let id = parse_object_id(&post_id, "postId")?;

    let post = state
        .store
        .find_post(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found."))?;

    Ok(ApiResponse::success(post, "Post fetched by id successfully."))
}

/// PATCH /posts/:postId - Replace title and content
pub async fn update(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    body: Result<Json<PostBody>, JsonRejection>,
) -> ApiResult<Post> {
    let id = parse_object_id(&post_id, "postId")?;
    let body = read_body(body)?;
    let title = require_text(body.title, "title", MISSING_FIELDS)?;
    let content = require_text(body.content, "content", MISSING_FIELDS)?;

    let post = state
        .store
        .update_post(id, PostChanges { title, content })
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found."))?;

    Ok(ApiResponse::success(post, "Post updated successfully."))
}

/// DELETE /posts/:postId - Remove a post and its comments
pub async fn delete(State(state): State<AppState>, Path(post_id): Path<String>) -> ApiResult<Empty> {
    let id = parse_object_id(&post_id, "postId")?;

    state
        .store
        .delete_post(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found."))?;

    tracing::info!(post_id = %id, "Post deleted");
    Ok(ApiResponse::success(Empty {}, "Post deleted successfully."))
}
