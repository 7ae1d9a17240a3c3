//! Post queue API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use postflow_core::{
    CreatePostRequest, ImportMode, MediaDescriptor, MediaKind, MediaRef, Post, PostFilter,
    StatusCounts, UpdatePostRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a post
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostBody {
    pub content: String,
    /// Account id from the account directory
    pub account_ref: String,
    #[serde(default)]
    pub images: Vec<MediaDescriptor>,
    #[serde(default)]
    pub videos: Vec<MediaDescriptor>,
}

/// Request body for editing a post. Omitted fields are left unchanged;
/// sending either media list replaces all media.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostBody {
    pub content: Option<String>,
    pub account_ref: Option<String>,
    pub images: Option<Vec<MediaDescriptor>>,
    pub videos: Option<Vec<MediaDescriptor>>,
}

/// Request body for importing posts
#[derive(Debug, Deserialize)]
pub struct ImportBody {
    pub posts: Vec<Post>,
    #[serde(default)]
    pub mode: ImportMode,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub success: bool,
    pub post: Post,
}

#[derive(Debug, Serialize)]
pub struct ListPostsResponse {
    pub success: bool,
    pub posts: Vec<Post>,
    pub counts: StatusCounts,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub imported: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub posts: Vec<Post>,
}

/// Resolve submitted descriptors into media refs.
pub(crate) fn collect_media(
    images: Vec<MediaDescriptor>,
    videos: Vec<MediaDescriptor>,
) -> Vec<MediaRef> {
    images
        .into_iter()
        .map(|d| d.into_media_ref(MediaKind::Image))
        .chain(videos.into_iter().map(|d| d.into_media_ref(MediaKind::Video)))
        .collect()
}

// ============================================================================
// Handlers
// ============================================================================

/// List posts, optionally filtered and sorted
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<PostFilter>,
) -> Json<ListPostsResponse> {
    let queue = state.queue().read().await;
    Json(ListPostsResponse {
        success: true,
        posts: queue.list(&filter),
        counts: queue.counts(),
    })
}

/// Add a pending post
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePostBody>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let request = CreatePostRequest {
        content: body.content,
        account_ref: body.account_ref,
        media: collect_media(body.images, body.videos),
    };

    let post = state.queue().write().await.add(request)?;
    tracing::info!(post_id = %post.id, "Post created");
    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            success: true,
            post,
        }),
    ))
}

/// Get a single post
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .queue()
        .read()
        .await
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("post not found: {}", id)))?;
    Ok(Json(PostResponse {
        success: true,
        post,
    }))
}

/// Edit a pending or failed post
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePostBody>,
) -> Result<Json<PostResponse>, ApiError> {
    let media = match (body.images, body.videos) {
        (None, None) => None,
        (images, videos) => Some(collect_media(
            images.unwrap_or_default(),
            videos.unwrap_or_default(),
        )),
    };
    let request = UpdatePostRequest {
        content: body.content,
        account_ref: body.account_ref,
        media,
    };

    let post = state.queue().write().await.update(&id, request)?;
    Ok(Json(PostResponse {
        success: true,
        post,
    }))
}

/// Delete a pending or failed post
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.queue().write().await.delete(&id)?;
    tracing::info!(post_id = %post.id, "Post deleted");
    Ok(Json(PostResponse {
        success: true,
        post,
    }))
}

/// Import posts from an export. Rejected while automation is active.
pub async fn import_posts(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ImportBody>,
) -> Result<Json<ImportResponse>, ApiError> {
    let summary = state.orchestrator().import(body.posts, body.mode).await?;
    Ok(Json(ImportResponse {
        success: true,
        imported: summary.imported,
        total: summary.total,
    }))
}

/// Export every post
pub async fn export_posts(State(state): State<Arc<AppState>>) -> Json<ExportResponse> {
    Json(ExportResponse {
        posts: state.queue().read().await.export(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use postflow_core::SourceKind;

    #[test]
    fn test_collect_media_resolves_descriptors() {
        let body: CreatePostBody = serde_json::from_value(serde_json::json!({
            "content": "hi",
            "accountRef": "acc-1",
            "images": [{"data": "data:image/png;base64,AAAA"}],
            "videos": ["https://example.com/v.mp4"]
        }))
        .unwrap();

        let media = collect_media(body.images, body.videos);
        assert_eq!(media.len(), 2);
        assert_eq!(media[0].kind, MediaKind::Image);
        assert_eq!(media[0].source_kind, SourceKind::InlineEncoded);
        assert_eq!(media[1].kind, MediaKind::Video);
        assert_eq!(media[1].source_kind, SourceKind::RemoteUrl);
    }
}
