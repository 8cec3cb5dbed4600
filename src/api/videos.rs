use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};

use crate::{models::SubmissionId, playlist_service::PlaylistEntry};

use super::{ApiError, AppState, OkResponse};

pub async fn list_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PlaylistEntry>>, ApiError> {
    Ok(Json(state.playlist.list_all().await?))
}

pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Path(id) = path?;
    state.playlist.delete_one(SubmissionId(id)).await?;
    Ok(Json(OkResponse::ok()))
}

pub async fn clear_videos(State(state): State<Arc<AppState>>) -> Result<Json<OkResponse>, ApiError> {
    state.playlist.clear_all().await?;
    Ok(Json(OkResponse::ok()))
}
