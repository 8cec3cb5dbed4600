//! HTTP API read by the playlist page, plus the page itself.

use std::{path::Path, sync::Arc};

use axum::{
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::playlist_service::PlaylistService;

mod error;
mod videos;

pub use error::ApiError;

pub struct AppState {
    pub playlist: Arc<PlaylistService>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OkResponse {
    pub const fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

pub fn router(state: Arc<AppState>, static_dir: impl AsRef<Path>) -> Router {
    let api_router = Router::new()
        .route("/videos", get(videos::list_videos))
        .route("/videos/{id}", delete(videos::delete_video))
        .route("/clear", post(videos::clear_videos))
        .with_state(state);

    Router::new()
        .nest("/api", api_router)
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
