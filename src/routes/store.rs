//! Playlist store endpoints
//!
//! Every handler needs a session. Ownership itself is checked by the
//! `DatabaseManager`; handlers only map its outcome onto status codes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{internal_error, ApiError};
use crate::middleware::AuthenticatedUser;
use crate::models::{Denial, NewPlaylist, PlaylistId, PlaylistUpdate};
use crate::services::metrics;
use crate::AppState;

/// Request to update a playlist
#[derive(Debug, Deserialize)]
pub struct UpdatePlaylistRequest {
    pub playlist: PlaylistUpdate,
}

fn json_error(status: StatusCode, body: serde_json::Value) -> ApiError {
    (status, Json(body))
}

/// POST /store/playlist - Create a playlist owned by the caller
pub async fn create_playlist(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    payload: Result<Json<NewPlaylist>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|e| {
        tracing::debug!("Rejected playlist body: {}", e);
        metrics::record("create_playlist", "invalid");
        json_error(
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "success": false, "error": "You must provide a Playlist" }),
        )
    })?;

    tracing::info!(
        "createPlaylist '{}' with {} songs for user {}",
        body.name,
        body.songs.len(),
        user.user_id()
    );

    match state.db.create_user_playlist(user.user_id(), body).await {
        Ok(playlist) => {
            metrics::record("create_playlist", "ok");
            Ok((
                StatusCode::CREATED,
                Json(serde_json::json!({ "playlist": playlist })),
            ))
        }
        Err(e) if e.is_client_error() => {
            tracing::warn!("Playlist not created: {}", e);
            metrics::record("create_playlist", "invalid");
            Err(json_error(
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "errorMessage": "Playlist Not Created" }),
            ))
        }
        Err(e) => {
            metrics::record("create_playlist", "error");
            Err(internal_error("Failed to create playlist", e))
        }
    }
}

/// DELETE /store/playlist/:id - Delete one of the caller's playlists
pub async fn delete_playlist(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("delete Playlist with id: {}", id);

    let result = state
        .db
        .delete_playlist(user.user_id(), &PlaylistId::new(id))
        .await
        .map_err(|e| {
            metrics::record("delete_playlist", "error");
            internal_error("Failed to delete playlist", e)
        })?;

    match result.reason {
        None => {
            metrics::record("delete_playlist", "ok");
            Ok(Json(serde_json::json!({})))
        }
        Some(Denial::Unauthorized) => {
            metrics::record("delete_playlist", "unauthorized");
            Err(json_error(
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "errorMessage": "authentication error" }),
            ))
        }
        Some(Denial::NotFound) => {
            metrics::record("delete_playlist", "not_found");
            Err(json_error(
                StatusCode::NOT_FOUND,
                serde_json::json!({ "errorMessage": "Playlist not found!" }),
            ))
        }
    }
}

/// GET /store/playlist/:id - Read one of the caller's playlists
pub async fn get_playlist_by_id(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Find Playlist with id: {}", id);

    let playlist = state
        .db
        .get_playlist_by_id(user.user_id(), &PlaylistId::new(id))
        .await
        .map_err(|e| {
            metrics::record("get_playlist", "error");
            internal_error("Failed to load playlist", e)
        })?;

    match playlist {
        Some(playlist) => {
            metrics::record("get_playlist", "ok");
            Ok(Json(serde_json::json!({ "success": true, "playlist": playlist })))
        }
        None => {
            metrics::record("get_playlist", "denied");
            Err(json_error(
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "success": false,
                    "description": "authentication error or playlist not found"
                }),
            ))
        }
    }
}

/// GET /store/playlistpairs - `{_id, name}` for each of the caller's playlists
pub async fn get_playlist_pairs(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let pairs = state
        .db
        .get_user_playlist_pairs(user.user_id())
        .await
        .map_err(|e| {
            metrics::record("get_playlist_pairs", "error");
            internal_error("Failed to list playlist pairs", e)
        })?;

    metrics::record("get_playlist_pairs", "ok");
    Ok(Json(serde_json::json!({ "success": true, "idNamePairs": pairs })))
}

/// GET /store/playlists - Every playlist in the store
pub async fn get_playlists(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let playlists = state.db.get_all_playlists().await.map_err(|e| {
        metrics::record("get_playlists", "error");
        internal_error("Failed to list playlists", e)
    })?;

    if playlists.is_empty() {
        metrics::record("get_playlists", "not_found");
        return Err(json_error(
            StatusCode::NOT_FOUND,
            serde_json::json!({ "success": false, "error": "Playlist not found" }),
        ));
    }

    metrics::record("get_playlists", "ok");
    Ok(Json(serde_json::json!({ "success": true, "data": playlists })))
}

/// PUT /store/playlist/:id - Rename and replace the songs of a playlist
pub async fn update_playlist(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePlaylistRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|e| {
        tracing::debug!("Rejected update body: {}", e);
        metrics::record("update_playlist", "invalid");
        json_error(
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "success": false, "error": "You must provide a body to update" }),
        )
    })?;

    tracing::info!(
        "updatePlaylist {} -> '{}' ({} songs)",
        id,
        body.playlist.name,
        body.playlist.songs.len()
    );

    let result = match state
        .db
        .update_user_playlist(user.user_id(), &PlaylistId::new(id), body.playlist)
        .await
    {
        Ok(result) => result,
        Err(e) if e.is_client_error() => {
            tracing::warn!("Playlist not updated: {}", e);
            metrics::record("update_playlist", "invalid");
            return Err(json_error(
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "success": false, "error": e.to_string() }),
            ));
        }
        Err(e) => {
            metrics::record("update_playlist", "error");
            return Err(internal_error("Failed to update playlist", e));
        }
    };

    match (result.reason, result.playlist) {
        (None, Some(playlist)) => {
            metrics::record("update_playlist", "ok");
            Ok(Json(serde_json::json!({
                "success": true,
                "id": playlist.id,
                "message": "Playlist updated!",
            })))
        }
        (Some(Denial::Unauthorized), _) => {
            metrics::record("update_playlist", "unauthorized");
            Err(json_error(
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "success": false, "description": "authentication error" }),
            ))
        }
        _ => {
            metrics::record("update_playlist", "not_found");
            Err(json_error(
                StatusCode::NOT_FOUND,
                serde_json::json!({ "message": "Playlist not found!" }),
            ))
        }
    }
}
