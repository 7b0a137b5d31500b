//! HTTP admin API endpoint handlers (read-only).

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tower_http::trace::TraceLayer;

use crate::{
    domain::Nickname,
    infrastructure::dto::http::{HealthDto, RoomDetailDto, RoomSummaryDto, UsersDto},
    ui::state::AppState,
    usecase::RoomDirectoryError,
};
use tertulia_shared::time::timestamp_to_rfc3339;

/// Admin API routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/users", get(get_users))
        .route("/api/rooms", get(get_rooms))
        .route("/api/rooms/{room_id}", get(get_room_detail))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}

/// Connected users
pub async fn get_users(State(state): State<Arc<AppState>>) -> Json<UsersDto> {
    let users: Vec<String> = state
        .connected_users()
        .await
        .iter()
        .map(|n| n.as_str().to_string())
        .collect();
    Json(UsersDto {
        count: users.len(),
        users,
    })
}

/// Persisted rooms with their live member counts
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomSummaryDto>>, StatusCode> {
    let rooms = state.rooms.list_rooms().await.map_err(|e| {
        tracing::error!("Failed to list rooms: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    // Domain Model から DTO への変換
    let summaries = rooms
        .iter()
        .map(|(room, live)| RoomSummaryDto::from_record(room, *live))
        .collect();
    Ok(Json(summaries))
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    match state.rooms.room_overview(&room_id).await {
        Ok(overview) => {
            let names = |list: &[Nickname]| -> Vec<String> {
                list.iter().map(|n| n.as_str().to_string()).collect()
            };
            Ok(Json(RoomDetailDto {
                id: overview.room.id.as_str().to_string(),
                name: overview.room.name.as_str().to_string(),
                description: overview.room.description.clone(),
                creator: overview.room.creator.as_str().to_string(),
                created_at: timestamp_to_rfc3339(overview.room.created_at.value()),
                members: names(&overview.members),
                live_members: names(&overview.live_members),
            }))
        }
        Err(RoomDirectoryError::RoomNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!(%room_id, "Failed to load room: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
