//! Room API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{RoomCreate, RoomListing, RoomQuery, RoomStatusUpdate, RoomUpdate, ReviewDetail};

use crate::api::{ApiResult, ok, ok_with_message};
use crate::services::{content, room as service};
use crate::state::AppState;

/// GET /api/kamar?status=&room_type=
pub async fn list(State(state): State<AppState>, Query(query): Query<RoomQuery>) -> ApiResult<Vec<RoomListing>> {
    ok(service::list_rooms(state.pool(), &query).await?)
}

/// GET /api/kamar/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<RoomListing> {
    ok(service::get_room(state.pool(), id).await?)
}

/// GET /api/kamar/{id}/reviews
pub async fn list_reviews(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Vec<ReviewDetail>> {
    service::get_room(state.pool(), id).await?;
    ok(content::list_room_reviews(state.pool(), id).await?)
}

/// POST /api/kamar
pub async fn create(State(state): State<AppState>, Json(payload): Json<RoomCreate>) -> ApiResult<RoomListing> {
    ok_with_message("Room created", service::create_room(state.pool(), &payload).await?)
}

/// PUT /api/kamar/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RoomUpdate>,
) -> ApiResult<RoomListing> {
    ok(service::update_room(state.pool(), id, &payload).await?)
}

/// DELETE /api/kamar/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    service::delete_room(state.pool(), id).await?;
    ok_with_message("Room deleted", ())
}

/// PUT /api/kamar/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RoomStatusUpdate>,
) -> ApiResult<RoomListing> {
    ok(service::update_room_status(state.pool(), id, payload.status).await?)
}
