use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    AvailableRoomsQuery, CreateRoomRequest, RoomSearchQuery, UpdateRoomRequest, UpdateRoomStatusRequest,
};
use crate::services::RoomService;

#[axum::debug_handler]
pub async fn list_rooms(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<RoomSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = RoomService::new(&state);
    let page = service.list_rooms(query, auth.token()).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn list_available_rooms(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<AvailableRoomsQuery>,
) -> Result<Json<Value>, AppError> {
    let service = RoomService::new(&state);
    let rooms = service.list_available_rooms(query, auth.token()).await?;
    Ok(Json(json!({
        "rooms": rooms,
        "total": rooms.len()
    })))
}

#[axum::debug_handler]
pub async fn get_room(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = RoomService::new(&state);
    let room = service.get_room(room_id, auth.token()).await?;
    Ok(Json(json!(room)))
}

#[axum::debug_handler]
pub async fn create_room(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = RoomService::new(&state);
    let room = service.create_room(request, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(room))))
}

#[axum::debug_handler]
pub async fn update_room(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(room_id): Path<Uuid>,
    Json(request): Json<UpdateRoomRequest>,
) -> Result<Json<Value>, AppError> {
    let service = RoomService::new(&state);
    let room = service.update_room(room_id, request, auth.token()).await?;
    Ok(Json(json!(room)))
}

#[axum::debug_handler]
pub async fn update_room_status(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(room_id): Path<Uuid>,
    Json(request): Json<UpdateRoomStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = RoomService::new(&state);
    let room = service.update_status(room_id, request.status, auth.token()).await?;
    Ok(Json(json!(room)))
}

#[axum::debug_handler]
pub async fn delete_room(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = RoomService::new(&state);
    service.delete_room(room_id, auth.token()).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Room deleted"
    })))
}
