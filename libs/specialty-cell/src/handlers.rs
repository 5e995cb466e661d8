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
    AssignHeadDoctorRequest, CreateSpecialtyRequest, SpecialtySearchQuery, UpdateSpecialtyRequest,
};
use crate::services::SpecialtyService;

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_specialties(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<SpecialtySearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&state);
    let page = service.list_specialties(query, None).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_specialty_detail(
    State(state): State<Arc<AppConfig>>,
    Path(specialty_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&state);
    let detail = service.get_specialty_detail(specialty_id, None).await?;
    Ok(Json(json!(detail)))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn admin_list_specialties(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<SpecialtySearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&state);
    let page = service.list_specialties(query, Some(auth.token())).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_specialty(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(specialty_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&state);
    let specialty = service.get_specialty(specialty_id, Some(auth.token())).await?;
    Ok(Json(json!(specialty)))
}

#[axum::debug_handler]
pub async fn create_specialty(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateSpecialtyRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = SpecialtyService::new(&state);
    let specialty = service.create_specialty(request, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(specialty))))
}

#[axum::debug_handler]
pub async fn update_specialty(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(specialty_id): Path<Uuid>,
    Json(request): Json<UpdateSpecialtyRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&state);
    let specialty = service.update_specialty(specialty_id, request, auth.token()).await?;
    Ok(Json(json!(specialty)))
}

#[axum::debug_handler]
pub async fn assign_head_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(specialty_id): Path<Uuid>,
    Json(request): Json<AssignHeadDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&state);
    let specialty = service.assign_head_doctor(specialty_id, request, auth.token()).await?;
    Ok(Json(json!(specialty)))
}

#[axum::debug_handler]
pub async fn delete_specialty(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(specialty_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&state);
    service.delete_specialty(specialty_id, auth.token()).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Specialty deleted"
    })))
}
