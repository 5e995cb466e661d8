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

use crate::models::{CreateServiceRequest, ServiceSearchQuery, UpdateServiceRequest};
use crate::services::MedicalServiceService;

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_services(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ServiceSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalServiceService::new(&state);
    let page = service.list_services(query, None).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_service_detail(
    State(state): State<Arc<AppConfig>>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalServiceService::new(&state);
    let detail = service.get_service_detail(service_id, None).await?;
    Ok(Json(json!(detail)))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn admin_list_services(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ServiceSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalServiceService::new(&state);
    let page = service.list_services(query, Some(auth.token())).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_service(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalServiceService::new(&state);
    let found = service.get_service(service_id, Some(auth.token())).await?;
    Ok(Json(json!(found)))
}

#[axum::debug_handler]
pub async fn create_service(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = MedicalServiceService::new(&state);
    let created = service.create_service(request, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(created))))
}

#[axum::debug_handler]
pub async fn update_service(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(service_id): Path<Uuid>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalServiceService::new(&state);
    let updated = service.update_service(service_id, request, auth.token()).await?;
    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn delete_service(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalServiceService::new(&state);
    service.delete_service(service_id, auth.token()).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Service deleted"
    })))
}
