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
    AvatarUploadRequest, CreateDoctorRequest, CreateLabTechnicianRequest, StaffSearchQuery,
    UpdateDoctorRequest, UpdateLabTechnicianRequest,
};
use crate::services::{DoctorService, LabTechnicianService};

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<StaffSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let page = service.list_doctors(query, true, None).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_doctor_detail(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let detail = service.get_doctor_detail(doctor_id, None).await?;
    Ok(Json(json!(detail)))
}

// ==============================================================================
// ADMIN DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn admin_list_doctors(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<StaffSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let page = service.list_doctors(query, false, Some(auth.token())).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let doctor = service.get_doctor(doctor_id, Some(auth.token())).await?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = DoctorService::new(&state);
    let doctor = service.create_doctor(request, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(doctor))))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let doctor = service.update_doctor(doctor_id, request, auth.token()).await?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_doctor_avatar(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<AvatarUploadRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let account = service.update_avatar(doctor_id, &request.image, auth.token()).await?;
    Ok(Json(json!(account)))
}

#[axum::debug_handler]
pub async fn reactivate_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let account = service.reactivate_doctor(doctor_id, auth.token()).await?;
    Ok(Json(json!(account)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state);
    let outcome = service.delete_doctor(doctor_id, auth.token()).await?;
    Ok(Json(json!(outcome)))
}

// ==============================================================================
// ADMIN LAB TECHNICIAN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_lab_technicians(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<StaffSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = LabTechnicianService::new(&state);
    let page = service.list_lab_technicians(query, auth.token()).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_lab_technician(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(technician_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = LabTechnicianService::new(&state);
    let technician = service.get_lab_technician(technician_id, auth.token()).await?;
    Ok(Json(json!(technician)))
}

#[axum::debug_handler]
pub async fn create_lab_technician(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateLabTechnicianRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = LabTechnicianService::new(&state);
    let technician = service.create_lab_technician(request, auth.token()).await?;
    Ok((StatusCode::CREATED, Json(json!(technician))))
}

#[axum::debug_handler]
pub async fn update_lab_technician(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(technician_id): Path<Uuid>,
    Json(request): Json<UpdateLabTechnicianRequest>,
) -> Result<Json<Value>, AppError> {
    let service = LabTechnicianService::new(&state);
    let technician = service.update_lab_technician(technician_id, request, auth.token()).await?;
    Ok(Json(json!(technician)))
}

#[axum::debug_handler]
pub async fn update_lab_technician_avatar(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(technician_id): Path<Uuid>,
    Json(request): Json<AvatarUploadRequest>,
) -> Result<Json<Value>, AppError> {
    let service = LabTechnicianService::new(&state);
    let account = service.update_avatar(technician_id, &request.image, auth.token()).await?;
    Ok(Json(json!(account)))
}

#[axum::debug_handler]
pub async fn reactivate_lab_technician(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(technician_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = LabTechnicianService::new(&state);
    let account = service.reactivate_lab_technician(technician_id, auth.token()).await?;
    Ok(Json(json!(account)))
}

#[axum::debug_handler]
pub async fn delete_lab_technician(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(technician_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = LabTechnicianService::new(&state);
    let outcome = service.delete_lab_technician(technician_id, auth.token()).await?;
    Ok(Json(json!(outcome)))
}
