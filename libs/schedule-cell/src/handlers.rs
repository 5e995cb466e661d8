use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use staff_cell::StaffKind;

use crate::models::{CreateScheduleRequest, ScheduleSearchQuery, UpdateScheduleRequest};
use crate::services::ScheduleService;

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_schedules(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ScheduleSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&state);
    let page = service.list_schedules(query, None).await?;
    Ok(Json(json!(page)))
}

// ==============================================================================
// STAFF HANDLERS
// ==============================================================================

async fn my_schedules(
    state: &AppConfig,
    user: &User,
    kind: StaffKind,
    token: &str,
    query: ScheduleSearchQuery,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(state);
    let page = service.my_schedules(user, kind, query, token).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn doctor_schedules(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ScheduleSearchQuery>,
) -> Result<Json<Value>, AppError> {
    my_schedules(&state, &user, StaffKind::Doctor, auth.token(), query).await
}

#[axum::debug_handler]
pub async fn labtech_schedules(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ScheduleSearchQuery>,
) -> Result<Json<Value>, AppError> {
    my_schedules(&state, &user, StaffKind::LabTech, auth.token(), query).await
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn admin_list_schedules(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ScheduleSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&state);
    let page = service.list_schedules(query, Some(auth.token())).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&state);
    let schedule = service.get_schedule(schedule_id, auth.token()).await?;
    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn create_schedules(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ScheduleService::new(&state);
    let created = service.create_schedules(request, auth.token()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "schedules": created,
            "total": created.len()
        })),
    ))
}

#[axum::debug_handler]
pub async fn update_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(schedule_id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&state);
    let schedule = service.update_schedule(schedule_id, request, auth.token()).await?;
    Ok(Json(json!(schedule)))
}

#[axum::debug_handler]
pub async fn delete_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&state);
    service.delete_schedule(schedule_id, auth.token()).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Schedule deleted"
    })))
}
