use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, require_admin, require_doctor, require_labtech};

use crate::handlers;

/// Mounted under `/patient`.
pub fn schedule_public_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/schedules", get(handlers::list_schedules))
        .with_state(state)
}

/// Mounted under `/doctor`.
pub fn doctor_schedule_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/schedules", get(handlers::doctor_schedules))
        .layer(middleware::from_fn(require_doctor))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/labtech`.
pub fn labtech_schedule_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/schedules", get(handlers::labtech_schedules))
        .layer(middleware::from_fn(require_labtech))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted under `/admin`.
pub fn schedule_admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/schedules",
            get(handlers::admin_list_schedules).post(handlers::create_schedules),
        )
        .route(
            "/schedules/{schedule_id}",
            get(handlers::get_schedule)
                .put(handlers::update_schedule)
                .delete(handlers::delete_schedule),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
