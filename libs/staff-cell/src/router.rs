use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    extract::DefaultBodyLimit,
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, require_admin};
use shared_utils::uploads::MAX_UPLOAD_BODY_BYTES;

use crate::handlers;

/// Mounted under `/patient`.
pub fn staff_public_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor_detail))
        .with_state(state)
}

/// Mounted under `/admin`.
pub fn staff_admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/doctors", get(handlers::admin_list_doctors).post(handlers::create_doctor))
        .route(
            "/doctors/{doctor_id}",
            get(handlers::get_doctor)
                .put(handlers::update_doctor)
                .delete(handlers::delete_doctor),
        )
        .route("/doctors/{doctor_id}/avatar", put(handlers::update_doctor_avatar))
        .route("/doctors/{doctor_id}/reactivate", post(handlers::reactivate_doctor))
        .route(
            "/lab-technicians",
            get(handlers::list_lab_technicians).post(handlers::create_lab_technician),
        )
        .route(
            "/lab-technicians/{technician_id}",
            get(handlers::get_lab_technician)
                .put(handlers::update_lab_technician)
                .delete(handlers::delete_lab_technician),
        )
        .route("/lab-technicians/{technician_id}/avatar", put(handlers::update_lab_technician_avatar))
        .route("/lab-technicians/{technician_id}/reactivate", post(handlers::reactivate_lab_technician))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
