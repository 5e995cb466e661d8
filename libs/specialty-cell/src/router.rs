use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
    extract::DefaultBodyLimit,
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, require_admin};
use shared_utils::uploads::MAX_UPLOAD_BODY_BYTES;

use crate::handlers;

/// Mounted under `/patient`.
pub fn specialty_public_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/specialties", get(handlers::list_specialties))
        .route("/specialties/{specialty_id}", get(handlers::get_specialty_detail))
        .with_state(state)
}

/// Mounted under `/admin`.
pub fn specialty_admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/specialties",
            get(handlers::admin_list_specialties).post(handlers::create_specialty),
        )
        .route(
            "/specialties/{specialty_id}",
            get(handlers::get_specialty)
                .put(handlers::update_specialty)
                .delete(handlers::delete_specialty),
        )
        .route("/specialties/{specialty_id}/head-doctor", put(handlers::assign_head_doctor))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
