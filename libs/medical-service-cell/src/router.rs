use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    extract::DefaultBodyLimit,
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, require_admin};
use shared_utils::uploads::MAX_UPLOAD_BODY_BYTES;

use crate::handlers;

/// Mounted under `/patient`.
pub fn service_public_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/services", get(handlers::list_services))
        .route("/services/{service_id}", get(handlers::get_service_detail))
        .with_state(state)
}

/// Mounted under `/admin`.
pub fn service_admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/services",
            get(handlers::admin_list_services).post(handlers::create_service),
        )
        .route(
            "/services/{service_id}",
            get(handlers::get_service)
                .put(handlers::update_service)
                .delete(handlers::delete_service),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
