use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::{auth_middleware, require_admin};

use crate::handlers;

/// Rooms are an admin-only resource; mounted under `/admin`.
pub fn room_admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/rooms", get(handlers::list_rooms).post(handlers::create_room))
        .route("/rooms/available", get(handlers::list_available_rooms))
        .route(
            "/rooms/{room_id}",
            get(handlers::get_room)
                .put(handlers::update_room)
                .delete(handlers::delete_room),
        )
        .route("/rooms/{room_id}/status", patch(handlers::update_room_status))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
