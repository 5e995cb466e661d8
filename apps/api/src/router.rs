use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};
use tower_http::services::ServeDir;

use auth_cell::router::auth_routes;
use medical_service_cell::router::{service_admin_routes, service_public_routes};
use room_cell::router::room_admin_routes;
use schedule_cell::router::{
    doctor_schedule_routes, labtech_schedule_routes, schedule_admin_routes, schedule_public_routes,
};
use shared_config::AppConfig;
use specialty_cell::router::{specialty_admin_routes, specialty_public_routes};
use staff_cell::router::{staff_admin_routes, staff_public_routes};

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let images = ServeDir::new(state.public_assets_dir.join("images"));

    Router::new()
        .route("/", get(|| async { "Hospital API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/patient", patient_routes(state.clone()))
        .nest("/doctor", doctor_schedule_routes(state.clone()))
        .nest("/labtech", labtech_schedule_routes(state.clone()))
        .nest("/admin", admin_routes(state))
        .nest_service("/images", images)
}

fn patient_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .merge(specialty_public_routes(state.clone()))
        .merge(staff_public_routes(state.clone()))
        .merge(service_public_routes(state.clone()))
        .merge(schedule_public_routes(state))
}

fn admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .merge(specialty_admin_routes(state.clone()))
        .merge(room_admin_routes(state.clone()))
        .merge(service_admin_routes(state.clone()))
        .merge(staff_admin_routes(state.clone()))
        .merge(schedule_admin_routes(state))
}
