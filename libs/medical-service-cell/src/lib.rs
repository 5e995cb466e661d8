pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use services::MedicalServiceService;
pub use router::{service_admin_routes, service_public_routes};
