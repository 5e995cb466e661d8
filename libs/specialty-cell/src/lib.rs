pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use services::SpecialtyService;
pub use router::{specialty_admin_routes, specialty_public_routes};
