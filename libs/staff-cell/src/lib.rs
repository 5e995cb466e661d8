pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use services::{AccountService, DoctorService, LabTechnicianService};
pub use router::{staff_admin_routes, staff_public_routes};
