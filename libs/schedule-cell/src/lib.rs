pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use services::{expand, find_conflicts, ScheduleService};
pub use router::{doctor_schedule_routes, labtech_schedule_routes, schedule_admin_routes, schedule_public_routes};
