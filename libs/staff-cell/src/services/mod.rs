pub mod account;
pub mod doctor;
pub mod lab_technician;
pub mod password;

pub use account::{AccountService, AccountUpdate};
pub use doctor::DoctorService;
pub use lab_technician::LabTechnicianService;
