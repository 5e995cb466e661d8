pub mod catalog;

pub use catalog::MedicalServiceService;
