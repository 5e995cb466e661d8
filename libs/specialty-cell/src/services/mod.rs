pub mod specialty;

pub use specialty::SpecialtyService;
