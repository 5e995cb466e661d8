pub mod generator;
pub mod schedule;

pub use generator::{expand, find_conflicts};
pub use schedule::ScheduleService;
