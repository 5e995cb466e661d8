pub mod dependency;
pub mod error;
pub mod supabase;

pub use dependency::{blocking_references, DependencyCheck};
pub use error::DbError;
pub use supabase::{eq_filter, SupabaseClient};
