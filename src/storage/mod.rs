pub mod engine;
pub mod metadata;
pub mod local;
pub mod supabase;

pub use engine::*;
pub use metadata::*;
pub use local::LocalStorage;
pub use supabase::{ClientOptions, SupabaseStorage};
