mod cache;

pub use cache::*;

/// SQL migration for the response cache
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
