//! Queries over cached regions: paginated listing with an optional birth-year
//! filter, and substring search.

pub mod engine;
pub mod error;

pub use engine::{Page, QueryEngine, DEFAULT_LIMIT, MAX_LIMIT};
pub use error::QueryError;
