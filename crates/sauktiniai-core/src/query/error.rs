use thiserror::Error;

/// Rejected query input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Search query is required")]
    EmptyQuery,
}
