use thiserror::Error;

/// Errors raised by catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("unknown table: {0}")]
    UnknownTable(String),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
