use thiserror::Error;

use pgcarve_catalog::CatalogError;
use pgcarve_manifest::ManifestError;

/// Errors raised by the dump pipeline.
///
/// All of these are fatal: a partially masked or partially loaded dump is
/// unsafe to use, so nothing here is downgraded to a warning and nothing is
/// retried. On failure the partially written file is left on disk for
/// inspection.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("row in '{table}' split into {actual} fields, expected {expected}")]
    FieldCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },
    #[error("no foreign key from '{child}' to '{parent}' for has_many cascade")]
    UnknownAssociation { child: String, parent: String },
    #[error("unknown dump format: {0}")]
    UnknownFormat(String),
    #[error("copy stream returned invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type for dump operations.
pub type Result<T> = std::result::Result<T, DumpError>;
