use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or resolving a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find manifest file: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("manifest declares no tables")]
    MissingTables,
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("duplicate table entry: {0}")]
    DuplicateTable(String),
    #[error("unknown variable in query template: {0}")]
    UnknownVariable(String),
    #[error("unterminated placeholder in query template: {0}")]
    UnterminatedPlaceholder(String),
    #[error("variable '{0}' is not a scalar value")]
    InvalidVariable(String),
    #[error("invalid mask pattern for {table}.{column}: {source}")]
    InvalidMaskPattern {
        table: String,
        column: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// Result type for manifest operations.
pub type Result<T> = std::result::Result<T, ManifestError>;
