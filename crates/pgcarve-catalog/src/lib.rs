//! Database collaborators for the dump pipeline.
//!
//! Everything the orchestrator needs to know about the target database is
//! looked up here: ordered column lists, deferred-constraint names,
//! foreign-key edges, materialized views, and serial sequences. All lookups
//! run against the `public` schema through a shared [`sqlx::PgPool`] and are
//! queried fresh per run.

pub mod errors;
pub mod queries;
pub mod registry;
pub mod schema_cache;

pub use errors::{CatalogError, Result};
pub use queries::{ForeignKeyEdge, SerialSequence};
pub use registry::ConstraintRegistry;
pub use schema_cache::SchemaCache;

/// Quote a PostgreSQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("user\"table"), "\"user\"\"table\"");
    }
}
