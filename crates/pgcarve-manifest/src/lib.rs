//! Declarative dump manifest for pgcarve.
//!
//! A manifest names the tables to export, optional row-filter queries with
//! `%{variable}` placeholders, has-many associations used to cascade row
//! selection, and per-column mask rules. Parsing is eager: variables are
//! interpolated and mask patterns compiled at load time, so every
//! configuration error surfaces before any database work begins.

pub mod errors;
pub mod mask;
pub mod model;

pub use errors::{ManifestError, Result};
pub use mask::{MaskRule, TableMask};
pub use model::{ForeignKeyHint, Manifest, TableEntry, interpolate};
