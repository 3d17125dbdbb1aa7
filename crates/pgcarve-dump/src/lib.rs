//! The dump pipeline: record-set resolution, row formatting, and the
//! orchestrator that streams a manifest-selected subset of a PostgreSQL
//! database into a replayable SQL text file.
//!
//! Tables are processed one at a time over a single pool; each table is
//! pulled through the COPY protocol, formatted row by row (optionally
//! masked), buffered, and flushed to the target file. Constraint deferral
//! brackets the data so foreign keys pointing at not-yet-loaded rows do not
//! fail on replay.

pub mod buffer;
pub mod engine;
pub mod errors;
pub mod formats;
pub mod records;
pub mod stream;

pub use buffer::DumpBuffer;
pub use engine::{Deferrability, DumpEngine, DumpOptions, DumpReport, TableDumpReport};
pub use errors::{DumpError, Result};
pub use formats::{FormatKind, RowFormat, TransferFormat};
pub use records::{AssociationEdge, Associations, ExtractRecord, RecordSet};
pub use stream::CopyRowStream;
