//! SQLite-backed persistence for normalized artifact records.
//!
//! The store owns a single connection behind a mutex and exposes an
//! async trait so callers never touch rusqlite directly. Each record
//! loads in its own transaction; a failed record rolls back without
//! touching anything already committed.

pub mod db;
pub mod error;
pub mod schema;
pub mod types;

pub use db::{ArtifactStore, SqliteArtifactStore};
pub use error::StoreError;
pub use types::{CellValue, LoadRun, LoadRunStats, SelectOutput, StoreSummary};
