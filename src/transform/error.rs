//! Error types for record normalization.

use thiserror::Error;

/// Errors raised while normalizing a raw record.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransformError {
    /// The record carries no artifact id, so none of its rows can be
    /// keyed. The offset is the record's position within the run.
    #[error("Record at offset {offset} has no artifact id")]
    MissingId { offset: u64 },
}
