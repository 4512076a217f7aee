//! Error types for the query catalog.

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while resolving or executing a catalog query.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The requested name matches no catalog entry.
    #[error("Unknown query '{0}'. Run `queries` to list the catalog.")]
    UnknownQuery(String),

    /// A declared parameter was not supplied.
    #[error("Query '{query}' requires parameter '{name}'")]
    MissingParam {
        query: &'static str,
        name: &'static str,
    },

    /// A supplied parameter matches no declared parameter.
    #[error("Query '{query}' takes no parameter named '{name}'")]
    UnknownParam { query: &'static str, name: String },

    /// A supplied value could not be parsed as the declared type.
    #[error("Parameter '{name}' expects {expected}, got '{value}'")]
    InvalidParam {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    /// The store rejected the query.
    #[error(transparent)]
    Store(#[from] StoreError),
}
