//! Types for the query catalog.

use crate::query::error::QueryError;
use crate::store::{CellValue, SelectOutput};

/// Type a query parameter is parsed as before binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Text,
    Integer,
}

/// One declared parameter of a catalog query.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
}

impl ParamSpec {
    /// Parse a caller-supplied string into a bindable cell.
    pub(crate) fn parse(&self, value: &str) -> Result<CellValue, QueryError> {
        match self.ty {
            ParamType::Text => Ok(CellValue::Text(value.to_string())),
            ParamType::Integer => {
                value
                    .parse::<i64>()
                    .map(CellValue::Integer)
                    .map_err(|_| QueryError::InvalidParam {
                        name: self.name,
                        expected: "an integer",
                        value: value.to_string(),
                    })
            }
        }
    }

    /// Human label for the `queries` listing.
    pub fn type_label(&self) -> &'static str {
        match self.ty {
            ParamType::Text => "text",
            ParamType::Integer => "integer",
        }
    }
}

/// Catalog section, mirroring how the queries are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryGroup {
    Metadata,
    Media,
    Colors,
    Joins,
}

impl QueryGroup {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Metadata => "Metadata",
            Self::Media => "Media",
            Self::Colors => "Colors",
            Self::Joins => "Joins",
        }
    }
}

/// Tabular result of one catalog query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl From<SelectOutput> for QueryResult {
    fn from(output: SelectOutput) -> Self {
        Self {
            columns: output.columns,
            rows: output.rows,
        }
    }
}
