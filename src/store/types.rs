//! Types for the artifact store.

use chrono::{DateTime, Utc};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::ToSql;

/// A single SQL cell, both as a bind parameter and as a result value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    pub(crate) fn from_value_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(f) => Self::Real(f),
            ValueRef::Text(t) => Self::Text(String::from_utf8_lossy(t).into_owned()),
            // The schema stores no blobs; render a placeholder if one
            // ever shows up instead of crashing the query path.
            ValueRef::Blob(b) => Self::Text(format!("<{} bytes>", b.len())),
        }
    }

    /// Plain-text rendering for table output.
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Integer(i) => i.to_string(),
            Self::Real(f) => format!("{:.2}", f),
            Self::Text(s) => s.clone(),
        }
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(Value::Null),
            Self::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            Self::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// Column names plus rows, as returned by the read-only query surface.
#[derive(Debug, Clone, Default)]
pub struct SelectOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Per-run counters written to `load_runs` when a collect run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadRunStats {
    /// Records pulled from the upstream, whether or not they loaded.
    pub fetched: u64,
    /// Records whose rows committed.
    pub loaded: u64,
    /// Records rejected during normalization.
    pub rejected: u64,
    /// Records whose store transaction failed.
    pub failed: u64,
}

/// One row of the `load_runs` table.
#[derive(Debug, Clone)]
pub struct LoadRun {
    pub id: i64,
    pub classification: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub stats: LoadRunStats,
}

/// Snapshot of what the store currently holds.
#[derive(Debug, Clone)]
pub struct StoreSummary {
    pub artifacts: u64,
    pub media_rows: u64,
    pub color_rows: u64,
    /// Artifact counts per classification, largest first.
    pub by_classification: Vec<(String, u64)>,
    pub last_run_started: Option<DateTime<Utc>>,
    pub last_run_completed: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_null_is_empty() {
        assert_eq!(CellValue::Null.render(), "");
    }

    #[test]
    fn test_render_integer() {
        assert_eq!(CellValue::Integer(42).render(), "42");
    }

    #[test]
    fn test_render_real_two_decimals() {
        assert_eq!(CellValue::Real(0.625).render(), "0.62");
        assert_eq!(CellValue::Real(3.0).render(), "3.00");
    }

    #[test]
    fn test_render_text_verbatim() {
        assert_eq!(CellValue::Text("Greek".to_string()).render(), "Greek");
    }
}
