//! Artifact store trait and SQLite implementation.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension};

use super::error::StoreError;
use super::schema;
use super::types::{CellValue, LoadRun, LoadRunStats, SelectOutput, StoreSummary};
use crate::transform::TransformedRecord;

/// Trait for artifact store operations.
///
/// Object-safe so the ingest engine and query layer can share an
/// `Arc<dyn ArtifactStore>` without caring about the backing store.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Load one normalized record inside its own transaction.
    ///
    /// Upserts the metadata row keyed on id, then replaces that id's
    /// media and color rows wholesale. A failure rolls back this record
    /// only; previously loaded records stay committed.
    async fn load_record(&self, record: &TransformedRecord) -> Result<(), StoreError>;

    /// Record the start of a collect run and return its id.
    async fn start_load_run(&self, classification: &str) -> Result<i64, StoreError>;

    /// Complete a collect run with its final counters.
    async fn complete_load_run(&self, run_id: i64, stats: &LoadRunStats)
        -> Result<(), StoreError>;

    /// Snapshot of row counts, per-classification totals, and last run
    /// times.
    async fn summary(&self) -> Result<StoreSummary, StoreError>;

    /// Most recent load runs, newest first.
    async fn recent_load_runs(&self, limit: u32) -> Result<Vec<LoadRun>, StoreError>;

    /// Delete every artifact of a classification. Media and color rows
    /// go with their parents via `ON DELETE CASCADE`. Returns the number
    /// of artifacts removed.
    async fn delete_classification(&self, classification: &str) -> Result<u64, StoreError>;

    /// Read-only query surface for the predefined query catalog.
    async fn select(&self, sql: &str, params: &[CellValue]) -> Result<SelectOutput, StoreError>;
}

/// SQLite implementation of the artifact store.
pub struct SqliteArtifactStore {
    /// Wrapped in Mutex because rusqlite::Connection is not Sync.
    conn: Mutex<Connection>,
    /// Path to the database file (for error messages).
    path: PathBuf,
}

impl std::fmt::Debug for SqliteArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteArtifactStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteArtifactStore {
    /// Open or create a database at the given path.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let path = path.to_path_buf();
        let path_clone = path.clone();

        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path_clone).map_err(|e| StoreError::Open {
                path: path_clone.clone(),
                source: e,
            })?;
            configure_connection(&conn)?;
            schema::migrate(&conn)?;
            Ok::<_, StoreError>(conn)
        })
        .await??;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source: e,
        })?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(StoreError::Migration)?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Query(e.to_string()))
    }
}

/// Pragmas applied to every new connection.
fn configure_connection(conn: &Connection) -> Result<(), StoreError> {
    // WAL keeps readers unblocked during a load run
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(StoreError::Migration)?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(StoreError::Migration)?;
    // Referential integrity is off by default in SQLite
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(StoreError::Migration)?;
    Ok(())
}

#[async_trait]
impl ArtifactStore for SqliteArtifactStore {
    async fn load_record(&self, record: &TransformedRecord) -> Result<(), StoreError> {
        let id = record.metadata.id;
        let now = Utc::now().timestamp();

        let conn = self.lock()?;

        conn.execute("BEGIN TRANSACTION", [])
            .map_err(|source| StoreError::Load { id, source })?;

        let result = (|| {
            let m = &record.metadata;
            conn.prepare_cached(
                r#"
                INSERT INTO artifact_metadata (
                    id, title, culture, period, century, medium, dimensions,
                    description, department, classification, accessionyear,
                    creditline, first_loaded_at, last_loaded_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    culture = excluded.culture,
                    period = excluded.period,
                    century = excluded.century,
                    medium = excluded.medium,
                    dimensions = excluded.dimensions,
                    description = excluded.description,
                    department = excluded.department,
                    classification = excluded.classification,
                    accessionyear = excluded.accessionyear,
                    creditline = excluded.creditline,
                    last_loaded_at = excluded.last_loaded_at
                "#,
            )?
            .execute(rusqlite::params![
                m.id,
                m.title,
                m.culture,
                m.period,
                m.century,
                m.medium,
                m.dimensions,
                m.description,
                m.department,
                m.classification,
                m.accessionyear,
                m.creditline,
                now,
            ])?;

            // Children are replaced, not merged: the upstream is the
            // source of truth for what images and colors a record has.
            conn.prepare_cached("DELETE FROM artifact_media WHERE objectid = ?1")?
                .execute([id])?;
            conn.prepare_cached("DELETE FROM artifact_colors WHERE objectid = ?1")?
                .execute([id])?;

            let mut insert_media = conn.prepare_cached(
                "INSERT INTO artifact_media (objectid, url, rank) VALUES (?1, ?2, ?3)",
            )?;
            for media in &record.media {
                insert_media.execute(rusqlite::params![media.objectid, media.url, media.rank])?;
            }

            let mut insert_color = conn.prepare_cached(
                r#"
                INSERT INTO artifact_colors (objectid, color, spectrum, hue, percent, css3)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for color in &record.colors {
                insert_color.execute(rusqlite::params![
                    color.objectid,
                    color.color,
                    color.spectrum,
                    color.hue,
                    color.percent,
                    color.css3,
                ])?;
            }

            Ok::<_, rusqlite::Error>(())
        })();

        match result {
            Ok(()) => {
                conn.execute("COMMIT", [])
                    .map_err(|source| StoreError::Load { id, source })?;
                Ok(())
            }
            Err(source) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(StoreError::Load { id, source })
            }
        }
    }

    async fn start_load_run(&self, classification: &str) -> Result<i64, StoreError> {
        let started_at = Utc::now().timestamp();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO load_runs (classification, started_at) VALUES (?1, ?2)",
            rusqlite::params![classification, started_at],
        )
        .map_err(StoreError::query)?;

        Ok(conn.last_insert_rowid())
    }

    async fn complete_load_run(
        &self,
        run_id: i64,
        stats: &LoadRunStats,
    ) -> Result<(), StoreError> {
        let completed_at = Utc::now().timestamp();

        let conn = self.lock()?;
        conn.execute(
            r#"
            UPDATE load_runs SET
                completed_at = ?1,
                records_fetched = ?2,
                records_loaded = ?3,
                records_rejected = ?4,
                records_failed = ?5
            WHERE id = ?6
            "#,
            rusqlite::params![
                completed_at,
                stats.fetched as i64,
                stats.loaded as i64,
                stats.rejected as i64,
                stats.failed as i64,
                run_id,
            ],
        )
        .map_err(StoreError::query)?;

        Ok(())
    }

    async fn summary(&self) -> Result<StoreSummary, StoreError> {
        let conn = self.lock()?;

        let count = |table: &str| -> Result<u64, StoreError> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as u64)
            .map_err(StoreError::query)
        };

        let artifacts = count("artifact_metadata")?;
        let media_rows = count("artifact_media")?;
        let color_rows = count("artifact_colors")?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT COALESCE(classification, '(unclassified)'), COUNT(*)
                FROM artifact_metadata
                GROUP BY classification
                ORDER BY COUNT(*) DESC, classification
                "#,
            )
            .map_err(StoreError::query)?;
        let by_classification = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })
            .map_err(StoreError::query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query)?;

        let last_run: Option<(Option<i64>, Option<i64>)> = conn
            .query_row(
                "SELECT started_at, completed_at FROM load_runs ORDER BY id DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(StoreError::query)?;

        let (last_run_started, last_run_completed) = match last_run {
            Some((started, completed)) => (
                started.and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
                completed.and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
            ),
            None => (None, None),
        };

        Ok(StoreSummary {
            artifacts,
            media_rows,
            color_rows,
            by_classification,
            last_run_started,
            last_run_completed,
        })
    }

    async fn recent_load_runs(&self, limit: u32) -> Result<Vec<LoadRun>, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, classification, started_at, completed_at,
                       records_fetched, records_loaded, records_rejected, records_failed
                FROM load_runs
                ORDER BY id DESC
                LIMIT ?1
                "#,
            )
            .map_err(StoreError::query)?;

        let runs = stmt
            .query_map([limit], |row| {
                let started_at: i64 = row.get(2)?;
                let completed_at: Option<i64> = row.get(3)?;
                Ok(LoadRun {
                    id: row.get(0)?,
                    classification: row.get(1)?,
                    started_at: Utc
                        .timestamp_opt(started_at, 0)
                        .single()
                        .unwrap_or(chrono::DateTime::UNIX_EPOCH),
                    completed_at: completed_at.and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
                    stats: LoadRunStats {
                        fetched: row.get::<_, i64>(4)? as u64,
                        loaded: row.get::<_, i64>(5)? as u64,
                        rejected: row.get::<_, i64>(6)? as u64,
                        failed: row.get::<_, i64>(7)? as u64,
                    },
                })
            })
            .map_err(StoreError::query)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query)?;

        Ok(runs)
    }

    async fn delete_classification(&self, classification: &str) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let removed = conn
            .execute(
                "DELETE FROM artifact_metadata WHERE classification = ?1",
                [classification],
            )
            .map_err(StoreError::query)?;
        Ok(removed as u64)
    }

    async fn select(&self, sql: &str, params: &[CellValue]) -> Result<SelectOutput, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(sql).map_err(StoreError::query)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();

        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(StoreError::query)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(StoreError::query)? {
            let mut cells = Vec::with_capacity(column_count);
            for index in 0..column_count {
                let value = row.get_ref(index).map_err(StoreError::query)?;
                cells.push(CellValue::from_value_ref(value));
            }
            out.push(cells);
        }

        Ok(SelectOutput { columns, rows: out })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{ColorRow, MediaRow, MetadataRow};
    use std::fs;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("artifact_store_tests")
            .join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn record(id: i64, title: &str, culture: &str, classification: &str) -> TransformedRecord {
        TransformedRecord {
            metadata: MetadataRow {
                id,
                title: Some(title.to_string()),
                culture: Some(culture.to_string()),
                period: None,
                century: None,
                medium: None,
                dimensions: None,
                description: None,
                department: None,
                classification: Some(classification.to_string()),
                accessionyear: None,
                creditline: None,
            },
            media: Vec::new(),
            colors: Vec::new(),
        }
    }

    fn record_with_children(id: i64) -> TransformedRecord {
        let mut rec = record(id, "Amphora", "Greek", "Vessels");
        rec.media = vec![
            MediaRow {
                objectid: id,
                url: format!("https://example.test/{}-a.jpg", id),
                rank: Some(0),
            },
            MediaRow {
                objectid: id,
                url: format!("https://example.test/{}-b.jpg", id),
                rank: None,
            },
        ];
        rec.colors = vec![ColorRow {
            objectid: id,
            color: Some("Brown".to_string()),
            spectrum: None,
            hue: Some("Orange".to_string()),
            percent: Some(0.6),
            css3: Some("#8b4513".to_string()),
        }];
        rec
    }

    #[tokio::test]
    async fn test_open_creates_db() {
        let dir = test_dir("open_creates");
        let path = dir.join("artifacts.db");
        let _store = SqliteArtifactStore::open(&path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_load_record_creates_rows() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        store.load_record(&record_with_children(42)).await.unwrap();

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.artifacts, 1);
        assert_eq!(summary.media_rows, 2);
        assert_eq!(summary.color_rows, 1);
    }

    #[tokio::test]
    async fn test_double_load_is_idempotent() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        let rec = record_with_children(42);
        store.load_record(&rec).await.unwrap();
        store.load_record(&rec).await.unwrap();

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.artifacts, 1);
        // Children are replaced, not appended
        assert_eq!(summary.media_rows, 2);
        assert_eq!(summary.color_rows, 1);
    }

    #[tokio::test]
    async fn test_reload_replaces_children() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        store.load_record(&record_with_children(42)).await.unwrap();

        let mut updated = record(42, "Amphora (repaired)", "Greek", "Vessels");
        updated.media = vec![MediaRow {
            objectid: 42,
            url: "https://example.test/new.jpg".to_string(),
            rank: Some(1),
        }];
        store.load_record(&updated).await.unwrap();

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.artifacts, 1);
        assert_eq!(summary.media_rows, 1);
        assert_eq!(summary.color_rows, 0);

        let result = store
            .select("SELECT title FROM artifact_metadata WHERE id = 42", &[])
            .await
            .unwrap();
        assert_eq!(
            result.rows[0][0],
            CellValue::Text("Amphora (repaired)".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_orphan_children_after_load() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        store.load_record(&record_with_children(1)).await.unwrap();
        store.load_record(&record_with_children(2)).await.unwrap();

        let orphans = store
            .select(
                r#"
                SELECT COUNT(*) AS n FROM artifact_media
                WHERE objectid NOT IN (SELECT id FROM artifact_metadata)
                "#,
                &[],
            )
            .await
            .unwrap();
        assert_eq!(orphans.rows[0][0], CellValue::Integer(0));
    }

    #[tokio::test]
    async fn test_delete_classification_cascades() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        store.load_record(&record_with_children(1)).await.unwrap();
        store.load_record(&record_with_children(2)).await.unwrap();
        store
            .load_record(&record(3, "Coin", "Roman", "Coins"))
            .await
            .unwrap();

        let removed = store.delete_classification("Vessels").await.unwrap();
        assert_eq!(removed, 2);

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.artifacts, 1);
        assert_eq!(summary.media_rows, 0);
        assert_eq!(summary.color_rows, 0);
    }

    #[tokio::test]
    async fn test_summary_by_classification() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        store
            .load_record(&record(1, "Amphora", "Greek", "Vessels"))
            .await
            .unwrap();
        store
            .load_record(&record(2, "Krater", "Greek", "Vessels"))
            .await
            .unwrap();
        store
            .load_record(&record(3, "Denarius", "Roman", "Coins"))
            .await
            .unwrap();

        let summary = store.summary().await.unwrap();
        assert_eq!(
            summary.by_classification,
            vec![("Vessels".to_string(), 2), ("Coins".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_load_run_lifecycle() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();

        let run_id = store.start_load_run("Vessels").await.unwrap();
        assert!(run_id > 0);

        let stats = LoadRunStats {
            fetched: 100,
            loaded: 95,
            rejected: 3,
            failed: 2,
        };
        store.complete_load_run(run_id, &stats).await.unwrap();

        let runs = store.recent_load_runs(10).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].classification, "Vessels");
        assert_eq!(runs[0].stats, stats);
        assert!(runs[0].completed_at.is_some());

        let summary = store.summary().await.unwrap();
        assert!(summary.last_run_started.is_some());
        assert!(summary.last_run_completed.is_some());
    }

    #[tokio::test]
    async fn test_recent_load_runs_newest_first() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        let first = store.start_load_run("Vessels").await.unwrap();
        let second = store.start_load_run("Coins").await.unwrap();

        let runs = store.recent_load_runs(10).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, second);
        assert_eq!(runs[1].id, first);

        let limited = store.recent_load_runs(1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, second);
    }

    #[tokio::test]
    async fn test_select_binds_params() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        store
            .load_record(&record(1, "Amphora", "Greek", "Vessels"))
            .await
            .unwrap();
        store
            .load_record(&record(2, "Denarius", "Roman", "Coins"))
            .await
            .unwrap();

        let result = store
            .select(
                "SELECT id, title FROM artifact_metadata WHERE culture = ?1 ORDER BY id",
                &[CellValue::Text("Greek".to_string())],
            )
            .await
            .unwrap();

        assert_eq!(result.columns, vec!["id", "title"]);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0][0], CellValue::Integer(1));
        assert_eq!(result.rows[0][1], CellValue::Text("Amphora".to_string()));
    }

    #[tokio::test]
    async fn test_select_surfaces_null_cells() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        store
            .load_record(&record(1, "Amphora", "Greek", "Vessels"))
            .await
            .unwrap();

        let result = store
            .select("SELECT medium FROM artifact_metadata WHERE id = 1", &[])
            .await
            .unwrap();
        assert_eq!(result.rows[0][0], CellValue::Null);
    }
}
