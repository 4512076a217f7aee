//! Database schema definitions and migrations.

use rusqlite::Connection;

use super::error::StoreError;

/// Current schema version. Increment when making schema changes.
pub const SCHEMA_VERSION: i32 = 1;

/// Schema DDL for version 1.
const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS artifact_metadata (
    id INTEGER PRIMARY KEY,
    title TEXT,
    culture TEXT,
    period TEXT,
    century TEXT,
    medium TEXT,
    dimensions TEXT,
    description TEXT,
    department TEXT,
    classification TEXT,
    accessionyear INTEGER,
    creditline TEXT,
    first_loaded_at INTEGER NOT NULL,
    last_loaded_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_metadata_culture ON artifact_metadata(culture);
CREATE INDEX IF NOT EXISTS idx_metadata_classification ON artifact_metadata(classification);
CREATE INDEX IF NOT EXISTS idx_metadata_department ON artifact_metadata(department);

CREATE TABLE IF NOT EXISTS artifact_media (
    objectid INTEGER NOT NULL REFERENCES artifact_metadata(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    rank INTEGER
);

CREATE INDEX IF NOT EXISTS idx_media_objectid ON artifact_media(objectid);

CREATE TABLE IF NOT EXISTS artifact_colors (
    objectid INTEGER NOT NULL REFERENCES artifact_metadata(id) ON DELETE CASCADE,
    color TEXT,
    spectrum TEXT,
    hue TEXT,
    percent REAL,
    css3 TEXT
);

CREATE INDEX IF NOT EXISTS idx_colors_objectid ON artifact_colors(objectid);
CREATE INDEX IF NOT EXISTS idx_colors_hue ON artifact_colors(hue);

CREATE TABLE IF NOT EXISTS load_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    classification TEXT NOT NULL,
    started_at INTEGER NOT NULL,
    completed_at INTEGER,
    records_fetched INTEGER DEFAULT 0,
    records_loaded INTEGER DEFAULT 0,
    records_rejected INTEGER DEFAULT 0,
    records_failed INTEGER DEFAULT 0
);
"#;

/// Get the current schema version from the database.
pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32, StoreError> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> Result<(), StoreError> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

/// Initialize or migrate the database schema.
///
/// Idempotent and safe to call on both new and existing databases.
pub(crate) fn migrate(conn: &Connection) -> Result<(), StoreError> {
    let current_version = get_schema_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchemaVersion {
            found: current_version,
            expected: SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(SCHEMA_V1)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
        tracing::debug!("Initialized database schema at version {}", SCHEMA_VERSION);
    } else if current_version < SCHEMA_VERSION {
        for version in (current_version + 1)..=SCHEMA_VERSION {
            migrate_to_version(conn, version)?;
        }
    }

    Ok(())
}

/// Apply migration for a specific version.
fn migrate_to_version(conn: &Connection, version: i32) -> Result<(), StoreError> {
    // Future migrations go here, e.g.:
    // match version {
    //     2 => { conn.execute_batch("ALTER TABLE artifact_metadata ADD COLUMN ...")?; }
    //     _ => {}
    // }
    if version != SCHEMA_VERSION {
        tracing::warn!("Unexpected schema version {}, applying base schema", version);
    }
    conn.execute_batch(SCHEMA_V1)?;
    set_schema_version(conn, version)?;
    tracing::info!("Migrated database to schema version {}", version);
    Ok(())
}
