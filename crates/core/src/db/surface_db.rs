use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::db::{CheckRunRecord, CheckRunStatus, SnapshotRecord};
use crate::snapshot::{Snapshot, SnapshotError};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for project database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },

    /// Snapshot labels are unique; saving over an existing one needs an explicit delete.
    #[error("Snapshot '{0}' already exists")]
    SnapshotExists(String),

    /// A stored snapshot body no longer parses or fails its hash check.
    #[error("Stored snapshot '{label}' is unreadable: {source}")]
    CorruptSnapshot {
        label: String,
        #[source]
        source: SnapshotError,
    },

    #[error("Unknown check run status '{0}' in database")]
    UnknownStatus(String),
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// SQLite-backed store for snapshots and check runs.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Providing small, testable helpers for querying and updating records.
#[derive(Debug)]
pub struct SurfaceDb {
    conn: Connection,
}

impl SurfaceDb {
    /// Open (or create) a database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database, used by tests and one-shot tooling.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Store a snapshot and return its row id. Fails if the label is taken.
    pub fn insert_snapshot(&self, snapshot: &Snapshot) -> DbResult<i64> {
        if self.snapshot_exists(&snapshot.label)? {
            return Err(DbError::SnapshotExists(snapshot.label.clone()));
        }
        let body = snapshot
            .to_json()
            .map_err(|source| DbError::CorruptSnapshot { label: snapshot.label.clone(), source })?;
        self.conn.execute(
            r#"
            INSERT INTO snapshots (label, format_version, created_at, content_hash, descriptor_count, body)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                snapshot.label,
                snapshot.format_version,
                snapshot.created_at,
                snapshot.content_hash,
                snapshot.descriptors.len() as i64,
                body
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn snapshot_exists(&self, label: &str) -> DbResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT id FROM snapshots WHERE label = ?1", params![label], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    /// Load a full snapshot by label.
    pub fn load_snapshot(&self, label: &str) -> DbResult<Option<Snapshot>> {
        let body: Option<String> = self
            .conn
            .query_row("SELECT body FROM snapshots WHERE label = ?1", params![label], |row| {
                row.get(0)
            })
            .optional()?;
        body.map(|b| parse_snapshot(label, &b)).transpose()
    }

    /// The most recently stored snapshot, if any.
    pub fn latest_snapshot(&self) -> DbResult<Option<Snapshot>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT label, body FROM snapshots ORDER BY id DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        row.map(|(label, body)| parse_snapshot(&label, &body)).transpose()
    }

    /// List snapshot summaries (ordered by id).
    pub fn list_snapshots(&self) -> DbResult<Vec<SnapshotRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT label, created_at, content_hash, descriptor_count
            FROM snapshots
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SnapshotRecord {
                label: row.get(0)?,
                created_at: row.get(1)?,
                content_hash: row.get(2)?,
                descriptor_count: row.get::<_, i64>(3)? as usize,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Delete a snapshot by label. Returns the number of rows affected.
    pub fn delete_snapshot(&self, label: &str) -> DbResult<usize> {
        Ok(self.conn.execute("DELETE FROM snapshots WHERE label = ?1", params![label])?)
    }

    /// Insert a check run record and return its row id.
    pub fn insert_check_run(&self, record: &CheckRunRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO check_runs (source, manifest, snapshot_label, status, descriptor_count, diagnostic_count, violation_count, started_at, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.source,
                record.manifest,
                record.snapshot_label,
                record.status.as_str(),
                record.descriptor_count as i64,
                record.diagnostic_count as i64,
                record.violation_count as i64,
                record.started_at,
                record.finished_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List check runs, oldest first.
    pub fn list_check_runs(&self) -> DbResult<Vec<CheckRunRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT source, manifest, snapshot_label, status, descriptor_count, diagnostic_count, violation_count, started_at, finished_at
            FROM check_runs
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (source, manifest, snapshot_label, status, descriptors, diagnostics, violations, started_at, finished_at) =
                row?;
            let status = CheckRunStatus::parse(&status).ok_or(DbError::UnknownStatus(status))?;
            out.push(CheckRunRecord {
                source,
                manifest,
                snapshot_label,
                status,
                descriptor_count: descriptors as usize,
                diagnostic_count: diagnostics as usize,
                violation_count: violations as usize,
                started_at,
                finished_at,
            });
        }
        Ok(out)
    }
}

fn parse_snapshot(label: &str, body: &str) -> DbResult<Snapshot> {
    Snapshot::from_json(body)
        .map_err(|source| DbError::CorruptSnapshot { label: label.to_string(), source })
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: snapshots table
/// - 2: check_runs table
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version < 1 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS snapshots (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                label            TEXT NOT NULL UNIQUE,
                format_version   INTEGER NOT NULL,
                created_at       TEXT NOT NULL,
                content_hash     TEXT NOT NULL,
                descriptor_count INTEGER NOT NULL,
                body             TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS check_runs (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                source           TEXT NOT NULL,
                manifest         TEXT,
                snapshot_label   TEXT,
                status           TEXT NOT NULL,
                descriptor_count INTEGER NOT NULL,
                diagnostic_count INTEGER NOT NULL,
                violation_count  INTEGER NOT NULL,
                started_at       TEXT NOT NULL,
                finished_at      TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
