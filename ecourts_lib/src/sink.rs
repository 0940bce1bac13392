//! SQLite history store for searches and their results.
//!
//! Writes go through a short-lived connection per call so concurrent
//! searches never contend on a shared handle; WAL keeps readers unblocked.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use ecourts_api::types::{CaseRecord, RawResponse, SearchQuery};
use ecourts_api::PortalKind;

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One row of search history: the query, and the outcome if one was
/// recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRow {
    pub id: i64,
    pub court_type: String,
    pub query: SearchQuery,
    pub recorded_at: String,
    pub case_data: Option<CaseRecord>,
}

pub struct ResultSink {
    path: PathBuf,
}

impl ResultSink {
    /// Opens (creating if needed) the history database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let sink = Self { path };
        let conn = sink.connect()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS queries (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 court_type TEXT NOT NULL,
                 query_params TEXT NOT NULL,
                 recorded_at DATETIME DEFAULT CURRENT_TIMESTAMP
             );
             CREATE TABLE IF NOT EXISTS case_results (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 query_id INTEGER,
                 case_data TEXT NOT NULL,
                 raw_response TEXT,
                 session_id TEXT,
                 recorded_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                 FOREIGN KEY (query_id) REFERENCES queries(id)
             );",
        )?;
        Ok(sink)
    }

    fn connect(&self) -> Result<Connection, SinkError> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(conn)
    }

    /// Registers a query and returns its durable id.
    pub fn record_query(&self, kind: PortalKind, query: &SearchQuery) -> Result<i64, SinkError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO queries (court_type, query_params) VALUES (?1, ?2)",
            params![kind.as_str(), serde_json::to_string(query)?],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Records the outcome of a query: the parsed record, or `None` for a
    /// clean miss. The raw portal reply is kept verbatim for audit.
    pub fn record_result(
        &self,
        query_id: i64,
        record: Option<&CaseRecord>,
        raw: &RawResponse,
    ) -> Result<(), SinkError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO case_results (query_id, case_data, raw_response, session_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                query_id,
                serde_json::to_string(&record)?,
                raw.payload,
                raw.session_id
            ],
        )?;
        Ok(())
    }

    /// Most recent queries first, joined with their recorded outcome.
    pub fn history(&self, limit: u32) -> Result<Vec<QueryRow>, SinkError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT q.id, q.court_type, q.query_params, q.recorded_at, cr.case_data
             FROM queries q
             LEFT JOIN case_results cr ON q.id = cr.query_id
             ORDER BY q.id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut history = Vec::new();
        for row in rows {
            let (id, court_type, query_json, recorded_at, case_json) = row?;
            history.push(QueryRow {
                id,
                court_type,
                query: serde_json::from_str(&query_json)?,
                recorded_at,
                case_data: match case_json {
                    Some(json) => serde_json::from_str(&json)?,
                    None => None,
                },
            });
        }
        Ok(history)
    }

    /// The raw portal reply stored for a query, if any.
    pub fn raw_response(&self, query_id: i64) -> Result<Option<String>, SinkError> {
        let conn = self.connect()?;
        let raw = conn
            .query_row(
                "SELECT raw_response FROM case_results WHERE query_id = ?1",
                params![query_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(raw.flatten())
    }
}
