//! SQLite-backed persistence for analysis results.
//!
//! Keeps a small project registry plus the latest analysis per project. The
//! scalar columns (classification, commit totals, main author) are queryable
//! without touching JSON; the full [`AnalysisResult`] is stored alongside as
//! a JSON blob and decoded on read. A blob that no longer decodes (schema
//! drift, manual edits) degrades to `details: None` instead of failing the
//! read.

use std::path::Path;

use chrono::Utc;
use collabscope_core::{Classification, CollabError, Result};
use collabscope_engine::AnalysisResult;
use rusqlite::{params, Connection, OptionalExtension, Row};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS projects (
    id                INTEGER PRIMARY KEY,
    name              TEXT NOT NULL UNIQUE,
    repo_path         TEXT NOT NULL,
    main_author_email TEXT,
    created_at        INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS project_analysis (
    project_id          INTEGER PRIMARY KEY
                        REFERENCES projects(id) ON DELETE CASCADE,
    classification      TEXT NOT NULL,
    total_commits       INTEGER NOT NULL,
    total_human_commits INTEGER NOT NULL,
    total_bot_commits   INTEGER NOT NULL,
    main_author_name    TEXT,
    main_author_email   TEXT,
    details             TEXT NOT NULL,
    analyzed_at         INTEGER NOT NULL
);
";

/// A registered repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Row id; stable for the lifetime of the store.
    pub id: i64,
    /// Unique project name.
    pub name: String,
    /// Repository path the project analyzes.
    pub repo_path: String,
    /// Preferred main-author email hint, if configured.
    pub main_author_email: Option<String>,
    /// When the project was registered, seconds since epoch.
    pub created_at: i64,
}

/// The latest stored analysis for a project.
///
/// The scalar fields are always present; `details` is `None` when the stored
/// JSON blob could not be decoded.
#[derive(Debug, Clone)]
pub struct StoredAnalysis {
    /// Owning project row id.
    pub project_id: i64,
    /// Stored classification.
    pub classification: Classification,
    /// Non-merge commits analyzed.
    pub total_commits: u32,
    /// Commits authored by human records.
    pub total_human_commits: u32,
    /// Commits authored by bot records.
    pub total_bot_commits: u32,
    /// Main author name at analysis time.
    pub main_author_name: Option<String>,
    /// Main author email at analysis time.
    pub main_author_email: Option<String>,
    /// Full decoded result, when the blob is still readable.
    pub details: Option<AnalysisResult>,
    /// When the analysis ran, seconds since epoch.
    pub analyzed_at: i64,
}

/// Handle to the on-disk (or in-memory) analysis database.
///
/// # Examples
///
/// ```
/// use collabscope_store::AnalysisStore;
///
/// let store = AnalysisStore::open_in_memory().unwrap();
/// let project = store.add_project("demo", "/tmp/demo", None).unwrap();
/// assert_eq!(store.list_projects().unwrap(), vec![project]);
/// ```
#[derive(Debug)]
pub struct AnalysisStore {
    conn: Connection,
}

impl AnalysisStore {
    /// Open (creating if needed) the database at `path` and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns [`CollabError::Store`] if the file cannot be opened or the
    /// schema cannot be applied.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(store_err)?;
        Self::initialize(conn)
    }

    /// Open a fresh in-memory database; used by tests and dry runs.
    ///
    /// # Errors
    ///
    /// Returns [`CollabError::Store`] if SQLite refuses the connection.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(store_err)?;
        conn.execute_batch(SCHEMA).map_err(store_err)?;
        Ok(Self { conn })
    }

    /// Register a project. Names are unique; re-adding an existing name is a
    /// store error.
    ///
    /// # Errors
    ///
    /// Returns [`CollabError::Store`] on constraint violations or I/O
    /// failures.
    pub fn add_project(
        &self,
        name: &str,
        repo_path: &str,
        main_author_email: Option<&str>,
    ) -> Result<Project> {
        let created_at = Utc::now().timestamp();
        self.conn
            .execute(
                "INSERT INTO projects (name, repo_path, main_author_email, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![name, repo_path, main_author_email, created_at],
            )
            .map_err(store_err)?;
        Ok(Project {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            repo_path: repo_path.to_string(),
            main_author_email: main_author_email.map(str::to_string),
            created_at,
        })
    }

    /// Look up a project by name.
    ///
    /// # Errors
    ///
    /// Returns [`CollabError::Store`] on query failure; an unknown name is
    /// `Ok(None)`.
    pub fn project_by_name(&self, name: &str) -> Result<Option<Project>> {
        self.conn
            .query_row(
                "SELECT id, name, repo_path, main_author_email, created_at
                 FROM projects WHERE name = ?1",
                params![name],
                project_from_row,
            )
            .optional()
            .map_err(store_err)
    }

    /// All registered projects, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`CollabError::Store`] on query failure.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, repo_path, main_author_email, created_at
                 FROM projects ORDER BY id",
            )
            .map_err(store_err)?;
        let rows = stmt
            .query_map([], project_from_row)
            .map_err(store_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err)?;
        Ok(rows)
    }

    /// Store `result` as the latest analysis for `project_id`, replacing any
    /// previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CollabError::Serialization`] if the result cannot be
    /// encoded and [`CollabError::Store`] on write failure, including an
    /// unknown `project_id`.
    pub fn upsert_analysis(&self, project_id: i64, result: &AnalysisResult) -> Result<()> {
        let details = serde_json::to_string(result)?;
        let (main_name, main_email) = result
            .main_author
            .as_ref()
            .map(|m| (m.name.clone(), m.email.clone()))
            .unwrap_or((None, None));
        self.conn
            .execute(
                "INSERT INTO project_analysis (
                     project_id, classification, total_commits,
                     total_human_commits, total_bot_commits,
                     main_author_name, main_author_email, details, analyzed_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(project_id) DO UPDATE SET
                     classification      = excluded.classification,
                     total_commits       = excluded.total_commits,
                     total_human_commits = excluded.total_human_commits,
                     total_bot_commits   = excluded.total_bot_commits,
                     main_author_name    = excluded.main_author_name,
                     main_author_email   = excluded.main_author_email,
                     details             = excluded.details,
                     analyzed_at         = excluded.analyzed_at",
                params![
                    project_id,
                    result.classification.to_string(),
                    result.totals.total_commits,
                    result.totals.total_human_commits,
                    result.totals.total_bot_commits,
                    main_name,
                    main_email,
                    details,
                    result.analyzed_at,
                ],
            )
            .map_err(store_err)?;
        Ok(())
    }

    /// The latest stored analysis for `project_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CollabError::Store`] on query failure. A details blob that
    /// fails to decode is logged and reported as `details: None`.
    pub fn latest_analysis(&self, project_id: i64) -> Result<Option<StoredAnalysis>> {
        self.conn
            .query_row(
                "SELECT project_id, classification, total_commits,
                        total_human_commits, total_bot_commits,
                        main_author_name, main_author_email, details, analyzed_at
                 FROM project_analysis WHERE project_id = ?1",
                params![project_id],
                stored_from_row,
            )
            .optional()
            .map_err(store_err)
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        repo_path: row.get(2)?,
        main_author_email: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn stored_from_row(row: &Row<'_>) -> rusqlite::Result<StoredAnalysis> {
    let project_id: i64 = row.get(0)?;
    let classification_raw: String = row.get(1)?;
    let details_raw: String = row.get(7)?;
    let details = match serde_json::from_str(&details_raw) {
        Ok(result) => Some(result),
        Err(err) => {
            tracing::warn!(project_id, %err, "stored analysis details failed to decode");
            None
        }
    };
    Ok(StoredAnalysis {
        project_id,
        classification: classification_raw
            .parse()
            .unwrap_or(Classification::Unclassified),
        total_commits: row.get(2)?,
        total_human_commits: row.get(3)?,
        total_bot_commits: row.get(4)?,
        main_author_name: row.get(5)?,
        main_author_email: row.get(6)?,
        details,
        analyzed_at: row.get(8)?,
    })
}

fn store_err(err: rusqlite::Error) -> CollabError {
    CollabError::Store(err.to_string())
}
