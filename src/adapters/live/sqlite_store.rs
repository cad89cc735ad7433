//! Link store backed by a SQLite database.
//!
//! The connection is shared behind a mutex and every statement runs on the
//! blocking pool, so callers on the async runtime never block a worker.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

use crate::link::{CorporateLink, StoredLink};
use crate::ports::link_store::{LinkStore, StoreError, StoreFuture};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS links (
    id TEXT PRIMARY KEY,
    third_party_id TEXT NOT NULL UNIQUE,
    third_party_username TEXT NOT NULL,
    corporate_id TEXT NOT NULL DEFAULT '',
    corporate_username TEXT NOT NULL,
    is_service_account INTEGER NOT NULL DEFAULT 0
);
";

const SELECT_COLUMNS: &str = "SELECT id, third_party_id, third_party_username, corporate_id, \
                              corporate_username, is_service_account FROM links";

/// SQLite link store.
pub struct SqliteLinkStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLinkStore {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the database cannot be opened or
    /// initialized.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("{}: failed to create directory: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path).map_err(|e| {
            StoreError::Unavailable(format!("{}: failed to open database: {e}", path.display()))
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| StoreError::Unavailable(format!("failed to set pragmas: {e}")))?;
        Self::with_connection(conn)
    }

    /// Opens a store that must already exist on disk.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the file is missing or cannot be opened.
    pub fn open_existing(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::Unavailable(format!(
                "{}: database does not exist",
                path.display()
            )));
        }
        Self::open(path)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(format!("failed to open database: {e}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Unavailable(format!("failed to create schema: {e}")))?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| StoreError::Backend(format!("connection lock poisoned: {e}")))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("database task failed: {e}")))?
    }
}

fn row_to_stored(row: &Row<'_>) -> rusqlite::Result<StoredLink> {
    Ok(StoredLink {
        id: row.get(0)?,
        link: CorporateLink {
            third_party_id: row.get(1)?,
            third_party_username: row.get(2)?,
            corporate_id: row.get(3)?,
            corporate_username: row.get(4)?,
            is_service_account: row.get(5)?,
        },
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

fn backend(err: &rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

impl LinkStore for SqliteLinkStore {
    fn get_all(&self) -> StoreFuture<'_, Vec<CorporateLink>> {
        Box::pin(self.run(|conn| {
            let unavailable = |e: rusqlite::Error| StoreError::Unavailable(e.to_string());
            let mut stmt =
                conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY rowid")).map_err(unavailable)?;
            let rows = stmt.query_map([], row_to_stored).map_err(unavailable)?;
            rows.map(|row| row.map(|s| s.link).map_err(unavailable)).collect()
        }))
    }

    fn get_by_external_id<'a>(
        &'a self,
        third_party_id: &'a str,
    ) -> StoreFuture<'a, Option<StoredLink>> {
        let third_party_id = third_party_id.to_string();
        Box::pin(self.run(move |conn| {
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE third_party_id = ?1"),
                params![third_party_id],
                row_to_stored,
            )
            .optional()
            .map_err(|e| backend(&e))
        }))
    }

    fn create<'a>(&'a self, link: &'a CorporateLink) -> StoreFuture<'a, String> {
        let link = link.clone();
        Box::pin(self.run(move |conn| {
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO links (id, third_party_id, third_party_username, corporate_id, \
                 corporate_username, is_service_account) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    link.third_party_id,
                    link.third_party_username,
                    link.corporate_id,
                    link.corporate_username,
                    link.is_service_account,
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::DuplicateKey(link.third_party_id.clone())
                } else {
                    backend(&e)
                }
            })?;
            Ok(id)
        }))
    }

    fn delete<'a>(&'a self, link: &'a StoredLink) -> StoreFuture<'a, ()> {
        let id = link.id.clone();
        Box::pin(self.run(move |conn| {
            let affected =
                conn.execute("DELETE FROM links WHERE id = ?1", params![id]).map_err(|e| backend(&e))?;
            if affected == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        }))
    }

    fn update<'a>(&'a self, link: &'a StoredLink) -> StoreFuture<'a, ()> {
        let stored = link.clone();
        Box::pin(self.run(move |conn| {
            let link = &stored.link;
            let affected = conn
                .execute(
                    "UPDATE links SET third_party_id = ?1, third_party_username = ?2, \
                     corporate_id = ?3, corporate_username = ?4, is_service_account = ?5 \
                     WHERE id = ?6",
                    params![
                        link.third_party_id,
                        link.third_party_username,
                        link.corporate_id,
                        link.corporate_username,
                        link.is_service_account,
                        stored.id,
                    ],
                )
                .map_err(|e| {
                    if is_constraint_violation(&e) {
                        StoreError::DuplicateKey(link.third_party_id.clone())
                    } else {
                        backend(&e)
                    }
                })?;
            if affected == 0 {
                return Err(StoreError::NotFound(stored.id.clone()));
            }
            Ok(())
        }))
    }
}
