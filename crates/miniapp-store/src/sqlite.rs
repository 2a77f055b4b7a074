//! SQLite backend.
//!
//! One row per key. Writes are single statements (`INSERT .. ON CONFLICT DO
//! UPDATE`, `DELETE`), so each is atomic without transactions.

use crate::store::{BackendError, NotificationBackend};
use async_trait::async_trait;
use miniapp_core::NotificationDetails;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS notification_details (
    key TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    token TEXT NOT NULL,
    updated_at INTEGER NOT NULL
)";

#[derive(Debug, Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open (creating if missing) a database file.
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        tracing::info!("Opened notification database at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| BackendError::from("sqlite connection lock poisoned"))?;
            f(&conn).map_err(BackendError::from)
        })
        .await?
    }
}

#[async_trait]
impl NotificationBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<NotificationDetails>, BackendError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT url, token FROM notification_details WHERE key = ?1",
                params![key],
                |row| {
                    Ok(NotificationDetails::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                    ))
                },
            )
            .optional()
        })
        .await
    }

    async fn upsert(&self, key: &str, details: &NotificationDetails) -> Result<(), BackendError> {
        let key = key.to_string();
        let details = details.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO notification_details (key, url, token, updated_at)
                 VALUES (?1, ?2, ?3, CAST(strftime('%s', 'now') AS INTEGER))
                 ON CONFLICT(key) DO UPDATE SET
                    url = excluded.url,
                    token = excluded.token,
                    updated_at = excluded.updated_at",
                params![key, details.url, details.token],
            )
            .map(|_| ())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), BackendError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM notification_details WHERE key = ?1", params![key])
                .map(|_| ())
        })
        .await
    }
}
