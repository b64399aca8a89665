//! SQLite-backed URL store.
//!
//! WAL journaling with a busy timeout; a single pooled connection avoids
//! persistent "database is locked" failures under concurrent writers. Alias
//! uniqueness is enforced by the UNIQUE constraint rather than a
//! check-then-insert, so concurrent saves of one alias have exactly one
//! winner.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};

use super::{StoreError, UrlRecord};

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Unavailable(e.to_string()))?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))
            .map_err(StoreError::from_sqlx)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(StoreError::from_sqlx)?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS url (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                url        TEXT    NOT NULL,
                alias      TEXT    NOT NULL UNIQUE,
                user_id    INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_url_user ON url(user_id, updated_at DESC)")
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    /// Insert a new record owned by `user_id` and return its row id.
    /// A live record with the same alias fails with `AliasExists`.
    pub async fn save_url(&self, url: &str, alias: &str, user_id: i64) -> Result<i64, StoreError> {
        let now = chrono::Utc::now().timestamp_millis();
        let res = sqlx::query(
            "INSERT INTO url (url, alias, user_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(url)
        .bind(alias)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(res.last_insert_rowid())
    }

    /// Resolve an alias to its target. Public read: no ownership filter.
    pub async fn get_url(&self, alias: &str) -> Result<String, StoreError> {
        let row = sqlx::query("SELECT url FROM url WHERE alias = ?")
            .bind(alias)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        match row {
            Some(r) => r.try_get("url").map_err(StoreError::from_sqlx),
            None => Err(StoreError::NotFound),
        }
    }

    /// All records owned by `user_id`, most recently updated first. Zero rows
    /// is a valid outcome, not an error.
    pub async fn get_user_urls(&self, user_id: i64) -> Result<Vec<UrlRecord>, StoreError> {
        sqlx::query_as::<_, UrlRecord>(
            "SELECT id, url, alias, user_id, created_at, updated_at FROM url
             WHERE user_id = ? ORDER BY updated_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    /// Ownership-gated delete. The owner lookup and the deletion run inside
    /// one transaction so no concurrent delete or re-insert can slip between
    /// the check and the mutation; an early return drops the transaction and
    /// rolls back.
    pub async fn delete_url(&self, alias: &str, user_id: i64, is_admin: bool) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from_sqlx)?;

        let row = sqlx::query("SELECT user_id FROM url WHERE alias = ?")
            .bind(alias)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;
        let owner: i64 = match row {
            Some(r) => r.try_get("user_id").map_err(StoreError::from_sqlx)?,
            None => return Err(StoreError::NotFound),
        };
        if !is_admin && owner != user_id {
            return Err(StoreError::NotOwned);
        }

        sqlx::query("DELETE FROM url WHERE alias = ?")
            .bind(alias)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;

        tx.commit().await.map_err(StoreError::from_sqlx)
    }
}
