//! Database lifecycle: open and bootstrap at startup, flush config and close at
//! shutdown.

use super::articles::ArticleRepository;
use super::config_store::ConfigStore;
use super::migrations::load_or_create;
use crate::config::Config;
use crate::error::DbError;
use futures::future::join_all;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::{error, info, warn};

/// Owns the database handle and the in-memory config map.
#[derive(Debug)]
pub struct Database {
    path: String,
    version: u32,
    pool: Option<SqlitePool>,
    config: ConfigStore,
}

impl Database {
    /// Create an unopened database for the configured path and version.
    pub fn new(config: &Config) -> Self {
        Database {
            path: config.database_path.clone(),
            version: config.db_version,
            pool: None,
            config: ConfigStore::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.pool.is_some()
    }

    /// Open the database file, creating it if absent, then load the stored
    /// config or bootstrap the schema.
    ///
    /// Returns only once the database is ready for use. Opening an already
    /// open database does nothing.
    ///
    /// # Errors
    /// `StorageOpen` if the file cannot be opened; `Schema` or
    /// `CorruptConfig` if bootstrap or config loading fails.
    pub async fn open(&mut self) -> Result<(), DbError> {
        if self.pool.is_some() {
            warn!("Database {} is already open", self.path);
            return Ok(());
        }

        if let Some(parent) = Path::new(&self.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true);

        // A single connection: SQLite's own locking serializes every
        // statement issued through the handle.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .after_connect(|conn, _meta| Box::pin(async move { configure_pragmas_conn(conn).await }))
            .connect_with(options)
            .await
            .map_err(|source| {
                error!(
                    "Unable to open database: database name: {}, error: {}",
                    self.path, source
                );
                DbError::StorageOpen {
                    path: self.path.clone(),
                    source,
                }
            })?;

        // The map must mirror storage, not a previous session.
        self.config = ConfigStore::new();
        if let Err(err) = load_or_create(&pool, &mut self.config, self.version).await {
            error!("Database bootstrap failed for {}: {}", self.path, err);
            pool.close().await;
            return Err(err);
        }

        info!("Database opened at {}", self.path);
        self.pool = Some(pool);
        Ok(())
    }

    /// Write every config entry back to the config table, delete the rows of
    /// removed keys, and close the handle.
    ///
    /// The writes run concurrently. A failed write is logged and does not
    /// stop the others; close itself never fails. Closing a database that
    /// was never opened does nothing.
    pub async fn close(&mut self) {
        let Some(pool) = self.pool.take() else {
            return;
        };

        let pool_ref = &pool;
        let upserts = self
            .config
            .iter()
            .map(|(key, value)| (key.as_str(), Some(value.to_string())));
        let deletes = self.config.removed().map(|key| (key.as_str(), None));

        let writes = upserts.chain(deletes).map(|(key, val)| async move {
            let result = match &val {
                Some(val) => {
                    sqlx::query("INSERT OR REPLACE INTO config (key, val) VALUES (?, ?)")
                        .bind(key)
                        .bind(val.as_str())
                        .execute(pool_ref)
                        .await
                }
                None => {
                    sqlx::query("DELETE FROM config WHERE key = ?")
                        .bind(key)
                        .execute(pool_ref)
                        .await
                }
            };
            if let Err(e) = &result {
                warn!(
                    "Error: writing settings back to database: key: {} val: {} err: {}",
                    key,
                    val.as_deref().unwrap_or("<removed>"),
                    e
                );
            }
            result.is_ok()
        });

        let outcomes = join_all(writes).await;
        let failed = outcomes.iter().filter(|ok| !**ok).count();
        info!(
            "Config flushed: {} written, {} failed",
            outcomes.len() - failed,
            failed
        );
        self.config.clear_removed();

        pool.close().await;
        info!("Database {} closed", self.path);
    }

    /// Article operations against the open handle.
    ///
    /// # Errors
    /// Returns `NotOpen` if the database is not open.
    pub fn articles(&self) -> Result<ArticleRepository<'_>, DbError> {
        self.pool
            .as_ref()
            .map(ArticleRepository::new)
            .ok_or(DbError::NotOpen)
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Mutable access to the config map. Changes are persisted on close.
    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.config
    }
}

/// Configure SQLite pragmas for each new connection.
async fn configure_pragmas_conn(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    use sqlx::Row;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;

    // journal_mode returns the actual mode set; must use fetch to get result
    let row = sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?;
    let journal_mode: String = row.get(0);
    info!("SQLite journal_mode set to: {}", journal_mode);

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&mut *conn)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        let path = temp_dir
            .path()
            .join("blog.db")
            .to_string_lossy()
            .to_string();
        Config::new(path, 5)
    }

    #[tokio::test]
    async fn test_close_without_open_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = Database::new(&test_config(&temp_dir));
        db.close().await;
        assert!(!db.is_open());
        assert!(!Path::new(db.path()).exists());
    }

    #[tokio::test]
    async fn test_articles_requires_open() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(&test_config(&temp_dir));
        assert!(matches!(db.articles(), Err(DbError::NotOpen)));
    }

    #[tokio::test]
    async fn test_open_creates_file_and_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = Database::new(&test_config(&temp_dir));

        db.open().await.expect("open failed");
        assert!(db.is_open());
        assert!(Path::new(db.path()).exists());
        assert_eq!(db.config(), &ConfigStore::defaults(5));

        // Second open is a no-op.
        db.open().await.expect("reopen failed");
        db.close().await;
        assert!(!db.is_open());
    }

    #[tokio::test]
    async fn test_reopen_discards_unsaved_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = Database::new(&test_config(&temp_dir));
        db.open().await.unwrap();
        db.close().await;

        // Set while closed: never flushed, so it must not survive open().
        db.config_mut().set("stale", json!(true)).unwrap();
        db.open().await.unwrap();
        assert_eq!(db.config(), &ConfigStore::defaults(5));
        db.close().await;
    }

    #[tokio::test]
    async fn test_open_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/blog.db");
        let mut db = Database::new(&Config::new(path.to_string_lossy(), 1));

        db.open().await.expect("open failed");
        assert!(path.exists());
        db.close().await;
    }

    #[tokio::test]
    async fn test_config_changes_persist_across_close() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let mut db = Database::new(&config);
        db.open().await.unwrap();
        db.config_mut().set("title", json!("My Blog")).unwrap();
        db.close().await;

        let mut db = Database::new(&config);
        db.open().await.unwrap();
        assert_eq!(db.config().get("title"), Some(&json!("My Blog")));
        assert_eq!(db.config().get("version"), Some(&json!(5)));
        db.close().await;
    }
}
