//! Schema bootstrap: load the stored config, or create the schema on first run.

use super::config_store::ConfigStore;
use crate::error::DbError;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::{error, info};

pub const CONFIG_TABLE: &str = "config";
pub const ARTICLE_TABLE: &str = "article";
pub const ASSETS_TABLE: &str = "assets";

const CREATE_CONFIG: &str = r#"
    CREATE TABLE config (
        id INTEGER PRIMARY KEY ASC,
        key CHAR(32) UNIQUE,
        val TEXT
    )
"#;

const CREATE_ARTICLE: &str = r#"
    CREATE TABLE article (
        id INTEGER PRIMARY KEY ASC,
        date INTEGER,
        title TEXT,
        content TEXT
    )
"#;

// No repository operations exist for assets yet; the table is reserved.
const CREATE_ASSETS: &str = r#"
    CREATE TABLE assets (
        id INTEGER PRIMARY KEY ASC,
        date INTEGER,
        originName TEXT,
        mime CHAR(64),
        content BLOB
    )
"#;

/// Domain tables, created in this order after the config table.
const DOMAIN_TABLES: [(&str, &str); 2] = [
    (ARTICLE_TABLE, CREATE_ARTICLE),
    (ASSETS_TABLE, CREATE_ASSETS),
];

/// Populate `store` from the config table, bootstrapping the schema if the
/// table cannot be read.
///
/// A failed read is taken to mean a fresh database. In that case the config
/// table is created, `store` is reset to its defaults and the domain tables
/// are created one after another. A failure part way through leaves the
/// tables created so far in place.
///
/// # Errors
/// `Schema` if a table cannot be created, `CorruptConfig` if a stored value
/// is not valid JSON.
pub async fn load_or_create(
    pool: &SqlitePool,
    store: &mut ConfigStore,
    version: u32,
) -> Result<(), DbError> {
    match sqlx::query("SELECT key, val FROM config")
        .fetch_all(pool)
        .await
    {
        Ok(rows) => {
            for row in rows {
                let key: String = row
                    .try_get("key")
                    .map_err(|e| DbError::query("reading config key", e))?;
                let val: Option<String> = row
                    .try_get("val")
                    .map_err(|e| DbError::query(format!("reading config value {}", key), e))?;
                store.insert_raw(key, val.as_deref().unwrap_or("null"))?;
            }
            info!("Database config loaded: {} entries", store.len());
            Ok(())
        }
        Err(err) => {
            info!(
                "got error: {} reading config, assuming table does not exist",
                err
            );
            bootstrap(pool, store, version).await
        }
    }
}

async fn bootstrap(pool: &SqlitePool, store: &mut ConfigStore, version: u32) -> Result<(), DbError> {
    info!("Create '{}' table", CONFIG_TABLE);
    create_table(pool, CONFIG_TABLE, CREATE_CONFIG).await?;

    store.reset_to_defaults(version);

    for (table, ddl) in DOMAIN_TABLES {
        create_table(pool, table, ddl).await?;
    }

    info!("Database schema created at version {}", version);
    Ok(())
}

async fn create_table(pool: &SqlitePool, table: &'static str, ddl: &str) -> Result<(), DbError> {
    sqlx::query(ddl).execute(pool).await.map_err(|source| {
        error!("Error creating table {}: {}", table, source);
        DbError::Schema { table, source }
    })?;
    Ok(())
}
