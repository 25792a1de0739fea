use crate::domain::Article;
use thiserror::Error;

/// Errors raised by the persistence layer.
///
/// `StorageOpen`, `Schema` and `CorruptConfig` are fatal to startup. `Query`
/// only affects the call that produced it; the handle stays usable.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unable to open database {path}: {source}")]
    StorageOpen {
        path: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Unable to create table {table}: {source}")]
    Schema {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("Query failed ({context}): {source}")]
    Query {
        context: String,
        /// The article being saved, when the failure came from a save.
        article: Option<Box<Article>>,
        #[source]
        source: sqlx::Error,
    },
    #[error("Stored config value for {key} is not valid JSON: {source}")]
    CorruptConfig {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config key {0:?}: must be 1 to 32 characters")]
    InvalidConfigKey(String),
    #[error("Database is not open")]
    NotOpen,
}

impl DbError {
    pub(crate) fn query(context: impl Into<String>, source: sqlx::Error) -> Self {
        DbError::Query {
            context: context.into(),
            article: None,
            source,
        }
    }

    /// The article attached to a failed save, if any.
    pub fn article(&self) -> Option<&Article> {
        match self {
            DbError::Query { article, .. } => article.as_deref(),
            _ => None,
        }
    }
}
