//! Article repository.

use crate::domain::{Article, SortField, TimeMs};
use crate::error::DbError;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{info, warn};

/// Data access for the `article` table.
///
/// Borrows the pool owned by [`super::Database`] and keeps no state of its
/// own; every call goes to storage.
#[derive(Debug, Clone, Copy)]
pub struct ArticleRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ArticleRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        ArticleRepository { pool }
    }

    /// List up to `count` articles ordered by `sort`, skipping `offset` rows.
    ///
    /// An empty table yields an empty list.
    ///
    /// # Errors
    /// Returns `Query` if the select fails.
    pub async fn list_page(
        &self,
        sort: SortField,
        ascending: bool,
        offset: u32,
        count: u32,
    ) -> Result<Vec<Article>, DbError> {
        let direction = if ascending { "ASC" } else { "DESC" };
        // `sort` is a closed enum, so only known column names reach the SQL.
        let sql = format!(
            "SELECT id, date, title, content FROM article ORDER BY {} {} LIMIT ? OFFSET ?",
            sort.column(),
            direction
        );

        let articles = sqlx::query(&sql)
            .bind(i64::from(count))
            .bind(i64::from(offset))
            .fetch_all(self.pool)
            .await
            .and_then(|rows| rows.iter().map(row_to_article).collect::<Result<Vec<_>, _>>())
            .map_err(|e| {
                let context = format!(
                    "listing articles: sortedby: {} asc: {} offset: {} num: {}",
                    sort, ascending, offset, count
                );
                warn!("Error getting articles: {}: {}", context, e);
                DbError::query(context, e)
            })?;

        Ok(articles)
    }

    /// Fetch one article by id. `Ok(None)` if no row matches.
    ///
    /// # Errors
    /// Returns `Query` if the select fails.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>, DbError> {
        let row = sqlx::query("SELECT id, date, title, content FROM article WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .and_then(|row| row.as_ref().map(row_to_article).transpose())
            .map_err(|e| {
                warn!("get article error: loading article id: {}: {}", id, e);
                DbError::query(format!("loading article id: {}", id), e)
            })?;

        Ok(row)
    }

    /// Insert or update an article depending on whether it has an id.
    ///
    /// Returns the article as persisted: a new article comes back with the
    /// id assigned by SQLite. Updating an id that does not exist returns
    /// `Ok(None)` and changes nothing.
    ///
    /// # Errors
    /// Returns `Query` carrying the article if the write fails.
    pub async fn save(&self, article: &Article) -> Result<Option<Article>, DbError> {
        let result = match article.id {
            None => {
                info!(
                    "new article: title: {:?} date: {}",
                    article.title, article.date
                );
                sqlx::query("INSERT INTO article (content, title, date) VALUES (?, ?, ?)")
                    .bind(article.content.as_str())
                    .bind(article.title.as_str())
                    .bind(article.date.as_i64())
                    .execute(self.pool)
                    .await
                    .map(|done| Some(done.last_insert_rowid()))
            }
            Some(id) => {
                info!(
                    "update article {}: title: {:?} date: {}",
                    id, article.title, article.date
                );
                sqlx::query("UPDATE article SET content = ?, title = ?, date = ? WHERE id = ?")
                    .bind(article.content.as_str())
                    .bind(article.title.as_str())
                    .bind(article.date.as_i64())
                    .bind(id)
                    .execute(self.pool)
                    .await
                    .map(|done| (done.rows_affected() > 0).then_some(id))
            }
        };

        match result {
            Ok(Some(id)) => Ok(Some(article.clone().with_id(id))),
            Ok(None) => {
                info!("update article: no row with id {:?}", article.id);
                Ok(None)
            }
            Err(source) => {
                warn!("Error saving article {:?}: {}", article.id, source);
                Err(DbError::Query {
                    context: "saving article".to_string(),
                    article: Some(Box::new(article.clone())),
                    source,
                })
            }
        }
    }

    /// Total number of stored articles.
    ///
    /// # Errors
    /// Returns `Query` if the select fails.
    pub async fn count(&self) -> Result<i64, DbError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM article")
            .fetch_one(self.pool)
            .await
            .map_err(|e| DbError::query("counting articles", e))?;
        Ok(count)
    }
}

fn row_to_article(row: &SqliteRow) -> Result<Article, sqlx::Error> {
    let id: i64 = row.try_get("id")?;
    let date: Option<i64> = row.try_get("date")?;
    let title: Option<String> = row.try_get("title")?;
    let content: Option<String> = row.try_get("content")?;

    Ok(Article {
        id: Some(id),
        title: title.unwrap_or_default(),
        content: content.unwrap_or_default(),
        date: TimeMs::new(date.unwrap_or_default()),
    })
}
