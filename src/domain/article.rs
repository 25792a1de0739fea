//! Article value type and the columns it can be listed by.

use super::TimeMs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A blog article.
///
/// An article without an `id` has never been saved; saving it assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    /// Body text, may contain markup.
    pub content: String,
    pub date: TimeMs,
}

impl Article {
    /// Create an unsaved article.
    pub fn new(title: impl Into<String>, content: impl Into<String>, date: TimeMs) -> Self {
        Article {
            id: None,
            title: title.into(),
            content: content.into(),
            date,
        }
    }

    /// Return the same article keyed by `id`.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn date(&self) -> TimeMs {
        self.date
    }

    /// True if the article has not been persisted yet.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

/// Column an article listing can be ordered by.
///
/// Only these columns are ever interpolated into the `ORDER BY` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Id,
    Date,
    Title,
    Content,
}

impl SortField {
    /// The SQL column name.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Date => "date",
            SortField::Title => "title",
            SortField::Content => "content",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Error returned when parsing an unknown sort column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort field: {0}")]
pub struct SortFieldParseError(pub String);

impl FromStr for SortField {
    type Err = SortFieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(SortField::Id),
            "date" => Ok(SortField::Date),
            "title" => Ok(SortField::Title),
            "content" => Ok(SortField::Content),
            _ => Err(SortFieldParseError(s.to_string())),
        }
    }
}
