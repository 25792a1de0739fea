pub mod config;
pub mod db;
pub mod domain;
pub mod error;

pub use config::Config;
pub use db::{ArticleRepository, ConfigStore, Database};
pub use domain::{Article, SortField, TimeMs};
pub use error::DbError;
