//! Domain types for the blog store.
//!
//! - Domain primitives: TimeMs
//! - Article value type and listing sort columns

pub mod article;
pub mod primitives;

pub use article::{Article, SortField, SortFieldParseError};
pub use primitives::TimeMs;
