//! Database module for SQLite operations.
//!
//! This module provides:
//! - The lifecycle manager owning the handle and config map
//! - Schema bootstrap and config loading
//! - The article repository

pub mod articles;
pub mod config_store;
pub mod lifecycle;
pub mod migrations;

pub use articles::ArticleRepository;
pub use config_store::ConfigStore;
pub use lifecycle::Database;
