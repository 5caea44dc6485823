//! Core library surface for the cookbook shelf: an SQLite-backed tracker for
//! a cookbook collection, its free-form tags and who borrowed what.
//!
//! The `db` module is the part other tools should reuse. The `ui` module is
//! the terminal front-end the binary drives.
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod ui;

/// Convenience re-exports for the persistence layer.
pub use db::{
    add_cookbook, add_tags, ensure_schema, list_cookbooks, open_in_memory_store, open_store,
    record_borrow, search_by_aesthetic,
};

pub use config::Config;
pub use error::{ShelfError, ShelfResult};
pub use models::{BorrowRecord, Cookbook, NewCookbook, Tag, TagOutcome, TagReport};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
