//! # storage-adapters
//!
//! Port implementations backed by SQLite and the local filesystem.

#[cfg(feature = "db-sqlite")]
pub mod sqlite;
#[cfg(feature = "media-local")]
pub mod thumbs;

#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteStore;
#[cfg(feature = "media-local")]
pub use thumbs::LocalThumbnailStore;
