//! # Core Traits (Ports)
//!
//! Any storage adapter must implement these traits to be wired into the binary.

use async_trait::async_trait;

use crate::models::{Category, Symbol, SymbolQuery, SymbolStatus};

/// Persistence contract for symbol records and their meta.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait SymbolRepo: Send + Sync {
    // Record operations
    async fn insert_symbol(&self, title: &str, status: SymbolStatus) -> anyhow::Result<Symbol>;
    async fn get_symbol(&self, id: i64) -> anyhow::Result<Option<Symbol>>;
    async fn update_symbol(&self, symbol: &Symbol) -> anyhow::Result<()>;
    async fn delete_symbol(&self, id: i64) -> anyhow::Result<()>;
    /// Returns the matching page and the total number of matches.
    async fn list_symbols(&self, query: &SymbolQuery) -> anyhow::Result<(Vec<Symbol>, i64)>;

    /// First non-trashed symbol with exactly `title`, ignoring `exclude_id`.
    async fn find_live_by_title(
        &self,
        title: &str,
        exclude_id: Option<i64>,
    ) -> anyhow::Result<Option<Symbol>>;

    // Meta operations
    async fn get_meta(&self, id: i64, key: &str) -> anyhow::Result<Option<String>>;
    async fn set_meta(&self, id: i64, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Persistence contract for the category taxonomy and symbol membership.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait CategoryRepo: Send + Sync {
    async fn create_category(&self, name: &str, slug: &str) -> anyhow::Result<Category>;
    async fn get_category(&self, id: i64) -> anyhow::Result<Option<Category>>;
    async fn get_category_by_name(&self, name: &str) -> anyhow::Result<Option<Category>>;
    async fn list_categories(&self) -> anyhow::Result<Vec<Category>>;
    /// Removes the term only; memberships are cleaned up by the delete hooks.
    async fn delete_category(&self, id: i64) -> anyhow::Result<()>;

    /// Categories attached to a symbol (expected 0 or 1).
    async fn symbol_categories(&self, symbol_id: i64) -> anyhow::Result<Vec<Category>>;
    /// Ids of every symbol tagged with `category_id`, including stale tags.
    async fn symbols_in_category(&self, category_id: i64) -> anyhow::Result<Vec<i64>>;
    /// Attaches the category named `name`. Returns false when no such category exists.
    async fn attach_by_name(&self, symbol_id: i64, name: &str) -> anyhow::Result<bool>;
    /// Detaches the category named `name`, if attached.
    async fn detach_by_name(&self, symbol_id: i64, name: &str) -> anyhow::Result<()>;
    /// Detaches a membership by category id. Works after the term itself is gone.
    async fn detach_by_id(&self, symbol_id: i64, category_id: i64) -> anyhow::Result<()>;
}

/// Storage contract for symbol thumbnails (`{id}.png` under a fixed folder).
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ThumbnailStore: Send + Sync {
    /// Whether the symbol has a thumbnail. IO failures are errors, not `false`.
    async fn exists(&self, symbol_id: i64) -> anyhow::Result<bool>;
    /// Public URL of the thumbnail file, whether or not it exists.
    fn url(&self, symbol_id: i64) -> String;
    /// URL returned when a symbol has no thumbnail.
    fn placeholder_url(&self) -> String;
    /// Copies `{from}.png` to `{to}.png`. The caller checks the source exists.
    async fn copy(&self, from: i64, to: i64) -> anyhow::Result<()>;
    /// Decodes an uploaded image and stores it as the symbol's PNG thumbnail.
    /// Undecodable input fails with an `AppError::ValidationError` inside the anyhow error.
    async fn save_image(&self, symbol_id: i64, data: Vec<u8>) -> anyhow::Result<()>;
    async fn remove(&self, symbol_id: i64) -> anyhow::Result<()>;
}
