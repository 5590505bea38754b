//! # services
//!
//! Business logic for the symbol library: the generic content service, its
//! hook registry, and the symbol extension that plugs into it.

pub mod content;
pub mod hooks;
pub mod symbols;

use std::sync::Arc;

use domains::{CategoryRepo, SymbolRepo, ThumbnailStore};

pub use content::ContentService;
pub use hooks::{FieldUpdate, HookRegistry, SymbolField};
pub use symbols::SymbolExtension;

/// Builds a [`ContentService`] with the symbol extension registered.
pub fn symbol_service(
    symbols: Arc<dyn SymbolRepo>,
    categories: Arc<dyn CategoryRepo>,
    thumbs: Arc<dyn ThumbnailStore>,
) -> ContentService {
    let mut hooks = HookRegistry::default();
    Arc::new(SymbolExtension::new(symbols.clone(), categories.clone(), thumbs.clone()))
        .register(&mut hooks);
    ContentService::new(symbols, categories, thumbs, hooks)
}
