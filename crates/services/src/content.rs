//! # Content Service
//!
//! Generic CRUD over symbols and categories. Every write runs through the
//! [`HookRegistry`] so extensions can guard, post-process and enrich it.

use std::sync::Arc;

use domains::{
    slugify, AppError, Category, CategoryRef, CategoryRepo, Page, RequestContext, Result, Symbol,
    SymbolInput, SymbolQuery, SymbolRepo, SymbolStatus, SymbolView, ThumbnailStore,
    CSS_META_KEY, HTML_META_KEY,
};
use tracing::{info, instrument};

use crate::hooks::{FieldUpdate, HookRegistry};

pub struct ContentService {
    symbols: Arc<dyn SymbolRepo>,
    categories: Arc<dyn CategoryRepo>,
    thumbs: Arc<dyn ThumbnailStore>,
    hooks: HookRegistry,
}

impl ContentService {
    pub fn new(
        symbols: Arc<dyn SymbolRepo>,
        categories: Arc<dyn CategoryRepo>,
        thumbs: Arc<dyn ThumbnailStore>,
        hooks: HookRegistry,
    ) -> Self {
        Self { symbols, categories, thumbs, hooks }
    }

    // ── Symbols ─────────────────────────────────────────────────────────────

    #[instrument(skip(self, ctx, input), fields(request_id = %ctx.request_id, old_id = ?ctx.old_id))]
    pub async fn create_symbol(&self, ctx: &RequestContext, input: SymbolInput) -> Result<SymbolView> {
        self.hooks.check_create(ctx, &input).await?;

        let title = input.title_str().unwrap_or_default();
        let status = input.status.unwrap_or_default();
        let symbol = self.symbols.insert_symbol(title, status).await?;
        info!(symbol_id = symbol.id, "symbol created");

        self.finish_write(ctx, symbol.id, &input).await
    }

    #[instrument(skip(self, ctx, input), fields(request_id = %ctx.request_id, old_id = ?ctx.old_id))]
    pub async fn update_symbol(
        &self,
        ctx: &RequestContext,
        id: i64,
        input: SymbolInput,
    ) -> Result<SymbolView> {
        let mut symbol = self.load(id).await?;
        self.hooks.check_update(ctx, &symbol, &input).await?;

        let mut changed = false;
        if let Some(title) = &input.title {
            symbol.title = title.as_str().to_string();
            changed = true;
        }
        if let Some(status) = input.status {
            symbol.status = status;
            changed = true;
        }
        if changed {
            symbol.updated_at = chrono::Utc::now();
            self.symbols.update_symbol(&symbol).await?;
        }

        self.finish_write(ctx, id, &input).await
    }

    /// Post-insert events and field updates shared by create and update.
    /// Steps already applied stay applied when a later one fails.
    async fn finish_write(&self, ctx: &RequestContext, id: i64, input: &SymbolInput) -> Result<SymbolView> {
        let symbol = self.load(id).await?;
        self.hooks.fire_after_insert(ctx, &symbol).await?;

        // handlers may have renamed the record
        let symbol = self.load(id).await?;
        for update in FieldUpdate::from_input(input) {
            self.hooks.update_field(ctx, &symbol, &update).await?;
        }

        self.view(self.load(id).await?).await
    }

    pub async fn get_symbol(&self, id: i64) -> Result<SymbolView> {
        let symbol = self.load(id).await?;
        self.view(symbol).await
    }

    pub async fn list_symbols(&self, query: &SymbolQuery) -> Result<Page<SymbolView>> {
        let (symbols, total) = self.symbols.list_symbols(query).await?;
        let mut items = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            items.push(self.view(symbol).await?);
        }
        Ok(Page { items, total })
    }

    /// Moves a symbol to the trash, or removes it for good when `force` is set.
    /// Returns the symbol as it was before a forced delete.
    #[instrument(skip(self))]
    pub async fn delete_symbol(&self, id: i64, force: bool) -> Result<SymbolView> {
        let mut symbol = self.load(id).await?;

        if !force {
            if symbol.status == SymbolStatus::Trash {
                return Err(AppError::Gone(format!("symbol {id} has already been trashed")));
            }
            symbol.status = SymbolStatus::Trash;
            symbol.updated_at = chrono::Utc::now();
            self.symbols.update_symbol(&symbol).await?;
            info!(symbol_id = id, "symbol trashed");
            return self.view(symbol).await;
        }

        let previous = self.view(symbol).await?;
        for category in self.categories.symbol_categories(id).await? {
            self.categories.detach_by_id(id, category.id).await?;
        }
        self.symbols.delete_symbol(id).await?;
        // the record is gone; a leftover file is only orphaned
        self.thumbs.remove(id).await?;
        info!(symbol_id = id, "symbol deleted");
        Ok(previous)
    }

    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn upload_thumbnail(&self, id: i64, content_type: &str, data: Vec<u8>) -> Result<SymbolView> {
        let symbol = self.load(id).await?;

        let is_image = content_type
            .parse::<mime::Mime>()
            .map(|m| m.type_() == mime::IMAGE)
            .unwrap_or(false);
        if !is_image {
            return Err(AppError::ValidationError(format!(
                "thumbnail must be an image, got '{content_type}'"
            )));
        }

        self.thumbs
            .save_image(id, data)
            .await
            .map_err(|err| match err.downcast::<AppError>() {
                Ok(app) => app,
                Err(other) => AppError::Storage(other),
            })?;

        self.view(symbol).await
    }

    // ── Categories ──────────────────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn create_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("category name must not be empty".into()));
        }
        if self.categories.get_category_by_name(name).await?.is_some() {
            return Err(AppError::Conflict(format!("a category named '{name}' already exists")));
        }
        let category = self.categories.create_category(name, &slugify(name)).await?;
        info!(category_id = category.id, "category created");
        Ok(category)
    }

    pub async fn get_category(&self, id: i64) -> Result<Category> {
        self.categories
            .get_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound("category", id.to_string()))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.list_categories().await?)
    }

    /// Deletes the term, then lets the registered handlers clean up after it.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i64) -> Result<Category> {
        let category = self.get_category(id).await?;
        self.categories.delete_category(id).await?;
        info!(category_id = id, "category deleted");
        self.hooks.fire_category_deleted(&category).await?;
        Ok(category)
    }

    // ── Internals ───────────────────────────────────────────────────────────

    async fn load(&self, id: i64) -> Result<Symbol> {
        self.symbols
            .get_symbol(id)
            .await?
            .ok_or_else(|| AppError::NotFound("symbol", id.to_string()))
    }

    /// Raw response (meta plus bare category ids), passed through the prepare handlers.
    async fn view(&self, symbol: Symbol) -> Result<SymbolView> {
        let html = self.symbols.get_meta(symbol.id, HTML_META_KEY).await?;
        let css = self.symbols.get_meta(symbol.id, CSS_META_KEY).await?;
        let categories = self
            .categories
            .symbol_categories(symbol.id)
            .await?
            .into_iter()
            .map(|c| CategoryRef::Id(c.id))
            .collect();

        let view = SymbolView {
            id: symbol.id,
            title: symbol.title,
            status: symbol.status,
            html: html.unwrap_or_default(),
            css: css.unwrap_or_default(),
            categories,
            thumb_url: None,
            created_at: symbol.created_at,
            updated_at: symbol.updated_at,
        };
        self.hooks.prepare(view).await
    }
}
