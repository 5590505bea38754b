//! # Symbol Extension
//!
//! Symbol-specific behavior layered on top of [`ContentService`](crate::ContentService):
//! duplicate-title guarding, response enrichment, duplication side effects,
//! exclusive category moves and the category-deletion cascade.

use std::sync::Arc;

use async_trait::async_trait;
use domains::{
    AppError, Category, CategoryRef, CategoryRepo, RequestContext, Result, Symbol, SymbolInput,
    SymbolRepo, SymbolStatus, SymbolView, ThumbnailStore, CSS_META_KEY, HTML_META_KEY,
    UNCATEGORIZED,
};
use tracing::{info, instrument, warn};

use crate::hooks::{
    AfterInsertHandler, CategoryDeletedHandler, FieldUpdate, FieldUpdater, HookRegistry,
    PrepareResponseHandler, SymbolField, WriteGuard,
};

pub struct SymbolExtension {
    symbols: Arc<dyn SymbolRepo>,
    categories: Arc<dyn CategoryRepo>,
    thumbs: Arc<dyn ThumbnailStore>,
}

impl SymbolExtension {
    pub fn new(
        symbols: Arc<dyn SymbolRepo>,
        categories: Arc<dyn CategoryRepo>,
        thumbs: Arc<dyn ThumbnailStore>,
    ) -> Self {
        Self { symbols, categories, thumbs }
    }

    /// Installs every symbol handler on `hooks`.
    pub fn register(self: Arc<Self>, hooks: &mut HookRegistry) {
        hooks.on_write(self.clone());
        hooks.on_after_insert(self.clone());
        hooks.on_prepare_response(self.clone());
        hooks.on_category_deleted(self.clone());
        hooks.register_field(SymbolField::Html, self.clone());
        hooks.register_field(SymbolField::Css, self.clone());
        hooks.register_field(SymbolField::MoveSymbol, self);
    }

    /// Rejects `title` when a live symbol other than `exclude_id` already uses it.
    pub async fn check_duplicate_title(&self, title: Option<&str>, exclude_id: Option<i64>) -> Result<()> {
        let Some(title) = title else {
            return Ok(());
        };
        if let Some(existing) = self.symbols.find_live_by_title(title, exclude_id).await? {
            warn!(title, existing_id = existing.id, "duplicate symbol title rejected");
            return Err(AppError::Conflict(
                "Sorry, you are not allowed to create symbols with the same title".into(),
            ));
        }
        Ok(())
    }

    /// Duplicates are renamed to `{title}_{id}`. If a live symbol already
    /// holds that name, a counter is appended (`{title}_{id}_2`, `_3`, ...).
    pub async fn ensure_unique_title(&self, symbol: &Symbol) -> Result<()> {
        let base = format!("{}_{}", symbol.title, symbol.id);
        let mut title = base.clone();
        let mut counter = 1;
        while self.symbols.find_live_by_title(&title, Some(symbol.id)).await?.is_some() {
            counter += 1;
            title = format!("{base}_{counter}");
        }

        let mut renamed = symbol.clone();
        renamed.title = title;
        self.symbols.update_symbol(&renamed).await?;
        Ok(())
    }

    /// Copies `{old_id}.png` to `{new_id}.png`. A missing source is not an error.
    pub async fn copy_thumb(&self, old_id: i64, new_id: i64) -> Result<()> {
        let found = self
            .thumbs
            .exists(old_id)
            .await
            .map_err(|err| AppError::ThumbnailCopy(format!("checking {old_id}: {err:#}")))?;
        if !found {
            return Ok(());
        }
        self.thumbs
            .copy(old_id, new_id)
            .await
            .map_err(|err| AppError::ThumbnailCopy(format!("{old_id} -> {new_id}: {err:#}")))
    }

    pub async fn update_symbol_html(&self, symbol: &Symbol, html: &str) -> Result<()> {
        self.symbols.set_meta(symbol.id, HTML_META_KEY, html).await?;
        Ok(())
    }

    /// When duplicating, every literal occurrence of the source id in the
    /// stylesheet is replaced with the new id before storing.
    pub async fn update_symbol_css(&self, ctx: &RequestContext, symbol: &Symbol, css: &str) -> Result<()> {
        let css = match ctx.old_id {
            Some(old_id) => css.replace(&old_id.to_string(), &symbol.id.to_string()),
            None => css.to_string(),
        };
        self.symbols.set_meta(symbol.id, CSS_META_KEY, &css).await?;
        Ok(())
    }

    /// Moves `symbol` into `category_id`, replacing its current category.
    /// `0` leaves it uncategorized.
    #[instrument(skip(self, symbol), fields(symbol_id = symbol.id))]
    pub async fn move_symbol(&self, category_id: i64, symbol: &Symbol) -> Result<()> {
        if category_id == UNCATEGORIZED {
            return self.remove_current_categories(symbol.id).await;
        }

        let category = self
            .categories
            .get_category(category_id)
            .await?
            .ok_or_else(|| AppError::NotFound("category", category_id.to_string()))?;

        self.remove_current_categories(symbol.id).await?;
        if !self.categories.attach_by_name(symbol.id, &category.name).await? {
            return Err(AppError::NotFound("category", category_id.to_string()));
        }
        Ok(())
    }

    pub async fn remove_current_categories(&self, symbol_id: i64) -> Result<()> {
        for category in self.categories.symbol_categories(symbol_id).await? {
            self.categories.detach_by_name(symbol_id, &category.name).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl WriteGuard for SymbolExtension {
    async fn check_create(&self, ctx: &RequestContext, input: &SymbolInput) -> Result<()> {
        // duplicates get a unique title after insert
        if ctx.is_duplicate() {
            return Ok(());
        }
        self.check_duplicate_title(input.title_str(), None).await
    }

    async fn check_update(&self, _ctx: &RequestContext, current: &Symbol, input: &SymbolInput) -> Result<()> {
        // a restore from the trash brings the stored title back into play
        let restoring = current.status == SymbolStatus::Trash
            && input.status.is_some_and(|status| status != SymbolStatus::Trash);
        let title = match &input.title {
            Some(_) => input.title_str(),
            None if restoring => Some(current.title.as_str()).filter(|t| !t.is_empty()),
            None => None,
        };
        self.check_duplicate_title(title, Some(current.id)).await
    }
}

#[async_trait]
impl AfterInsertHandler for SymbolExtension {
    async fn after_insert(&self, ctx: &RequestContext, symbol: &Symbol) -> Result<()> {
        let Some(old_id) = ctx.old_id else {
            return Ok(());
        };
        self.ensure_unique_title(symbol).await?;
        self.copy_thumb(old_id, symbol.id).await?;
        info!(old_id, new_id = symbol.id, "symbol duplicated");
        Ok(())
    }
}

#[async_trait]
impl PrepareResponseHandler for SymbolExtension {
    async fn prepare(&self, mut view: SymbolView) -> Result<SymbolView> {
        let mut resolved = Vec::with_capacity(view.categories.len());
        for reference in view.categories {
            match reference {
                CategoryRef::Id(id) => {
                    if let Some(category) = self.categories.get_category(id).await? {
                        resolved.push(CategoryRef::Resolved(category));
                    }
                }
                done @ CategoryRef::Resolved(_) => resolved.push(done),
            }
        }
        view.categories = resolved;

        let has_thumb = match self.thumbs.exists(view.id).await {
            Ok(found) => found,
            Err(err) => {
                warn!(symbol_id = view.id, error = %format!("{err:#}"), "thumbnail lookup failed");
                false
            }
        };
        view.thumb_url = Some(if has_thumb {
            self.thumbs.url(view.id)
        } else {
            self.thumbs.placeholder_url()
        });
        Ok(view)
    }
}

#[async_trait]
impl FieldUpdater for SymbolExtension {
    async fn update_field(&self, ctx: &RequestContext, symbol: &Symbol, update: &FieldUpdate) -> Result<()> {
        match update {
            FieldUpdate::Html(html) => self.update_symbol_html(symbol, html).await,
            FieldUpdate::Css(css) => self.update_symbol_css(ctx, symbol, css).await,
            FieldUpdate::MoveSymbol(category_id) => self.move_symbol(*category_id, symbol).await,
        }
    }
}

#[async_trait]
impl CategoryDeletedHandler for SymbolExtension {
    #[instrument(skip(self, category), fields(category_id = category.id))]
    async fn category_deleted(&self, category: &Category) -> Result<()> {
        let tagged = self.categories.symbols_in_category(category.id).await?;
        for symbol_id in &tagged {
            self.categories.detach_by_id(*symbol_id, category.id).await?;
        }
        info!(moved = tagged.len(), "symbols moved to uncategorized");
        Ok(())
    }
}
