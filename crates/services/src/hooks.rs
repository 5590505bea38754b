//! # Hook Registry
//!
//! Typed lifecycle events exposed by [`ContentService`](crate::ContentService).
//! Extensions implement the handler traits and register themselves here;
//! handlers run in registration order and the first error aborts the chain.

use std::sync::Arc;

use async_trait::async_trait;
use domains::{Category, RequestContext, Result, Symbol, SymbolInput, SymbolView};

/// Runs before a write touches storage.
#[async_trait]
pub trait WriteGuard: Send + Sync {
    async fn check_create(&self, ctx: &RequestContext, input: &SymbolInput) -> Result<()>;
    /// `current` is the record as stored, before `input` is applied.
    async fn check_update(&self, ctx: &RequestContext, current: &Symbol, input: &SymbolInput) -> Result<()>;
}

/// Runs after a symbol record was inserted or updated.
#[async_trait]
pub trait AfterInsertHandler: Send + Sync {
    async fn after_insert(&self, ctx: &RequestContext, symbol: &Symbol) -> Result<()>;
}

/// Rewrites a symbol response before it leaves the service.
#[async_trait]
pub trait PrepareResponseHandler: Send + Sync {
    async fn prepare(&self, view: SymbolView) -> Result<SymbolView>;
}

/// Runs after a category term was deleted.
#[async_trait]
pub trait CategoryDeletedHandler: Send + Sync {
    async fn category_deleted(&self, category: &Category) -> Result<()>;
}

/// Writable extra fields of a symbol request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolField {
    Html,
    Css,
    MoveSymbol,
}

/// A single field value taken from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Html(String),
    Css(String),
    MoveSymbol(i64),
}

impl FieldUpdate {
    pub fn field(&self) -> SymbolField {
        match self {
            FieldUpdate::Html(_) => SymbolField::Html,
            FieldUpdate::Css(_) => SymbolField::Css,
            FieldUpdate::MoveSymbol(_) => SymbolField::MoveSymbol,
        }
    }

    /// Field updates carried by a request, in the order they are applied.
    pub fn from_input(input: &SymbolInput) -> Vec<FieldUpdate> {
        let mut updates = Vec::new();
        if let Some(html) = &input.html {
            updates.push(FieldUpdate::Html(html.clone()));
        }
        if let Some(css) = &input.css {
            updates.push(FieldUpdate::Css(css.clone()));
        }
        if let Some(category_id) = input.move_symbol {
            updates.push(FieldUpdate::MoveSymbol(category_id));
        }
        updates
    }
}

/// Persists one extra field after the record itself was written.
#[async_trait]
pub trait FieldUpdater: Send + Sync {
    async fn update_field(
        &self,
        ctx: &RequestContext,
        symbol: &Symbol,
        update: &FieldUpdate,
    ) -> Result<()>;
}

#[derive(Default, Clone)]
pub struct HookRegistry {
    guards: Vec<Arc<dyn WriteGuard>>,
    after_insert: Vec<Arc<dyn AfterInsertHandler>>,
    prepare: Vec<Arc<dyn PrepareResponseHandler>>,
    category_deleted: Vec<Arc<dyn CategoryDeletedHandler>>,
    fields: Vec<(SymbolField, Arc<dyn FieldUpdater>)>,
}

impl HookRegistry {
    pub fn on_write(&mut self, guard: Arc<dyn WriteGuard>) {
        self.guards.push(guard);
    }

    pub fn on_after_insert(&mut self, handler: Arc<dyn AfterInsertHandler>) {
        self.after_insert.push(handler);
    }

    pub fn on_prepare_response(&mut self, handler: Arc<dyn PrepareResponseHandler>) {
        self.prepare.push(handler);
    }

    pub fn on_category_deleted(&mut self, handler: Arc<dyn CategoryDeletedHandler>) {
        self.category_deleted.push(handler);
    }

    pub fn register_field(&mut self, field: SymbolField, updater: Arc<dyn FieldUpdater>) {
        self.fields.push((field, updater));
    }

    pub(crate) async fn check_create(&self, ctx: &RequestContext, input: &SymbolInput) -> Result<()> {
        for guard in &self.guards {
            guard.check_create(ctx, input).await?;
        }
        Ok(())
    }

    pub(crate) async fn check_update(
        &self,
        ctx: &RequestContext,
        current: &Symbol,
        input: &SymbolInput,
    ) -> Result<()> {
        for guard in &self.guards {
            guard.check_update(ctx, current, input).await?;
        }
        Ok(())
    }

    pub(crate) async fn fire_after_insert(&self, ctx: &RequestContext, symbol: &Symbol) -> Result<()> {
        for handler in &self.after_insert {
            handler.after_insert(ctx, symbol).await?;
        }
        Ok(())
    }

    pub(crate) async fn prepare(&self, mut view: SymbolView) -> Result<SymbolView> {
        for handler in &self.prepare {
            view = handler.prepare(view).await?;
        }
        Ok(view)
    }

    pub(crate) async fn fire_category_deleted(&self, category: &Category) -> Result<()> {
        for handler in &self.category_deleted {
            handler.category_deleted(category).await?;
        }
        Ok(())
    }

    /// Applies `update` through every updater registered for its field.
    /// Fields nobody registered for are ignored.
    pub(crate) async fn update_field(
        &self,
        ctx: &RequestContext,
        symbol: &Symbol,
        update: &FieldUpdate,
    ) -> Result<()> {
        let field = update.field();
        for (_, updater) in self.fields.iter().filter(|(f, _)| *f == field) {
            updater.update_field(ctx, symbol, update).await?;
        }
        Ok(())
    }
}
