//! # SQLite Store
//!
//! Maps the SQLite relational model onto the `domains` symbol and category
//! models. One pool serves both repositories.

use std::str::FromStr;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use domains::{Category, CategoryRepo, Symbol, SymbolQuery, SymbolRepo, SymbolStatus, UNCATEGORIZED};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to `url` and applies the embedded migrations.
    ///
    /// In-memory databases live only as long as their connection, so they get
    /// a single connection that is never recycled.
    pub async fn new(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url '{url}'"))?
            .create_if_missing(true);

        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        MIGRATOR.run(&pool).await.context("running migrations")?;
        tracing::debug!(url, "sqlite store ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn symbol_from_row(row: &SqliteRow) -> anyhow::Result<Symbol> {
    let status: String = row.try_get("status")?;
    Ok(Symbol {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        status: SymbolStatus::parse(&status).ok_or_else(|| anyhow!("unknown symbol status '{status}'"))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn category_from_row(row: &SqliteRow) -> anyhow::Result<Category> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

/// Appends the `WHERE` conditions shared by the list and count queries.
fn push_symbol_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &SymbolQuery) {
    match query.status {
        Some(status) => {
            qb.push(" AND s.status = ").push_bind(status.as_str());
        }
        None => {
            qb.push(" AND s.status != 'trash'");
        }
    }

    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND s.title LIKE ").push_bind(format!("%{search}%"));
    }

    match query.category {
        Some(UNCATEGORIZED) => {
            qb.push(
                " AND NOT EXISTS (SELECT 1 FROM symbol_categories sc \
                 JOIN categories c ON c.id = sc.category_id WHERE sc.symbol_id = s.id)",
            );
        }
        Some(category_id) => {
            qb.push(" AND EXISTS (SELECT 1 FROM symbol_categories sc WHERE sc.symbol_id = s.id AND sc.category_id = ")
                .push_bind(category_id)
                .push(")");
        }
        None => {}
    }
}

#[async_trait]
impl SymbolRepo for SqliteStore {
    async fn insert_symbol(&self, title: &str, status: SymbolStatus) -> anyhow::Result<Symbol> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO symbols (title, status, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(status.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Symbol {
            id,
            title: title.to_string(),
            status,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_symbol(&self, id: i64) -> anyhow::Result<Option<Symbol>> {
        let row = sqlx::query("SELECT * FROM symbols WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(symbol_from_row).transpose()
    }

    async fn update_symbol(&self, symbol: &Symbol) -> anyhow::Result<()> {
        sqlx::query("UPDATE symbols SET title = ?, status = ?, updated_at = ? WHERE id = ?")
            .bind(&symbol.title)
            .bind(symbol.status.as_str())
            .bind(symbol.updated_at)
            .bind(symbol.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Removes the record together with its meta and memberships.
    async fn delete_symbol(&self, id: i64) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM symbol_meta WHERE symbol_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM symbol_categories WHERE symbol_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM symbols WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_symbols(&self, query: &SymbolQuery) -> anyhow::Result<(Vec<Symbol>, i64)> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM symbols s WHERE 1 = 1");
        push_symbol_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let (limit, offset) = query.limit_offset();
        let mut select = QueryBuilder::<Sqlite>::new("SELECT s.* FROM symbols s WHERE 1 = 1");
        push_symbol_filters(&mut select, query);
        select
            .push(" ORDER BY s.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = select.build().fetch_all(&self.pool).await?;
        let symbols = rows.iter().map(symbol_from_row).collect::<anyhow::Result<Vec<_>>>()?;
        Ok((symbols, total))
    }

    async fn find_live_by_title(
        &self,
        title: &str,
        exclude_id: Option<i64>,
    ) -> anyhow::Result<Option<Symbol>> {
        let row = sqlx::query(
            "SELECT * FROM symbols WHERE title = ? AND status != 'trash' \
             AND (? IS NULL OR id != ?) ORDER BY id LIMIT 1",
        )
        .bind(title)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(symbol_from_row).transpose()
    }

    async fn get_meta(&self, id: i64, key: &str) -> anyhow::Result<Option<String>> {
        let value = sqlx::query_scalar("SELECT meta_value FROM symbol_meta WHERE symbol_id = ? AND meta_key = ?")
            .bind(id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set_meta(&self, id: i64, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO symbol_meta (symbol_id, meta_key, meta_value) VALUES (?, ?, ?) \
             ON CONFLICT (symbol_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value",
        )
        .bind(id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CategoryRepo for SqliteStore {
    async fn create_category(&self, name: &str, slug: &str) -> anyhow::Result<Category> {
        let id = sqlx::query("INSERT INTO categories (name, slug) VALUES (?, ?)")
            .bind(name)
            .bind(slug)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        Ok(Category { id, name: name.to_string(), slug: slug.to_string() })
    }

    async fn get_category(&self, id: i64) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name, slug FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn get_category_by_name(&self, name: &str) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name, slug FROM categories WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn list_categories(&self) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, slug FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn delete_category(&self, id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn symbol_categories(&self, symbol_id: i64) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT c.id, c.name, c.slug FROM categories c \
             JOIN symbol_categories sc ON sc.category_id = c.id \
             WHERE sc.symbol_id = ? ORDER BY c.id",
        )
        .bind(symbol_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn symbols_in_category(&self, category_id: i64) -> anyhow::Result<Vec<i64>> {
        let ids = sqlx::query_scalar(
            "SELECT symbol_id FROM symbol_categories WHERE category_id = ? ORDER BY symbol_id",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn attach_by_name(&self, symbol_id: i64, name: &str) -> anyhow::Result<bool> {
        let Some(category) = self.get_category_by_name(name).await? else {
            return Ok(false);
        };
        sqlx::query("INSERT OR IGNORE INTO symbol_categories (symbol_id, category_id) VALUES (?, ?)")
            .bind(symbol_id)
            .bind(category.id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    async fn detach_by_name(&self, symbol_id: i64, name: &str) -> anyhow::Result<()> {
        sqlx::query(
            "DELETE FROM symbol_categories WHERE symbol_id = ? \
             AND category_id IN (SELECT id FROM categories WHERE name = ?)",
        )
        .bind(symbol_id)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn detach_by_id(&self, symbol_id: i64, category_id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM symbol_categories WHERE symbol_id = ? AND category_id = ?")
            .bind(symbol_id)
            .bind(category_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:", 1).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_symbol() {
        let store = store().await;
        let created = store.insert_symbol("Header A", SymbolStatus::Publish).await.unwrap();

        let fetched = store.get_symbol(created.id).await.unwrap().expect("symbol exists");
        assert_eq!(fetched.title, "Header A");
        assert_eq!(fetched.status, SymbolStatus::Publish);
        assert!(store.get_symbol(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_title_lookup_ignores_trash_and_excluded_id() {
        let store = store().await;
        let live = store.insert_symbol("Header A", SymbolStatus::Publish).await.unwrap();
        let mut trashed = store.insert_symbol("Footer", SymbolStatus::Publish).await.unwrap();
        trashed.status = SymbolStatus::Trash;
        store.update_symbol(&trashed).await.unwrap();

        assert_eq!(store.find_live_by_title("Header A", None).await.unwrap().map(|s| s.id), Some(live.id));
        assert!(store.find_live_by_title("Header A", Some(live.id)).await.unwrap().is_none());
        assert!(store.find_live_by_title("Footer", None).await.unwrap().is_none());
        assert!(store.find_live_by_title("header a", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_meta_is_upserted() {
        let store = store().await;
        let symbol = store.insert_symbol("x", SymbolStatus::Draft).await.unwrap();

        assert!(store.get_meta(symbol.id, "tve_custom_css").await.unwrap().is_none());
        store.set_meta(symbol.id, "tve_custom_css", "a{}").await.unwrap();
        store.set_meta(symbol.id, "tve_custom_css", "b{}").await.unwrap();
        assert_eq!(store.get_meta(symbol.id, "tve_custom_css").await.unwrap().as_deref(), Some("b{}"));
    }

    #[tokio::test]
    async fn test_membership_by_name_and_stale_ids() {
        let store = store().await;
        let symbol = store.insert_symbol("x", SymbolStatus::Publish).await.unwrap();
        let headers = store.create_category("Headers", "headers").await.unwrap();

        assert!(!store.attach_by_name(symbol.id, "Nope").await.unwrap());
        assert!(store.attach_by_name(symbol.id, "Headers").await.unwrap());
        assert_eq!(store.symbol_categories(symbol.id).await.unwrap(), vec![headers.clone()]);

        // deleting the term leaves a stale membership row behind
        store.delete_category(headers.id).await.unwrap();
        assert!(store.symbol_categories(symbol.id).await.unwrap().is_empty());
        assert_eq!(store.symbols_in_category(headers.id).await.unwrap(), vec![symbol.id]);

        store.detach_by_id(symbol.id, headers.id).await.unwrap();
        assert!(store.symbols_in_category(headers.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_and_paging() {
        let store = store().await;
        let headers = store.create_category("Headers", "headers").await.unwrap();
        for i in 0..5 {
            let s = store.insert_symbol(&format!("Header {i}"), SymbolStatus::Publish).await.unwrap();
            if i % 2 == 0 {
                store.attach_by_name(s.id, "Headers").await.unwrap();
            }
        }
        let mut trashed = store.insert_symbol("Header old", SymbolStatus::Publish).await.unwrap();
        trashed.status = SymbolStatus::Trash;
        store.update_symbol(&trashed).await.unwrap();

        let (all, total) = store.list_symbols(&SymbolQuery::default()).await.unwrap();
        assert_eq!((all.len(), total), (5, 5));

        let query = SymbolQuery { category: Some(headers.id), ..Default::default() };
        assert_eq!(store.list_symbols(&query).await.unwrap().1, 3);

        let query = SymbolQuery { category: Some(UNCATEGORIZED), ..Default::default() };
        assert_eq!(store.list_symbols(&query).await.unwrap().1, 2);

        let query = SymbolQuery { status: Some(SymbolStatus::Trash), ..Default::default() };
        assert_eq!(store.list_symbols(&query).await.unwrap().1, 1);

        let query = SymbolQuery { search: Some("der 3".into()), ..Default::default() };
        assert_eq!(store.list_symbols(&query).await.unwrap().1, 1);

        let query = SymbolQuery { page: Some(2), per_page: Some(2), ..Default::default() };
        let (page, total) = store.list_symbols(&query).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.iter().map(|s| s.title.as_str()).collect::<Vec<_>>(), vec!["Header 2", "Header 1"]);
    }

    #[tokio::test]
    async fn test_delete_symbol_removes_meta_and_membership() {
        let store = store().await;
        let symbol = store.insert_symbol("x", SymbolStatus::Publish).await.unwrap();
        let headers = store.create_category("Headers", "headers").await.unwrap();
        store.attach_by_name(symbol.id, "Headers").await.unwrap();
        store.set_meta(symbol.id, "tve_updated_post", "<p/>").await.unwrap();

        store.delete_symbol(symbol.id).await.unwrap();

        assert!(store.get_symbol(symbol.id).await.unwrap().is_none());
        assert!(store.get_meta(symbol.id, "tve_updated_post").await.unwrap().is_none());
        assert!(store.symbols_in_category(headers.id).await.unwrap().is_empty());
    }
}
