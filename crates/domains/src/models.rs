//! # Domain Models
//!
//! These structs represent the core entities of the symbol library:
//! symbols (reusable HTML + CSS fragments) and the flat set of categories
//! they are filed under.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Meta key holding a symbol's rendered HTML body.
pub const HTML_META_KEY: &str = "tve_updated_post";
/// Meta key holding a symbol's custom stylesheet.
pub const CSS_META_KEY: &str = "tve_custom_css";

/// Category id that stands for "no category".
pub const UNCATEGORIZED: i64 = 0;

/// Publication state of a symbol record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SymbolStatus {
    #[default]
    Publish,
    Draft,
    Trash,
}

impl SymbolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolStatus::Publish => "publish",
            SymbolStatus::Draft => "draft",
            SymbolStatus::Trash => "trash",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "publish" => Some(SymbolStatus::Publish),
            "draft" => Some(SymbolStatus::Draft),
            "trash" => Some(SymbolStatus::Trash),
            _ => None,
        }
    }
}

/// A stored symbol record. HTML and CSS live in meta, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: i64,
    pub title: String,
    pub status: SymbolStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named grouping of symbols. Membership is exclusive per symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Title as sent by clients: either a bare string or `{ "raw": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TitleInput {
    Plain(String),
    Raw { raw: String },
}

impl TitleInput {
    pub fn as_str(&self) -> &str {
        match self {
            TitleInput::Plain(s) => s,
            TitleInput::Raw { raw } => raw,
        }
    }
}

/// Body of a create / update request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolInput {
    pub title: Option<TitleInput>,
    pub status: Option<SymbolStatus>,
    /// Present when the new symbol is a duplicate of `old_id`.
    pub old_id: Option<i64>,
    #[serde(rename = "tve_updated_post")]
    pub html: Option<String>,
    #[serde(rename = "tve_custom_css")]
    pub css: Option<String>,
    /// Target category id; `0` moves the symbol to uncategorized.
    pub move_symbol: Option<i64>,
}

impl SymbolInput {
    /// The proposed title, if the request carries a non-empty one.
    pub fn title_str(&self) -> Option<&str> {
        self.title.as_ref().map(TitleInput::as_str).filter(|t| !t.is_empty())
    }
}

/// The response shape for a symbol, after enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolView {
    pub id: i64,
    pub title: String,
    pub status: SymbolStatus,
    #[serde(rename = "tve_updated_post")]
    pub html: String,
    #[serde(rename = "tve_custom_css")]
    pub css: String,
    /// Bare category ids straight from storage, replaced by full objects
    /// when the response is prepared.
    pub categories: Vec<CategoryRef>,
    pub thumb_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category reference inside a symbol response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(i64),
    Resolved(Category),
}

/// Filters for listing symbols.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolQuery {
    /// `Some(0)` selects uncategorized symbols only.
    pub category: Option<i64>,
    /// `None` means every status except trash.
    pub status: Option<SymbolStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SymbolQuery {
    pub const DEFAULT_PER_PAGE: u32 = 10;
    pub const MAX_PER_PAGE: u32 = 100;

    /// Returns `(limit, offset)` with the paging bounds applied.
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self
            .per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE) as i64;
        let page = self.page.unwrap_or(1).max(1) as i64;
        (per_page, (page - 1) * per_page)
    }
}

/// One page of symbols plus the total number of matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Lowercased, dash-separated slug for a category name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
