//! symbol-board/crates/domains/src/lib.rs
//!
//! The central domain types and port definitions for the symbol library.

pub mod context;
pub mod error;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use context::*;
pub use error::*;
pub use models::*;
pub use ports::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_accepts_plain_and_raw_forms() {
        let plain: SymbolInput = serde_json::from_str(r#"{"title":"Header A"}"#).unwrap();
        let raw: SymbolInput = serde_json::from_str(r#"{"title":{"raw":"Header A"}}"#).unwrap();
        assert_eq!(plain.title_str(), Some("Header A"));
        assert_eq!(raw.title_str(), Some("Header A"));
    }

    #[test]
    fn empty_title_counts_as_absent() {
        let input: SymbolInput = serde_json::from_str(r#"{"title":""}"#).unwrap();
        assert_eq!(input.title_str(), None);
    }

    #[test]
    fn meta_fields_use_storage_keys_on_the_wire() {
        let input: SymbolInput = serde_json::from_value(serde_json::json!({
            "tve_updated_post": "<div></div>",
            "tve_custom_css": "#tve-5-block{}",
            "move_symbol": 3,
            "old_id": 5,
        }))
        .unwrap();
        assert_eq!(input.html.as_deref(), Some("<div></div>"));
        assert_eq!(input.css.as_deref(), Some("#tve-5-block{}"));
        assert_eq!(input.move_symbol, Some(3));
        assert_eq!(input.old_id, Some(5));
    }

    #[test]
    fn paging_is_clamped() {
        let q = SymbolQuery { page: Some(0), per_page: Some(1000), ..Default::default() };
        assert_eq!(q.limit_offset(), (100, 0));
        let q = SymbolQuery { page: Some(3), per_page: None, ..Default::default() };
        assert_eq!(q.limit_offset(), (10, 20));
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Hero Sections / Dark "), "hero-sections-dark");
        assert_eq!(slugify("Footers"), "footers");
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AppError::Conflict("t".into()).code(), "rest_cannot_create_post");
        assert_eq!(AppError::ThumbnailCopy("x".into()).code(), "could_not_generate_file");
        assert_eq!(AppError::NotFound("category", "4".into()).code(), "rest_term_invalid");
        assert_eq!(AppError::NotFound("symbol", "4".into()).code(), "rest_post_invalid_id");
    }
}
