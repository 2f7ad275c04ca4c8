//! Schema-validated manifest parsing.

use std::path::Path;

use serde::Deserialize;

use super::error::ParseError;
use super::page::{Page, parse_modified};

/// A manifest record as it appears on disk. Every field is a required string.
#[derive(Debug, Deserialize)]
struct RawPage {
    url: String,
    modified: String,
    title: String,
    content: String,
    path: String,
    categories: String,
    tag: String,
    #[serde(rename = "type")]
    page_type: String,
}

impl RawPage {
    fn into_page(self, index: usize) -> Result<Page, ParseError> {
        let url = self.url.trim().to_string();
        if url.is_empty() {
            return Err(ParseError::EmptyUrl { index });
        }

        let modified = parse_modified(&self.modified).map_err(|source| ParseError::Timestamp {
            url: url.clone(),
            value: self.modified.clone(),
            source,
        })?;

        // An empty field still yields one (empty) category.
        let categories = self
            .categories
            .trim()
            .split(',')
            .map(|category| category.trim().to_string())
            .collect();

        Ok(Page {
            url,
            modified,
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            path: self.path.trim().to_string(),
            page_type: self.page_type.trim().to_string(),
            categories,
            tags: vec![self.tag.trim().to_string()],
        })
    }
}

/// Parse raw manifest bytes into pages, preserving manifest order.
pub fn parse_manifest(bytes: &[u8]) -> Result<Vec<Page>, ParseError> {
    let text = std::str::from_utf8(bytes)?;
    let raw: Vec<RawPage> = serde_json::from_str(text)?;

    raw.into_iter()
        .enumerate()
        .map(|(index, record)| record.into_page(index))
        .collect()
}

/// Read and parse the manifest at `path`.
pub fn read_manifest(path: &Path) -> Result<Vec<Page>, ParseError> {
    let bytes = std::fs::read(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(url: &str, modified: &str) -> serde_json::Value {
        serde_json::json!({
            "url": url,
            "modified": modified,
            "title": "  Title  ",
            "content": " Body ",
            "path": " posts/a.md ",
            "categories": "news, rust ,releases",
            "tag": " blog ",
            "type": " post "
        })
    }

    fn bytes(records: &[serde_json::Value]) -> Vec<u8> {
        serde_json::to_vec(records).unwrap()
    }

    #[test]
    fn test_parses_and_trims_fields() {
        let pages = parse_manifest(&bytes(&[record("  /a  ", "2024-01-01 00:00:00 +0000")])).unwrap();

        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert_eq!(page.url, "/a");
        assert_eq!(page.title, "Title");
        assert_eq!(page.content, "Body");
        assert_eq!(page.path, "posts/a.md");
        assert_eq!(page.page_type, "post");
        assert_eq!(page.categories, vec!["news", "rust", "releases"]);
        assert_eq!(page.tags, vec!["blog"]);
        assert_eq!(
            page.modified,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_preserves_manifest_order() {
        let pages = parse_manifest(&bytes(&[
            record("/c", "2024-01-01 00:00:00 +0000"),
            record("/a", "2024-01-01 00:00:00 +0000"),
            record("/b", "2024-01-01 00:00:00 +0000"),
        ]))
        .unwrap();

        let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["/c", "/a", "/b"]);
    }

    #[test]
    fn test_empty_categories_yield_single_empty_category() {
        let mut raw = record("/a", "2024-01-01 00:00:00 +0000");
        raw["categories"] = serde_json::json!("");

        let pages = parse_manifest(&bytes(&[raw])).unwrap();
        assert_eq!(pages[0].categories, vec![String::new()]);
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(parse_manifest(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_top_level_object_is_rejected() {
        let err = parse_manifest(br#"{"url": "/a"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Schema(_)), "got {err:?}");
    }

    #[test]
    fn test_missing_field_rejects_whole_manifest() {
        let mut broken = record("/b", "2024-01-01 00:00:00 +0000");
        broken.as_object_mut().unwrap().remove("title");

        let err = parse_manifest(&bytes(&[record("/a", "2024-01-01 00:00:00 +0000"), broken]))
            .unwrap_err();
        match err {
            ParseError::Schema(e) => assert!(e.to_string().contains("title"), "{e}"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_string_field_is_rejected() {
        let mut raw = record("/a", "2024-01-01 00:00:00 +0000");
        raw["content"] = serde_json::json!(42);

        let err = parse_manifest(&bytes(&[raw])).unwrap_err();
        assert!(matches!(err, ParseError::Schema(_)));
    }

    #[test]
    fn test_bad_timestamp_names_the_record() {
        let err = parse_manifest(&bytes(&[record("/a", "yesterday")])).unwrap_err();
        match err {
            ParseError::Timestamp { url, value, .. } => {
                assert_eq!(url, "/a");
                assert_eq!(value, "yesterday");
            }
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_url_is_rejected() {
        let err = parse_manifest(&bytes(&[
            record("/a", "2024-01-01 00:00:00 +0000"),
            record("   ", "2024-01-01 00:00:00 +0000"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ParseError::EmptyUrl { index: 1 }));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = parse_manifest(&[0x5b, 0xff, 0x5d]).unwrap_err();
        assert!(matches!(err, ParseError::Encoding(_)));
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_manifest(&temp_dir.path().join("pages.json")).unwrap_err();
        assert!(matches!(err, ParseError::Read { .. }));
    }
}
