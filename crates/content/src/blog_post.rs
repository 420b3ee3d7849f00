//! Legacy stored blog post shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blog post as persisted by the dashboard before [`crate::UniversalContent`]
/// existed. Keywords are a single string holding either a JSON array or a
/// comma-separated list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Parse the stored keyword string.
///
/// A JSON array of strings wins; anything else is split on commas.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        return list
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
    }

    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Inverse of [`parse_keywords`]: always a JSON array.
pub fn serialize_keywords(keywords: &[String]) -> String {
    serde_json::to_string(keywords).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keywords_json_array() {
        assert_eq!(
            parse_keywords(r#"["rust", " async ", ""]"#),
            vec!["rust".to_string(), "async".to_string()]
        );
    }

    #[test]
    fn test_parse_keywords_falls_back_to_commas() {
        assert_eq!(
            parse_keywords("rust, async,,tokio "),
            vec!["rust", "async", "tokio"]
        );
        // Malformed JSON is treated as a plain list.
        assert_eq!(parse_keywords(r#"["rust""#), vec![r#"["rust""#]);
        assert!(parse_keywords("   ").is_empty());
    }

    #[test]
    fn test_serialize_keywords_round_trip() {
        let keywords = vec!["a b".to_string(), "c,d".to_string()];
        assert_eq!(parse_keywords(&serialize_keywords(&keywords)), keywords);
    }

    #[test]
    fn test_blog_post_uses_snake_case() {
        let post: BlogPost = serde_json::from_str(
            r#"{"title": "T", "content": "C", "meta_description": "M", "seo_title": "S"}"#,
        )
        .unwrap();
        assert_eq!(post.meta_description.as_deref(), Some("M"));
        assert_eq!(post.seo_title.as_deref(), Some("S"));
    }
}
