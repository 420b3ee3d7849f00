//! Platform-agnostic content model.
//!
//! [`UniversalContent`] is the canonical article record passed through the
//! publishing pipeline. It is built once per publishing attempt and treated as
//! an immutable value; every later stage derives a new object from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical, platform-independent article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversalContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    /// Markdown body. Source of truth for every platform rendering.
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub body_images: Vec<ContentImage>,
    #[serde(default)]
    pub seo_title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_keyword: Option<String>,
    #[serde(default)]
    pub heading_structure: Vec<ContentHeading>,
    #[serde(default)]
    pub internal_link_opportunities: Vec<LinkOpportunity>,
    #[serde(default)]
    pub external_link_targets: Vec<ExternalLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UniversalContent {
    /// The keyword SEO checks are run against: the explicit focus keyword,
    /// otherwise the first keyword.
    #[must_use]
    pub fn primary_keyword(&self) -> Option<&str> {
        self.focus_keyword
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.keywords.first().map(String::as_str))
    }

    /// Short text suitable for summaries: excerpt, then meta description,
    /// then title.
    #[must_use]
    pub fn summary(&self) -> &str {
        [&self.excerpt, &self.meta_description, &self.title]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }

    /// Number of images attached to the article, featured image included.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.body_images.len() + usize::from(self.featured_image.is_some())
    }
}

/// Image embedded in the article body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentImage {
    pub url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default)]
    pub position: ImagePosition,
    #[serde(default)]
    pub optimization: ImageOptimization,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePosition {
    /// Zero-based index of the paragraph the image belongs to.
    pub paragraph_index: usize,
    #[serde(default)]
    pub placement: ImagePlacement,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagePlacement {
    #[default]
    Inline,
    Before,
    After,
    Featured,
}

/// Optimization hints carried with an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptimization {
    pub lazy_load: bool,
    pub format: ImageFormat,
    pub compression: Compression,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Default for ImageOptimization {
    fn default() -> Self {
        Self {
            lazy_load: true,
            format: ImageFormat::Original,
            compression: Compression::Medium,
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Original,
    Webp,
    Avif,
    Jpeg,
    Png,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Low,
    #[default]
    Medium,
    High,
}

/// A heading found in the Markdown body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentHeading {
    /// 1–6.
    pub level: u8,
    pub text: String,
    /// Stable slug derived from the heading text.
    pub id: String,
    /// Words in the section body up to the next heading.
    pub word_count: usize,
    /// Declared for nested outlines. The extractor produces a flat list and
    /// leaves this empty.
    #[serde(default)]
    pub subsections: Vec<ContentHeading>,
}

/// Where a link sits in the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPosition {
    pub paragraph: usize,
    pub sentence: usize,
    /// Byte offset of the link in the Markdown source.
    pub character: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkIntent {
    #[default]
    Informational,
    Navigational,
    Transactional,
    Commercial,
}

/// Candidate link to a page on the same site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkOpportunity {
    pub anchor_text: String,
    pub target_url: String,
    /// 0.0–1.0.
    pub relevance_score: f64,
    #[serde(default)]
    pub position: LinkPosition,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub intent: LinkIntent,
}

/// Candidate link to another site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLink {
    pub anchor_text: String,
    pub url: String,
    #[serde(default)]
    pub domain: String,
    /// 0.0–1.0.
    pub relevance_score: f64,
    #[serde(default)]
    pub position: LinkPosition,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub intent: LinkIntent,
    #[serde(default)]
    pub nofollow: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_keyword_prefers_focus_keyword() {
        let mut content = UniversalContent {
            keywords: vec!["rust".to_string(), "async".to_string()],
            ..Default::default()
        };
        assert_eq!(content.primary_keyword(), Some("rust"));

        content.focus_keyword = Some("tokio".to_string());
        assert_eq!(content.primary_keyword(), Some("tokio"));

        content.focus_keyword = Some("  ".to_string());
        assert_eq!(content.primary_keyword(), Some("rust"));
    }

    #[test]
    fn test_summary_fallback_order() {
        let mut content = UniversalContent {
            title: "Title".to_string(),
            ..Default::default()
        };
        assert_eq!(content.summary(), "Title");

        content.meta_description = "Meta".to_string();
        assert_eq!(content.summary(), "Meta");

        content.excerpt = "Excerpt".to_string();
        assert_eq!(content.summary(), "Excerpt");
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "title": "Hello",
            "content": "Body",
            "metaDescription": "Desc",
            "bodyImages": [{"url": "a.png", "altText": "A"}]
        }"#;
        let content: UniversalContent = serde_json::from_str(json).unwrap();
        assert_eq!(content.meta_description, "Desc");
        assert_eq!(content.body_images[0].alt_text, "A");
        assert!(content.body_images[0].optimization.lazy_load);
    }
}
