//! Conversion, analysis and validation entry points.

use std::borrow::Cow;
use tracing::debug;

use crate::analysis::{self, ContentAnalysis};
use crate::blog_post::{parse_keywords, serialize_keywords, BlogPost};
use crate::extract::{extract, ExtractOptions};
use crate::markdown::{slugify, truncate_words};
use crate::model::UniversalContent;
use crate::policy::{ScoringPolicy, ValidationPolicy};
use crate::validation::{self, ContentValidation};

/// Stateless service over [`UniversalContent`], parameterised by policy.
#[derive(Debug, Clone, Default)]
pub struct ContentService {
    scoring: ScoringPolicy,
    validation: ValidationPolicy,
}

impl ContentService {
    pub fn new(scoring: ScoringPolicy, validation: ValidationPolicy) -> Self {
        Self {
            scoring,
            validation,
        }
    }

    pub fn scoring_policy(&self) -> &ScoringPolicy {
        &self.scoring
    }

    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            link_relevance: self.scoring.default_link_relevance,
            context_chars: self.scoring.link_context_chars,
        }
    }

    /// Build the canonical record from a stored blog post.
    pub fn from_blog_post(&self, post: &BlogPost) -> UniversalContent {
        let extracted = extract(&post.content, self.extract_options());
        let keywords = post
            .keywords
            .as_deref()
            .map(parse_keywords)
            .unwrap_or_default();

        let excerpt = non_empty(post.excerpt.as_deref()).unwrap_or_else(|| {
            extracted
                .first_paragraph
                .as_deref()
                .map(|p| truncate_words(p, self.scoring.excerpt_max_chars))
                .unwrap_or_default()
        });

        debug!(
            title = %post.title,
            headings = extracted.headings.len(),
            images = extracted.images.len(),
            internal_links = extracted.internal_links.len(),
            external_links = extracted.external_links.len(),
            "Converted blog post"
        );

        UniversalContent {
            id: post.id.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            excerpt,
            meta_description: post.meta_description.clone().unwrap_or_default(),
            keywords,
            tags: post.tags.clone(),
            featured_image: non_empty(post.featured_image.as_deref()),
            body_images: extracted.images,
            seo_title: non_empty(post.seo_title.as_deref()).unwrap_or_else(|| post.title.clone()),
            slug: non_empty(post.slug.as_deref()).unwrap_or_else(|| slugify(&post.title)),
            focus_keyword: non_empty(post.focus_keyword.as_deref()),
            heading_structure: extracted.headings,
            internal_link_opportunities: extracted.internal_links,
            external_link_targets: extracted.external_links,
            author: post.author.clone(),
            category: post.category.clone(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }

    /// Map back to the stored shape. Derived structure is dropped.
    pub fn to_blog_post(&self, content: &UniversalContent) -> BlogPost {
        let some = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());
        BlogPost {
            id: content.id.clone(),
            title: content.title.clone(),
            content: content.content.clone(),
            excerpt: some(&content.excerpt),
            meta_description: some(&content.meta_description),
            keywords: Some(serialize_keywords(&content.keywords)),
            tags: content.tags.clone(),
            slug: some(&content.slug),
            seo_title: some(&content.seo_title),
            featured_image: content.featured_image.clone(),
            focus_keyword: content.focus_keyword.clone(),
            author: content.author.clone(),
            category: content.category.clone(),
            created_at: content.created_at,
            updated_at: content.updated_at,
        }
    }

    /// Fill in structure a caller left empty, e.g. content built by hand
    /// rather than through [`Self::from_blog_post`].
    pub fn with_structure<'a>(&self, content: &'a UniversalContent) -> Cow<'a, UniversalContent> {
        let needs_headings = content.heading_structure.is_empty();
        let needs_images = content.body_images.is_empty();
        let needs_links = content.internal_link_opportunities.is_empty()
            && content.external_link_targets.is_empty();
        if !(needs_headings || needs_images || needs_links) {
            return Cow::Borrowed(content);
        }

        let extracted = extract(&content.content, self.extract_options());
        let mut owned = content.clone();
        if needs_headings {
            owned.heading_structure = extracted.headings;
        }
        if needs_images {
            owned.body_images = extracted.images;
        }
        if needs_links {
            owned.internal_link_opportunities = extracted.internal_links;
            owned.external_link_targets = extracted.external_links;
        }
        Cow::Owned(owned)
    }

    pub fn analyze(&self, content: &UniversalContent) -> ContentAnalysis {
        let content = self.with_structure(content);
        analysis::analyze(&content, &self.scoring)
    }

    pub fn validate(&self, content: &UniversalContent) -> ContentValidation {
        validation::validate(content, &self.validation)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(content: &str) -> BlogPost {
        BlogPost {
            title: "Getting Started".to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_blog_post_defaults() {
        let mut input = post("# Getting Started\n\nFirst paragraph here.\n\nSecond.");
        input.keywords = Some("rust, tokio".to_string());
        input.slug = Some(String::new());

        let content = ContentService::default().from_blog_post(&input);
        assert_eq!(content.slug, "getting-started");
        assert_eq!(content.seo_title, "Getting Started");
        assert_eq!(content.excerpt, "First paragraph here.");
        assert_eq!(content.keywords, vec!["rust", "tokio"]);
        assert_eq!(content.heading_structure.len(), 1);
    }

    #[test]
    fn test_stored_fields_win() {
        let mut input = post("Body.");
        input.slug = Some("custom".to_string());
        input.seo_title = Some("SEO".to_string());
        input.excerpt = Some("Stored".to_string());

        let content = ContentService::default().from_blog_post(&input);
        assert_eq!(content.slug, "custom");
        assert_eq!(content.seo_title, "SEO");
        assert_eq!(content.excerpt, "Stored");
    }

    #[test]
    fn test_to_blog_post_serializes_keywords_as_json() {
        let content = UniversalContent {
            title: "T".to_string(),
            keywords: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        };
        let post = ContentService::default().to_blog_post(&content);
        assert_eq!(post.keywords.as_deref(), Some(r#"["a","b"]"#));
        assert_eq!(post.excerpt, None);
    }

    #[test]
    fn test_analyze_fills_missing_structure() {
        let content = UniversalContent {
            title: "T".to_string(),
            content: "# One\n\n## Two\n\nSee [docs](/docs).".to_string(),
            ..Default::default()
        };
        let analysis = ContentService::default().analyze(&content);
        assert_eq!(analysis.heading_analysis.count(1), 1);
        assert_eq!(analysis.heading_analysis.count(2), 1);
        assert_eq!(analysis.link_distribution.internal, 1);
    }
}
