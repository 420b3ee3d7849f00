//! Base Adapter Implementation
//!
//! Shared behaviour for every platform adapter: default backlink generation,
//! capability-driven validation, field mappings and the HTTP plumbing used by
//! the REST clients.

use content::extract::domain_of;
use content::validation::{Impact, Severity, ValidationError, ValidationWarning};
use content::{ContentService, LinkIntent, LinkPosition, UniversalContent};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::adapter::{
    ContentFormat, Platform, PlatformCapabilities, PlatformContent, PublishingResult,
    ValidationResult,
};
use crate::error::{AdapterError, AdapterResult};
use crate::links::{
    domain_matches, LinkStrategy, LinkingRules, ProcessedLink, ProjectContext,
};

/// Validation codes produced by [`validate`].
pub mod codes {
    pub const UNSUPPORTED_FORMAT: &str = "UNSUPPORTED_FORMAT";
    pub const TITLE_TOO_LONG: &str = "TITLE_TOO_LONG";
    pub const CONTENT_TOO_LONG: &str = "CONTENT_TOO_LONG";
    pub const IMAGE_REQUIRED: &str = "IMAGE_REQUIRED";
    pub const EXCERPT_TOO_LONG: &str = "EXCERPT_TOO_LONG";
    pub const INTERNAL_LINKS_UNSUPPORTED: &str = "INTERNAL_LINKS_UNSUPPORTED";
    pub const TOO_MANY_TAGS: &str = "TOO_MANY_TAGS";
    pub const TOO_MANY_IMAGES: &str = "TOO_MANY_IMAGES";
}

pub const DEFAULT_MAX_INTERNAL_LINKS: usize = 10;
pub const DEFAULT_MAX_EXTERNAL_LINKS: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// State every adapter carries.
#[derive(Debug, Clone)]
pub struct BaseAdapter {
    pub platform: Platform,
    pub capabilities: PlatformCapabilities,
    pub client: Client,
    /// Outgoing payload key renames.
    pub field_mappings: HashMap<String, String>,
    /// Analysis and structure extraction under the configured policies.
    pub service: ContentService,
}

impl BaseAdapter {
    pub fn new(
        platform: Platform,
        headers: HeaderMap,
        timeout: Duration,
        field_mappings: HashMap<String, String>,
    ) -> AdapterResult<Self> {
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            platform,
            capabilities: platform.capabilities(),
            client,
            field_mappings,
            service: ContentService::default(),
        })
    }

    pub fn map_fields(&self, payload: Map<String, Value>) -> Map<String, Value> {
        apply_field_mappings(payload, &self.field_mappings)
    }

    /// Fail on non-success status, otherwise decode the JSON body.
    pub async fn read_json<T: DeserializeOwned>(&self, response: Response) -> AdapterResult<T> {
        let response = self.check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            AdapterError::InvalidResponse(format!("{} response: {e}", self.platform))
        })
    }

    pub async fn check_status(&self, response: Response) -> AdapterResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AdapterError::Api {
            platform: self.platform.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    /// Turn an operation outcome into a result, logging failures.
    pub fn fold(&self, operation: &str, outcome: AdapterResult<PublishingResult>) -> PublishingResult {
        match outcome {
            Ok(result) => {
                debug!(
                    platform = %self.platform,
                    operation,
                    platform_id = ?result.platform_id,
                    "Platform operation succeeded"
                );
                result
            }
            Err(e) => {
                warn!(platform = %self.platform, operation, error = %e, "Platform operation failed");
                PublishingResult::failed(self.platform, e.to_string())
            }
        }
    }
}

/// Rename payload keys per the integration's field mappings. Keys without a
/// mapping pass through unchanged.
pub fn apply_field_mappings(
    payload: Map<String, Value>,
    mappings: &HashMap<String, String>,
) -> Map<String, Value> {
    if mappings.is_empty() {
        return payload;
    }
    payload
        .into_iter()
        .map(|(key, value)| match mappings.get(&key) {
            Some(mapped) => (mapped.clone(), value),
            None => (key, value),
        })
        .collect()
}

/// Resolve `url` against `base` when it is relative.
pub fn resolve_url(base: &str, url: &str) -> String {
    if Url::parse(url).is_ok() {
        return url.to_string();
    }
    Url::parse(base)
        .and_then(|b| b.join(url))
        .map_or_else(|_| url.to_string(), |u| u.to_string())
}

pub fn default_rules(capabilities: &PlatformCapabilities, project: &ProjectContext) -> LinkingRules {
    LinkingRules {
        max_internal_links: if capabilities.supports_internal_links {
            DEFAULT_MAX_INTERNAL_LINKS
        } else {
            0
        },
        max_external_links: DEFAULT_MAX_EXTERNAL_LINKS,
        required_domains: project.required_domains.clone(),
        forbidden_domains: project.forbidden_domains.clone(),
        ..Default::default()
    }
}

/// Default backlink strategy: existing opportunities map 1:1, project pages
/// sharing a keyword become extra internal suggestions, external links are
/// filtered by the domain rules and both lists are capped by SEO value.
pub fn generate_backlinks(
    capabilities: &PlatformCapabilities,
    content: &UniversalContent,
    project: &ProjectContext,
) -> LinkStrategy {
    let rules = default_rules(capabilities, project);
    let (internal, external) = candidate_links(content, project, &rules);

    LinkStrategy {
        internal_links: cap_by_value(internal, rules.max_internal_links),
        external_links: cap_by_value(external, rules.max_external_links),
        rules,
    }
}

/// All internal and external candidates, uncapped.
pub fn candidate_links(
    content: &UniversalContent,
    project: &ProjectContext,
    rules: &LinkingRules,
) -> (Vec<ProcessedLink>, Vec<ProcessedLink>) {
    let mut internal: Vec<ProcessedLink> = content
        .internal_link_opportunities
        .iter()
        .map(|link| ProcessedLink {
            anchor_text: link.anchor_text.clone(),
            url: resolve_url(&project.base_url, &link.target_url),
            internal: true,
            seo_value: link.relevance_score * 100.0,
            position: link.position,
            context: link.context.clone(),
            intent: link.intent,
            nofollow: false,
        })
        .collect();

    let keywords: HashSet<String> = content
        .keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    for page in &project.pages {
        let url = resolve_url(&project.base_url, &page.url);
        if internal.iter().any(|l| l.url == url) || page.keywords.is_empty() {
            continue;
        }
        let overlap = page
            .keywords
            .iter()
            .filter(|k| keywords.contains(&k.trim().to_lowercase()))
            .count();
        if overlap == 0 {
            continue;
        }
        internal.push(ProcessedLink {
            anchor_text: page.title.clone(),
            url,
            internal: true,
            seo_value: overlap as f64 / page.keywords.len() as f64 * 100.0,
            position: LinkPosition::default(),
            context: String::new(),
            intent: LinkIntent::Navigational,
            nofollow: false,
        });
    }

    let external = content
        .external_link_targets
        .iter()
        .filter(|link| {
            let domain = if link.domain.trim().is_empty() {
                domain_of(&link.url)
            } else {
                link.domain.clone()
            };
            if rules.forbidden_domains.iter().any(|rule| domain_matches(&domain, rule)) {
                debug!(url = %link.url, "Dropping link to forbidden domain");
                return false;
            }
            if !rules.required_domains.is_empty()
                && !rules.required_domains.iter().any(|rule| domain_matches(&domain, rule))
            {
                debug!(url = %link.url, "Dropping link outside required domains");
                return false;
            }
            true
        })
        .map(|link| ProcessedLink {
            anchor_text: link.anchor_text.clone(),
            url: link.url.clone(),
            internal: false,
            seo_value: link.relevance_score * 100.0,
            position: link.position,
            context: link.context.clone(),
            intent: link.intent,
            nofollow: link.nofollow,
        })
        .collect();

    (internal, external)
}

/// Keep the `max` most valuable links, preserving document order.
pub fn cap_by_value(links: Vec<ProcessedLink>, max: usize) -> Vec<ProcessedLink> {
    if links.len() <= max {
        return links;
    }
    let mut ranked: Vec<(usize, ProcessedLink)> = links.into_iter().enumerate().collect();
    ranked.sort_by(|a, b| b.1.seo_value.total_cmp(&a.1.seo_value).then(a.0.cmp(&b.0)));
    ranked.truncate(max);
    ranked.sort_by_key(|(index, _)| *index);
    ranked.into_iter().map(|(_, link)| link).collect()
}

fn penalty(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => 25,
        Severity::High => 15,
        Severity::Medium => 10,
        Severity::Low => 5,
    }
}

/// Score: 100 minus per-error severity penalties minus 2 per warning.
pub fn score(errors: &[ValidationError], warnings: &[ValidationWarning]) -> u32 {
    let deductions: u32 = errors.iter().map(|e| penalty(e.severity)).sum::<u32>()
        + 2 * warnings.len() as u32;
    100u32.saturating_sub(deductions)
}

/// Check `content` against the platform's capabilities.
pub fn validate(capabilities: &PlatformCapabilities, content: &PlatformContent) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if content.format == ContentFormat::Markdown && !capabilities.supports_markdown {
        errors.push(ValidationError::new(
            codes::UNSUPPORTED_FORMAT,
            "format",
            Severity::Critical,
            format!("{} does not accept Markdown content", content.platform),
        ));
    }

    if let Some(max) = capabilities.max_title_length {
        let len = content.title.chars().count();
        if len > max {
            errors.push(ValidationError::new(
                codes::TITLE_TOO_LONG,
                "title",
                Severity::High,
                format!("Title is {len} characters, limit is {max}"),
            ));
        }
    }

    if let Some(max) = capabilities.max_content_length {
        let len = content.content.chars().count();
        if len > max {
            errors.push(ValidationError::new(
                codes::CONTENT_TOO_LONG,
                "content",
                Severity::High,
                format!("Content is {len} characters, limit is {max}"),
            ));
        }
    }

    if capabilities.requires_image && content.images.is_empty() {
        errors.push(ValidationError::new(
            codes::IMAGE_REQUIRED,
            "images",
            Severity::High,
            format!("{} posts require an image", content.platform),
        ));
    }

    if let Some(max) = capabilities.max_excerpt_length {
        let len = content.excerpt.chars().count();
        if len > max {
            errors.push(ValidationError::new(
                codes::EXCERPT_TOO_LONG,
                "excerpt",
                Severity::Medium,
                format!("Excerpt is {len} characters, limit is {max}"),
            ));
        }
    }

    if !capabilities.supports_internal_links && content.links.iter().any(|l| l.internal) {
        errors.push(ValidationError::new(
            codes::INTERNAL_LINKS_UNSUPPORTED,
            "links",
            Severity::Low,
            format!("{} does not support internal links", content.platform),
        ));
    }

    if let Some(max) = capabilities.max_tags {
        if content.tags.len() > max {
            warnings.push(ValidationWarning::new(
                codes::TOO_MANY_TAGS,
                "tags",
                Impact::Seo,
                format!("{} tags, only {max} will be used", content.tags.len()),
            ));
        }
    }

    if let Some(max) = capabilities.max_images {
        if content.images.len() > max {
            warnings.push(ValidationWarning::new(
                codes::TOO_MANY_IMAGES,
                "images",
                Impact::Ux,
                format!("{} images, only {max} will be used", content.images.len()),
            ));
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        score: score(&errors, &warnings),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{PlatformImage, PlatformLink};
    use crate::links::ProjectPage;
    use content::{ExternalLink, LinkOpportunity};
    use serde_json::json;

    fn article() -> UniversalContent {
        UniversalContent {
            title: "Async Rust".to_string(),
            content: "Body".to_string(),
            keywords: vec!["rust".to_string(), "async".to_string()],
            internal_link_opportunities: vec![LinkOpportunity {
                anchor_text: "docs".to_string(),
                target_url: "/docs".to_string(),
                relevance_score: 0.8,
                ..Default::default()
            }],
            external_link_targets: vec![
                ExternalLink {
                    anchor_text: "Tokio".to_string(),
                    url: "https://tokio.rs".to_string(),
                    domain: "tokio.rs".to_string(),
                    relevance_score: 0.8,
                    ..Default::default()
                },
                ExternalLink {
                    anchor_text: "Spam".to_string(),
                    url: "https://spam.example/x".to_string(),
                    domain: "spam.example".to_string(),
                    relevance_score: 0.9,
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    fn project() -> ProjectContext {
        ProjectContext {
            base_url: "https://blog.example.com".to_string(),
            pages: vec![
                ProjectPage {
                    url: "/guides/async".to_string(),
                    title: "Async guide".to_string(),
                    keywords: vec!["Async".to_string(), "futures".to_string()],
                },
                ProjectPage {
                    url: "/docs".to_string(),
                    title: "Docs".to_string(),
                    keywords: vec!["rust".to_string()],
                },
                ProjectPage {
                    url: "/cooking".to_string(),
                    title: "Cooking".to_string(),
                    keywords: vec!["pasta".to_string()],
                },
            ],
            forbidden_domains: vec!["spam.example".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_backlinks_defaults() {
        let caps = Platform::WordPress.capabilities();
        let strategy = generate_backlinks(&caps, &article(), &project());

        assert_eq!(strategy.rules.max_internal_links, 10);
        assert_eq!(strategy.rules.max_external_links, 5);

        let urls: Vec<&str> = strategy.internal_links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://blog.example.com/docs",
                "https://blog.example.com/guides/async"
            ]
        );
        assert!((strategy.internal_links[0].seo_value - 80.0).abs() < 1e-9);
        assert!((strategy.internal_links[1].seo_value - 50.0).abs() < 1e-9);

        assert_eq!(strategy.external_links.len(), 1);
        assert_eq!(strategy.external_links[0].url, "https://tokio.rs");
    }

    #[test]
    fn test_no_internal_links_without_support() {
        let caps = Platform::Twitter.capabilities();
        let strategy = generate_backlinks(&caps, &article(), &project());
        assert_eq!(strategy.rules.max_internal_links, 0);
        assert!(strategy.internal_links.is_empty());
    }

    #[test]
    fn test_external_links_follow_domain_rules() {
        let caps = Platform::WordPress.capabilities();
        let mut content = article();
        // Links built by hand may carry no domain.
        content.external_link_targets.push(ExternalLink {
            anchor_text: "More spam".to_string(),
            url: "https://www.cdn.spam.example/y".to_string(),
            relevance_score: 0.9,
            ..Default::default()
        });
        content.external_link_targets.push(ExternalLink {
            anchor_text: "Docs".to_string(),
            url: "https://docs.rs/tokio".to_string(),
            relevance_score: 0.5,
            ..Default::default()
        });

        let strategy = generate_backlinks(&caps, &content, &project());
        let urls: Vec<&str> = strategy.external_links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://tokio.rs", "https://docs.rs/tokio"]);

        let mut project = project();
        project.required_domains = vec!["docs.rs".to_string()];
        let strategy = generate_backlinks(&caps, &content, &project);
        let urls: Vec<&str> = strategy.external_links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://docs.rs/tokio"]);
        assert_eq!(strategy.rules.required_domains, vec!["docs.rs"]);
    }

    #[test]
    fn test_cap_by_value_keeps_order() {
        let link = |url: &str, value: f64| ProcessedLink {
            anchor_text: url.to_string(),
            url: url.to_string(),
            internal: true,
            seo_value: value,
            position: LinkPosition::default(),
            context: String::new(),
            intent: LinkIntent::Navigational,
            nofollow: false,
        };
        let capped = cap_by_value(vec![link("a", 10.0), link("b", 90.0), link("c", 50.0)], 2);
        let urls: Vec<&str> = capped.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "c"]);
    }

    #[test]
    fn test_validate_scores() {
        let caps = Platform::WordPress.capabilities();
        let clean = PlatformContent::new(Platform::WordPress, "Title", "<p>Body</p>");
        let result = validate(&caps, &clean);
        assert!(result.is_valid);
        assert_eq!(result.score, 100);

        let mut markdown = clean.clone();
        markdown.format = ContentFormat::Markdown;
        let result = validate(&caps, &markdown);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].severity, Severity::Critical);
        assert_eq!(result.score, 75);
    }

    #[test]
    fn test_validate_social_limits() {
        let caps = Platform::Instagram.capabilities();
        let mut post = PlatformContent::new(Platform::Instagram, "", "x".repeat(2201));
        post.format = ContentFormat::PlainText;
        post.links.push(PlatformLink {
            url: "/internal".to_string(),
            internal: true,
            ..Default::default()
        });
        post.tags = (0..31).map(|i| format!("tag{i}")).collect();

        let result = validate(&caps, &post);
        let found: Vec<&str> = result.errors.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(
            found,
            vec![
                codes::CONTENT_TOO_LONG,
                codes::IMAGE_REQUIRED,
                codes::INTERNAL_LINKS_UNSUPPORTED
            ]
        );
        assert_eq!(result.warnings.len(), 1);
        // 15 + 15 + 5 + 2
        assert_eq!(result.score, 63);

        post.images = vec![PlatformImage::default(); 11];
        let result = validate(&caps, &post);
        assert!(result.warnings.iter().any(|w| w.code == codes::TOO_MANY_IMAGES));
    }

    #[test]
    fn test_apply_field_mappings() {
        let payload = json!({"title": "T", "content": "C"});
        let Value::Object(map) = payload else {
            unreachable!()
        };
        let mappings = HashMap::from([("title".to_string(), "headline".to_string())]);
        let mapped = apply_field_mappings(map, &mappings);
        assert_eq!(mapped.get("headline"), Some(&json!("T")));
        assert_eq!(mapped.get("content"), Some(&json!("C")));
        assert!(!mapped.contains_key("title"));
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://example.com/blog/", "post"),
            "https://example.com/blog/post"
        );
        assert_eq!(
            resolve_url("https://example.com", "https://other.com/x"),
            "https://other.com/x"
        );
        assert_eq!(resolve_url("", "/docs"), "/docs");
    }
}
