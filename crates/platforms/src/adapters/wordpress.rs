//! WordPress adapter.
//!
//! Renders Markdown into Gutenberg block markup and publishes through the
//! WordPress REST API (`/wp-json/wp/v2/posts`) with an application password.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use content::analysis::{keyword_density, reading_time, word_count};
use content::markdown::{
    html_blocks, html_to_markdown, paragraph_count, slugify, to_plain_text, truncate_words,
    BlockKind, HtmlBlock,
};
use content::{ContentService, UniversalContent};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::adapter::{
    ContentFormat, ContentTransformationResult, Platform, PlatformAdapter, PlatformCapabilities,
    PlatformContent, PublishStatus, PublishingResult, PublishingStatus, RemoteStatus,
    TransformOptions,
};
use crate::base_adapter::{self, BaseAdapter};
use crate::config::{PlatformsConfig, WordPressConfig};
use crate::error::{AdapterError, AdapterResult};
use crate::links::{
    AnchorTextRules, LinkStrategy, LinkingRules, PositionPreferences, ProcessedLink,
    ProjectContext,
};

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*/?wp:[^>]*?-->\n?").unwrap());
static SEO_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*SEO:[^>]*?-->\n?").unwrap());
static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<img ").unwrap());

const MIN_FOCUS_DENSITY: f64 = 0.5;
const EXCERPT_CHARS: usize = 155;

const MAX_INTERNAL_LINKS: usize = 15;
const MAX_EXTERNAL_LINKS: usize = 5;
const MAX_ANCHOR_CHARS: usize = 60;

/// WordPress REST adapter.
#[derive(Debug, Clone)]
pub struct WordPressAdapter {
    base: BaseAdapter,
    site_url: String,
    username: String,
    app_password: String,
}

#[derive(Debug, Deserialize)]
struct WpPost {
    id: u64,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    modified_gmt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WpTerm {
    id: u64,
    #[serde(default)]
    name: String,
}

/// Term ids resolved for one post.
#[derive(Debug, Default)]
struct Terms {
    tags: Vec<u64>,
    categories: Vec<u64>,
}

impl WordPressAdapter {
    pub fn new(
        config: &WordPressConfig,
        app_password: String,
        timeout: Duration,
    ) -> AdapterResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(Self {
            base: BaseAdapter::new(
                Platform::WordPress,
                headers,
                timeout,
                config.field_mappings.clone(),
            )?,
            site_url: config.site_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            app_password,
        })
    }

    pub fn from_config(config: &PlatformsConfig) -> AdapterResult<Self> {
        let wp = config
            .wordpress
            .as_ref()
            .ok_or_else(|| AdapterError::NotConfigured("wordpress".to_string()))?;
        let password = config.secret(&wp.app_password)?;
        Ok(Self::new(wp, password, config.timeout())?
            .with_content_service(config.content_service()))
    }

    pub fn with_content_service(mut self, service: ContentService) -> Self {
        self.base.service = service;
        self
    }

    fn posts_url(&self) -> String {
        format!("{}/wp-json/wp/v2/posts", self.site_url)
    }

    fn post_url(&self, id: &str) -> String {
        format!("{}/{id}", self.posts_url())
    }

    fn taxonomy_url(&self, taxonomy: &str) -> String {
        format!("{}/wp-json/wp/v2/{taxonomy}", self.site_url)
    }

    /// Find a tag or category by name, creating it when the site has none.
    async fn term_id(&self, taxonomy: &str, name: &str) -> AdapterResult<u64> {
        let response = self
            .base
            .client
            .get(self.taxonomy_url(taxonomy))
            .query(&[("search", name), ("per_page", "100")])
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?;
        let found: Vec<WpTerm> = self.base.read_json(response).await?;
        if let Some(term) = found.iter().find(|t| t.name.eq_ignore_ascii_case(name)) {
            return Ok(term.id);
        }

        debug!(taxonomy, name, "Creating WordPress term");
        let response = self
            .base
            .client
            .post(self.taxonomy_url(taxonomy))
            .basic_auth(&self.username, Some(&self.app_password))
            .json(&json!({ "name": name }))
            .send()
            .await?;
        let created: WpTerm = self.base.read_json(response).await?;
        Ok(created.id)
    }

    async fn resolve_terms(&self, content: &PlatformContent) -> AdapterResult<Terms> {
        let fields = &content.platform_specific_fields;
        let names = |key: &str| -> Vec<String> {
            match fields.get(key) {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
                    .collect(),
                Some(Value::String(name)) if !name.trim().is_empty() => vec![name.clone()],
                _ => Vec::new(),
            }
        };

        let mut terms = Terms::default();
        for tag in names("tag_names") {
            terms.tags.push(self.term_id("tags", &tag).await?);
        }
        for category in names("category_name") {
            terms.categories.push(self.term_id("categories", &category).await?);
        }
        Ok(terms)
    }

    fn payload(&self, content: &PlatformContent, terms: &Terms) -> Value {
        let fields = &content.platform_specific_fields;
        let field = |key: &str, default: &str| {
            fields
                .get(key)
                .cloned()
                .unwrap_or_else(|| Value::String(default.to_string()))
        };

        let mut meta = fields
            .get("meta")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        if let Some(Value::Object(custom)) = fields.get("custom_fields") {
            meta.extend(custom.clone());
        }

        let mut payload = Map::new();
        payload.insert("title".to_string(), json!(content.title));
        payload.insert("content".to_string(), json!(content.content));
        payload.insert("excerpt".to_string(), json!(content.excerpt));
        payload.insert("slug".to_string(), json!(content.slug));
        payload.insert(
            "status".to_string(),
            json!(wp_status(content.publishing_settings.status)),
        );
        payload.insert("comment_status".to_string(), field("comment_status", "open"));
        payload.insert("ping_status".to_string(), field("ping_status", "open"));
        payload.insert("format".to_string(), field("format", "standard"));
        payload.insert("meta".to_string(), Value::Object(meta));
        if !terms.tags.is_empty() {
            payload.insert("tags".to_string(), json!(terms.tags));
        }
        if !terms.categories.is_empty() {
            payload.insert("categories".to_string(), json!(terms.categories));
        }
        if let Some(at) = content.publishing_settings.scheduled_at {
            payload.insert("date_gmt".to_string(), json!(at.naive_utc().to_string()));
        }

        Value::Object(self.base.map_fields(payload))
    }

    async fn send_post(
        &self,
        url: String,
        content: &PlatformContent,
    ) -> AdapterResult<PublishingResult> {
        let terms = self.resolve_terms(content).await?;
        let response = self
            .base
            .client
            .post(url)
            .basic_auth(&self.username, Some(&self.app_password))
            .json(&self.payload(content, &terms))
            .send()
            .await?;
        let post: WpPost = self.base.read_json(response).await?;

        let mut result = PublishingResult::ok(Platform::WordPress, post.id.to_string(), post.link);
        if let Some(image) = content
            .platform_specific_fields
            .get("featured_image")
            .and_then(Value::as_str)
        {
            // featured_media takes a media library id, not a URL.
            result.warnings.push(format!(
                "Featured image {image} was not attached; upload it to the media library and set it on the post"
            ));
        }
        if let Some(status) = post.status {
            result.metadata.insert("status".to_string(), json!(status));
        }
        Ok(result)
    }

    async fn try_delete(&self, platform_id: &str) -> AdapterResult<PublishingResult> {
        let response = self
            .base
            .client
            .delete(self.post_url(platform_id))
            .query(&[("force", "true")])
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?;
        self.base.check_status(response).await?;
        Ok(PublishingResult::ok(Platform::WordPress, platform_id, None))
    }

    async fn try_status(&self, platform_id: &str) -> AdapterResult<PublishingStatus> {
        let response = self
            .base
            .client
            .get(self.post_url(platform_id))
            .query(&[("context", "edit")])
            .basic_auth(&self.username, Some(&self.app_password))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(PublishingStatus {
                platform: Platform::WordPress,
                platform_id: platform_id.to_string(),
                status: RemoteStatus::Deleted,
                url: None,
                last_modified: None,
                error: None,
            });
        }

        let post: WpPost = self.base.read_json(response).await?;
        Ok(PublishingStatus {
            platform: Platform::WordPress,
            platform_id: post.id.to_string(),
            status: remote_status(post.status.as_deref()),
            url: post.link,
            last_modified: post.modified_gmt.as_deref().and_then(parse_gmt),
            error: None,
        })
    }
}

fn wp_status(status: PublishStatus) -> &'static str {
    match status {
        PublishStatus::Draft => "draft",
        PublishStatus::Publish => "publish",
        PublishStatus::Scheduled => "future",
        PublishStatus::Private => "private",
    }
}

fn remote_status(status: Option<&str>) -> RemoteStatus {
    match status {
        Some("publish") => RemoteStatus::Published,
        Some("draft" | "pending") => RemoteStatus::Draft,
        Some("future") => RemoteStatus::Scheduled,
        Some("private") => RemoteStatus::Private,
        Some("trash") => RemoteStatus::Deleted,
        _ => RemoteStatus::Unknown,
    }
}

fn parse_gmt(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Wrap one rendered block in Gutenberg block comments.
fn gutenberg_block(block: &HtmlBlock) -> String {
    let html = block.html.trim_end();
    let (name, attrs, html) = match block.kind {
        BlockKind::Paragraph => ("paragraph", None, html.to_string()),
        BlockKind::Heading(level) => (
            "heading",
            (level != 2).then(|| json!({ "level": level })),
            html.to_string(),
        ),
        BlockKind::List { ordered } => (
            "list",
            ordered.then(|| json!({ "ordered": true })),
            html.to_string(),
        ),
        BlockKind::Image => {
            let inner = html
                .trim_start_matches("<p>")
                .trim_end_matches("</p>")
                .trim();
            let img = IMG_TAG.replace(inner, r#"<img loading="lazy" "#);
            (
                "image",
                None,
                format!(r#"<figure class="wp-block-image">{img}</figure>"#),
            )
        }
        BlockKind::Code => ("code", None, html.to_string()),
        BlockKind::Quote => ("quote", None, html.to_string()),
        BlockKind::Table => (
            "table",
            None,
            format!(r#"<figure class="wp-block-table">{html}</figure>"#),
        ),
        BlockKind::Separator => ("separator", None, html.to_string()),
        BlockKind::Html => ("html", None, html.to_string()),
    };

    let attrs = attrs.map(|a| format!(" {a}")).unwrap_or_default();
    format!("<!-- wp:{name}{attrs} -->\n{html}\n<!-- /wp:{name} -->")
}

/// Markdown to Gutenberg markup.
pub fn to_gutenberg(markdown: &str) -> String {
    html_blocks(markdown)
        .iter()
        .map(gutenberg_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn sort_by_value(links: &mut [ProcessedLink]) {
    links.sort_by(|a, b| b.seo_value.total_cmp(&a.seo_value));
}

type Slot<'a> = dyn Fn(&ProcessedLink) -> bool + 'a;

/// Fill each `(limit, accepts)` slot by SEO value first, then top up to `max`
/// from whatever is left. Result is in document order.
fn place(
    mut candidates: Vec<ProcessedLink>,
    slots: &[(usize, &Slot<'_>)],
    max: usize,
) -> Vec<ProcessedLink> {
    sort_by_value(&mut candidates);
    let mut chosen = Vec::new();
    let mut rest = Vec::new();
    let mut filled = vec![0usize; slots.len()];

    for link in candidates {
        let slot = slots
            .iter()
            .enumerate()
            .find(|(i, (limit, accepts))| filled[*i] < *limit && accepts(&link))
            .map(|(i, _)| i);
        match slot {
            Some(i) if chosen.len() < max => {
                filled[i] += 1;
                chosen.push(link);
            }
            _ => rest.push(link),
        }
    }

    for link in rest {
        if chosen.len() >= max {
            break;
        }
        chosen.push(link);
    }

    chosen.sort_by_key(|l| (l.position.paragraph, l.position.character));
    chosen
}

#[async_trait]
impl PlatformAdapter for WordPressAdapter {
    fn platform(&self) -> Platform {
        Platform::WordPress
    }

    fn capabilities(&self) -> &PlatformCapabilities {
        &self.base.capabilities
    }

    fn transform(
        &self,
        content: &UniversalContent,
        options: &TransformOptions,
    ) -> ContentTransformationResult {
        if content.title.trim().is_empty() {
            return ContentTransformationResult::failed("Title is required");
        }
        if content.content.trim().is_empty() {
            return ContentTransformationResult::failed("Content is required");
        }

        let service = &self.base.service;
        let words_per_minute = service.scoring_policy().words_per_minute;
        let content = service.with_structure(content);
        let mut warnings = Vec::new();
        let mut body = to_gutenberg(&content.content);

        let words = word_count(&content.content);
        let focus = content.primary_keyword().map(str::to_string);
        if let Some(keyword) = &focus {
            let density = keyword_density(&content.content, keyword, words);
            if density < MIN_FOCUS_DENSITY {
                body.push_str(&format!(
                    "\n\n<!-- SEO: focus keyword \"{keyword}\", density {density:.2}% -->"
                ));
                warnings.push(format!(
                    "Focus keyword \"{keyword}\" density {density:.2}% is below {MIN_FOCUS_DENSITY}%"
                ));
            }
        }

        let plain = to_plain_text(&content.content);
        let excerpt = if content.excerpt.trim().is_empty() {
            truncate_words(&plain, EXCERPT_CHARS)
        } else {
            content.excerpt.clone()
        };
        let slug = if content.slug.trim().is_empty() {
            slugify(&content.title)
        } else {
            content.slug.clone()
        };
        let settings = options.publishing_settings();

        let mut fields = Map::new();
        fields.insert("post_type".to_string(), json!("post"));
        fields.insert("status".to_string(), json!(wp_status(settings.status)));
        fields.insert("comment_status".to_string(), json!("open"));
        fields.insert("ping_status".to_string(), json!("open"));
        fields.insert("format".to_string(), json!("standard"));
        let seo_title = if content.seo_title.is_empty() {
            &content.title
        } else {
            &content.seo_title
        };
        fields.insert(
            "meta".to_string(),
            json!({
                "_yoast_wpseo_title": seo_title,
                "_yoast_wpseo_metadesc": content.meta_description,
                "_yoast_wpseo_focuskw": focus.clone().unwrap_or_default(),
            }),
        );
        fields.insert(
            "custom_fields".to_string(),
            json!({
                "reading_time": reading_time(words, words_per_minute),
                "word_count": words,
            }),
        );
        fields.insert("tag_names".to_string(), json!(content.tags));
        if let Some(category) = &content.category {
            fields.insert("category_name".to_string(), json!(category));
        }
        if let Some(image) = &content.featured_image {
            fields.insert("featured_image".to_string(), json!(image));
        }
        if let Some(url) = &options.canonical_url {
            fields.insert("canonical_url".to_string(), json!(url));
        }

        let platform_content = PlatformContent {
            platform: Platform::WordPress,
            title: content.title.clone(),
            content: body,
            format: ContentFormat::Html,
            excerpt,
            slug,
            tags: content.tags.clone(),
            images: super::collect_images(&content, true),
            links: super::collect_links(&content),
            platform_specific_fields: fields,
            publishing_settings: settings,
        };

        debug!(
            title = %platform_content.title,
            warnings = warnings.len(),
            "Transformed content for WordPress"
        );
        ContentTransformationResult::ok(platform_content, warnings)
    }

    fn reverse(&self, content: &PlatformContent) -> UniversalContent {
        let html = BLOCK_COMMENT.replace_all(&content.content, "");
        let html = SEO_COMMENT.replace_all(&html, "");
        let fields = &content.platform_specific_fields;
        let meta = fields.get("meta");
        let meta_str = |key: &str| {
            meta.and_then(|m| m.get(key))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let focus = meta_str("_yoast_wpseo_focuskw");
        let seo_title = meta_str("_yoast_wpseo_title");
        let featured_image = fields
            .get("featured_image")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                content
                    .images
                    .iter()
                    .find(|i| i.attributes.get("role").is_some_and(|r| r == "featured"))
                    .map(|i| i.url.clone())
            });

        let universal = UniversalContent {
            title: content.title.clone(),
            content: html_to_markdown(&html),
            excerpt: content.excerpt.clone(),
            meta_description: meta_str("_yoast_wpseo_metadesc"),
            keywords: if focus.is_empty() { Vec::new() } else { vec![focus.clone()] },
            tags: content.tags.clone(),
            featured_image,
            seo_title: if seo_title == content.title { String::new() } else { seo_title },
            slug: content.slug.clone(),
            focus_keyword: Some(focus).filter(|f| !f.is_empty()),
            category: fields
                .get("category_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            ..Default::default()
        };
        self.base.service.with_structure(&universal).into_owned()
    }

    fn generate_backlinks(&self, content: &UniversalContent, project: &ProjectContext) -> LinkStrategy {
        let rules = LinkingRules {
            max_internal_links: MAX_INTERNAL_LINKS,
            max_external_links: MAX_EXTERNAL_LINKS,
            required_domains: project.required_domains.clone(),
            forbidden_domains: project.forbidden_domains.clone(),
            position_preferences: PositionPreferences {
                intro_internal: 2,
                body_internal: 8,
                conclusion_external: 3,
            },
            anchor_text: AnchorTextRules {
                max_length: MAX_ANCHOR_CHARS,
                avoid_exact_match: true,
            },
        };

        let (internal, external) = base_adapter::candidate_links(content, project, &rules);
        let last_paragraph = paragraph_count(&content.content).saturating_sub(1);
        let prefs = rules.position_preferences;

        let is_intro: &Slot = &|l| l.position.paragraph == 0;
        let is_body: &Slot = &|l| l.position.paragraph > 0;
        let is_conclusion: &Slot = &|l| l.position.paragraph >= last_paragraph;

        let trim_anchor = |mut link: ProcessedLink| {
            if link.anchor_text.chars().count() > MAX_ANCHOR_CHARS {
                link.anchor_text = truncate_words(&link.anchor_text, MAX_ANCHOR_CHARS);
            }
            link
        };

        let internal_links = place(
            internal,
            &[(prefs.intro_internal, is_intro), (prefs.body_internal, is_body)],
            rules.max_internal_links,
        )
        .into_iter()
        .map(trim_anchor)
        .collect();
        let external_links = place(
            external,
            &[(prefs.conclusion_external, is_conclusion)],
            rules.max_external_links,
        )
        .into_iter()
        .map(trim_anchor)
        .collect();

        LinkStrategy {
            internal_links,
            external_links,
            rules,
        }
    }

    #[instrument(skip(self, content), fields(title = %content.title))]
    async fn publish(&self, content: &PlatformContent) -> PublishingResult {
        info!(site = %self.site_url, "Publishing post to WordPress");
        let outcome = self.send_post(self.posts_url(), content).await;
        self.base.fold("publish", outcome)
    }

    #[instrument(skip(self, content))]
    async fn update(&self, platform_id: &str, content: &PlatformContent) -> PublishingResult {
        let outcome = self.send_post(self.post_url(platform_id), content).await;
        self.base.fold("update", outcome)
    }

    #[instrument(skip(self))]
    async fn delete(&self, platform_id: &str) -> PublishingResult {
        let outcome = self.try_delete(platform_id).await;
        self.base.fold("delete", outcome)
    }

    #[instrument(skip(self))]
    async fn get_publishing_status(&self, platform_id: &str) -> PublishingStatus {
        match self.try_status(platform_id).await {
            Ok(status) => status,
            Err(e) => PublishingStatus::unknown(Platform::WordPress, platform_id, e.to_string()),
        }
    }
}
