//! Social network adapters.
//!
//! One adapter type covers Twitter/X, LinkedIn, Facebook pages and Instagram
//! business accounts. Posts are plain text composed from the title, summary,
//! article link and hashtags, cut to the network's character limit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use content::markdown::truncate_words;
use content::{ContentService, UniversalContent};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::adapter::{
    ContentFormat, ContentTransformationResult, Platform, PlatformAdapter, PlatformCapabilities,
    PlatformContent, PlatformImage, PlatformLink, PublishStatus, PublishingResult, PublishingStatus,
    RemoteStatus, TransformOptions,
};
use crate::base_adapter::BaseAdapter;
use crate::config::{PlatformsConfig, SocialConfig};
use crate::error::{AdapterError, AdapterResult};

const TWITTER_API: &str = "https://api.twitter.com";
const LINKEDIN_API: &str = "https://api.linkedin.com";
const GRAPH_API: &str = "https://graph.facebook.com/v19.0";

/// Hashtags appended to a post.
pub fn hashtag_limit(platform: Platform) -> usize {
    match platform {
        Platform::Twitter => 2,
        Platform::LinkedIn => 5,
        Platform::Facebook => 3,
        Platform::Instagram => 30,
        Platform::WordPress | Platform::Webflow => 0,
    }
}

/// `"async rust"` becomes `#AsyncRust`, `"rust"` becomes `#rust`.
pub fn to_hashtag(tag: &str) -> Option<String> {
    let words: Vec<&str> = tag
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    match words.as_slice() {
        [] => None,
        [single] => Some(format!("#{single}")),
        many => {
            let joined: String = many
                .iter()
                .map(|w| {
                    let mut chars = w.chars();
                    chars
                        .next()
                        .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                        .unwrap_or_default()
                })
                .collect();
            Some(format!("#{joined}"))
        }
    }
}

/// Compose a post within `limit` characters. The body is cut first; hashtags
/// are dropped only when nothing else fits. Returns the text and whether
/// anything was cut.
pub fn compose_post(
    title: &str,
    summary: &str,
    link: Option<&str>,
    hashtags: &[String],
    limit: usize,
) -> (String, bool) {
    let mut body = title.trim().to_string();
    let summary = summary.trim();
    if !summary.is_empty() && summary != body {
        if !body.is_empty() {
            body.push_str("\n\n");
        }
        body.push_str(summary);
    }

    let tags = hashtags.join(" ");
    let mut suffix: Vec<&str> = link.into_iter().filter(|l| !l.is_empty()).collect();
    if !tags.is_empty() {
        suffix.push(&tags);
    }

    loop {
        let tail = suffix.join("\n\n");
        let tail_len = tail.chars().count();
        let sep = if tail.is_empty() || body.is_empty() { 0 } else { 2 };

        if body.chars().count() + sep + tail_len <= limit {
            return (join_post(&body, &tail), false);
        }
        // Keep at least a few words of the body before giving up on the tail.
        let budget = limit.saturating_sub(tail_len + sep);
        if budget >= 20 || suffix.is_empty() {
            let cut = truncate_words(&body, budget.max(1).min(limit));
            let text = join_post(&cut, &tail);
            if text.chars().count() <= limit {
                return (text, true);
            }
            return (text.chars().take(limit).collect(), true);
        }
        suffix.pop();
    }
}

fn join_post(body: &str, tail: &str) -> String {
    match (body.is_empty(), tail.is_empty()) {
        (_, true) => body.to_string(),
        (true, false) => tail.to_string(),
        (false, false) => format!("{body}\n\n{tail}"),
    }
}

/// Adapter for one social network.
#[derive(Debug, Clone)]
pub struct SocialAdapter {
    base: BaseAdapter,
    api_base: String,
    account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: IdResponse,
}

impl SocialAdapter {
    pub fn new(
        platform: Platform,
        config: &SocialConfig,
        access_token: &str,
        timeout: Duration,
    ) -> AdapterResult<Self> {
        if !platform.is_social() {
            return Err(AdapterError::UnsupportedPlatform(platform.to_string()));
        }
        if platform != Platform::Twitter && config.account_id.is_none() {
            return Err(AdapterError::NotConfigured(format!(
                "{platform} requires an account id"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(|_| {
                AdapterError::NotConfigured(format!("invalid {platform} access token"))
            })?,
        );
        if platform == Platform::LinkedIn {
            headers.insert("x-restli-protocol-version", HeaderValue::from_static("2.0.0"));
        }

        let default_base = match platform {
            Platform::Twitter => TWITTER_API,
            Platform::LinkedIn => LINKEDIN_API,
            _ => GRAPH_API,
        };

        Ok(Self {
            base: BaseAdapter::new(platform, headers, timeout, config.field_mappings.clone())?,
            api_base: config
                .api_base
                .as_deref()
                .unwrap_or(default_base)
                .trim_end_matches('/')
                .to_string(),
            account_id: config.account_id.clone(),
        })
    }

    pub fn from_config(platform: Platform, config: &PlatformsConfig) -> AdapterResult<Self> {
        let social = config
            .social(platform)
            .ok_or_else(|| AdapterError::NotConfigured(platform.to_string()))?;
        let token = config.secret(&social.access_token)?;
        Ok(Self::new(platform, social, &token, config.timeout())?
            .with_content_service(config.content_service()))
    }

    pub fn with_content_service(mut self, service: ContentService) -> Self {
        self.base.service = service;
        self
    }

    fn network(&self) -> Platform {
        self.base.platform
    }

    fn account(&self) -> AdapterResult<&str> {
        self.account_id
            .as_deref()
            .ok_or_else(|| AdapterError::NotConfigured(format!("{} account id", self.network())))
    }

    fn post_url(&self, id: &str) -> Option<String> {
        match self.network() {
            Platform::Twitter => Some(format!("https://twitter.com/i/web/status/{id}")),
            Platform::LinkedIn => Some(format!("https://www.linkedin.com/feed/update/{id}")),
            Platform::Facebook => Some(format!("https://www.facebook.com/{id}")),
            _ => None,
        }
    }

    fn object_url(&self, id: &str) -> String {
        match self.network() {
            Platform::Twitter => format!("{}/2/tweets/{id}", self.api_base),
            Platform::LinkedIn => format!("{}/v2/ugcPosts/{}", self.api_base, encode_urn(id)),
            _ => format!("{}/{id}", self.api_base),
        }
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: String,
        payload: Map<String, Value>,
    ) -> AdapterResult<T> {
        let response = self
            .base
            .client
            .post(url)
            .json(&Value::Object(self.base.map_fields(payload)))
            .send()
            .await?;
        self.base.read_json(response).await
    }

    async fn try_publish(&self, content: &PlatformContent) -> AdapterResult<PublishingResult> {
        let text = content.content.clone();
        let id = match self.network() {
            Platform::Twitter => {
                let mut payload = Map::new();
                payload.insert("text".to_string(), json!(text));
                let tweet: TweetResponse = self
                    .post_json(format!("{}/2/tweets", self.api_base), payload)
                    .await?;
                tweet.data.id
            }
            Platform::LinkedIn => {
                let link = content.links.first().map(|l| l.url.clone());
                let media = match &link {
                    Some(url) => json!([{ "status": "READY", "originalUrl": url }]),
                    None => json!([]),
                };
                let mut payload = Map::new();
                payload.insert("author".to_string(), json!(self.account()?));
                payload.insert("lifecycleState".to_string(), json!("PUBLISHED"));
                payload.insert(
                    "specificContent".to_string(),
                    json!({
                        "com.linkedin.ugc.ShareContent": {
                            "shareCommentary": { "text": text },
                            "shareMediaCategory": if link.is_some() { "ARTICLE" } else { "NONE" },
                            "media": media,
                        }
                    }),
                );
                payload.insert(
                    "visibility".to_string(),
                    json!({ "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" }),
                );
                let post: IdResponse = self
                    .post_json(format!("{}/v2/ugcPosts", self.api_base), payload)
                    .await?;
                post.id
            }
            Platform::Facebook => {
                let mut payload = Map::new();
                payload.insert("message".to_string(), json!(text));
                if let Some(link) = content.links.first() {
                    payload.insert("link".to_string(), json!(link.url));
                }
                let post: IdResponse = self
                    .post_json(format!("{}/{}/feed", self.api_base, self.account()?), payload)
                    .await?;
                post.id
            }
            Platform::Instagram => {
                let image = content.images.first().ok_or_else(|| {
                    AdapterError::Unsupported("Instagram posts require an image".to_string())
                })?;
                let account = self.account()?;

                let mut payload = Map::new();
                payload.insert("image_url".to_string(), json!(image.url));
                payload.insert("caption".to_string(), json!(text));
                let container: IdResponse = self
                    .post_json(format!("{}/{account}/media", self.api_base), payload)
                    .await?;
                debug!(container = %container.id, "Created Instagram media container");

                let mut publish = Map::new();
                publish.insert("creation_id".to_string(), json!(container.id));
                let media: IdResponse = self
                    .post_json(format!("{}/{account}/media_publish", self.api_base), publish)
                    .await?;
                media.id
            }
            other => return Err(AdapterError::UnsupportedPlatform(other.to_string())),
        };

        let url = self.post_url(&id);
        Ok(PublishingResult::ok(self.network(), id, url))
    }

    async fn try_delete(&self, platform_id: &str) -> AdapterResult<PublishingResult> {
        if !self.base.capabilities.supports_deletion {
            return Err(AdapterError::Unsupported(format!(
                "{} posts cannot be deleted through the API",
                self.network()
            )));
        }
        let response = self
            .base
            .client
            .delete(self.object_url(platform_id))
            .send()
            .await?;
        self.base.check_status(response).await?;
        Ok(PublishingResult::ok(self.network(), platform_id, None))
    }

    async fn try_status(&self, platform_id: &str) -> AdapterResult<PublishingStatus> {
        let mut request = self.base.client.get(self.object_url(platform_id));
        match self.network() {
            Platform::Facebook => {
                request = request.query(&[("fields", "id,permalink_url,updated_time")]);
            }
            Platform::Instagram => request = request.query(&[("fields", "id,permalink,timestamp")]),
            _ => {}
        }
        let response = request.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(PublishingStatus {
                platform: self.network(),
                platform_id: platform_id.to_string(),
                status: RemoteStatus::Deleted,
                url: None,
                last_modified: None,
                error: None,
            });
        }

        let body: Value = self.base.read_json(response).await?;
        let body = body.get("data").unwrap_or(&body);
        let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(PublishingStatus {
            platform: self.network(),
            platform_id: platform_id.to_string(),
            status: RemoteStatus::Published,
            url: text("permalink_url")
                .or_else(|| text("permalink"))
                .or_else(|| self.post_url(platform_id)),
            last_modified: text("updated_time")
                .or_else(|| text("timestamp"))
                .as_deref()
                .and_then(parse_graph_time),
            error: None,
        })
    }
}

/// LinkedIn URNs go into the path percent-encoded.
fn encode_urn(id: &str) -> String {
    id.replace(':', "%3A")
}

/// Graph API timestamps look like `2024-05-01T10:00:00+0000`.
fn parse_graph_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[async_trait]
impl PlatformAdapter for SocialAdapter {
    fn platform(&self) -> Platform {
        self.base.platform
    }

    fn capabilities(&self) -> &PlatformCapabilities {
        &self.base.capabilities
    }

    fn transform(
        &self,
        content: &UniversalContent,
        options: &TransformOptions,
    ) -> ContentTransformationResult {
        let platform = self.network();
        let caps = &self.base.capabilities;
        let limit = caps.max_content_length.unwrap_or(usize::MAX);
        let mut warnings = Vec::new();

        let source_tags = if content.tags.is_empty() {
            &content.keywords
        } else {
            &content.tags
        };
        let hashtags: Vec<String> = source_tags
            .iter()
            .filter_map(|t| to_hashtag(t))
            .take(hashtag_limit(platform))
            .collect();

        // Instagram captions do not render links.
        let link = options
            .canonical_url
            .as_deref()
            .filter(|_| platform != Platform::Instagram);

        let (text, truncated) =
            compose_post(&content.title, content.summary(), link, &hashtags, limit);
        if text.trim().is_empty() {
            return ContentTransformationResult::failed("Nothing to post: title and summary are empty");
        }
        if truncated {
            warnings.push(format!("Post shortened to fit the {limit} character limit of {platform}"));
        }

        let images: Vec<PlatformImage> = super::collect_images(content, false)
            .into_iter()
            .take(caps.max_images.unwrap_or(usize::MAX))
            .collect();
        if caps.requires_image && images.is_empty() {
            warnings.push(format!("{platform} posts need an image"));
        }

        let mut fields = Map::new();
        fields.insert("hashtags".to_string(), json!(hashtags));
        if platform == Platform::LinkedIn {
            fields.insert("visibility".to_string(), json!("PUBLIC"));
        }
        if let Some(image) = images.first() {
            if platform == Platform::Instagram {
                fields.insert("image_url".to_string(), json!(image.url));
            }
        }

        let mut settings = options.publishing_settings();
        if settings.scheduled_at.take().is_some() {
            if settings.status == PublishStatus::Scheduled {
                settings.status = PublishStatus::Publish;
            }
            warnings.push(format!("{platform} does not support scheduling here; use the scheduler"));
        }

        let platform_content = PlatformContent {
            platform,
            title: content.title.clone(),
            content: text,
            format: ContentFormat::PlainText,
            excerpt: String::new(),
            slug: String::new(),
            tags: hashtags.iter().map(|h| h.trim_start_matches('#').to_string()).collect(),
            images,
            links: link
                .map(|url| PlatformLink {
                    url: url.to_string(),
                    anchor_text: content.title.clone(),
                    internal: false,
                    attributes: Default::default(),
                })
                .into_iter()
                .collect(),
            platform_specific_fields: fields,
            publishing_settings: settings,
        };

        debug!(platform = %platform, chars = platform_content.content.chars().count(), "Composed social post");
        ContentTransformationResult::ok(platform_content, warnings)
    }

    fn reverse(&self, content: &PlatformContent) -> UniversalContent {
        let mut paragraphs: Vec<&str> = content
            .content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let is_hashtags = |p: &str| p.split_whitespace().all(|w| w.starts_with('#'));
        let mut tags: Vec<String> = content.tags.clone();
        if paragraphs.last().is_some_and(|p| is_hashtags(*p)) {
            if let Some(last) = paragraphs.pop() {
                if tags.is_empty() {
                    tags = last
                        .split_whitespace()
                        .map(|w| w.trim_start_matches('#').to_string())
                        .collect();
                }
            }
        }
        let link_urls: Vec<&str> = content.links.iter().map(|l| l.url.as_str()).collect();
        paragraphs.retain(|p| !link_urls.contains(p));

        let title = if content.title.is_empty() {
            paragraphs.first().map(|p| (*p).to_string()).unwrap_or_default()
        } else {
            content.title.clone()
        };
        let body: Vec<&str> = paragraphs.into_iter().filter(|p| *p != title).collect();
        let body = body.join("\n\n");

        let universal = UniversalContent {
            title,
            excerpt: body.clone(),
            content: body,
            tags,
            featured_image: content.images.first().map(|i| i.url.clone()),
            ..Default::default()
        };
        self.base.service.with_structure(&universal).into_owned()
    }

    #[instrument(skip(self, content), fields(platform = %self.network()))]
    async fn publish(&self, content: &PlatformContent) -> PublishingResult {
        info!("Publishing social post");
        let outcome = self.try_publish(content).await;
        self.base.fold("publish", outcome)
    }

    async fn update(&self, platform_id: &str, _content: &PlatformContent) -> PublishingResult {
        let outcome = Err(AdapterError::Unsupported(format!(
            "{} posts cannot be edited after publishing (post {platform_id})",
            self.network()
        )));
        self.base.fold("update", outcome)
    }

    #[instrument(skip(self), fields(platform = %self.network()))]
    async fn delete(&self, platform_id: &str) -> PublishingResult {
        let outcome = self.try_delete(platform_id).await;
        self.base.fold("delete", outcome)
    }

    #[instrument(skip(self), fields(platform = %self.network()))]
    async fn get_publishing_status(&self, platform_id: &str) -> PublishingStatus {
        match self.try_status(platform_id).await {
            Ok(status) => status,
            Err(e) => PublishingStatus::unknown(self.network(), platform_id, e.to_string()),
        }
    }
}
