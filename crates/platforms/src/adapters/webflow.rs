//! Webflow CMS adapter (REST API v1).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use content::markdown::{html_to_markdown, slugify, to_html, to_plain_text, truncate_words};
use content::{ContentService, UniversalContent};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::adapter::{
    ContentFormat, ContentTransformationResult, Platform, PlatformAdapter, PlatformCapabilities,
    PlatformContent, PublishStatus, PublishingResult, PublishingStatus, RemoteStatus,
    TransformOptions,
};
use crate::base_adapter::BaseAdapter;
use crate::config::{PlatformsConfig, WebflowConfig};
use crate::error::{AdapterError, AdapterResult};

const API_VERSION: &str = "1.0.0";

/// Webflow collection item adapter.
#[derive(Debug, Clone)]
pub struct WebflowAdapter {
    base: BaseAdapter,
    api_base: String,
    collection_id: String,
    site_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebflowItem {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(rename = "_draft", default)]
    draft: bool,
    #[serde(rename = "_archived", default)]
    archived: bool,
    #[serde(rename = "updated-on", default)]
    updated_on: Option<DateTime<Utc>>,
}

/// `GET` wraps the item in `items`.
#[derive(Debug, Deserialize)]
struct WebflowItems {
    items: Vec<WebflowItem>,
}

impl WebflowAdapter {
    pub fn new(config: &WebflowConfig, api_token: &str, timeout: Duration) -> AdapterResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_token}"))
                .map_err(|_| AdapterError::NotConfigured("invalid Webflow API token".to_string()))?,
        );
        headers.insert("accept-version", HeaderValue::from_static(API_VERSION));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(Self {
            base: BaseAdapter::new(Platform::Webflow, headers, timeout, config.field_mappings.clone())?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            collection_id: config.collection_id.clone(),
            site_url: config
                .site_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
        })
    }

    pub fn from_config(config: &PlatformsConfig) -> AdapterResult<Self> {
        let webflow = config
            .webflow
            .as_ref()
            .ok_or_else(|| AdapterError::NotConfigured("webflow".to_string()))?;
        let token = config.secret(&webflow.api_token)?;
        Ok(Self::new(webflow, &token, config.timeout())?
            .with_content_service(config.content_service()))
    }

    pub fn with_content_service(mut self, service: ContentService) -> Self {
        self.base.service = service;
        self
    }

    fn items_url(&self) -> String {
        format!("{}/collections/{}/items", self.api_base, self.collection_id)
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/{id}", self.items_url())
    }

    fn public_url(&self, slug: Option<&str>) -> Option<String> {
        match (&self.site_url, slug) {
            (Some(site), Some(slug)) if !slug.is_empty() => Some(format!("{site}/post/{slug}")),
            _ => None,
        }
    }

    fn payload(&self, content: &PlatformContent) -> Value {
        let mut fields = content.platform_specific_fields.clone();
        fields.insert("name".to_string(), json!(content.title));
        fields.insert("slug".to_string(), json!(content.slug));
        fields.insert("post-body".to_string(), json!(content.content));
        fields.insert("post-summary".to_string(), json!(content.excerpt));
        fields.insert("tags".to_string(), json!(content.tags));
        fields.insert(
            "_draft".to_string(),
            json!(content.publishing_settings.status == PublishStatus::Draft),
        );
        fields.entry("_archived").or_insert(json!(false));

        json!({ "fields": self.base.map_fields(fields) })
    }

    async fn send_item(
        &self,
        request: reqwest::RequestBuilder,
        content: &PlatformContent,
    ) -> AdapterResult<PublishingResult> {
        let publish = content.publishing_settings.status != PublishStatus::Draft;
        let response = request
            .query(&[("live", if publish { "true" } else { "false" })])
            .json(&self.payload(content))
            .send()
            .await?;
        let item: WebflowItem = self.base.read_json(response).await?;
        let url = self.public_url(item.slug.as_deref());
        Ok(PublishingResult::ok(Platform::Webflow, item.id, url))
    }

    async fn try_delete(&self, platform_id: &str) -> AdapterResult<PublishingResult> {
        let response = self
            .base
            .client
            .delete(self.item_url(platform_id))
            .send()
            .await?;
        self.base.check_status(response).await?;
        Ok(PublishingResult::ok(Platform::Webflow, platform_id, None))
    }

    async fn try_status(&self, platform_id: &str) -> AdapterResult<PublishingStatus> {
        let response = self.base.client.get(self.item_url(platform_id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(PublishingStatus {
                platform: Platform::Webflow,
                platform_id: platform_id.to_string(),
                status: RemoteStatus::Deleted,
                url: None,
                last_modified: None,
                error: None,
            });
        }

        let body: WebflowItems = self.base.read_json(response).await?;
        let item = body.items.into_iter().next().ok_or_else(|| {
            AdapterError::InvalidResponse(format!("no item {platform_id} in response"))
        })?;

        let status = if item.archived {
            RemoteStatus::Deleted
        } else if item.draft {
            RemoteStatus::Draft
        } else {
            RemoteStatus::Published
        };
        Ok(PublishingStatus {
            platform: Platform::Webflow,
            url: self.public_url(item.slug.as_deref()),
            platform_id: item.id,
            status,
            last_modified: item.updated_on,
            error: None,
        })
    }
}

#[async_trait]
impl PlatformAdapter for WebflowAdapter {
    fn platform(&self) -> Platform {
        Platform::Webflow
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

        let caps = &self.base.capabilities;
        let content = self.base.service.with_structure(content);
        let mut warnings = Vec::new();

        let mut settings = options.publishing_settings();
        if settings.scheduled_at.is_some() {
            warnings.push("Webflow does not support scheduling; the item is published immediately".to_string());
            settings.scheduled_at = None;
            if settings.status == PublishStatus::Scheduled {
                settings.status = PublishStatus::Publish;
            }
        }
        if content.category.is_some() {
            warnings.push("Webflow collections have no categories; category dropped".to_string());
        }

        let max_excerpt = caps.max_excerpt_length.unwrap_or(usize::MAX);
        let source = if content.excerpt.trim().is_empty() {
            to_plain_text(&content.content)
        } else {
            content.excerpt.clone()
        };
        let excerpt = truncate_words(&source, max_excerpt);

        let slug = if content.slug.trim().is_empty() {
            slugify(&content.title)
        } else {
            content.slug.clone()
        };

        let mut fields = Map::new();
        fields.insert(
            "meta-title".to_string(),
            json!(if content.seo_title.is_empty() {
                &content.title
            } else {
                &content.seo_title
            }),
        );
        fields.insert("meta-description".to_string(), json!(content.meta_description));
        if let Some(image) = &content.featured_image {
            fields.insert("main-image".to_string(), json!(image));
        }

        let platform_content = PlatformContent {
            platform: Platform::Webflow,
            title: content.title.clone(),
            content: to_html(&content.content),
            format: ContentFormat::Html,
            excerpt,
            slug,
            tags: content.tags.clone(),
            images: super::collect_images(&content, false),
            links: super::collect_links(&content),
            platform_specific_fields: fields,
            publishing_settings: settings,
        };

        debug!(title = %platform_content.title, "Transformed content for Webflow");
        ContentTransformationResult::ok(platform_content, warnings)
    }

    fn reverse(&self, content: &PlatformContent) -> UniversalContent {
        let fields = &content.platform_specific_fields;
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let seo_title = text("meta-title");

        let universal = UniversalContent {
            title: content.title.clone(),
            content: html_to_markdown(&content.content),
            excerpt: content.excerpt.clone(),
            meta_description: text("meta-description"),
            tags: content.tags.clone(),
            featured_image: Some(text("main-image")).filter(|s| !s.is_empty()),
            seo_title: if seo_title == content.title { String::new() } else { seo_title },
            slug: content.slug.clone(),
            ..Default::default()
        };
        self.base.service.with_structure(&universal).into_owned()
    }

    #[instrument(skip(self, content), fields(title = %content.title))]
    async fn publish(&self, content: &PlatformContent) -> PublishingResult {
        info!(collection = %self.collection_id, "Creating Webflow item");
        let request = self.base.client.post(self.items_url());
        let outcome = self.send_item(request, content).await;
        self.base.fold("publish", outcome)
    }

    #[instrument(skip(self, content))]
    async fn update(&self, platform_id: &str, content: &PlatformContent) -> PublishingResult {
        let request = self.base.client.put(self.item_url(platform_id));
        let outcome = self.send_item(request, content).await;
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
            Err(e) => PublishingStatus::unknown(Platform::Webflow, platform_id, e.to_string()),
        }
    }
}
