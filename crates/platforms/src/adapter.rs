//! Platform Adapter Trait
//!
//! Unified interface for turning [`UniversalContent`] into platform-native
//! content and publishing it. Every operation returns a structured result;
//! failures are reported in the result rather than as `Err`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use content::{UniversalContent, ValidationError, ValidationWarning};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::str::FromStr;

use crate::base_adapter;
use crate::links::{LinkStrategy, ProjectContext};

/// Publishing targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    WordPress,
    Webflow,
    Twitter,
    LinkedIn,
    Facebook,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::WordPress,
        Platform::Webflow,
        Platform::Twitter,
        Platform::LinkedIn,
        Platform::Facebook,
        Platform::Instagram,
    ];

    pub fn is_social(self) -> bool {
        matches!(
            self,
            Platform::Twitter | Platform::LinkedIn | Platform::Facebook | Platform::Instagram
        )
    }

    /// Static capability table.
    pub fn capabilities(self) -> PlatformCapabilities {
        let cms = PlatformCapabilities {
            supports_html: true,
            supports_markdown: false,
            supports_images: true,
            supports_video: true,
            supports_tags: true,
            supports_categories: true,
            supports_scheduling: true,
            supports_internal_links: true,
            supports_excerpt: true,
            supports_updates: true,
            supports_deletion: true,
            supports_featured_image: true,
            supports_custom_fields: true,
            max_title_length: None,
            max_content_length: None,
            max_excerpt_length: None,
            max_tags: None,
            max_images: None,
            requires_image: false,
        };
        let social = PlatformCapabilities {
            supports_html: false,
            supports_categories: false,
            supports_scheduling: false,
            supports_internal_links: false,
            supports_excerpt: false,
            supports_updates: false,
            supports_featured_image: false,
            supports_custom_fields: false,
            ..cms.clone()
        };

        match self {
            Platform::WordPress => PlatformCapabilities {
                max_title_length: Some(200),
                ..cms
            },
            Platform::Webflow => PlatformCapabilities {
                supports_video: false,
                supports_categories: false,
                supports_scheduling: false,
                max_title_length: Some(256),
                max_excerpt_length: Some(256),
                ..cms
            },
            Platform::Twitter => PlatformCapabilities {
                max_content_length: Some(280),
                max_images: Some(4),
                ..social
            },
            Platform::LinkedIn => PlatformCapabilities {
                max_content_length: Some(3000),
                max_images: Some(9),
                ..social
            },
            Platform::Facebook => PlatformCapabilities {
                max_content_length: Some(63_206),
                max_images: Some(10),
                ..social
            },
            Platform::Instagram => PlatformCapabilities {
                supports_deletion: false,
                max_content_length: Some(2200),
                max_tags: Some(30),
                max_images: Some(10),
                requires_image: true,
                ..social
            },
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::WordPress => write!(f, "wordpress"),
            Platform::Webflow => write!(f, "webflow"),
            Platform::Twitter => write!(f, "twitter"),
            Platform::LinkedIn => write!(f, "linkedin"),
            Platform::Facebook => write!(f, "facebook"),
            Platform::Instagram => write!(f, "instagram"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wordpress" | "wp" => Ok(Platform::WordPress),
            "webflow" => Ok(Platform::Webflow),
            "twitter" | "x" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::LinkedIn),
            "facebook" | "fb" => Ok(Platform::Facebook),
            "instagram" | "ig" => Ok(Platform::Instagram),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// Single capability, for lookups across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Html,
    Markdown,
    Images,
    Video,
    Tags,
    Categories,
    Scheduling,
    InternalLinks,
    Excerpt,
    Updates,
    Deletion,
    FeaturedImage,
    CustomFields,
}

impl Feature {
    pub const ALL: [Feature; 13] = [
        Feature::Html,
        Feature::Markdown,
        Feature::Images,
        Feature::Video,
        Feature::Tags,
        Feature::Categories,
        Feature::Scheduling,
        Feature::InternalLinks,
        Feature::Excerpt,
        Feature::Updates,
        Feature::Deletion,
        Feature::FeaturedImage,
        Feature::CustomFields,
    ];
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Feature::ALL
            .into_iter()
            .find(|f| {
                serde_json::to_value(f)
                    .ok()
                    .and_then(|v| v.as_str().map(|name| name == normalized))
                    .unwrap_or(false)
            })
            .ok_or_else(|| format!("unknown feature '{s}'"))
    }
}

/// What a platform can represent, and its limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)] // Appropriate for capabilities struct
pub struct PlatformCapabilities {
    pub supports_html: bool,
    pub supports_markdown: bool,
    pub supports_images: bool,
    pub supports_video: bool,
    pub supports_tags: bool,
    pub supports_categories: bool,
    pub supports_scheduling: bool,
    pub supports_internal_links: bool,
    pub supports_excerpt: bool,
    pub supports_updates: bool,
    pub supports_deletion: bool,
    pub supports_featured_image: bool,
    pub supports_custom_fields: bool,
    pub max_title_length: Option<usize>,
    pub max_content_length: Option<usize>,
    pub max_excerpt_length: Option<usize>,
    pub max_tags: Option<usize>,
    pub max_images: Option<usize>,
    pub requires_image: bool,
}

impl PlatformCapabilities {
    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::Html => self.supports_html,
            Feature::Markdown => self.supports_markdown,
            Feature::Images => self.supports_images,
            Feature::Video => self.supports_video,
            Feature::Tags => self.supports_tags,
            Feature::Categories => self.supports_categories,
            Feature::Scheduling => self.supports_scheduling,
            Feature::InternalLinks => self.supports_internal_links,
            Feature::Excerpt => self.supports_excerpt,
            Feature::Updates => self.supports_updates,
            Feature::Deletion => self.supports_deletion,
            Feature::FeaturedImage => self.supports_featured_image,
            Feature::CustomFields => self.supports_custom_fields,
        }
    }
}

/// Markup of [`PlatformContent::content`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    #[default]
    Html,
    Markdown,
    PlainText,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    #[default]
    Draft,
    Publish,
    Scheduled,
    Private,
}

impl std::fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishStatus::Draft => write!(f, "draft"),
            PublishStatus::Publish => write!(f, "publish"),
            PublishStatus::Scheduled => write!(f, "scheduled"),
            PublishStatus::Private => write!(f, "private"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Password,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishingSettings {
    pub status: PublishStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformImage {
    pub url: String,
    pub alt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Platform-specific attributes such as `loading` or `class`.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformLink {
    pub url: String,
    pub anchor_text: String,
    pub internal: bool,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Content adapted to one platform. Produced by `transform`, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformContent {
    pub platform: Platform,
    pub title: String,
    pub content: String,
    pub format: ContentFormat,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<PlatformImage>,
    #[serde(default)]
    pub links: Vec<PlatformLink>,
    #[serde(default)]
    pub platform_specific_fields: Map<String, Value>,
    #[serde(default)]
    pub publishing_settings: PublishingSettings,
}

impl PlatformContent {
    pub fn new(platform: Platform, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            platform,
            title: title.into(),
            content: content.into(),
            format: ContentFormat::default(),
            excerpt: String::new(),
            slug: String::new(),
            tags: Vec::new(),
            images: Vec::new(),
            links: Vec::new(),
            platform_specific_fields: Map::new(),
            publishing_settings: PublishingSettings::default(),
        }
    }
}

/// Caller choices for `transform`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
    #[serde(default)]
    pub status: PublishStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Public URL of the article, linked from social posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
}

impl TransformOptions {
    pub fn publishing_settings(&self) -> PublishingSettings {
        let status = if self.scheduled_at.is_some() && self.status == PublishStatus::Publish {
            PublishStatus::Scheduled
        } else {
            self.status
        };
        PublishingSettings {
            status,
            scheduled_at: self.scheduled_at,
            visibility: self.visibility,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTransformationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<PlatformContent>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ContentTransformationResult {
    pub fn ok(content: PlatformContent, warnings: Vec<String>) -> Self {
        Self {
            success: true,
            content: Some(content),
            warnings,
            errors: Vec::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: None,
            warnings: Vec::new(),
            errors: vec![error.into()],
        }
    }
}

/// Platform validation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    /// 0–100.
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishingResult {
    pub success: bool,
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl PublishingResult {
    pub fn ok(platform: Platform, platform_id: impl Into<String>, url: Option<String>) -> Self {
        Self {
            success: true,
            platform,
            platform_id: Some(platform_id.into()),
            url,
            published_at: Some(Utc::now()),
            errors: Vec::new(),
            warnings: Vec::new(),
            metadata: Map::new(),
        }
    }

    pub fn failed(platform: Platform, error: impl Into<String>) -> Self {
        Self {
            success: false,
            platform,
            platform_id: None,
            url: None,
            published_at: None,
            errors: vec![error.into()],
            warnings: Vec::new(),
            metadata: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    Draft,
    Published,
    Scheduled,
    Private,
    Deleted,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishingStatus {
    pub platform: Platform,
    pub platform_id: String,
    pub status: RemoteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PublishingStatus {
    pub fn unknown(platform: Platform, platform_id: &str, error: impl Into<String>) -> Self {
        Self {
            platform,
            platform_id: platform_id.to_string(),
            status: RemoteStatus::Unknown,
            url: None,
            last_modified: None,
            error: Some(error.into()),
        }
    }
}

/// Core platform abstraction.
#[async_trait]
pub trait PlatformAdapter: Send + Sync + Debug {
    fn platform(&self) -> Platform;

    fn capabilities(&self) -> &PlatformCapabilities;

    /// Adapt universal content to this platform.
    fn transform(
        &self,
        content: &UniversalContent,
        options: &TransformOptions,
    ) -> ContentTransformationResult;

    /// Recover universal content from platform content.
    fn reverse(&self, content: &PlatformContent) -> UniversalContent;

    fn generate_backlinks(
        &self,
        content: &UniversalContent,
        project: &ProjectContext,
    ) -> LinkStrategy {
        base_adapter::generate_backlinks(self.capabilities(), content, project)
    }

    fn validate(&self, content: &PlatformContent) -> ValidationResult {
        base_adapter::validate(self.capabilities(), content)
    }

    async fn publish(&self, content: &PlatformContent) -> PublishingResult;

    async fn update(&self, platform_id: &str, content: &PlatformContent) -> PublishingResult;

    async fn delete(&self, platform_id: &str) -> PublishingResult;

    async fn get_publishing_status(&self, platform_id: &str) -> PublishingStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_round_trips_through_display() {
        for platform in Platform::ALL {
            assert_eq!(platform.to_string().parse::<Platform>(), Ok(platform));
        }
        assert_eq!("X".parse::<Platform>(), Ok(Platform::Twitter));
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn test_feature_from_str() {
        assert_eq!("internal-links".parse::<Feature>(), Ok(Feature::InternalLinks));
        assert_eq!("html".parse::<Feature>(), Ok(Feature::Html));
        assert!("teleport".parse::<Feature>().is_err());
    }

    #[test]
    fn test_capability_table() {
        let wp = Platform::WordPress.capabilities();
        assert!(wp.supports(Feature::Html));
        assert!(!wp.supports(Feature::Markdown));

        let twitter = Platform::Twitter.capabilities();
        assert_eq!(twitter.max_content_length, Some(280));
        assert!(!twitter.supports(Feature::InternalLinks));

        let instagram = Platform::Instagram.capabilities();
        assert!(instagram.requires_image);
        assert!(!instagram.supports(Feature::Deletion));
    }

    #[test]
    fn test_scheduled_status_from_options() {
        let options = TransformOptions {
            status: PublishStatus::Publish,
            scheduled_at: Some(Utc::now()),
            ..Default::default()
        };
        assert_eq!(
            options.publishing_settings().status,
            PublishStatus::Scheduled
        );
    }
}
