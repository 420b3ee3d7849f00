//! Adapter Factory and Platform Registry
//!
//! The factory maps each [`Platform`] to a constructor. The registry holds the
//! adapters built for the configured platforms and answers capability
//! questions across them. It is an ordinary value passed by reference.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapter::{Feature, Platform, PlatformAdapter, PlatformCapabilities};
use crate::adapters::{SocialAdapter, WebflowAdapter, WordPressAdapter};
use crate::config::PlatformsConfig;
use crate::error::{AdapterError, AdapterResult};

/// Builds an adapter from configuration.
pub type AdapterConstructor =
    Box<dyn Fn(&PlatformsConfig) -> AdapterResult<Arc<dyn PlatformAdapter>> + Send + Sync>;

/// Box a typed adapter builder as an [`AdapterConstructor`].
pub fn constructor<A, F>(build: F) -> AdapterConstructor
where
    A: PlatformAdapter + 'static,
    F: Fn(&PlatformsConfig) -> AdapterResult<A> + Send + Sync + 'static,
{
    Box::new(
        move |config: &PlatformsConfig| -> AdapterResult<Arc<dyn PlatformAdapter>> {
            Ok(Arc::new(build(config)?))
        },
    )
}

/// Factory for creating platform adapters
#[derive(Default)]
pub struct AdapterFactory {
    constructors: HashMap<Platform, AdapterConstructor>,
}

impl std::fmt::Debug for AdapterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterFactory")
            .field("platforms", &self.supported_types())
            .finish()
    }
}

impl AdapterFactory {
    /// Empty factory; see [`Self::with_builtins`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with the WordPress, Webflow and social adapters registered.
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register(Platform::WordPress, constructor(WordPressAdapter::from_config));
        factory.register(Platform::Webflow, constructor(WebflowAdapter::from_config));
        for platform in [
            Platform::Twitter,
            Platform::LinkedIn,
            Platform::Facebook,
            Platform::Instagram,
        ] {
            factory.register(
                platform,
                constructor(move |config: &PlatformsConfig| {
                    SocialAdapter::from_config(platform, config)
                }),
            );
        }
        factory
    }

    /// Register or replace the constructor for `platform`.
    pub fn register(&mut self, platform: Platform, constructor: AdapterConstructor) {
        if self.constructors.insert(platform, constructor).is_some() {
            debug!(platform = %platform, "Replaced adapter constructor");
        }
    }

    /// Create an adapter for the specified platform
    pub fn create(
        &self,
        platform: Platform,
        config: &PlatformsConfig,
    ) -> AdapterResult<Arc<dyn PlatformAdapter>> {
        info!(platform = %platform, "Creating adapter");
        let constructor = self
            .constructors
            .get(&platform)
            .ok_or_else(|| AdapterError::UnsupportedPlatform(platform.to_string()))?;
        let adapter = constructor(config)?;
        debug!(platform = %platform, "Adapter created successfully");
        Ok(adapter)
    }

    /// Get all supported platforms
    pub fn supported_types(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.constructors.keys().copied().collect();
        platforms.sort();
        platforms
    }

    /// Check if a platform is supported
    pub fn is_supported(&self, platform: Platform) -> bool {
        self.constructors.contains_key(&platform)
    }
}

/// Difference in one numeric limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitDifference {
    pub limit: &'static str,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

/// Feature-by-feature comparison of two platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityComparison {
    pub left: Platform,
    pub right: Platform,
    pub shared: Vec<Feature>,
    pub only_left: Vec<Feature>,
    pub only_right: Vec<Feature>,
    pub limits: Vec<LimitDifference>,
}

fn limits(caps: &PlatformCapabilities) -> [(&'static str, Option<usize>); 5] {
    [
        ("max_title_length", caps.max_title_length),
        ("max_content_length", caps.max_content_length),
        ("max_excerpt_length", caps.max_excerpt_length),
        ("max_tags", caps.max_tags),
        ("max_images", caps.max_images),
    ]
}

/// The tighter of two optional limits; `None` means unlimited.
fn tighter(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Adapters for the configured platforms.
#[derive(Debug, Default, Clone)]
pub struct PlatformRegistry {
    adapters: BTreeMap<Platform, Arc<dyn PlatformAdapter>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build adapters for every platform `config` has settings for. A platform
    /// whose adapter fails to build is skipped with a warning, except for
    /// credential errors, which are returned.
    pub fn from_config(factory: &AdapterFactory, config: &PlatformsConfig) -> AdapterResult<Self> {
        let mut registry = Self::new();
        for platform in config.configured_platforms() {
            match factory.create(platform, config) {
                Ok(adapter) => registry.insert(adapter),
                Err(e @ AdapterError::Credential(_)) => return Err(e),
                Err(e) => warn!(platform = %platform, error = %e, "Skipping platform"),
            }
        }
        info!(platforms = ?registry.platforms(), "Platform registry ready");
        Ok(registry)
    }

    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.insert(adapter);
        self
    }

    pub fn insert(&mut self, adapter: Arc<dyn PlatformAdapter>) {
        self.adapters.insert(adapter.platform(), adapter);
    }

    pub fn get(&self, platform: Platform) -> Option<Arc<dyn PlatformAdapter>> {
        self.adapters.get(&platform).cloned()
    }

    /// Registered platforms in canonical order.
    pub fn platforms(&self) -> Vec<Platform> {
        self.adapters.keys().copied().collect()
    }

    /// Capabilities of a registered adapter.
    pub fn capabilities(&self, platform: Platform) -> Option<&PlatformCapabilities> {
        self.adapters.get(&platform).map(|a| a.capabilities())
    }

    fn capabilities_or_default(&self, platform: Platform) -> PlatformCapabilities {
        self.capabilities(platform)
            .cloned()
            .unwrap_or_else(|| platform.capabilities())
    }

    pub fn compare_capabilities(&self, left: Platform, right: Platform) -> CapabilityComparison {
        let l = self.capabilities_or_default(left);
        let r = self.capabilities_or_default(right);

        let mut comparison = CapabilityComparison {
            left,
            right,
            shared: Vec::new(),
            only_left: Vec::new(),
            only_right: Vec::new(),
            limits: Vec::new(),
        };
        for feature in Feature::ALL {
            match (l.supports(feature), r.supports(feature)) {
                (true, true) => comparison.shared.push(feature),
                (true, false) => comparison.only_left.push(feature),
                (false, true) => comparison.only_right.push(feature),
                (false, false) => {}
            }
        }
        for ((limit, a), (_, b)) in limits(&l).into_iter().zip(limits(&r)) {
            if a != b {
                comparison.limits.push(LimitDifference {
                    limit,
                    left: a,
                    right: b,
                });
            }
        }
        comparison
    }

    /// Most restrictive capabilities across `platforms`: a feature is kept
    /// only when all support it and every limit is the tightest one.
    pub fn common_capabilities(&self, platforms: &[Platform]) -> Option<PlatformCapabilities> {
        let mut iter = platforms.iter().map(|p| self.capabilities_or_default(*p));
        let first = iter.next()?;
        Some(iter.fold(first, |acc, caps| PlatformCapabilities {
            supports_html: acc.supports_html && caps.supports_html,
            supports_markdown: acc.supports_markdown && caps.supports_markdown,
            supports_images: acc.supports_images && caps.supports_images,
            supports_video: acc.supports_video && caps.supports_video,
            supports_tags: acc.supports_tags && caps.supports_tags,
            supports_categories: acc.supports_categories && caps.supports_categories,
            supports_scheduling: acc.supports_scheduling && caps.supports_scheduling,
            supports_internal_links: acc.supports_internal_links && caps.supports_internal_links,
            supports_excerpt: acc.supports_excerpt && caps.supports_excerpt,
            supports_updates: acc.supports_updates && caps.supports_updates,
            supports_deletion: acc.supports_deletion && caps.supports_deletion,
            supports_featured_image: acc.supports_featured_image && caps.supports_featured_image,
            supports_custom_fields: acc.supports_custom_fields && caps.supports_custom_fields,
            max_title_length: tighter(acc.max_title_length, caps.max_title_length),
            max_content_length: tighter(acc.max_content_length, caps.max_content_length),
            max_excerpt_length: tighter(acc.max_excerpt_length, caps.max_excerpt_length),
            max_tags: tighter(acc.max_tags, caps.max_tags),
            max_images: tighter(acc.max_images, caps.max_images),
            requires_image: acc.requires_image || caps.requires_image,
        }))
    }

    /// Registered platforms supporting `feature`.
    pub fn platforms_supporting(&self, feature: Feature) -> Vec<Platform> {
        self.adapters
            .iter()
            .filter(|(_, adapter)| adapter.capabilities().supports(feature))
            .map(|(platform, _)| *platform)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SocialConfig, WordPressConfig};

    fn config() -> PlatformsConfig {
        PlatformsConfig {
            wordpress: Some(WordPressConfig {
                site_url: "https://blog.example.com".to_string(),
                username: "editor".to_string(),
                app_password: "pw".to_string(),
                ..Default::default()
            }),
            twitter: Some(SocialConfig {
                access_token: "tw".to_string(),
                ..Default::default()
            }),
            // No account id: skipped with a warning.
            facebook: Some(SocialConfig {
                access_token: "fb".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_builtins_cover_every_platform() {
        let factory = AdapterFactory::with_builtins();
        assert_eq!(factory.supported_types(), Platform::ALL.to_vec());
        assert!(factory.is_supported(Platform::Instagram));
        assert!(!AdapterFactory::new().is_supported(Platform::WordPress));
    }

    #[test]
    fn test_create_unconfigured_platform() {
        let factory = AdapterFactory::with_builtins();
        let err = factory
            .create(Platform::Webflow, &PlatformsConfig::default())
            .unwrap_err();
        assert!(matches!(err, AdapterError::NotConfigured(_)));

        let err = AdapterFactory::new()
            .create(Platform::Webflow, &PlatformsConfig::default())
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnsupportedPlatform(_)));
    }

    #[test]
    fn test_registry_from_config() {
        let registry =
            PlatformRegistry::from_config(&AdapterFactory::with_builtins(), &config()).unwrap();
        assert_eq!(registry.platforms(), vec![Platform::WordPress, Platform::Twitter]);
        assert!(registry.get(Platform::Facebook).is_none());
        assert_eq!(
            registry.capabilities(Platform::Twitter).and_then(|c| c.max_content_length),
            Some(280)
        );
        assert_eq!(
            registry.platforms_supporting(Feature::Scheduling),
            vec![Platform::WordPress]
        );
    }

    #[test]
    fn test_credential_errors_surface() {
        let mut config = config();
        config.credentials_encrypted = true;
        config.encryption_key = Some("22".repeat(32));
        let err = PlatformRegistry::from_config(&AdapterFactory::with_builtins(), &config)
            .unwrap_err();
        assert!(matches!(err, AdapterError::Credential(_)));
    }

    #[test]
    fn test_compare_capabilities() {
        let registry = PlatformRegistry::new();
        let cmp = registry.compare_capabilities(Platform::WordPress, Platform::Twitter);
        assert!(cmp.shared.contains(&Feature::Images));
        assert!(cmp.only_left.contains(&Feature::Html));
        assert!(cmp.only_right.is_empty());
        assert!(cmp
            .limits
            .iter()
            .any(|d| d.limit == "max_content_length" && d.right == Some(280)));
    }

    #[test]
    fn test_common_capabilities_most_restrictive() {
        let registry = PlatformRegistry::new();
        let common = registry
            .common_capabilities(&[Platform::WordPress, Platform::Twitter, Platform::Instagram])
            .unwrap();
        assert!(!common.supports_html);
        assert!(common.supports_images);
        assert!(!common.supports_deletion);
        assert_eq!(common.max_content_length, Some(280));
        assert_eq!(common.max_images, Some(4));
        assert_eq!(common.max_title_length, Some(200));
        assert!(common.requires_image);

        assert!(registry.common_capabilities(&[]).is_none());
    }
}
