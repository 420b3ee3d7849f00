//! Publishing pipeline: transform, validate, publish.

use content::UniversalContent;
use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::adapter::{Platform, PublishingResult, TransformOptions};
use crate::registry::PlatformRegistry;

/// Runs content through the registered adapters.
#[derive(Debug, Clone, Default)]
pub struct PublishingPipeline {
    registry: PlatformRegistry,
}

impl PublishingPipeline {
    pub fn new(registry: PlatformRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    /// Transform, validate and publish to one platform. Every failure is
    /// reported in the returned result.
    #[instrument(skip(self, content, options), fields(title = %content.title))]
    pub async fn publish(
        &self,
        content: &UniversalContent,
        platform: Platform,
        options: &TransformOptions,
    ) -> PublishingResult {
        let Some(adapter) = self.registry.get(platform) else {
            return PublishingResult::failed(platform, format!("{platform} is not configured"));
        };

        let transformed = adapter.transform(content, options);
        let Some(platform_content) = transformed.content.filter(|_| transformed.success) else {
            warn!(platform = %platform, errors = ?transformed.errors, "Transformation failed");
            let mut result = PublishingResult::failed(platform, "Transformation failed");
            result.errors.extend(transformed.errors);
            result.warnings = transformed.warnings;
            return result;
        };

        let validation = adapter.validate(&platform_content);
        let mut warnings = transformed.warnings;
        warnings.extend(
            validation
                .warnings
                .iter()
                .map(|w| format!("{}: {}", w.code, w.message)),
        );

        if !validation.is_valid {
            warn!(platform = %platform, score = validation.score, "Validation failed");
            let mut result = PublishingResult::failed(platform, "Validation failed");
            result.errors.extend(
                validation
                    .errors
                    .iter()
                    .map(|e| format!("{}: {}", e.code, e.message)),
            );
            result.warnings = warnings;
            return result;
        }

        let mut result = adapter.publish(&platform_content).await;
        result.warnings.extend(warnings);
        result
            .metadata
            .insert("validationScore".to_string(), validation.score.into());
        info!(
            platform = %platform,
            success = result.success,
            platform_id = ?result.platform_id,
            "Publish finished"
        );
        result
    }

    /// Publish to every platform concurrently. Results are in the order of
    /// `platforms`; one failure never affects the others.
    pub async fn publish_all(
        &self,
        content: &UniversalContent,
        platforms: &[Platform],
        options: &TransformOptions,
    ) -> Vec<PublishingResult> {
        join_all(
            platforms
                .iter()
                .map(|platform| self.publish(content, *platform, options)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{
        ContentTransformationResult, PlatformAdapter, PlatformCapabilities, PlatformContent,
        PublishingStatus,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Adapter that accepts everything and never touches the network.
    #[derive(Debug)]
    struct StubAdapter {
        platform: Platform,
        capabilities: PlatformCapabilities,
        fail_publish: bool,
    }

    impl StubAdapter {
        fn new(platform: Platform, fail_publish: bool) -> Arc<Self> {
            Arc::new(Self {
                platform,
                capabilities: platform.capabilities(),
                fail_publish,
            })
        }
    }

    #[async_trait]
    impl PlatformAdapter for StubAdapter {
        fn platform(&self) -> Platform {
            self.platform
        }

        fn capabilities(&self) -> &PlatformCapabilities {
            &self.capabilities
        }

        fn transform(
            &self,
            content: &UniversalContent,
            _options: &TransformOptions,
        ) -> ContentTransformationResult {
            if content.title.is_empty() {
                return ContentTransformationResult::failed("Title is required");
            }
            ContentTransformationResult::ok(
                PlatformContent::new(self.platform, &content.title, &content.content),
                vec!["stub warning".to_string()],
            )
        }

        fn reverse(&self, content: &PlatformContent) -> UniversalContent {
            UniversalContent {
                title: content.title.clone(),
                content: content.content.clone(),
                ..Default::default()
            }
        }

        async fn publish(&self, _content: &PlatformContent) -> PublishingResult {
            if self.fail_publish {
                PublishingResult::failed(self.platform, "HTTP 500")
            } else {
                PublishingResult::ok(self.platform, "42", None)
            }
        }

        async fn update(&self, id: &str, _content: &PlatformContent) -> PublishingResult {
            PublishingResult::ok(self.platform, id, None)
        }

        async fn delete(&self, id: &str) -> PublishingResult {
            PublishingResult::ok(self.platform, id, None)
        }

        async fn get_publishing_status(&self, id: &str) -> PublishingStatus {
            PublishingStatus::unknown(self.platform, id, "stub")
        }
    }

    fn article() -> UniversalContent {
        UniversalContent {
            title: "Title".to_string(),
            content: "Body".to_string(),
            ..Default::default()
        }
    }

    fn pipeline() -> PublishingPipeline {
        PublishingPipeline::new(
            PlatformRegistry::new()
                .with_adapter(StubAdapter::new(Platform::WordPress, false))
                .with_adapter(StubAdapter::new(Platform::Twitter, true))
                .with_adapter(StubAdapter::new(Platform::Instagram, false)),
        )
    }

    #[tokio::test]
    async fn test_publish_success_carries_warnings() {
        let result = pipeline()
            .publish(&article(), Platform::WordPress, &TransformOptions::default())
            .await;
        assert!(result.success);
        assert_eq!(result.platform_id.as_deref(), Some("42"));
        assert_eq!(result.warnings, vec!["stub warning".to_string()]);
        assert_eq!(result.metadata["validationScore"], 100);
    }

    #[tokio::test]
    async fn test_validation_failure_is_folded() {
        // Instagram requires an image; the stub produces none.
        let result = pipeline()
            .publish(&article(), Platform::Instagram, &TransformOptions::default())
            .await;
        assert!(!result.success);
        assert!(result.errors.iter().any(|e| e.starts_with("IMAGE_REQUIRED")));
    }

    #[tokio::test]
    async fn test_transform_failure_and_missing_adapter() {
        let pipeline = pipeline();
        let mut content = article();
        content.title.clear();
        let result = pipeline
            .publish(&content, Platform::WordPress, &TransformOptions::default())
            .await;
        assert!(!result.success);
        assert!(result.errors.contains(&"Title is required".to_string()));

        let result = pipeline
            .publish(&article(), Platform::Webflow, &TransformOptions::default())
            .await;
        assert!(!result.success);
        assert!(result.errors[0].contains("not configured"));
    }

    #[tokio::test]
    async fn test_publish_all_keeps_slots() {
        let results = pipeline()
            .publish_all(
                &article(),
                &[Platform::Twitter, Platform::WordPress, Platform::Webflow],
                &TransformOptions::default(),
            )
            .await;
        let outcome: Vec<(Platform, bool)> = results.iter().map(|r| (r.platform, r.success)).collect();
        assert_eq!(
            outcome,
            vec![
                (Platform::Twitter, false),
                (Platform::WordPress, true),
                (Platform::Webflow, false)
            ]
        );
    }
}
