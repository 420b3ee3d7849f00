//! Seam between the queue and the platform layer.

use async_trait::async_trait;
use content::UniversalContent;
use platforms::{
    CompatibilityReport, ContentTester, Platform, PublishStatus, PublishingPipeline,
    PublishingResult, TransformOptions,
};

/// Publishes queued content and checks it before publishing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentPublisher: Send + Sync {
    /// One result per platform, in order. Never fails as a whole.
    async fn publish_all(
        &self,
        content: &UniversalContent,
        platforms: &[Platform],
    ) -> Vec<PublishingResult>;

    fn check_compatibility(
        &self,
        content: &UniversalContent,
        platforms: &[Platform],
    ) -> CompatibilityReport;
}

/// [`ContentPublisher`] backed by the adapter pipeline and content tester.
#[derive(Debug, Clone)]
pub struct PipelinePublisher {
    pipeline: PublishingPipeline,
    tester: ContentTester,
    options: TransformOptions,
}

impl PipelinePublisher {
    /// Publishes immediately with public status when an item comes due.
    pub fn new(pipeline: PublishingPipeline) -> Self {
        Self {
            pipeline,
            tester: ContentTester::new(),
            options: TransformOptions {
                status: PublishStatus::Publish,
                ..Default::default()
            },
        }
    }

    pub fn with_options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl ContentPublisher for PipelinePublisher {
    async fn publish_all(
        &self,
        content: &UniversalContent,
        platforms: &[Platform],
    ) -> Vec<PublishingResult> {
        self.pipeline
            .publish_all(content, platforms, &self.options)
            .await
    }

    fn check_compatibility(
        &self,
        content: &UniversalContent,
        platforms: &[Platform],
    ) -> CompatibilityReport {
        self.tester.test_compatibility(content, platforms)
    }
}
