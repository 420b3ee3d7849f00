#![warn(clippy::pedantic)]
// =============================================================================
// Clippy Pedantic Lint Configuration
// =============================================================================
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
// Character counts and scores are small.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::implicit_hasher)]

//! # Platforms
//!
//! Adapters that turn [`content::UniversalContent`] into platform-native
//! content and publish it.
//!
//! - **Adapters**: WordPress (Gutenberg + REST), Webflow CMS, Twitter/X,
//!   LinkedIn, Facebook and Instagram
//! - **Registry**: explicit [`AdapterFactory`] and [`PlatformRegistry`]
//! - **Pipeline**: transform, validate, publish with folded failures
//! - **Tester**: quick per-platform compatibility checks
//! - **Credentials**: AES-256-CBC encrypted secrets

pub mod adapter;
pub mod adapters;
pub mod base_adapter;
pub mod config;
pub mod credentials;
pub mod error;
pub mod links;
pub mod pipeline;
pub mod registry;
pub mod tester;

pub use adapter::{
    ContentFormat, ContentTransformationResult, Feature, Platform, PlatformAdapter,
    PlatformCapabilities, PlatformContent, PlatformImage, PlatformLink, PublishStatus,
    PublishingResult, PublishingSettings, PublishingStatus, RemoteStatus, TransformOptions,
    ValidationResult, Visibility,
};
pub use adapters::{SocialAdapter, WebflowAdapter, WordPressAdapter};
pub use config::{PlatformsConfig, SocialConfig, WebflowConfig, WordPressConfig};
pub use error::{AdapterError, AdapterResult, ConfigError, CredentialError};
pub use links::{LinkStrategy, LinkingRules, ProcessedLink, ProjectContext, ProjectPage};
pub use pipeline::PublishingPipeline;
pub use registry::{AdapterFactory, CapabilityComparison, PlatformRegistry};
pub use tester::{CompatibilityReport, ContentTester, PlatformTestResult};
