#![warn(clippy::pedantic)]
// =============================================================================
// Clippy Pedantic Lint Configuration
// =============================================================================
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// Word counts and scores are small; f64 holds them exactly.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::default_trait_access)]

//! # Content
//!
//! Platform-agnostic article model for the publishing layer.
//!
//! - **Model**: [`UniversalContent`] and its images, headings and links
//! - **Legacy posts**: [`BlogPost`] conversion in both directions
//! - **Analysis**: word counts, readability, SEO and structure scores
//! - **Validation**: platform-independent errors and warnings
//! - **Markdown**: CommonMark rendering and HTML back-conversion

pub mod analysis;
pub mod blog_post;
pub mod extract;
pub mod markdown;
pub mod model;
pub mod policy;
pub mod service;
pub mod validation;

pub use analysis::ContentAnalysis;
pub use blog_post::BlogPost;
pub use model::{
    Compression, ContentHeading, ContentImage, ExternalLink, ImageFormat, ImageOptimization,
    ImagePlacement, ImagePosition, LinkIntent, LinkOpportunity, LinkPosition, UniversalContent,
};
pub use policy::{ScoringPolicy, ValidationPolicy};
pub use service::ContentService;
pub use validation::{
    ContentValidation, Impact, Severity, ValidationError, ValidationWarning,
};
