//! Platform-independent content validation.
//!
//! Only structural problems (no title, no body) are errors; everything else is
//! a warning. Platform limits are checked by the adapters.

use serde::{Deserialize, Serialize};

use crate::analysis::word_count;
use crate::model::UniversalContent;
use crate::policy::ValidationPolicy;

/// Stable machine-readable codes.
pub mod codes {
    pub const MISSING_TITLE: &str = "MISSING_TITLE";
    pub const MISSING_CONTENT: &str = "MISSING_CONTENT";
    pub const MISSING_META_DESCRIPTION: &str = "MISSING_META_DESCRIPTION";
    pub const CONTENT_TOO_SHORT: &str = "CONTENT_TOO_SHORT";
    pub const NO_KEYWORDS: &str = "NO_KEYWORDS";
    pub const TITLE_TOO_LONG: &str = "TITLE_TOO_LONG";
    pub const META_DESCRIPTION_TOO_LONG: &str = "META_DESCRIPTION_TOO_LONG";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// What a warning affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Seo,
    Ux,
    Performance,
    Accessibility,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Seo => "seo",
            Self::Ux => "ux",
            Self::Performance => "performance",
            Self::Accessibility => "accessibility",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub code: String,
    pub message: String,
    pub field: String,
    pub severity: Severity,
}

impl ValidationError {
    pub fn new(
        code: impl Into<String>,
        field: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field: field.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
    pub field: String,
    pub impact: Impact,
    pub auto_fix_available: bool,
}

impl ValidationWarning {
    pub fn new(
        code: impl Into<String>,
        field: impl Into<String>,
        impact: Impact,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field: field.into(),
            impact,
            auto_fix_available: false,
        }
    }

    #[must_use]
    pub fn auto_fixable(mut self) -> Self {
        self.auto_fix_available = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentValidation {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ContentValidation {
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    pub fn has_error(&self, code: &str) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }
}

/// Check `content` against `policy`. Never fails; problems are reported in
/// the returned value.
pub fn validate(content: &UniversalContent, policy: &ValidationPolicy) -> ContentValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if content.title.trim().is_empty() {
        errors.push(ValidationError::new(
            codes::MISSING_TITLE,
            "title",
            Severity::Critical,
            "Title is required",
        ));
    }

    if content.content.trim().is_empty() {
        errors.push(ValidationError::new(
            codes::MISSING_CONTENT,
            "content",
            Severity::Critical,
            "Content body is required",
        ));
    }

    let meta = content.meta_description.trim();
    if meta.is_empty() {
        warnings.push(
            ValidationWarning::new(
                codes::MISSING_META_DESCRIPTION,
                "metaDescription",
                Impact::Seo,
                "Meta description is missing",
            )
            .auto_fixable(),
        );
    } else if meta.chars().count() > policy.max_meta_description_chars {
        warnings.push(
            ValidationWarning::new(
                codes::META_DESCRIPTION_TOO_LONG,
                "metaDescription",
                Impact::Seo,
                format!(
                    "Meta description exceeds {} characters",
                    policy.max_meta_description_chars
                ),
            )
            .auto_fixable(),
        );
    }

    let words = word_count(&content.content);
    if words > 0 && words < policy.min_words {
        warnings.push(ValidationWarning::new(
            codes::CONTENT_TOO_SHORT,
            "content",
            Impact::Seo,
            format!(
                "Content has {words} words, at least {} recommended",
                policy.min_words
            ),
        ));
    }

    if content.keywords.iter().all(|k| k.trim().is_empty()) {
        warnings.push(ValidationWarning::new(
            codes::NO_KEYWORDS,
            "keywords",
            Impact::Seo,
            "No keywords defined",
        ));
    }

    if content.title.chars().count() > policy.max_title_chars {
        warnings.push(ValidationWarning::new(
            codes::TITLE_TOO_LONG,
            "title",
            Impact::Seo,
            format!("Title exceeds {} characters", policy.max_title_chars),
        ));
    }

    ContentValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}
