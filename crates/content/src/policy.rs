//! Tunable heuristics for analysis and validation.
//!
//! Every constant the analyzer and validator use lives here so a deployment
//! can adjust them from a config file without touching the scoring code.

use serde::{Deserialize, Serialize};

/// Weights and thresholds used by [`crate::analysis`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ScoringPolicy {
    pub words_per_minute: usize,
    /// Relevance assigned to every link found in the body.
    pub default_link_relevance: f64,
    /// Excerpt length when one has to be generated from the body.
    pub excerpt_max_chars: usize,
    /// Length of the paragraph snippet stored with each link.
    pub link_context_chars: usize,

    pub seo: SeoWeights,
    pub headings: HeadingDeductions,
    pub images: ImageWeights,

    /// Placeholder until a real topical model exists.
    pub topical_consistency: f64,
    /// Placeholder until a real plagiarism check exists.
    pub originality: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            words_per_minute: 200,
            default_link_relevance: 0.8,
            excerpt_max_chars: 160,
            link_context_chars: 200,
            seo: SeoWeights::default(),
            headings: HeadingDeductions::default(),
            images: ImageWeights::default(),
            topical_consistency: 0.8,
            originality: 0.85,
        }
    }
}

/// Additive SEO score components. The defaults sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoWeights {
    pub title_min_chars: usize,
    pub title_max_chars: usize,
    pub title_length: u32,
    pub meta_min_chars: usize,
    pub meta_max_chars: usize,
    pub meta_length: u32,
    pub has_keywords: u32,
    pub keyword_in_title: u32,
    pub keyword_in_meta: u32,
    pub min_words: usize,
    pub word_count: u32,
    pub has_h2: u32,
}

impl Default for SeoWeights {
    fn default() -> Self {
        Self {
            title_min_chars: 30,
            title_max_chars: 60,
            title_length: 20,
            meta_min_chars: 120,
            meta_max_chars: 160,
            meta_length: 20,
            has_keywords: 10,
            keyword_in_title: 15,
            keyword_in_meta: 10,
            min_words: 300,
            word_count: 15,
            has_h2: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingDeductions {
    pub missing_h1: u32,
    pub multiple_h1: u32,
    pub skipped_level: u32,
    pub missing_h2: u32,
}

impl Default for HeadingDeductions {
    fn default() -> Self {
        Self {
            missing_h1: 10,
            multiple_h1: 15,
            skipped_level: 10,
            missing_h2: 10,
        }
    }
}

/// Per-image optimization points. The defaults sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageWeights {
    pub alt_text: u32,
    pub caption: u32,
    pub lazy_load: u32,
    pub modern_format: u32,
    pub compression: u32,
}

impl Default for ImageWeights {
    fn default() -> Self {
        Self {
            alt_text: 40,
            caption: 20,
            lazy_load: 10,
            modern_format: 15,
            compression: 15,
        }
    }
}

/// Thresholds used by [`crate::validation::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub min_words: usize,
    pub max_title_chars: usize,
    pub max_meta_description_chars: usize,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_words: 300,
            max_title_chars: 60,
            max_meta_description_chars: 160,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_100() {
        let seo = SeoWeights::default();
        let total = seo.title_length
            + seo.meta_length
            + seo.has_keywords
            + seo.keyword_in_title
            + seo.keyword_in_meta
            + seo.word_count
            + seo.has_h2;
        assert_eq!(total, 100);

        let img = ImageWeights::default();
        assert_eq!(
            img.alt_text + img.caption + img.lazy_load + img.modern_format + img.compression,
            100
        );
    }

    #[test]
    fn test_partial_policy_from_json_keeps_defaults() {
        let policy: ScoringPolicy =
            serde_json::from_str(r#"{"words_per_minute": 250, "seo": {"has_h2": 5}}"#).unwrap();
        assert_eq!(policy.words_per_minute, 250);
        assert_eq!(policy.seo.has_h2, 5);
        assert_eq!(policy.seo.title_length, 20);
        assert!((policy.default_link_relevance - 0.8).abs() < f64::EPSILON);
    }
}
