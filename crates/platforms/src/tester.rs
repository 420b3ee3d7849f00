//! Content Tester
//!
//! Quick per-platform checks on [`UniversalContent`] before anything is
//! transformed: character limits, required media, hashtag counts and tone.

use content::UniversalContent;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::Platform;
use crate::adapters::social::hashtag_limit;

const ERROR_PENALTY: u32 = 25;
const WARNING_PENALTY: u32 = 10;
const MAX_META_DESCRIPTION: usize = 160;

/// Words that read as too casual for LinkedIn.
const LINKEDIN_CASUAL: [&str; 10] = [
    "lol", "omg", "lmao", "gonna", "wanna", "gotta", "btw", "tbh", "dude", "yolo",
];

/// Outcome for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformTestResult {
    pub platform: Platform,
    pub passed: bool,
    /// 0–100.
    pub score: u32,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl PlatformTestResult {
    fn new(platform: Platform, errors: Vec<String>, warnings: Vec<String>) -> Self {
        let deductions = ERROR_PENALTY * errors.len() as u32 + WARNING_PENALTY * warnings.len() as u32;
        Self {
            platform,
            passed: errors.is_empty(),
            score: 100u32.saturating_sub(deductions),
            errors,
            warnings,
        }
    }
}

/// Outcome across platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityReport {
    /// True when no platform reported errors.
    pub compatible: bool,
    pub results: Vec<PlatformTestResult>,
    /// Mean of the per-platform scores.
    pub overall_score: u32,
}

impl CompatibilityReport {
    pub fn failed_platforms(&self) -> Vec<Platform> {
        self.results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.platform)
            .collect()
    }
}

/// Stateless rule checker.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentTester;

impl ContentTester {
    pub fn new() -> Self {
        Self
    }

    /// Text a social post starts from: title and summary.
    fn social_text(content: &UniversalContent) -> String {
        let summary = content.summary();
        if summary.is_empty() || summary == content.title.trim() {
            content.title.trim().to_string()
        } else {
            format!("{}\n\n{summary}", content.title.trim())
        }
    }

    pub fn test_platform(&self, content: &UniversalContent, platform: Platform) -> PlatformTestResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let caps = platform.capabilities();

        if platform.is_social() {
            let text = Self::social_text(content);
            let len = text.chars().count();
            if len == 0 {
                errors.push("Post text is empty".to_string());
            }
            if let Some(max) = caps.max_content_length {
                if len > max {
                    errors.push(format!("Post text is {len} characters, {platform} allows {max}"));
                }
            }

            let tag_count = content.tags.len();
            let limit = hashtag_limit(platform);
            if tag_count > limit {
                warnings.push(format!(
                    "{tag_count} tags, only {limit} hashtags will be used on {platform}"
                ));
            }

            if platform == Platform::Instagram && content.image_count() == 0 {
                errors.push("Instagram posts require at least one image".to_string());
            }

            if platform == Platform::LinkedIn {
                let lower = text.to_lowercase();
                let casual: Vec<&str> = LINKEDIN_CASUAL
                    .iter()
                    .copied()
                    .filter(|word| {
                        lower
                            .split(|c: char| !c.is_alphanumeric())
                            .any(|token| token == *word)
                    })
                    .collect();
                if !casual.is_empty() {
                    warnings.push(format!(
                        "Casual language for LinkedIn: {}",
                        casual.join(", ")
                    ));
                }
            }
        } else {
            let title_len = content.title.trim().chars().count();
            if title_len == 0 {
                errors.push("Title is required".to_string());
            }
            if let Some(max) = caps.max_title_length {
                if title_len > max {
                    errors.push(format!("Title is {title_len} characters, {platform} allows {max}"));
                }
            }
            if content.content.trim().is_empty() {
                errors.push("Content is required".to_string());
            }

            let meta_len = content.meta_description.trim().chars().count();
            if meta_len == 0 {
                warnings.push("Meta description is missing".to_string());
            } else if meta_len > MAX_META_DESCRIPTION {
                warnings.push(format!(
                    "Meta description is {meta_len} characters, search engines show about {MAX_META_DESCRIPTION}"
                ));
            }
        }

        let result = PlatformTestResult::new(platform, errors, warnings);
        debug!(
            platform = %platform,
            score = result.score,
            passed = result.passed,
            "Content tested"
        );
        result
    }

    pub fn test_compatibility(
        &self,
        content: &UniversalContent,
        platforms: &[Platform],
    ) -> CompatibilityReport {
        let results: Vec<PlatformTestResult> = platforms
            .iter()
            .map(|p| self.test_platform(content, *p))
            .collect();

        let overall_score = if results.is_empty() {
            100
        } else {
            results.iter().map(|r| r.score).sum::<u32>() / results.len() as u32
        };

        CompatibilityReport {
            compatible: results.iter().all(|r| r.passed),
            overall_score,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> UniversalContent {
        UniversalContent {
            title: "Quarterly update".to_string(),
            content: "Numbers went up.".to_string(),
            meta_description: "What changed this quarter".to_string(),
            tags: vec!["business".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_article_passes_cms() {
        let tester = ContentTester::new();
        let result = tester.test_platform(&article(), Platform::WordPress);
        assert!(result.passed);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_twitter_limit() {
        let mut content = article();
        content.excerpt = "x".repeat(300);
        let result = ContentTester::new().test_platform(&content, Platform::Twitter);
        assert!(!result.passed);
        assert_eq!(result.score, 75);
    }

    #[test]
    fn test_instagram_requires_image() {
        let mut content = article();
        let result = ContentTester::new().test_platform(&content, Platform::Instagram);
        assert!(!result.passed);

        content.featured_image = Some("https://cdn.example.com/a.png".to_string());
        assert!(ContentTester::new().test_platform(&content, Platform::Instagram).passed);
    }

    #[test]
    fn test_linkedin_casual_language() {
        let mut content = article();
        content.excerpt = "We're gonna crush it, lol".to_string();
        let result = ContentTester::new().test_platform(&content, Platform::LinkedIn);
        assert!(result.passed);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("gonna"));
        assert!(result.warnings[0].contains("lol"));
        assert_eq!(result.score, 90);
    }

    #[test]
    fn test_hashtag_limit_warning() {
        let mut content = article();
        content.tags = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let result = ContentTester::new().test_platform(&content, Platform::Twitter);
        assert!(result.passed);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_compatibility_report() {
        let tester = ContentTester::new();
        let report = tester.test_compatibility(
            &article(),
            &[Platform::WordPress, Platform::Twitter, Platform::Instagram],
        );
        assert!(!report.compatible);
        assert_eq!(report.failed_platforms(), vec![Platform::Instagram]);
        assert_eq!(report.overall_score, (100 + 100 + 75) / 3);

        let ok = tester.test_compatibility(&article(), &[Platform::WordPress, Platform::Webflow]);
        assert!(ok.compatible);
    }
}
