//! Content metrics and scores.
//!
//! All scores are heuristics driven by [`ScoringPolicy`]. Functions here are
//! pure and never fail; empty input produces zeroed metrics.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::markdown::to_plain_text;
use crate::model::{Compression, ContentHeading, ContentImage, ImageFormat, UniversalContent};
use crate::policy::{HeadingDeductions, ImageWeights, ScoringPolicy};

/// Full analysis of one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    pub word_count: usize,
    pub reading_time_minutes: usize,
    /// Keyword to occurrences per 100 words.
    pub keyword_density: BTreeMap<String, f64>,
    /// Flesch Reading Ease, 0–100.
    pub readability_score: f64,
    /// 0–100.
    pub seo_score: u32,
    pub heading_analysis: HeadingAnalysis,
    pub link_distribution: LinkDistribution,
    pub image_optimization: ImageOptimizationReport,
    pub content_quality: ContentQuality,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingAnalysis {
    /// Heading level to number of headings at that level.
    pub counts: BTreeMap<u8, usize>,
    pub score: u32,
    pub issues: Vec<String>,
}

impl HeadingAnalysis {
    pub fn count(&self, level: u8) -> usize {
        self.counts.get(&level).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDistribution {
    pub internal: usize,
    pub external: usize,
    pub internal_ratio: f64,
    pub external_ratio: f64,
    pub links_per_100_words: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptimizationReport {
    pub image_count: usize,
    pub missing_alt_text: usize,
    /// Average per-image score, 0 when there are no images.
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentQuality {
    pub average_paragraph_words: f64,
    pub average_sentence_words: f64,
    /// Unique words over total words, 0–1.
    pub vocabulary_diversity: f64,
    pub topical_consistency: f64,
    pub originality: f64,
}

/// Run every metric over `content`.
pub fn analyze(content: &UniversalContent, policy: &ScoringPolicy) -> ContentAnalysis {
    let words = word_count(&content.content);
    let plain = to_plain_text(&content.content);

    ContentAnalysis {
        word_count: words,
        reading_time_minutes: reading_time(words, policy.words_per_minute),
        keyword_density: content
            .keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|k| (k.clone(), keyword_density(&content.content, k, words)))
            .collect(),
        readability_score: readability_score(&plain),
        seo_score: seo_score(content, words, policy),
        heading_analysis: analyze_headings(&content.heading_structure, &policy.headings),
        link_distribution: link_distribution(
            content.internal_link_opportunities.len(),
            content.external_link_targets.len(),
            words,
        ),
        image_optimization: image_optimization(&content.body_images, &policy.images),
        content_quality: content_quality(&plain, policy),
    }
}

/// Whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn reading_time(words: usize, words_per_minute: usize) -> usize {
    if words_per_minute == 0 {
        return 0;
    }
    words.div_ceil(words_per_minute)
}

/// Case-insensitive whole-phrase occurrences of `keyword` per 100 words.
pub fn keyword_density(text: &str, keyword: &str, words: usize) -> f64 {
    if words == 0 {
        return 0.0;
    }
    keyword_occurrences(text, keyword) as f64 / words as f64 * 100.0
}

pub fn keyword_occurrences(text: &str, keyword: &str) -> usize {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return 0;
    }

    // `\b` only makes sense next to word characters ("c++" has none at the end).
    let boundary = |c: Option<char>| {
        if c.is_some_and(|c| c.is_alphanumeric() || c == '_') {
            r"\b"
        } else {
            ""
        }
    };
    let pattern = format!(
        "(?i){}{}{}",
        boundary(keyword.chars().next()),
        regex::escape(keyword),
        boundary(keyword.chars().last()),
    );

    match Regex::new(&pattern) {
        Ok(re) => re.find_iter(text).count(),
        Err(e) => {
            tracing::debug!(keyword, error = %e, "Keyword pattern rejected");
            0
        }
    }
}

/// Flesch Reading Ease on plain text, clamped to 0–100.
pub fn readability_score(plain: &str) -> f64 {
    let words: Vec<&str> = plain.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let sentences = sentence_count(plain).max(1) as f64;
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let word_total = words.len() as f64;

    let score = 206.835 - 1.015 * (word_total / sentences) - 84.6 * (syllables as f64 / word_total);
    score.clamp(0.0, 100.0)
}

/// Vowel groups in `word`, at least one.
pub fn count_syllables(word: &str) -> usize {
    let mut groups = 0;
    let mut in_vowel = false;
    for c in word.chars().flat_map(char::to_lowercase) {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !in_vowel {
            groups += 1;
        }
        in_vowel = vowel;
    }
    groups.max(1)
}

fn sentence_count(plain: &str) -> usize {
    plain
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

pub fn seo_score(content: &UniversalContent, words: usize, policy: &ScoringPolicy) -> u32 {
    let w = &policy.seo;
    let mut score = 0;

    let title_len = content.title.chars().count();
    if (w.title_min_chars..=w.title_max_chars).contains(&title_len) {
        score += w.title_length;
    }

    let meta_len = content.meta_description.chars().count();
    if (w.meta_min_chars..=w.meta_max_chars).contains(&meta_len) {
        score += w.meta_length;
    }

    if content.keywords.iter().any(|k| !k.trim().is_empty()) {
        score += w.has_keywords;
    }

    if let Some(keyword) = content.primary_keyword() {
        let keyword = keyword.to_lowercase();
        if content.title.to_lowercase().contains(&keyword) {
            score += w.keyword_in_title;
        }
        if content.meta_description.to_lowercase().contains(&keyword) {
            score += w.keyword_in_meta;
        }
    }

    if words >= w.min_words {
        score += w.word_count;
    }

    if content.heading_structure.iter().any(|h| h.level == 2) {
        score += w.has_h2;
    }

    score.min(100)
}

pub fn analyze_headings(headings: &[ContentHeading], deductions: &HeadingDeductions) -> HeadingAnalysis {
    let mut counts = BTreeMap::new();
    for heading in headings {
        *counts.entry(heading.level).or_insert(0) += 1;
    }

    let mut issues = Vec::new();
    let mut penalty = 0u32;

    match counts.get(&1).copied().unwrap_or(0) {
        0 => {
            issues.push("No H1 heading in content".to_string());
            penalty += deductions.missing_h1;
        }
        1 => {}
        n => {
            issues.push(format!("{n} H1 headings, expected one"));
            penalty += deductions.multiple_h1;
        }
    }

    for pair in headings.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.level > prev.level.saturating_add(1) {
            issues.push(format!(
                "Heading \"{}\" skips from H{} to H{}",
                next.text, prev.level, next.level
            ));
            penalty += deductions.skipped_level;
        }
    }

    if !counts.contains_key(&2) {
        issues.push("No H2 headings".to_string());
        penalty += deductions.missing_h2;
    }

    HeadingAnalysis {
        counts,
        score: 100u32.saturating_sub(penalty),
        issues,
    }
}

pub fn link_distribution(internal: usize, external: usize, words: usize) -> LinkDistribution {
    let total = internal + external;
    let ratio = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 };
    LinkDistribution {
        internal,
        external,
        internal_ratio: ratio(internal),
        external_ratio: ratio(external),
        links_per_100_words: if words == 0 {
            0.0
        } else {
            total as f64 / words as f64 * 100.0
        },
    }
}

pub fn image_score(image: &ContentImage, weights: &ImageWeights) -> u32 {
    let mut score = 0;
    if !image.alt_text.trim().is_empty() {
        score += weights.alt_text;
    }
    if image.caption.as_deref().is_some_and(|c| !c.trim().is_empty()) {
        score += weights.caption;
    }
    if image.optimization.lazy_load {
        score += weights.lazy_load;
    }
    if image.optimization.format == ImageFormat::Webp {
        score += weights.modern_format;
    }
    if image.optimization.compression != Compression::Low {
        score += weights.compression;
    }
    score
}

pub fn image_optimization(images: &[ContentImage], weights: &ImageWeights) -> ImageOptimizationReport {
    if images.is_empty() {
        return ImageOptimizationReport::default();
    }
    let total: u32 = images.iter().map(|i| image_score(i, weights)).sum();
    ImageOptimizationReport {
        image_count: images.len(),
        missing_alt_text: images
            .iter()
            .filter(|i| i.alt_text.trim().is_empty())
            .count(),
        score: f64::from(total) / images.len() as f64,
    }
}

pub fn content_quality(plain: &str, policy: &ScoringPolicy) -> ContentQuality {
    let words: Vec<String> = plain
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    let paragraphs: Vec<&str> = plain
        .split("\n\n")
        .filter(|p| !p.trim().is_empty())
        .collect();
    let sentences = sentence_count(plain);

    let per = |total: usize, n: usize| if n == 0 { 0.0 } else { total as f64 / n as f64 };
    let unique: HashSet<&str> = words.iter().map(String::as_str).collect();

    ContentQuality {
        average_paragraph_words: per(
            paragraphs.iter().map(|p| word_count(p)).sum(),
            paragraphs.len(),
        ),
        average_sentence_words: per(words.len(), sentences),
        vocabulary_diversity: per(unique.len(), words.len()),
        topical_consistency: policy.topical_consistency,
        originality: policy.originality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: u8, text: &str) -> ContentHeading {
        ContentHeading {
            level,
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_word_count_and_reading_time() {
        assert_eq!(word_count("  one two\n\nthree  "), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(reading_time(0, 200), 0);
        assert_eq!(reading_time(1, 200), 1);
        assert_eq!(reading_time(401, 200), 3);
    }

    #[test]
    fn test_keyword_density_whole_phrase() {
        let text = "Rust is great. I love rust and rustaceans. RUST!";
        assert_eq!(keyword_occurrences(text, "rust"), 3);
        assert_eq!(keyword_occurrences("c++ and C++", "c++"), 2);
        let density = keyword_density(text, "rust", 10);
        assert!((density - 30.0).abs() < 1e-9);
        assert!(keyword_density("", "rust", 0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_count_syllables() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("reading"), 2);
        assert_eq!(count_syllables("rhythm"), 1);
        assert_eq!(count_syllables("123"), 1);
    }

    #[test]
    fn test_readability_is_clamped() {
        let easy = readability_score("The cat sat. The dog ran.");
        assert!((easy - 100.0).abs() < f64::EPSILON);
        let hard = readability_score(
            "Incomprehensibility characterizes institutionalization notwithstanding organizational considerations",
        );
        assert!(hard.abs() < f64::EPSILON);
        assert!(readability_score("").abs() < f64::EPSILON);
    }

    #[test]
    fn test_seo_score_full_marks() {
        let content = UniversalContent {
            title: "A complete guide to async Rust programming".to_string(),
            meta_description: format!("Learn async Rust {}", "x".repeat(110)),
            keywords: vec!["async rust".to_string()],
            content: "word ".repeat(300),
            heading_structure: vec![heading(2, "Section")],
            ..Default::default()
        };
        assert_eq!(seo_score(&content, 300, &ScoringPolicy::default()), 100);
    }

    #[test]
    fn test_seo_score_empty_content() {
        assert_eq!(
            seo_score(&UniversalContent::default(), 0, &ScoringPolicy::default()),
            0
        );
    }

    #[test]
    fn test_heading_deductions() {
        let deductions = HeadingDeductions::default();

        let good = analyze_headings(
            &[heading(1, "T"), heading(2, "A"), heading(3, "B")],
            &deductions,
        );
        assert_eq!(good.score, 100);
        assert!(good.issues.is_empty());

        let bad = analyze_headings(
            &[heading(1, "T"), heading(1, "U"), heading(3, "B")],
            &deductions,
        );
        // multiple H1, skipped level, no H2
        assert_eq!(bad.score, 100 - 15 - 10 - 10);
        assert_eq!(bad.issues.len(), 3);
        assert_eq!(bad.count(1), 2);

        let none = analyze_headings(&[], &deductions);
        assert_eq!(none.score, 80);
    }

    #[test]
    fn test_heading_levels_out_of_range() {
        // Deserialized content is not limited to H1-H6.
        let odd = analyze_headings(
            &[
                heading(1, "T"),
                heading(2, "A"),
                heading(255, "Deep"),
                heading(255, "Deeper"),
            ],
            &HeadingDeductions::default(),
        );
        assert_eq!(odd.issues.len(), 1);
        assert!(odd.issues[0].contains("from H2 to H255"));
    }

    #[test]
    fn test_link_distribution() {
        let dist = link_distribution(3, 1, 200);
        assert!((dist.internal_ratio - 0.75).abs() < f64::EPSILON);
        assert!((dist.external_ratio - 0.25).abs() < f64::EPSILON);
        assert!((dist.links_per_100_words - 2.0).abs() < 1e-9);

        let empty = link_distribution(0, 0, 0);
        assert!(empty.internal_ratio.abs() < f64::EPSILON);
    }

    #[test]
    fn test_image_optimization_average() {
        let weights = ImageWeights::default();
        let mut perfect = ContentImage {
            url: "a.webp".to_string(),
            alt_text: "Alt".to_string(),
            caption: Some("Caption".to_string()),
            ..Default::default()
        };
        perfect.optimization.format = ImageFormat::Webp;
        assert_eq!(image_score(&perfect, &weights), 100);

        let mut bare = ContentImage::default();
        bare.optimization.lazy_load = false;
        bare.optimization.compression = Compression::Low;
        assert_eq!(image_score(&bare, &weights), 0);

        let report = image_optimization(&[perfect, bare], &weights);
        assert!((report.score - 50.0).abs() < f64::EPSILON);
        assert_eq!(report.missing_alt_text, 1);

        assert!(image_optimization(&[], &weights).score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_content_quality() {
        let quality = content_quality("One two two.\n\nThree four.", &ScoringPolicy::default());
        assert!((quality.average_paragraph_words - 2.5).abs() < f64::EPSILON);
        assert!((quality.average_sentence_words - 2.5).abs() < f64::EPSILON);
        assert!((quality.vocabulary_diversity - 0.8).abs() < f64::EPSILON);
        assert!((quality.originality - 0.85).abs() < f64::EPSILON);
    }
}
