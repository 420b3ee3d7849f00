//! Backlink strategy types.

use content::{LinkIntent, LinkPosition};
use serde::{Deserialize, Serialize};

/// Site the content is published for. Used to resolve relative links and to
/// suggest internal links to existing pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub base_url: String,
    #[serde(default)]
    pub pages: Vec<ProjectPage>,
    #[serde(default)]
    pub required_domains: Vec<String>,
    #[serde(default)]
    pub forbidden_domains: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPage {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A link ready to be placed in platform content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedLink {
    pub anchor_text: String,
    pub url: String,
    pub internal: bool,
    /// 0–100.
    pub seo_value: f64,
    pub position: LinkPosition,
    pub context: String,
    pub intent: LinkIntent,
    pub nofollow: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPreferences {
    pub intro_internal: usize,
    pub body_internal: usize,
    pub conclusion_external: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorTextRules {
    pub max_length: usize,
    pub avoid_exact_match: bool,
}

impl Default for AnchorTextRules {
    fn default() -> Self {
        Self {
            max_length: 100,
            avoid_exact_match: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkingRules {
    pub max_internal_links: usize,
    pub max_external_links: usize,
    /// When non-empty, external links must point to one of these domains.
    pub required_domains: Vec<String>,
    /// External links to these domains are dropped. Wins over `required_domains`.
    pub forbidden_domains: Vec<String>,
    pub position_preferences: PositionPreferences,
    pub anchor_text: AnchorTextRules,
}

/// Output of `generate_backlinks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStrategy {
    pub internal_links: Vec<ProcessedLink>,
    pub external_links: Vec<ProcessedLink>,
    pub rules: LinkingRules,
}

impl LinkStrategy {
    pub fn total(&self) -> usize {
        self.internal_links.len() + self.external_links.len()
    }
}

/// True when `domain` is `rule` or one of its subdomains.
pub fn domain_matches(domain: &str, rule: &str) -> bool {
    let domain = domain.trim_start_matches("www.").to_ascii_lowercase();
    let rule = rule.trim_start_matches("www.").to_ascii_lowercase();
    domain == rule || domain.ends_with(&format!(".{rule}"))
}
