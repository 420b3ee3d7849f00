//! Platform connection settings.
//!
//! Loaded from the environment (`WORDPRESS_*`, `WEBFLOW_*`, ...) or from a
//! TOML file. A platform is configured when its required values are present.

use content::{ContentService, ScoringPolicy, ValidationPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::adapter::Platform;
use crate::credentials;
use crate::error::{ConfigError, CredentialError};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// WordPress REST API settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPressConfig {
    /// Site root, e.g. `https://blog.example.com`.
    pub site_url: String,
    pub username: String,
    /// Application password (possibly encrypted).
    pub app_password: String,
    #[serde(default)]
    pub field_mappings: HashMap<String, String>,
}

/// Webflow CMS API settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebflowConfig {
    /// API token (possibly encrypted).
    pub api_token: String,
    pub collection_id: String,
    /// Public site URL used to build item URLs.
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default = "default_webflow_api")]
    pub api_base: String,
    #[serde(default)]
    pub field_mappings: HashMap<String, String>,
}

fn default_webflow_api() -> String {
    "https://api.webflow.com".to_string()
}

/// Settings for one social network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialConfig {
    /// Bearer or page access token (possibly encrypted).
    pub access_token: String,
    /// LinkedIn author URN, Facebook page id or Instagram user id.
    #[serde(default)]
    pub account_id: Option<String>,
    /// Overrides the network's API root.
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub field_mappings: HashMap<String, String>,
}

/// All platform settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformsConfig {
    pub wordpress: Option<WordPressConfig>,
    pub webflow: Option<WebflowConfig>,
    pub twitter: Option<SocialConfig>,
    pub linkedin: Option<SocialConfig>,
    pub facebook: Option<SocialConfig>,
    pub instagram: Option<SocialConfig>,
    /// Secrets are stored as `iv:ciphertext` and decrypted on adapter construction.
    pub credentials_encrypted: bool,
    /// Overrides `CMS_ENCRYPTION_KEY`.
    pub encryption_key: Option<String>,
    pub http_timeout_secs: u64,
    /// Heuristics adapters use for reading time, excerpts and link relevance.
    pub scoring: ScoringPolicy,
    pub validation: ValidationPolicy,
}

impl Default for PlatformsConfig {
    fn default() -> Self {
        Self {
            wordpress: None,
            webflow: None,
            twitter: None,
            linkedin: None,
            facebook: None,
            instagram: None,
            credentials_encrypted: false,
            encryption_key: None,
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            scoring: ScoringPolicy::default(),
            validation: ValidationPolicy::default(),
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

fn social_from_env(token_var: &str, account_var: Option<&str>) -> Option<SocialConfig> {
    let access_token = var(token_var)?;
    let account_id = match account_var {
        Some(name) => Some(var(name)?),
        None => None,
    };
    Some(SocialConfig {
        access_token,
        account_id,
        ..Default::default()
    })
}

impl PlatformsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_timeout_secs = match var("PLATFORM_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "PLATFORM_HTTP_TIMEOUT_SECS".to_string(),
                message: format!("'{raw}' is not a number of seconds"),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let wordpress = match (
            var("WORDPRESS_SITE_URL"),
            var("WORDPRESS_USERNAME"),
            var("WORDPRESS_APP_PASSWORD"),
        ) {
            (Some(site_url), Some(username), Some(app_password)) => Some(WordPressConfig {
                site_url,
                username,
                app_password,
                field_mappings: HashMap::new(),
            }),
            _ => None,
        };

        let webflow = match (var("WEBFLOW_API_TOKEN"), var("WEBFLOW_COLLECTION_ID")) {
            (Some(api_token), Some(collection_id)) => Some(WebflowConfig {
                api_token,
                collection_id,
                site_url: var("WEBFLOW_SITE_URL"),
                api_base: var("WEBFLOW_API_BASE").unwrap_or_else(default_webflow_api),
                field_mappings: HashMap::new(),
            }),
            _ => None,
        };

        Ok(Self {
            wordpress,
            webflow,
            twitter: social_from_env("TWITTER_BEARER_TOKEN", None),
            linkedin: social_from_env("LINKEDIN_ACCESS_TOKEN", Some("LINKEDIN_AUTHOR_URN")),
            facebook: social_from_env("FACEBOOK_ACCESS_TOKEN", Some("FACEBOOK_PAGE_ID")),
            instagram: social_from_env("INSTAGRAM_ACCESS_TOKEN", Some("INSTAGRAM_USER_ID")),
            credentials_encrypted: flag("CMS_CREDENTIALS_ENCRYPTED"),
            encryption_key: None,
            http_timeout_secs,
            ..Self::default()
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Content service built from the configured policies.
    pub fn content_service(&self) -> ContentService {
        ContentService::new(self.scoring.clone(), self.validation.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn is_configured(&self, platform: Platform) -> bool {
        match platform {
            Platform::WordPress => self.wordpress.is_some(),
            Platform::Webflow => self.webflow.is_some(),
            _ => self.social(platform).is_some(),
        }
    }

    /// Platforms with settings present, in canonical order.
    pub fn configured_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.is_configured(*p))
            .collect()
    }

    pub fn social(&self, platform: Platform) -> Option<&SocialConfig> {
        match platform {
            Platform::Twitter => self.twitter.as_ref(),
            Platform::LinkedIn => self.linkedin.as_ref(),
            Platform::Facebook => self.facebook.as_ref(),
            Platform::Instagram => self.instagram.as_ref(),
            Platform::WordPress | Platform::Webflow => None,
        }
    }

    /// Plain secret for `stored`, decrypting when credentials are encrypted.
    pub fn secret(&self, stored: &str) -> Result<String, CredentialError> {
        if !self.credentials_encrypted {
            return Ok(stored.to_string());
        }
        let key = match &self.encryption_key {
            Some(raw) => credentials::parse_key(raw)?,
            None => credentials::key_from_env()?,
        };
        credentials::decrypt(stored, &key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: [&str; 16] = [
        "WORDPRESS_SITE_URL",
        "WORDPRESS_USERNAME",
        "WORDPRESS_APP_PASSWORD",
        "WEBFLOW_API_TOKEN",
        "WEBFLOW_COLLECTION_ID",
        "WEBFLOW_SITE_URL",
        "WEBFLOW_API_BASE",
        "TWITTER_BEARER_TOKEN",
        "LINKEDIN_ACCESS_TOKEN",
        "LINKEDIN_AUTHOR_URN",
        "FACEBOOK_ACCESS_TOKEN",
        "FACEBOOK_PAGE_ID",
        "INSTAGRAM_ACCESS_TOKEN",
        "INSTAGRAM_USER_ID",
        "CMS_CREDENTIALS_ENCRYPTED",
        "PLATFORM_HTTP_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for name in ALL_VARS {
            unsafe { env::remove_var(name) };
        }
    }

    #[test]
    #[serial]
    fn test_from_env_empty() {
        clear_env();
        let config = PlatformsConfig::from_env().unwrap();
        assert!(config.configured_platforms().is_empty());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn test_from_env_partial_platforms() {
        clear_env();
        unsafe {
            env::set_var("WORDPRESS_SITE_URL", "https://blog.example.com");
            env::set_var("WORDPRESS_USERNAME", "editor");
            env::set_var("WORDPRESS_APP_PASSWORD", "abcd efgh");
            env::set_var("TWITTER_BEARER_TOKEN", "tw-token");
            // Missing FACEBOOK_PAGE_ID leaves Facebook unconfigured.
            env::set_var("FACEBOOK_ACCESS_TOKEN", "fb-token");
            env::set_var("PLATFORM_HTTP_TIMEOUT_SECS", "5");
        }

        let config = PlatformsConfig::from_env().unwrap();
        assert_eq!(
            config.configured_platforms(),
            vec![Platform::WordPress, Platform::Twitter]
        );
        assert_eq!(config.wordpress.as_ref().unwrap().username, "editor");
        assert_eq!(config.http_timeout_secs, 5);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_timeout() {
        clear_env();
        unsafe { env::set_var("PLATFORM_HTTP_TIMEOUT_SECS", "soon") };
        let err = PlatformsConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        clear_env();
    }

    #[test]
    fn test_from_toml() {
        let config = PlatformsConfig::from_toml(
            r#"
            http_timeout_secs = 10

            [webflow]
            api_token = "wf"
            collection_id = "col-1"

            [webflow.field_mappings]
            post-body = "body"

            [linkedin]
            access_token = "li"
            account_id = "urn:li:person:42"
            "#,
        )
        .unwrap();

        let webflow = config.webflow.as_ref().unwrap();
        assert_eq!(webflow.api_base, "https://api.webflow.com");
        assert_eq!(webflow.field_mappings["post-body"], "body");
        assert_eq!(
            config.configured_platforms(),
            vec![Platform::Webflow, Platform::LinkedIn]
        );
        assert!(!config.credentials_encrypted);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("platforms.toml");
        std::fs::write(
            &path,
            "[wordpress]\nsite_url = \"https://blog.example.com\"\nusername = \"editor\"\napp_password = \"pw\"\n",
        )
        .unwrap();

        let config = PlatformsConfig::from_file(&path).unwrap();
        assert!(config.is_configured(Platform::WordPress));
        assert_eq!(config.timeout(), Duration::from_secs(30));

        let missing = PlatformsConfig::from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
        std::fs::write(&path, "wordpress = 3").unwrap();
        assert!(matches!(
            PlatformsConfig::from_file(&path),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_secret_decrypts_when_enabled() {
        let key_hex = "11".repeat(32);
        let key = credentials::parse_key(&key_hex).unwrap();
        let stored = credentials::encrypt("plain", &key);

        let mut config = PlatformsConfig::default();
        assert_eq!(config.secret("plain").unwrap(), "plain");

        config.credentials_encrypted = true;
        config.encryption_key = Some(key_hex);
        assert_eq!(config.secret(&stored).unwrap(), "plain");
        assert!(config.secret("garbage").is_err());
    }
}
