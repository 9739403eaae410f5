use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Language tags the caller wants sources for (lowercase, compared
    /// case-insensitively). Empty means "take whatever is configured".
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub resolve: ResolveConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Similarity score at or above which two titles are the same item.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Global deadline for a media race, in seconds.
    #[serde(default = "default_resolve_timeout_secs")]
    pub timeout_secs: u64,
}

impl ResolveConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub mangadex: Option<MangadexConfig>,
    #[serde(default)]
    pub consumet: Option<ConsumetConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MangadexConfig {
    pub enabled: bool,
    #[serde(default = "default_mangadex_api")]
    pub api_url: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumetConfig {
    pub enabled: bool,
    /// Base URL of a self-hosted Consumet API instance.
    pub base_url: String,
    #[serde(default = "default_consumet_provider")]
    pub provider: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_threshold() -> f64 {
    0.95
}

fn default_resolve_timeout_secs() -> u64 {
    30
}

fn default_mangadex_api() -> String {
    "https://api.mangadex.org".to_string()
}

fn default_consumet_provider() -> String {
    "zoro".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_resolve_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            matcher: MatcherConfig::default(),
            resolve: ResolveConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl Config {
    /// Loads the config file, falling back to defaults when it does not
    /// exist. A file that exists but fails to parse is an error, not a
    /// silent fallback.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.matcher.threshold) {
            anyhow::bail!(
                "matcher.threshold must be in [0, 1], got {}",
                self.matcher.threshold
            );
        }
        if self.resolve.timeout_secs == 0 {
            anyhow::bail!("resolve.timeout_secs must be greater than zero");
        }
        if let Some(consumet) = &self.sources.consumet {
            if consumet.enabled && consumet.base_url.is_empty() {
                anyhow::bail!("consumet is enabled but base_url is not configured");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("tsugi.toml")).unwrap();
        assert_eq!(config.languages, vec!["en"]);
        assert_eq!(config.matcher.threshold, 0.95);
        assert_eq!(config.resolve.timeout_secs, 30);
        assert!(config.sources.mangadex.is_none());
    }

    #[test]
    fn test_parses_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsugi.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
languages = ["en", "ja"]

[matcher]
threshold = 0.9

[resolve]
timeout_secs = 10

[sources.mangadex]
enabled = true

[sources.consumet]
enabled = true
base_url = "http://localhost:3000"
provider = "gogoanime"
"#
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.languages, vec!["en", "ja"]);
        assert_eq!(config.matcher.threshold, 0.9);
        assert_eq!(config.resolve.timeout(), Duration::from_secs(10));
        let mangadex = config.sources.mangadex.unwrap();
        assert!(mangadex.enabled);
        assert_eq!(mangadex.api_url, "https://api.mangadex.org");
        assert_eq!(mangadex.language, "en");
        let consumet = config.sources.consumet.unwrap();
        assert_eq!(consumet.provider, "gogoanime");
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsugi.toml");
        std::fs::write(&path, "[matcher]\nthreshold = 1.5\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_rejects_enabled_consumet_without_base_url() {
        let config = Config {
            sources: SourcesConfig {
                consumet: Some(ConsumetConfig {
                    enabled: true,
                    base_url: String::new(),
                    provider: default_consumet_provider(),
                    language: default_language(),
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsugi.toml");
        std::fs::write(&path, "languages = not-a-list").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
