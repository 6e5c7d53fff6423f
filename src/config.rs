//! TOML configuration.
//!
//! Everything has a serde default, so an absent or partial file still
//! yields a runnable (if degraded) configuration: no store URL means the
//! pipeline goes straight to the LLM tier, no LLM key means the fixed
//! "not configured" answer. Credentials never live in the file; they are
//! read from the environment (`STORE_SERVICE_KEY` / `STORE_ANON_KEY`,
//! `GEMINI_API_KEY`, `OPENAI_API_KEY`). `CAMPUS_STORE_URL` overrides
//! `[store] url`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ask: AskConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Base URL of the record store. Unset disables the store tier.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_store_timeout_secs(),
        }
    }
}

fn default_store_timeout_secs() -> u64 {
    6
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Provider endpoint override. Unset uses the built-in Gemini URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_media_timeout_secs")]
    pub media_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: default_llm_model(),
            image_model: default_image_model(),
            tts_model: default_tts_model(),
            timeout_secs: default_llm_timeout_secs(),
            media_timeout_secs: default_media_timeout_secs(),
        }
    }
}

fn default_llm_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_image_model() -> String {
    "gemini-2.0-flash-preview-image-generation".to_string()
}
fn default_tts_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    20
}
fn default_media_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8090".to_string()
}
fn default_max_image_bytes() -> usize {
    12 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct AskConfig {
    /// Name the assistant uses for itself in the LLM persona preamble.
    #[serde(default = "default_institution")]
    pub institution: String,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    #[serde(default = "default_confident_min")]
    pub confident_min: u32,
    #[serde(default = "default_role_min")]
    pub role_min: u32,
    #[serde(default = "default_safety_ratio")]
    pub safety_ratio: f32,
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    /// Extra alias entries merged after the built-in table:
    /// `[["surface", "canonical phrase"], ...]`.
    #[serde(default)]
    pub extra_aliases: Vec<(String, String)>,
    #[serde(default)]
    pub weights: ScoreWeights,
}

impl Default for AskConfig {
    fn default() -> Self {
        Self {
            institution: default_institution(),
            fetch_limit: default_fetch_limit(),
            confident_min: default_confident_min(),
            role_min: default_role_min(),
            safety_ratio: default_safety_ratio(),
            suggestion_limit: default_suggestion_limit(),
            extra_aliases: Vec::new(),
            weights: ScoreWeights::default(),
        }
    }
}

fn default_institution() -> String {
    "the college".to_string()
}
fn default_fetch_limit() -> usize {
    200
}
fn default_confident_min() -> u32 {
    5
}
fn default_role_min() -> u32 {
    2
}
fn default_safety_ratio() -> f32 {
    1.15
}
fn default_suggestion_limit() -> usize {
    3
}

/// Per-signal scoring weights. Relative ordering matters more than the
/// absolute values; see the scorer for how they combine.
#[derive(Debug, Deserialize, Clone)]
pub struct ScoreWeights {
    #[serde(default = "default_name_exact")]
    pub name_exact: u32,
    #[serde(default = "default_name_partial")]
    pub name_partial: u32,
    #[serde(default = "default_name_fuzzy")]
    pub name_fuzzy: u32,
    #[serde(default = "default_department")]
    pub department: u32,
    #[serde(default = "default_course")]
    pub course: u32,
    #[serde(default = "default_designation")]
    pub designation: u32,
    #[serde(default = "default_notes")]
    pub notes: u32,
    #[serde(default = "default_contact")]
    pub contact: u32,
    #[serde(default = "default_coverage_high_bonus")]
    pub coverage_high_bonus: u32,
    #[serde(default = "default_coverage_low_bonus")]
    pub coverage_low_bonus: u32,
    #[serde(default = "default_dept_boost")]
    pub dept_boost: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            name_exact: default_name_exact(),
            name_partial: default_name_partial(),
            name_fuzzy: default_name_fuzzy(),
            department: default_department(),
            course: default_course(),
            designation: default_designation(),
            notes: default_notes(),
            contact: default_contact(),
            coverage_high_bonus: default_coverage_high_bonus(),
            coverage_low_bonus: default_coverage_low_bonus(),
            dept_boost: default_dept_boost(),
        }
    }
}

fn default_name_exact() -> u32 {
    7
}
fn default_name_partial() -> u32 {
    4
}
fn default_name_fuzzy() -> u32 {
    4
}
fn default_department() -> u32 {
    2
}
fn default_course() -> u32 {
    4
}
fn default_designation() -> u32 {
    8
}
fn default_notes() -> u32 {
    2
}
fn default_contact() -> u32 {
    1
}
fn default_coverage_high_bonus() -> u32 {
    2
}
fn default_coverage_low_bonus() -> u32 {
    1
}
fn default_dept_boost() -> u32 {
    8
}

/// Load configuration from a TOML file. A missing file yields the
/// defaults; a present but invalid file is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str::<Config>(&content).with_context(|| "Failed to parse config file")?
    } else {
        Config::default()
    };

    if let Ok(url) = std::env::var("CAMPUS_STORE_URL") {
        if !url.trim().is_empty() {
            config.store.url = Some(url);
        }
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.ask.safety_ratio < 1.0 {
        anyhow::bail!("ask.safety_ratio must be >= 1.0");
    }
    if config.ask.confident_min == 0 {
        anyhow::bail!("ask.confident_min must be > 0");
    }
    if config.ask.suggestion_limit == 0 {
        anyhow::bail!("ask.suggestion_limit must be >= 1");
    }
    if config.ask.fetch_limit == 0 {
        anyhow::bail!("ask.fetch_limit must be >= 1");
    }
    if config.server.max_image_bytes == 0 {
        anyhow::bail!("server.max_image_bytes must be > 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.store.url.is_none());
        assert_eq!(config.server.bind, "127.0.0.1:8090");
        assert_eq!(config.ask.confident_min, 5);
        assert_eq!(config.ask.weights.name_exact, 7);
        assert_eq!(config.server.max_image_bytes, 12 * 1024 * 1024);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [store]
            url = "https://records.example.edu"

            [ask]
            confident_min = 6
            extra_aliases = [["rvs", "dr r v subramanian"]]

            [ask.weights]
            course = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.store.url.as_deref(), Some("https://records.example.edu"));
        assert_eq!(config.ask.confident_min, 6);
        assert_eq!(config.ask.weights.course, 5);
        assert_eq!(config.ask.weights.name_exact, 7);
        assert_eq!(config.ask.extra_aliases.len(), 1);
        assert_eq!(config.ask.role_min, 2);
    }

    #[test]
    fn test_validation_rejects_bad_ratio() {
        let config: Config = toml::from_str("[ask]\nsafety_ratio = 0.9").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let config: Config = toml::from_str("[ask]\nfetch_limit = 0").unwrap();
        assert!(validate(&config).is_err());
        let config: Config = toml::from_str("[server]\nmax_image_bytes = 0").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_file_is_defaults() {
        let config = load_config(Path::new("/nonexistent/desk.toml")).unwrap();
        assert!(config.store.url.is_none());
    }
}
