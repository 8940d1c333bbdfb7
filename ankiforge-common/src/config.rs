//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration lives in a single TOML file. Every field has a
//! built-in default so a missing file never prevents startup.
//!
//! # Resolution priority
//!
//! Config file path:
//! 1. Command-line argument (`--config`)
//! 2. Environment variable `ANKIFORGE_CONFIG`
//! 3. OS-dependent compiled default (`~/.config/ankiforge/config.toml` on Linux)
//!
//! Root folder:
//! 1. Command-line argument (`--root-folder`)
//! 2. Environment variable `ANKIFORGE_ROOT_FOLDER`
//! 3. TOML `root_folder`
//! 4. OS-dependent compiled default
//!
//! Anthropic API key:
//! 1. Environment variable `ANTHROPIC_API_KEY`
//! 2. TOML `anthropic_api_key`

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the config file path
pub const CONFIG_PATH_ENV: &str = "ANKIFORGE_CONFIG";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "ANKIFORGE_ROOT_FOLDER";

/// Environment variable holding the Anthropic API key
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const APP_DIR_NAME: &str = "ankiforge";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Root folder holding `config/` and `data/` (optional)
    pub root_folder: Option<PathBuf>,

    /// Anthropic API key (environment variable takes precedence)
    pub anthropic_api_key: Option<String>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// AnkiConnect settings
    pub anki: AnkiConfig,

    /// Language-model settings
    pub llm: LlmConfig,

    /// Image generation settings
    pub image: ImageConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// AnkiConnect settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnkiConfig {
    /// AnkiConnect endpoint
    pub url: String,
    /// Note type used for both cards
    pub card_model: String,
    /// Target deck, created when missing
    pub deck_name: String,
    /// Tags attached to every created note
    pub default_tags: Vec<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for AnkiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8765".to_string(),
            card_model: "Básico".to_string(),
            deck_name: "English Vocabulary".to_string(),
            default_tags: vec!["vocabulary".to_string(), "english".to_string()],
            timeout_secs: 10,
        }
    }
}

/// Language-model settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Messages API base URL (without `/v1/messages`)
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Extra attempts after a transient failure (429, 5xx, network)
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 2000,
            max_retries: 2,
            timeout_secs: 120,
        }
    }
}

/// Image generation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Prompt endpoint; the encoded prompt is appended as a path segment
    pub base_url: String,
    pub quality: ImageQuality,
    /// Total attempts per image
    pub max_retries: u32,
    /// Pause between failed attempts
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://image.pollinations.ai/prompt".to_string(),
            quality: ImageQuality::High,
            max_retries: 3,
            retry_delay_ms: 2000,
            timeout_secs: 30,
        }
    }
}

/// Requested image size
///
/// Unrecognized values fall back to `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ImageQuality {
    High,
    Medium,
    Low,
}

impl ImageQuality {
    /// Edge length in pixels (images are square)
    pub fn dimension(&self) -> u32 {
        match self {
            ImageQuality::High => 1024,
            ImageQuality::Medium => 768,
            ImageQuality::Low => 512,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQuality::High => "high",
            ImageQuality::Medium => "medium",
            ImageQuality::Low => "low",
        }
    }
}

impl From<String> for ImageQuality {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "high" => ImageQuality::High,
            "medium" => ImageQuality::Medium,
            _ => ImageQuality::Low,
        }
    }
}

impl From<ImageQuality> for String {
    fn from(value: ImageQuality) -> Self {
        value.as_str().to_string()
    }
}

impl TomlConfig {
    /// Load configuration from a TOML file
    ///
    /// A missing file is not an error: a warning is logged and built-in
    /// defaults are used. A file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file not found at {}, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config: TomlConfig = toml::from_str(&content)?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }
}

/// Platform defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub config_file: PathBuf,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        // ~/.local/share/ankiforge, ~/Library/Application Support/ankiforge, %LOCALAPPDATA%\ankiforge
        let root_folder = dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("./ankiforge_data"));

        let config_file = dirs::config_dir()
            .map(|d| d.join(APP_DIR_NAME).join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./ankiforge.toml"));

        Self {
            root_folder,
            config_file,
        }
    }
}

/// Resolve the config file path (CLI → ENV → compiled default)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Some(path) = non_empty_env(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }

    CompiledDefaults::for_current_platform().config_file
}

/// Root folder resolution (CLI → ENV → TOML → compiled default)
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, toml_root: Option<PathBuf>) -> Self {
        Self { cli_arg, toml_root }
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Some(path) = non_empty_env(ROOT_FOLDER_ENV) {
            return PathBuf::from(path);
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_root {
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Resolve the Anthropic API key (ENV → TOML)
pub fn resolve_anthropic_api_key(toml_config: &TomlConfig) -> Result<String> {
    let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .anthropic_api_key
        .as_ref()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Anthropic API key found in both environment and TOML. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("Anthropic API key loaded from environment variable");
        return Ok(key.trim().to_string());
    }

    if let Some(key) = toml_key {
        info!("Anthropic API key loaded from TOML config");
        return Ok(key.trim().to_string());
    }

    Err(Error::Config(format!(
        "Anthropic API key not configured. Please configure using one of:\n\
         1. Environment: {}=your-key-here\n\
         2. TOML config: anthropic_api_key = \"your-key\"",
        API_KEY_ENV
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Files and directories under the root folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Prompt sent to the language model, one word appended per request
    pub fn prompt_template_path(&self) -> PathBuf {
        self.config_dir().join("prompt_template.txt")
    }

    /// Work queue: pending words, one per line
    pub fn words_path(&self) -> PathBuf {
        self.data_dir().join("words.txt")
    }

    /// Processed-word cache
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir().join("processed.json")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir().join("images")
    }

    /// Create `config/`, `data/` and `data/images/` if missing
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [self.config_dir(), self.data_dir(), self.images_dir()] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir).map_err(|e| {
                    Error::Config(format!("Failed to create {}: {}", dir.display(), e))
                })?;
                info!("Created directory: {}", dir.display());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.anki.url, "http://localhost:8765");
        assert_eq!(config.anki.timeout_secs, 10);
        assert_eq!(config.llm.max_tokens, 2000);
        assert_eq!(config.image.max_retries, 3);
        assert_eq!(config.image.retry_delay_ms, 2000);
        assert_eq!(config.image.quality, ImageQuality::High);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            anthropic_api_key = "sk-test"

            [anki]
            deck_name = "Words"

            [image]
            quality = "medium"
            "#,
        )
        .unwrap();

        assert_eq!(config.anthropic_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.anki.deck_name, "Words");
        assert_eq!(config.anki.card_model, "Básico");
        assert_eq!(config.image.quality, ImageQuality::Medium);
        assert_eq!(config.image.max_retries, 3);
        assert_eq!(config.llm.model, "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn test_unknown_quality_falls_back_to_low() {
        let config: TomlConfig = toml::from_str("[image]\nquality = \"ultra\"\n").unwrap();
        assert_eq!(config.image.quality, ImageQuality::Low);
        assert_eq!(config.image.quality.dimension(), 512);
    }

    #[test]
    fn test_quality_dimensions() {
        assert_eq!(ImageQuality::High.dimension(), 1024);
        assert_eq!(ImageQuality::Medium.dimension(), 768);
        assert_eq!(ImageQuality::Low.dimension(), 512);
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("sk-ant-123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   \t"));
    }

    #[test]
    fn test_data_layout_paths() {
        let layout = DataLayout::new("/srv/anki");
        assert_eq!(layout.words_path(), PathBuf::from("/srv/anki/data/words.txt"));
        assert_eq!(layout.cache_path(), PathBuf::from("/srv/anki/data/processed.json"));
        assert_eq!(layout.images_dir(), PathBuf::from("/srv/anki/data/images"));
        assert_eq!(
            layout.prompt_template_path(),
            PathBuf::from("/srv/anki/config/prompt_template.txt")
        );
    }
}
