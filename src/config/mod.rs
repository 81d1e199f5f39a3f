//! Configuration system (layered: code > env > config file).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BrookError, Result};

const DEFAULT_MODEL: &str = "gpt-5";
const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;
const DEFAULT_IMAGE_BASE_URL: &str = "/images";

/// Runtime configuration for brook.
///
/// Resolution order: explicit setters, then environment variables, then the
/// TOML config file, then built-in defaults.
#[derive(Debug, Clone)]
pub struct BrookConfig {
    api_key: Option<String>,
    base_url: Option<String>,
    model: String,
    strict_policy: bool,
    max_tool_rounds: usize,
    image_dir: PathBuf,
    image_base_url: String,
}

impl Default for BrookConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// On-disk shape of `config.toml`; every key optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    strict_policy: Option<bool>,
    max_tool_rounds: Option<usize>,
    image_dir: Option<PathBuf>,
    image_base_url: Option<String>,
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "brook")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".brook"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" => Some(true),
        "0" | "false" | "FALSE" | "no" => Some(false),
        _ => None,
    }
}

impl BrookConfig {
    /// Built-in defaults, no credentials.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            strict_policy: false,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            image_dir: default_data_dir().join("images"),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
        }
    }

    /// Default config file location (`<config dir>/brook/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "brook")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Parse a TOML document on top of the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(raw)
            .map_err(|e| BrookError::Configuration(format!("invalid config: {e}")))?;
        let mut config = Self::new();
        config.apply_file(file);
        Ok(config)
    }

    /// Read a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Load from environment variables only (after reading `.env` if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // .env is optional
        let mut config = Self::new();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Config file (if it exists) overlaid with the environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::new(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if file.api_key.is_some() {
            self.api_key = file.api_key;
        }
        if file.base_url.is_some() {
            self.base_url = file.base_url;
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(strict) = file.strict_policy {
            self.strict_policy = strict;
        }
        if let Some(rounds) = file.max_tool_rounds {
            self.max_tool_rounds = rounds;
        }
        if let Some(dir) = file.image_dir {
            self.image_dir = dir;
        }
        if let Some(url) = file.image_base_url {
            self.image_base_url = url;
        }
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(model) = lookup("BROOK_MODEL") {
            self.model = model;
        }
        if let Some(strict) = lookup("BROOK_STRICT_POLICY").as_deref().and_then(parse_bool) {
            self.strict_policy = strict;
        }
        match lookup("BROOK_MAX_TOOL_ROUNDS").map(|v| v.parse::<usize>()) {
            Some(Ok(rounds)) => self.max_tool_rounds = rounds,
            Some(Err(e)) => tracing::warn!(error = %e, "ignoring invalid BROOK_MAX_TOOL_ROUNDS"),
            None => {}
        }
        if let Some(dir) = lookup("BROOK_IMAGE_DIR") {
            self.image_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("BROOK_IMAGE_BASE_URL") {
            self.image_base_url = url;
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_strict_policy(mut self, strict: bool) -> Self {
        self.strict_policy = strict;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = dir.into();
        self
    }

    pub fn with_image_base_url(mut self, url: impl Into<String>) -> Self {
        self.image_base_url = url.into();
        self
    }

    pub fn api_key(&self) -> Option<String> {
        self.api_key.clone()
    }

    pub fn base_url(&self) -> Option<String> {
        self.base_url.clone()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn strict_policy(&self) -> bool {
        self.strict_policy
    }

    pub fn max_tool_rounds(&self) -> usize {
        self.max_tool_rounds
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn image_base_url(&self) -> &str {
        &self.image_base_url
    }
}
