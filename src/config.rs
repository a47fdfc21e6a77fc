use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

pub const DEFAULT_BASE_URL: &str = "https://v2.api.noroff.dev";
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote auction API.
    pub base_url: String,
    /// Static API key, used as-is when present.
    pub api_key: Option<String>,
    /// Environment variable to read the API key from.
    pub api_key_env: Option<String>,
    /// Default page size for listing feeds.
    pub page_size: u32,
    /// Override for the session/state directory (default `~/.gavel`).
    pub state_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_env: Some("GAVEL_API_KEY".to_string()),
            page_size: DEFAULT_PAGE_SIZE,
            state_dir: None,
        }
    }
}

/// On-disk config shape; every field optional so partial files merge cleanly.
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    api_key_env: Option<String>,
    #[serde(default)]
    page_size: Option<u32>,
    #[serde(default)]
    state_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default paths.
    /// Priority: project (.gavel/config.toml) > user (~/.gavel/config.toml) > built-in defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".gavel").join("config.toml");
            if user_config.exists() {
                config.apply(read_config_file(&user_config)?);
            }
        }

        let project_config = Path::new(".gavel").join("config.toml");
        if project_config.exists() {
            config.apply(read_config_file(&project_config)?);
        }

        Ok(config)
    }

    /// Load configuration from a specific path, on top of built-in defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.apply(read_config_file(path)?);
        Ok(config)
    }

    /// Merge a config file into this one (the file takes priority).
    fn apply(&mut self, file: ConfigFile) {
        if let Some(base_url) = file.base_url {
            self.base_url = base_url;
        }
        if file.api_key.is_some() {
            self.api_key = file.api_key;
        }
        if file.api_key_env.is_some() {
            self.api_key_env = file.api_key_env;
        }
        if let Some(page_size) = file.page_size {
            self.page_size = page_size;
        }
        if file.state_dir.is_some() {
            self.state_dir = file.state_dir;
        }
    }

    /// Resolve the configured API key from config or environment, if any.
    /// An absent key is not an error: login provisions one from the API.
    pub fn resolve_api_key(&self) -> Option<String> {
        // Direct key takes priority
        if let Some(key) = &self.api_key {
            return Some(key.clone());
        }
        if let Some(env_var) = &self.api_key_env {
            if let Ok(key) = std::env::var(env_var) {
                if !key.is_empty() {
                    return Some(key);
                }
            }
        }
        None
    }

    /// The directory holding the session file and transcripts.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        match dirs::home_dir() {
            Some(home) => home.join(".gavel"),
            None => PathBuf::from(".gavel"),
        }
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            errors.push(ValidationError {
                field: "base_url".to_string(),
                message: format!("Expected an http(s) URL, got '{}'", self.base_url),
            });
        }

        if self.page_size == 0 {
            errors.push(ValidationError {
                field: "page_size".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let file: ConfigFile = toml::from_str(&content)?;
    Ok(file)
}
