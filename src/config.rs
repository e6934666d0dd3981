use crate::errors::ConfigError;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

const USER_CONFIG_DIR: &str = ".config/repolens";
const USER_CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_PATH_ENV: &str = "REPOLENS_CONFIG";
const TOKEN_ENV: &str = "GH_ACCESS_TOKEN";
const TOKEN_PLACEHOLDER: &str = "YOUR_GITHUB_TOKEN_IF_NEEDED";

// GitHub access configuration
#[derive(Deserialize, Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
    format!("repolens/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

// Analysis configuration
#[derive(Deserialize, Debug, Clone)]
pub struct AnalysisConfig {
    /// Only files ending with this suffix are fetched and analyzed
    pub extension: String,

    /// Complexity strictly above this is rendered as medium
    pub complexity_warn: usize,

    /// Complexity strictly above this is rendered as high
    pub complexity_high: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            complexity_warn: 5,
            complexity_high: 10,
        }
    }
}

fn default_extension() -> String {
    ".java".to_string()
}

#[derive(Deserialize, Debug, Default, Clone)]
struct PartialGitHubConfig {
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    user_agent: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
struct PartialAnalysisConfig {
    #[serde(default)]
    extension: Option<String>,
    #[serde(default)]
    complexity_warn: Option<usize>,
    #[serde(default)]
    complexity_high: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialAppConfig {
    github: Option<PartialGitHubConfig>,
    analysis: Option<PartialAnalysisConfig>,
}

// Application-wide configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub github: GitHubConfig,
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    /// Loads the user configuration.
    ///
    /// The path is `explicit_path`, else `$REPOLENS_CONFIG`, else
    /// `~/.config/repolens/config.toml`. A missing file yields defaults.
    /// `GH_ACCESS_TOKEN` overrides the configured token.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit_path {
            Some(path) => path.to_path_buf(),
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(path) => PathBuf::from(path),
                Err(_) => Self::user_config_path(),
            },
        };

        let mut config = if path.exists() {
            info!("Loading configuration from {:?}", path);
            Self::load_from_file(&path)?
        } else {
            info!("No configuration at {:?}, using defaults", path);
            Self::default()
        };

        if let Ok(token) = std::env::var(TOKEN_ENV) {
            config.github.token = normalize_token(Some(token));
        }
        Ok(config)
    }

    /// Replaces the token, e.g. with one given on the command line.
    pub fn override_token(&mut self, token: &str) {
        self.github.token = normalize_token(Some(token.to_string()));
    }

    fn user_config_path() -> PathBuf {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(dirs::home_dir)
            .unwrap_or_default();
        home.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE_NAME)
    }

    pub fn load_from_file(config_path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(config_path)
            .map_err(|e| ConfigError::FileRead(config_path.to_string_lossy().to_string(), e))?;
        Self::from_toml_str(&content)
            .map_err(|e| match e {
                FromStrError::Toml(e) => {
                    ConfigError::TomlParse(config_path.to_string_lossy().to_string(), e)
                }
                FromStrError::Config(e) => e,
            })
    }

    fn from_toml_str(content: &str) -> Result<Self, FromStrError> {
        let partial: PartialAppConfig = toml::from_str(content).map_err(FromStrError::Toml)?;

        let partial_github = partial.github.unwrap_or_default();
        let github = GitHubConfig {
            api_url: partial_github
                .api_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(default_api_url),
            user_agent: partial_github.user_agent.unwrap_or_else(default_user_agent),
            timeout_secs: partial_github.timeout_secs.unwrap_or_else(default_timeout_secs),
            token: normalize_token(partial_github.token),
        };

        let defaults = AnalysisConfig::default();
        let partial_analysis = partial.analysis.unwrap_or_default();
        let analysis = AnalysisConfig {
            extension: partial_analysis.extension.unwrap_or(defaults.extension),
            complexity_warn: partial_analysis
                .complexity_warn
                .unwrap_or(defaults.complexity_warn),
            complexity_high: partial_analysis
                .complexity_high
                .unwrap_or(defaults.complexity_high),
        };

        let config = Self { github, analysis };
        config.validate().map_err(FromStrError::Config)?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.github.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "github.timeout_secs".to_string(),
                "must be positive".to_string(),
            ));
        }
        if !self.analysis.extension.starts_with('.') || self.analysis.extension.len() < 2 {
            return Err(ConfigError::InvalidValue(
                "analysis.extension".to_string(),
                "must start with '.'".to_string(),
            ));
        }
        if self.analysis.complexity_warn > self.analysis.complexity_high {
            return Err(ConfigError::InvalidValue(
                "analysis.complexity_warn".to_string(),
                "must not exceed analysis.complexity_high".to_string(),
            ));
        }
        Ok(())
    }
}

enum FromStrError {
    Toml(toml::de::Error),
    Config(ConfigError),
}

// Placeholder or empty tokens count as no token
fn normalize_token(token: Option<String>) -> Option<String> {
    token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && t != TOKEN_PLACEHOLDER)
}
