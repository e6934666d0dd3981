use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("I/O error while {0}: {1}")]
    IO(String, #[source] std::io::Error), // For general I/O errors not covered by specific types
    #[error("Application error: {0}")]
    Generic(String), // For simple string-based errors
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Configuration value '{0}' is invalid: {1}")]
    InvalidValue(String, String),
}

/// Failures talking to the remote repository host.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GitHub responded with error {status} for {url}: {body}")]
    ApiResponseError {
        status: reqwest::StatusCode,
        url: String,
        body: String,
    },
    #[error("Failed to parse GitHub response from {url}: {source}")]
    ResponseParseFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Failed to build HTTP client: {0}")]
    ClientSetup(#[source] reqwest::Error),
    #[error("Invalid API endpoint '{0}'")]
    InvalidEndpoint(String),
}

/// Everything that can end an analysis run without publishing a result.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Internal analyzer error: {0}")]
    Internal(String),
    #[error("Analysis cancelled.")]
    Cancelled,
    #[error("Analysis superseded by a newer run.")]
    Superseded,
}

impl PipelineError {
    /// Runs that stopped because the caller asked them to, as opposed to failures.
    pub fn is_interruption(&self) -> bool {
        matches!(self, PipelineError::Cancelled | PipelineError::Superseded)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IO("I/O operation failed".to_string(), err)
    }
}
