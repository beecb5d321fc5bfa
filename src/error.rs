use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Status(u16),

    #[error("Unauthorized: check the configured API key")]
    Unauthorized,

    #[error("Rate limited by the catalog API")]
    RateLimit,

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::Status(status.as_u16()),
            None if err.is_decode() => ApiError::Parse(err.to_string()),
            None => ApiError::Network(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not determine the data directory")]
    NoHomeDir,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not determine config path")]
    NoConfigPath,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
