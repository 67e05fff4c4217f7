//! Error types shared across jobfeed crates

use thiserror::Error;

/// Result type alias for jobfeed operations
pub type Result<T> = std::result::Result<T, JobfeedError>;

/// Workspace-level error for configuration and file handling
#[derive(Error, Debug)]
pub enum JobfeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidSetting { key: String, value: String },
}

impl JobfeedError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an error for an environment variable or flag that failed to parse
    pub fn invalid_setting(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_setting_message() {
        let err = JobfeedError::invalid_setting("JOBFEED_COUNT", "lots");
        assert_eq!(err.to_string(), "Invalid value for JOBFEED_COUNT: 'lots'");
    }
}
