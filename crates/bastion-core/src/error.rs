//! Configuration errors.

/// Error raised by configuration loading and by the configuration API
/// (pattern registration, policy declaration, tier validation).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Param matcher '{name}' is already registered with pattern '{existing}', cannot register '{requested}'"
    )]
    ConflictingPattern {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("Invalid param matcher '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("Invalid IDOR policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid rate limit: {0}")]
    InvalidRateLimit(String),
}
