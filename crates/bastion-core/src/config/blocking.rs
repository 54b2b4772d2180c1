//! Allow and block lists.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// A user-agent pattern (case-insensitive regex) and the reason it is blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedUserAgent {
    pub pattern: String,
    #[serde(default = "default_description")]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockingConfig {
    /// IPs that skip rate limiting and user-agent checks.
    #[serde(default)]
    pub bypassed_ips: Vec<String>,

    #[serde(default)]
    pub blocked_user_ids: Vec<String>,

    #[serde(default)]
    pub blocked_user_agents: Vec<BlockedUserAgent>,
}

impl BlockingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(entry) = self
            .blocked_user_agents
            .iter()
            .find(|entry| entry.pattern.trim().is_empty())
        {
            return Err(ConfigError::Config(format!(
                "blocked user agent '{}' has an empty pattern",
                entry.description
            )));
        }
        Ok(())
    }
}

fn default_description() -> String {
    "blocked user agent".to_string()
}
