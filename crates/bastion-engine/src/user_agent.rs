//! User-agent blocklist.

use bastion_core::{BlockedUserAgent, ConfigError};
use regex::{Regex, RegexBuilder};

/// Decides whether a user agent is blocked.
///
/// Returns the reason for the block, or `None` to let the request through.
pub trait UserAgentBlocklist: Send + Sync {
    fn is_user_agent_blocked(&self, user_agent: &str) -> Option<String>;
}

impl<F> UserAgentBlocklist for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn is_user_agent_blocked(&self, user_agent: &str) -> Option<String> {
        self(user_agent)
    }
}

/// Case-insensitive regex patterns, first match wins.
#[derive(Debug, Clone, Default)]
pub struct PatternUserAgentBlocklist {
    entries: Vec<(Regex, String)>,
}

impl PatternUserAgentBlocklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(entries: &[BlockedUserAgent]) -> Result<Self, ConfigError> {
        let mut blocklist = Self::new();
        for entry in entries {
            blocklist.add(&entry.pattern, entry.description.clone())?;
        }
        Ok(blocklist)
    }

    pub fn add(&mut self, pattern: &str, description: impl Into<String>) -> Result<(), ConfigError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                ConfigError::Config(format!("invalid user agent pattern '{pattern}': {e}"))
            })?;
        self.entries.push((regex, description.into()));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl UserAgentBlocklist for PatternUserAgentBlocklist {
    fn is_user_agent_blocked(&self, user_agent: &str) -> Option<String> {
        if user_agent.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(regex, _)| regex.is_match(user_agent))
            .map(|(_, description)| description.clone())
    }
}
