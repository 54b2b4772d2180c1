//! Rate limiting configuration.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// One fixed window: at most `max_requests` per `window_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateLimitTier {
    pub window_ms: u64,
    pub max_requests: u64,
}

impl RateLimitTier {
    pub fn new(window_ms: u64, max_requests: u64) -> Self {
        Self {
            window_ms,
            max_requests,
        }
    }

    pub fn per_minute(max_requests: u64) -> Self {
        Self::new(60_000, max_requests)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_ms == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "window_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_requests == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "max_requests must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tiers that only apply to one method and route template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRateLimit {
    /// HTTP method, or `*` for any.
    #[serde(default = "default_method")]
    pub method: String,

    /// Route template as produced by route normalization. `*` matches any
    /// run of characters, e.g. `/api/*/auth/*`.
    pub route: String,

    pub tiers: Vec<RateLimitTier>,
}

impl EndpointRateLimit {
    /// Whether the route contains `*` wildcards.
    pub fn is_wildcard(&self) -> bool {
        self.route.contains('*')
    }

    /// Compile the route into an anchored regex: literal text is escaped and
    /// every `*` matches any run of characters.
    pub fn route_regex(&self) -> Result<Regex, ConfigError> {
        let pattern = self
            .route
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        Regex::new(&format!("^{pattern}$")).map_err(|e| {
            ConfigError::InvalidRateLimit(format!("endpoint route '{}': {e}", self.route))
        })
    }

    /// The lowest allowed rate among the tiers, as `(max_requests, window_ms)`.
    pub fn most_restrictive_tier(&self) -> Option<RateLimitTier> {
        self.tiers.iter().copied().reduce(|best, tier| {
            if allows_fewer(tier, best) { tier } else { best }
        })
    }

    /// Whether this endpoint takes precedence over `other` when both match a
    /// request. Exact routes beat wildcard routes. Among exact routes an
    /// explicit method beats `*`; among wildcard routes the lowest rate wins.
    pub fn takes_precedence_over(&self, other: &EndpointRateLimit) -> bool {
        match (self.is_wildcard(), other.is_wildcard()) {
            (false, true) => true,
            (true, false) => false,
            (false, false) => self.method != "*" && other.method == "*",
            (true, true) => match (self.most_restrictive_tier(), other.most_restrictive_tier()) {
                (Some(mine), Some(theirs)) => allows_fewer(mine, theirs),
                (Some(_), None) => true,
                _ => false,
            },
        }
    }
}

/// `a` allows strictly fewer requests per millisecond than `b`.
fn allows_fewer(a: RateLimitTier, b: RateLimitTier) -> bool {
    u128::from(a.max_requests) * u128::from(b.window_ms)
        < u128::from(b.max_requests) * u128::from(a.window_ms)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Tiers applied to every request.
    #[serde(default)]
    pub tiers: Vec<RateLimitTier>,

    #[serde(default)]
    pub endpoints: Vec<EndpointRateLimit>,
}

impl RateLimitingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for tier in &self.tiers {
            tier.validate()?;
        }
        for endpoint in &self.endpoints {
            if !endpoint.route.starts_with('/') {
                return Err(ConfigError::InvalidRateLimit(format!(
                    "endpoint route '{}' must start with '/'",
                    endpoint.route
                )));
            }
            if endpoint.tiers.is_empty() {
                return Err(ConfigError::InvalidRateLimit(format!(
                    "endpoint {} {} has no tiers",
                    endpoint.method, endpoint.route
                )));
            }
            for tier in &endpoint.tiers {
                tier.validate()?;
            }
            endpoint.route_regex()?;
        }
        Ok(())
    }
}

fn default_method() -> String {
    "*".to_string()
}
