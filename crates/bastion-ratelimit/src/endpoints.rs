//! Route-scoped rate limits.

use bastion_core::{ConfigError, EndpointRateLimit};
use regex::Regex;

#[derive(Debug, Clone)]
struct CompiledEndpoint {
    limit: EndpointRateLimit,
    route: Regex,
}

impl CompiledEndpoint {
    fn matches(&self, method: &str, route: &str) -> bool {
        (self.limit.method == "*" || self.limit.method.eq_ignore_ascii_case(method))
            && self.route.is_match(route)
    }
}

/// Endpoint limits with their routes compiled, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct EndpointTable {
    endpoints: Vec<CompiledEndpoint>,
}

impl EndpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(limits: &[EndpointRateLimit]) -> Result<Self, ConfigError> {
        let mut endpoints = Vec::with_capacity(limits.len());
        for limit in limits {
            endpoints.push(CompiledEndpoint {
                route: limit.route_regex()?,
                limit: limit.clone(),
            });
        }
        Ok(Self { endpoints })
    }

    /// The endpoint whose limits apply to a request.
    ///
    /// An exact route match wins over wildcard matches; among wildcard
    /// matches the most restrictive one applies. Ties go to the endpoint
    /// declared first.
    pub fn find(&self, method: &str, route: &str) -> Option<&EndpointRateLimit> {
        let mut best: Option<&EndpointRateLimit> = None;
        for endpoint in self.endpoints.iter().filter(|e| e.matches(method, route)) {
            if best.is_none_or(|b| endpoint.limit.takes_precedence_over(b)) {
                best = Some(&endpoint.limit);
            }
        }
        best
    }

    pub fn limits(&self) -> impl Iterator<Item = &EndpointRateLimit> {
        self.endpoints.iter().map(|e| &e.limit)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
