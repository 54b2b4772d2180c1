//! Route normalization configuration.

use serde::{Deserialize, Serialize};

/// A custom path segment matcher, e.g. `{ name: order_ref, pattern: "ord-{digits}" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamMatcherConfig {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutesConfig {
    /// Custom matchers, tried in declaration order before the built-in classifiers.
    #[serde(default)]
    pub param_matchers: Vec<ParamMatcherConfig>,

    /// Route templates the application is known to serve (`/users/:id`, `/static/*`).
    #[serde(default)]
    pub known_routes: Vec<String>,
}
