//! Route normalization.
//!
//! Concrete request paths are turned into route templates so that
//! `/users/123` and `/users/456` share one rate-limit bucket:
//!
//! | Segment | Becomes |
//! |---------|---------|
//! | custom matcher `order_ref: "ord-{digits}"` | `:order_ref` |
//! | `123` | `:number` |
//! | `2c1a...` (UUID) | `:uuid` |
//! | `01ARZ3NDEKTSV4RRFFQ69G5FAV` | `:ulid` |
//! | 24 hex characters | `:objectId` |
//! | `2024-01-31` | `:date` |
//! | `a@b.com` | `:email` |
//! | `10.0.0.1` | `:ip` |
//! | 32/40/64/128 hex characters | `:hash` |
//!
//! Known route templates registered by the application take precedence over
//! segment classification.

use std::net::IpAddr;
use std::sync::LazyLock;

use bastion_core::{ConfigError, RoutesConfig};
use parking_lot::RwLock;
use regex::Regex;

const MAX_PLACEHOLDERS: usize = 4;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[a-zA-Z_]+\}").expect("placeholder regex is valid"));
static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[1-8][0-9a-fA-F]{3}-[89abAB][0-9a-fA-F]{3}-[0-9a-fA-F]{12}|00000000-0000-0000-0000-000000000000|ffffffff-ffff-ffff-ffff-ffffffffffff)$",
    )
    .expect("uuid regex is valid")
});
static ULID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[0-9A-HJKMNP-TV-Z]{26}$").expect("ulid regex is valid"));
static OBJECT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("object id regex is valid"));
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{4}-\d{2}-\d{2}|\d{2}-\d{2}-\d{4})$").expect("date regex is valid")
});
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email regex is valid")
});

/// Regex fragment for each supported placeholder.
fn placeholder_regex(placeholder: &str) -> Option<&'static str> {
    match placeholder {
        "{digits}" => Some(r"\d+"),
        "{alpha}" => Some("[a-zA-Z]+"),
        "{alnum}" => Some("[a-zA-Z0-9]+"),
        "{hex}" => Some("[0-9a-fA-F]+"),
        _ => None,
    }
}

/// A compiled custom segment matcher.
#[derive(Debug, Clone)]
struct ParamMatcher {
    name: String,
    pattern: String,
    regex: Regex,
    /// Characters matched literally; ranks matchers accepting the same segment.
    literal_len: usize,
}

impl ParamMatcher {
    fn compile(name: &str, pattern: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidPattern {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
            return Err(invalid("name may only contain letters and underscores"));
        }
        if pattern.contains('/') {
            return Err(invalid("pattern should not contain slashes"));
        }

        let mut regex = String::from("^");
        let mut last_end = 0;
        let mut previous: Option<&str> = None;
        let mut count = 0;
        let mut literal_len = 0;
        for found in PLACEHOLDER.find_iter(pattern) {
            let placeholder = found.as_str();
            let Some(fragment) = placeholder_regex(placeholder) else {
                return Err(invalid(&format!("unknown placeholder {placeholder}")));
            };
            if found.start() == last_end && previous == Some(placeholder) {
                return Err(invalid(
                    "pattern should not contain consecutive similar placeholders",
                ));
            }
            count += 1;
            if count > MAX_PLACEHOLDERS {
                return Err(invalid("too many placeholders in pattern"));
            }

            literal_len += found.start() - last_end;
            regex.push_str(&regex::escape(&pattern[last_end..found.start()]));
            regex.push_str(fragment);
            last_end = found.end();
            previous = Some(placeholder);
        }
        if count == 0 {
            return Err(invalid("pattern should contain at least one placeholder"));
        }
        literal_len += pattern.len() - last_end;
        regex.push_str(&regex::escape(&pattern[last_end..]));
        regex.push('$');

        let regex = Regex::new(&regex).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            regex,
            literal_len,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplateSegment {
    Literal(String),
    Param,
    /// Trailing `*`: matches the rest of the path.
    Rest,
}

#[derive(Debug, Clone)]
struct KnownRoute {
    template: String,
    segments: Vec<TemplateSegment>,
}

impl KnownRoute {
    fn parse(template: &str) -> Result<Self, ConfigError> {
        if !template.starts_with('/') {
            return Err(ConfigError::Config(format!(
                "route template '{template}' must start with '/'"
            )));
        }
        let parts = path_segments(template);
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = if *part == "*" {
                if i + 1 != parts.len() {
                    return Err(ConfigError::Config(format!(
                        "route template '{template}' may only use '*' as its last segment"
                    )));
                }
                TemplateSegment::Rest
            } else if part.starts_with(':') && part.len() > 1 {
                TemplateSegment::Param
            } else {
                TemplateSegment::Literal((*part).to_string())
            };
            segments.push(segment);
        }
        Ok(Self {
            template: join_segments(&parts),
            segments,
        })
    }

    fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, TemplateSegment::Literal(_)))
            .count()
    }

    fn matches(&self, path: &[&str]) -> bool {
        let mut path = path.iter();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Rest => return true,
                TemplateSegment::Param => {
                    if path.next().is_none() {
                        return false;
                    }
                }
                TemplateSegment::Literal(literal) => {
                    if path.next() != Some(&literal.as_str()) {
                        return false;
                    }
                }
            }
        }
        path.next().is_none()
    }
}

/// Turns request paths into canonical route templates.
///
/// Registration and normalization may run concurrently: both tables sit
/// behind read-write locks, so `normalize` sees either the old or the new
/// table, never a partial update.
#[derive(Debug, Default)]
pub struct RouteMatcher {
    param_matchers: RwLock<Vec<ParamMatcher>>,
    known_routes: RwLock<Vec<KnownRoute>>,
}

impl RouteMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RoutesConfig) -> Result<Self, ConfigError> {
        let matcher = Self::new();
        for param in &config.param_matchers {
            matcher.register_pattern(&param.name, &param.pattern)?;
        }
        for route in &config.known_routes {
            matcher.register_route(route)?;
        }
        Ok(matcher)
    }

    /// Register a custom segment matcher.
    ///
    /// Returns `false` if the identical pair was already registered.
    /// Registering a different pattern under an existing name fails.
    pub fn register_pattern(&self, name: &str, pattern: &str) -> Result<bool, ConfigError> {
        let compiled = ParamMatcher::compile(name, pattern)?;

        let mut matchers = self.param_matchers.write();
        if let Some(existing) = matchers.iter().find(|m| m.name == name) {
            if existing.pattern == pattern {
                tracing::debug!(name, pattern, "Param matcher already registered");
                return Ok(false);
            }
            return Err(ConfigError::ConflictingPattern {
                name: name.to_string(),
                existing: existing.pattern.clone(),
                requested: pattern.to_string(),
            });
        }
        matchers.push(compiled);
        tracing::info!(name, pattern, "Registered param matcher");
        Ok(true)
    }

    /// Register a route template the application serves, e.g. `/users/:id`
    /// or `/static/*`.
    pub fn register_route(&self, template: &str) -> Result<bool, ConfigError> {
        let route = KnownRoute::parse(template)?;

        let mut routes = self.known_routes.write();
        if routes.iter().any(|r| r.template == route.template) {
            tracing::debug!(template = %route.template, "Route already registered");
            return Ok(false);
        }
        tracing::info!(template = %route.template, "Registered route");
        routes.push(route);
        Ok(true)
    }

    pub fn param_matcher_count(&self) -> usize {
        self.param_matchers.read().len()
    }

    pub fn known_route_count(&self) -> usize {
        self.known_routes.read().len()
    }

    /// Normalize a request path (or full URL) into its route template.
    pub fn normalize(&self, path: &str) -> String {
        let segments = path_segments(strip_url(path));
        if segments.is_empty() {
            return "/".to_string();
        }

        if let Some(template) = self.match_known_route(&segments) {
            return template;
        }

        let matchers = self.param_matchers.read();
        let replaced: Vec<String> = segments
            .iter()
            .map(|segment| classify_segment(segment, &matchers))
            .collect();
        format!("/{}", replaced.join("/"))
    }

    fn match_known_route(&self, segments: &[&str]) -> Option<String> {
        let routes = self.known_routes.read();
        let mut best: Option<&KnownRoute> = None;
        for route in routes.iter().filter(|r| r.matches(segments)) {
            // Strictly greater keeps the earliest declaration on ties
            if best.is_none_or(|b| route.literal_count() > b.literal_count()) {
                best = Some(route);
            }
        }
        best.map(|route| route.template.clone())
    }
}

/// Drop query string and fragment, then scheme and host. A URL inside the
/// query string never replaces the path.
fn strip_url(raw: &str) -> &str {
    let path = raw.split(['?', '#']).next().unwrap_or_default();
    if path.starts_with('/') {
        return path;
    }
    match path.find("://") {
        Some(index) => {
            let rest = &path[index + 3..];
            rest.find('/').map_or("/", |slash| &rest[slash..])
        }
        None => path,
    }
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn join_segments(segments: &[&str]) -> String {
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

fn classify_segment(segment: &str, matchers: &[ParamMatcher]) -> String {
    let mut best: Option<&ParamMatcher> = None;
    for matcher in matchers.iter().filter(|m| m.regex.is_match(segment)) {
        if best.is_none_or(|b| matcher.literal_len > b.literal_len) {
            best = Some(matcher);
        }
    }
    if let Some(matcher) = best {
        return format!(":{}", matcher.name);
    }

    let len = segment.len();
    let class = if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        Some("number")
    } else if len == 36 && UUID.is_match(segment) {
        Some("uuid")
    } else if len == 26 && ULID.is_match(segment) {
        Some("ulid")
    } else if len == 24 && OBJECT_ID.is_match(segment) {
        Some("objectId")
    } else if DATE.is_match(segment) {
        Some("date")
    } else if EMAIL.is_match(segment) {
        Some("email")
    } else if segment.parse::<IpAddr>().is_ok() {
        Some("ip")
    } else if matches!(len, 32 | 40 | 64 | 128) && segment.bytes().all(|b| b.is_ascii_hexdigit()) {
        Some("hash")
    } else {
        None
    };

    match class {
        Some(class) => format!(":{class}"),
        None => segment.to_string(),
    }
}
