//! Policy orchestration.
//!
//! The engine has two entry points:
//!
//! - [`PolicyEngine::decide_for_request`], once per request: blocked users,
//!   rate limits, then the user-agent blocklist.
//! - [`PolicyEngine::decide_for_statement`] / [`PolicyEngine::decide_for_sql`],
//!   once per outgoing statement: tenant isolation.
//!
//! Both return a [`Decision`]. Only the configuration API returns errors.

use std::collections::HashSet;
use std::sync::Arc;

use bastion_core::{
    BastionConfig, ConfigError, Decision, DecisionMetadata, EndpointRateLimit, RateLimitTier,
    RequestContext, SqlDialectKind, Trigger,
};
use bastion_idor::{
    BoundParameters, IdorPolicy, IdorPolicyStore, StatementModel, TenantIsolationAnalyzer,
};
use bastion_ratelimit::{EndpointTable, RateLimiter, RouteMatcher, now_ms};

use crate::user_agent::{PatternUserAgentBlocklist, UserAgentBlocklist};

/// Renders block/allow decisions for requests and SQL statements.
///
/// Shared by all requests; every method takes `&self`.
pub struct PolicyEngine {
    routes: RouteMatcher,
    limiter: RateLimiter,
    tiers: Vec<RateLimitTier>,
    endpoints: EndpointTable,
    bypassed_ips: HashSet<String>,
    blocked_user_ids: HashSet<String>,
    user_agents: Box<dyn UserAgentBlocklist>,
    analyzer: TenantIsolationAnalyzer,
    policies: IdorPolicyStore,
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("routes", &self.routes)
            .field("tiers", &self.tiers)
            .field("endpoints", &self.endpoints)
            .field("bypassed_ips", &self.bypassed_ips)
            .field("blocked_user_ids", &self.blocked_user_ids)
            .field("analyzer", &self.analyzer)
            .field("policies", &self.policies)
            .finish_non_exhaustive()
    }
}

impl PolicyEngine {
    /// An engine that allows everything until configured.
    pub fn new() -> Self {
        Self {
            routes: RouteMatcher::new(),
            limiter: RateLimiter::new(),
            tiers: Vec::new(),
            endpoints: EndpointTable::new(),
            bypassed_ips: HashSet::new(),
            blocked_user_ids: HashSet::new(),
            user_agents: Box::new(PatternUserAgentBlocklist::new()),
            analyzer: TenantIsolationAnalyzer::default(),
            policies: IdorPolicyStore::new(),
        }
    }

    /// Build an engine from configuration, validating every section.
    pub fn from_config(config: &BastionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let dialect = config
            .idor
            .as_ref()
            .map(|idor| idor.sql_dialect)
            .unwrap_or_default();
        let engine = Self {
            routes: RouteMatcher::from_config(&config.routes)?,
            limiter: RateLimiter::new(),
            tiers: config.rate_limiting.tiers.clone(),
            endpoints: EndpointTable::from_config(&config.rate_limiting.endpoints)?,
            bypassed_ips: config.blocking.bypassed_ips.iter().cloned().collect(),
            blocked_user_ids: config.blocking.blocked_user_ids.iter().cloned().collect(),
            user_agents: Box::new(PatternUserAgentBlocklist::from_config(
                &config.blocking.blocked_user_agents,
            )?),
            analyzer: TenantIsolationAnalyzer::new(dialect),
            policies: IdorPolicyStore::new(),
        };
        if let Some(idor) = &config.idor {
            engine.policies.declare(IdorPolicy::from_config(idor)?);
        }

        tracing::info!(
            tiers = engine.tiers.len(),
            endpoints = engine.endpoints.len(),
            param_matchers = engine.routes.param_matcher_count(),
            known_routes = engine.routes.known_route_count(),
            idor = engine.policies.current().is_some(),
            "Policy engine configured"
        );
        Ok(engine)
    }

    /// Replace the user-agent collaborator.
    pub fn with_user_agent_blocklist(mut self, blocklist: impl UserAgentBlocklist + 'static) -> Self {
        self.user_agents = Box::new(blocklist);
        self
    }

    /// Set the SQL dialect used by [`decide_for_sql`](Self::decide_for_sql).
    pub fn with_sql_dialect(mut self, dialect: SqlDialectKind) -> Self {
        self.analyzer = TenantIsolationAnalyzer::new(dialect);
        self
    }

    /// Replace the global rate-limit tiers.
    pub fn with_rate_limit_tiers(mut self, tiers: Vec<RateLimitTier>) -> Result<Self, ConfigError> {
        for tier in &tiers {
            tier.validate()?;
        }
        self.tiers = tiers;
        Ok(self)
    }

    // ---- Configuration API ----

    pub fn register_pattern(&self, name: &str, pattern: &str) -> Result<bool, ConfigError> {
        self.routes.register_pattern(name, pattern)
    }

    pub fn register_route(&self, template: &str) -> Result<bool, ConfigError> {
        self.routes.register_route(template)
    }

    /// Declare which tables are scoped by `tenant_column`. Redeclaring the
    /// same policy is a no-op; a different one replaces it.
    pub fn declare_idor_policy<I, S>(&self, tenant_column: &str, tables: I) -> Result<bool, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let policy = IdorPolicy::new(tenant_column, tables)?;
        Ok(self.policies.declare(policy))
    }

    pub fn idor_policy(&self) -> Option<Arc<IdorPolicy>> {
        self.policies.current()
    }

    pub fn route_matcher(&self) -> &RouteMatcher {
        &self.routes
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn rate_limit_tiers(&self) -> &[RateLimitTier] {
        &self.tiers
    }

    pub fn endpoints(&self) -> &EndpointTable {
        &self.endpoints
    }

    pub fn normalize_route(&self, path: &str) -> String {
        self.routes.normalize(path)
    }

    /// Store the route template of `path` on the context.
    pub fn match_route(&self, ctx: &mut RequestContext, path: &str) {
        ctx.matched_route = self.routes.normalize(path);
    }

    // ---- Request checkpoint ----

    pub fn decide_for_request(&self, ctx: &RequestContext) -> Decision {
        self.decide_for_request_at(ctx, now_ms())
    }

    /// [`decide_for_request`](Self::decide_for_request) at an explicit time.
    pub fn decide_for_request_at(&self, ctx: &RequestContext, now_ms: u64) -> Decision {
        if let Some(user) = ctx.user() {
            if self.blocked_user_ids.contains(&user.id) {
                tracing::info!(user_id = %user.id, ip = %ctx.ip, "Blocked request from blocked user");
                return Decision::blocked(
                    Trigger::User,
                    DecisionMetadata {
                        ip: non_empty(&ctx.ip),
                        user_id: Some(user.id.clone()),
                        description: Some("user is blocked".to_string()),
                        ..DecisionMetadata::default()
                    },
                );
            }
        }

        if self.bypassed_ips.contains(&ctx.ip) {
            tracing::debug!(ip = %ctx.ip, "IP is bypassed, skipping request checks");
            return Decision::allow();
        }

        if let Some(decision) = self.check_rate_limits(ctx, now_ms) {
            return decision;
        }

        if let Some(description) = self.user_agents.is_user_agent_blocked(&ctx.user_agent) {
            tracing::info!(
                ip = %ctx.ip,
                user_agent = %ctx.user_agent,
                "Blocked request from user agent: {description}"
            );
            return Decision::blocked(
                Trigger::UserAgent,
                DecisionMetadata {
                    ip: non_empty(&ctx.ip),
                    user_agent: Some(ctx.user_agent.clone()),
                    description: Some(description),
                    ..DecisionMetadata::default()
                },
            );
        }

        Decision::allow()
    }

    fn check_rate_limits(&self, ctx: &RequestContext, now_ms: u64) -> Option<Decision> {
        // Group, then user, then IP
        let user_id = ctx.user().map(|user| user.id.as_str()).filter(|id| !id.is_empty());
        let (key, trigger) = match (ctx.rate_limit_group(), user_id) {
            (Some(group), _) => (format!("group:{group}"), Trigger::Group),
            (None, Some(id)) => (format!("user:{id}"), Trigger::User),
            (None, None) if !ctx.ip.is_empty() => (format!("ip:{}", ctx.ip), Trigger::Ip),
            (None, None) => return None,
        };

        // Every tier counts the request, the first exceeded one is reported
        let mut exceeded: Option<(RateLimitTier, Option<&str>)> = None;
        for tier in &self.tiers {
            let status = self.limiter.evaluate_at(&key, *tier, now_ms);
            if status.limited && exceeded.is_none() {
                exceeded = Some((*tier, None));
            }
        }

        if let Some(endpoint) = self.matching_endpoint(&ctx.method, &ctx.matched_route) {
            let endpoint_key = format!("{key}|{} {}", endpoint.method, endpoint.route);
            for tier in &endpoint.tiers {
                let status = self.limiter.evaluate_at(&endpoint_key, *tier, now_ms);
                if status.limited && exceeded.is_none() {
                    exceeded = Some((*tier, Some(endpoint.route.as_str())));
                }
            }
        }

        let (tier, route) = exceeded?;
        let subject = match trigger {
            Trigger::Group => "group",
            Trigger::User => "user",
            _ => "ip",
        };
        tracing::info!(
            key = %key,
            ip = %ctx.ip,
            route = ?route,
            window_ms = tier.window_ms,
            max_requests = tier.max_requests,
            "Rate limit exceeded"
        );
        Some(Decision::rate_limited(
            trigger,
            DecisionMetadata {
                ip: non_empty(&ctx.ip),
                group: ctx.rate_limit_group().map(str::to_string),
                user_id: user_id.map(str::to_string),
                route: route.map(str::to_string),
                description: Some(format!("configured rate limit exceeded by current {subject}")),
                window_ms: Some(tier.window_ms),
                max_requests: Some(tier.max_requests),
                ..DecisionMetadata::default()
            },
        ))
    }

    fn matching_endpoint(&self, method: &str, route: &str) -> Option<&EndpointRateLimit> {
        self.endpoints.find(method, route)
    }

    // ---- Statement checkpoint ----

    /// Check a statement model built by the interception layer.
    pub fn decide_for_statement(
        &self,
        statement: &StatementModel,
        bound: &BoundParameters,
        ctx: &RequestContext,
    ) -> Decision {
        match self.policies.current() {
            Some(policy) => self.analyzer.check(statement, bound, ctx, &policy),
            None => Decision::allow(),
        }
    }

    /// Check several models of one statement; the first violation wins.
    pub fn decide_for_statements(
        &self,
        statements: &[StatementModel],
        bound: &BoundParameters,
        ctx: &RequestContext,
    ) -> Decision {
        match self.policies.current() {
            Some(policy) => self.analyzer.check_all(statements, bound, ctx, &policy),
            None => Decision::allow(),
        }
    }

    /// Parse and check raw SQL.
    pub fn decide_for_sql(&self, sql: &str, bound: &BoundParameters, ctx: &RequestContext) -> Decision {
        match self.policies.current() {
            Some(policy) => self.analyzer.check_sql(sql, bound, ctx, &policy),
            None => Decision::allow(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
