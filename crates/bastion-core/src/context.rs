//! Per-request state.
//!
//! A [`RequestContext`] is created when a request starts, owned by the code
//! handling that request, and passed by reference into every policy call.
//! Nothing in here is shared between requests, so it needs no locking.

use std::ops::{Deref, DerefMut};

/// The authenticated user of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// Marker pushed onto the IDOR override stack of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdorOverride {
    /// Tenant checks are skipped while this marker is on top.
    Disabled,
    /// Tenant checks run again, even inside an outer disabled scope.
    Enabled,
}

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Client IP address as resolved by the request pipeline.
    pub ip: String,
    pub user_agent: String,
    /// HTTP method, upper-cased.
    pub method: String,
    /// Canonical route template of the request path.
    pub matched_route: String,
    user: Option<User>,
    tenant_id: Option<String>,
    rate_limit_group: Option<String>,
    idor_overrides: Vec<IdorOverride>,
}

impl RequestContext {
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_agent: user_agent.into(),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_uppercase();
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.matched_route = route.into();
        self
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn set_user(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        if id.trim().is_empty() {
            tracing::warn!("set_user called with an empty user id, ignoring");
            return;
        }
        self.user = Some(User {
            id,
            name: name.into(),
        });
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Set the tenant of the current request. A later call replaces an earlier one.
    pub fn set_tenant_id(&mut self, tenant_id: impl Into<String>) {
        let tenant_id = tenant_id.into();
        if tenant_id.is_empty() {
            tracing::warn!("set_tenant_id called with an empty tenant id, ignoring");
            return;
        }
        if let Some(previous) = &self.tenant_id {
            if previous != &tenant_id {
                tracing::debug!(previous = %previous, tenant_id = %tenant_id, "Replacing tenant id");
            }
        }
        self.tenant_id = Some(tenant_id);
    }

    pub fn rate_limit_group(&self) -> Option<&str> {
        self.rate_limit_group.as_deref()
    }

    pub fn set_rate_limit_group(&mut self, group: impl Into<String>) {
        let group = group.into();
        if group.trim().is_empty() {
            tracing::warn!("set_rate_limit_group called with an empty group, ignoring");
            return;
        }
        self.rate_limit_group = Some(group);
    }

    /// Whether tenant checks are currently bypassed for this request.
    pub fn idor_bypassed(&self) -> bool {
        matches!(self.idor_overrides.last(), Some(IdorOverride::Disabled))
    }

    pub fn idor_override_depth(&self) -> usize {
        self.idor_overrides.len()
    }

    /// Push a marker that lasts until the returned guard is dropped.
    pub fn push_idor_override(&mut self, marker: IdorOverride) -> IdorDisabledGuard<'_> {
        let depth = self.idor_overrides.len();
        self.idor_overrides.push(marker);
        IdorDisabledGuard { ctx: self, depth }
    }

    /// Disable tenant checks until the returned guard is dropped.
    pub fn disable_idor(&mut self) -> IdorDisabledGuard<'_> {
        self.push_idor_override(IdorOverride::Disabled)
    }

    /// Run `body` with tenant checks disabled. The marker is popped on every
    /// exit path, including an `Err` returned by `body` or a panic unwinding
    /// through it.
    pub fn with_idor_disabled<R>(&mut self, body: impl FnOnce(&mut RequestContext) -> R) -> R {
        let mut guard = self.disable_idor();
        body(&mut guard)
    }

    /// Run `body` with tenant checks forced back on.
    pub fn with_idor_enabled<R>(&mut self, body: impl FnOnce(&mut RequestContext) -> R) -> R {
        let mut guard = self.push_idor_override(IdorOverride::Enabled);
        body(&mut guard)
    }
}

/// Scope guard for an IDOR override marker.
///
/// Dereferences to the [`RequestContext`] so statements can be checked while
/// the scope is active. Dropping it restores the stack to the depth it had
/// before the marker was pushed.
pub struct IdorDisabledGuard<'a> {
    ctx: &'a mut RequestContext,
    depth: usize,
}

impl Deref for IdorDisabledGuard<'_> {
    type Target = RequestContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for IdorDisabledGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for IdorDisabledGuard<'_> {
    fn drop(&mut self) {
        self.ctx.idor_overrides.truncate(self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_tenant_id_wins() {
        let mut ctx = RequestContext::new("1.2.3.4", "curl/8.0");
        assert_eq!(ctx.tenant_id(), None);
        ctx.set_tenant_id("A");
        ctx.set_tenant_id("B");
        assert_eq!(ctx.tenant_id(), Some("B"));
        ctx.set_tenant_id("");
        assert_eq!(ctx.tenant_id(), Some("B"));
    }

    #[test]
    fn test_set_user_and_group() {
        let mut ctx = RequestContext::new("1.2.3.4", "curl/8.0").with_method("post");
        ctx.set_user("42", "Alice");
        ctx.set_rate_limit_group("group1");
        assert_eq!(ctx.user().map(|u| u.id.as_str()), Some("42"));
        assert_eq!(ctx.rate_limit_group(), Some("group1"));
        assert_eq!(ctx.method, "POST");
    }

    #[test]
    fn test_guard_pops_marker() {
        let mut ctx = RequestContext::default();
        {
            let guard = ctx.disable_idor();
            assert!(guard.idor_bypassed());
        }
        assert!(!ctx.idor_bypassed());
        assert_eq!(ctx.idor_override_depth(), 0);
    }

    #[test]
    fn test_with_idor_disabled_pops_on_error() {
        let mut ctx = RequestContext::default();
        let result: Result<(), &str> = ctx.with_idor_disabled(|inner| {
            assert!(inner.idor_bypassed());
            Err("query failed")
        });
        assert!(result.is_err());
        assert!(!ctx.idor_bypassed());
        assert_eq!(ctx.idor_override_depth(), 0);
    }

    #[test]
    fn test_with_idor_disabled_pops_on_panic() {
        let mut ctx = RequestContext::default();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            ctx.with_idor_disabled(|_| panic!("handler crashed"));
        }));
        assert!(outcome.is_err());
        assert_eq!(ctx.idor_override_depth(), 0);
    }

    #[test]
    fn test_nested_enable_inside_disable() {
        let mut ctx = RequestContext::default();
        ctx.with_idor_disabled(|outer| {
            assert!(outer.idor_bypassed());
            outer.with_idor_enabled(|inner| {
                assert!(!inner.idor_bypassed());
                assert_eq!(inner.idor_override_depth(), 2);
            });
            assert!(outer.idor_bypassed());
        });
        assert!(!ctx.idor_bypassed());
    }
}
