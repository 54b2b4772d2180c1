//! Policy decisions.

use serde::Serialize;

/// Why a request or statement was blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    None,
    RateLimited,
    Blocked,
    TenantViolation,
}

/// Which attribute of the request triggered the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    None,
    Ip,
    Group,
    User,
    UserAgent,
    Tenant,
}

/// Trigger-specific details attached to a blocking decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecisionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Table whose tenant scoping could not be verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Tenant column the policy requires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_requests: Option<u64>,
}

/// The verdict of a policy checkpoint. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub block: bool,
    #[serde(rename = "type")]
    pub kind: DecisionType,
    pub trigger: Trigger,
    pub metadata: DecisionMetadata,
}

impl Decision {
    /// Let the operation proceed.
    pub fn allow() -> Self {
        Self {
            block: false,
            kind: DecisionType::None,
            trigger: Trigger::None,
            metadata: DecisionMetadata::default(),
        }
    }

    /// Request exceeded a configured rate-limit tier.
    pub fn rate_limited(trigger: Trigger, metadata: DecisionMetadata) -> Self {
        Self {
            block: true,
            kind: DecisionType::RateLimited,
            trigger,
            metadata,
        }
    }

    /// Request matched a blocklist entry.
    pub fn blocked(trigger: Trigger, metadata: DecisionMetadata) -> Self {
        Self {
            block: true,
            kind: DecisionType::Blocked,
            trigger,
            metadata,
        }
    }

    /// Statement could not be proven to stay within the current tenant.
    pub fn tenant_violation(
        table: impl Into<String>,
        column: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            block: true,
            kind: DecisionType::TenantViolation,
            trigger: Trigger::Tenant,
            metadata: DecisionMetadata {
                table: Some(table.into()),
                column: Some(column.into()),
                description: Some(description.into()),
                ..DecisionMetadata::default()
            },
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.block
    }

    /// HTTP status a request pipeline should answer with, if the decision blocks.
    pub fn status_code(&self) -> Option<u16> {
        match self.kind {
            DecisionType::None => None,
            DecisionType::RateLimited => Some(429),
            DecisionType::Blocked => Some(403),
            DecisionType::TenantViolation => Some(500),
        }
    }

    /// Human-readable message in the form surfaced to blocked clients.
    pub fn message(&self) -> Option<String> {
        if !self.block {
            return None;
        }
        let description = self.metadata.description.as_deref().unwrap_or("unknown");
        let message = match self.trigger {
            Trigger::Tenant => format!("Bastion IDOR protection: {description}"),
            Trigger::Ip => format!(
                "Your IP address ({}) is blocked due to: {description}!",
                self.metadata.ip.as_deref().unwrap_or_default()
            ),
            Trigger::Group => format!(
                "Your rate-limit group ({}) is blocked due to: {description}!",
                self.metadata.group.as_deref().unwrap_or_default()
            ),
            Trigger::User => format!(
                "Your user ({}) is blocked due to: {description}!",
                self.metadata.user_id.as_deref().unwrap_or_default()
            ),
            Trigger::UserAgent => format!(
                "Your user agent ({}) is blocked due to: {description}!",
                self.metadata.user_agent.as_deref().unwrap_or_default()
            ),
            Trigger::None => description.to_string(),
        };
        Some(message)
    }
}

impl Default for Decision {
    fn default() -> Self {
        Self::allow()
    }
}
