//! # bastion-core
//!
//! Types shared by every Bastion crate.
//!
//! - [`Decision`]: the block/allow verdict returned by every policy checkpoint
//! - [`RequestContext`]: per-request state (user, tenant, rate-limit group, route)
//! - [`config`]: YAML configuration and the [`ConfigError`] raised by all
//!   configuration APIs
//!
//! Blocking is a normal outcome. Policy checks return a [`Decision`] and only
//! configuration calls return errors.

pub mod config;
pub mod context;
pub mod decision;
pub mod error;

pub use config::{
    BastionConfig, BlockedUserAgent, BlockingConfig, ConfigError, EndpointRateLimit, IdorConfig,
    ParamMatcherConfig, RateLimitTier, RateLimitingConfig, RoutesConfig, SqlDialectKind,
};
pub use context::{IdorDisabledGuard, IdorOverride, RequestContext, User};
pub use decision::{Decision, DecisionMetadata, DecisionType, Trigger};
