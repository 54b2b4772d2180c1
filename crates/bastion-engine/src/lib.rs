//! # bastion-engine
//!
//! The policy engine of Bastion. It combines the route normalizer, the
//! rate limiter and the tenant isolation analyzer behind two checkpoints.
//!
//! ```text
//! request in ──► decide_for_request(ctx) ──► blocked user?
//!                                            bypassed IP?   → allow
//!                                            rate limits    → 429
//!                                            user agent     → 403
//!
//! SQL out ────► decide_for_sql(sql, params, ctx) ──► tenant filter? → 500
//! ```
//!
//! The host framework owns the request lifecycle: it builds a
//! [`RequestContext`](bastion_core::RequestContext), calls the
//! checkpoints, and turns a blocking [`Decision`](bastion_core::Decision)
//! into a response or an error.

pub mod engine;
pub mod user_agent;

pub use engine::PolicyEngine;
pub use user_agent::{PatternUserAgentBlocklist, UserAgentBlocklist};

pub use bastion_core::{BastionConfig, ConfigError, Decision, DecisionType, RequestContext, Trigger};
pub use bastion_idor::{BoundParameters, ParamValue};
