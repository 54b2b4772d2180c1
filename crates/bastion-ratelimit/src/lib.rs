//! # bastion-ratelimit
//!
//! Request accounting for Bastion.
//!
//! - [`RouteMatcher`] turns request paths into route templates, so
//!   parameterized paths share one bucket.
//! - [`RateLimiter`] counts requests per key and tier in fixed, epoch-aligned
//!   windows with a sticky block once a limit is exceeded.
//! - [`EndpointTable`] selects the route-scoped limits of a request.

pub mod endpoints;
pub mod limiter;
pub mod routes;

pub use endpoints::EndpointTable;
pub use limiter::{DEFAULT_PRUNE_INTERVAL, RateLimitStatus, RateLimiter, now_ms};
pub use routes::RouteMatcher;
