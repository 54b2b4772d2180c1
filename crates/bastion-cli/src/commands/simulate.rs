//! `bastion simulate` command implementation.

use std::path::Path;

use anyhow::Result;
use bastion_core::{DecisionType, RequestContext};
use bastion_ratelimit::now_ms;

use super::load_engine;

/// A burst of identical requests.
#[derive(Debug)]
pub struct Simulation {
    pub ip: String,
    pub user_agent: String,
    pub group: Option<String>,
    pub user: Option<String>,
    pub method: String,
    pub path: String,
    pub count: u32,
}

pub fn run(config_path: &Path, simulation: &Simulation) -> Result<()> {
    let (_, engine) = load_engine(config_path)?;

    let mut ctx = RequestContext::new(simulation.ip.as_str(), simulation.user_agent.as_str())
        .with_method(simulation.method.as_str());
    engine.match_route(&mut ctx, &simulation.path);
    if let Some(group) = &simulation.group {
        ctx.set_rate_limit_group(group.as_str());
    }
    if let Some(user) = &simulation.user {
        ctx.set_user(user.as_str(), "");
    }

    println!("🚦 {} {} as {}", ctx.method, ctx.matched_route, simulation.ip);

    // One timestamp for the whole burst so it never straddles two windows
    let started_ms = now_ms();
    let mut allowed = 0u32;
    let mut limited = 0u32;
    let mut blocked = 0u32;
    for index in 1..=simulation.count {
        let decision = engine.decide_for_request_at(&ctx, started_ms);
        match decision.kind {
            DecisionType::None => allowed += 1,
            DecisionType::RateLimited => limited += 1,
            DecisionType::Blocked | DecisionType::TenantViolation => blocked += 1,
        }
        if let Some(message) = decision.message() {
            println!("  #{index}: {} {message}", decision.status_code().unwrap_or(0));
        } else {
            println!("  #{index}: allowed");
        }
    }

    println!();
    println!("{allowed} allowed, {limited} rate limited, {blocked} blocked");
    Ok(())
}
