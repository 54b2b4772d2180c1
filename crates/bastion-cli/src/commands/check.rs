//! `bastion check` command implementation.

use std::path::Path;

use anyhow::Result;
use bastion_core::BastionConfig;

use super::load_engine;

/// Validate the configuration and print a summary of it.
pub fn run(config_path: &Path) -> Result<()> {
    println!("🔍 Checking {}...", config_path.display());
    let (config, _engine) = load_engine(config_path)?;

    for line in summary(&config) {
        println!("  {line}");
    }
    println!();
    println!("✅ Configuration is valid");
    Ok(())
}

fn summary(config: &BastionConfig) -> Vec<String> {
    let mut lines = Vec::new();

    match &config.idor {
        Some(idor) => lines.push(format!(
            "IDOR: column '{}' on {} table(s) [{}] ({})",
            idor.tenant_column,
            idor.protected_tables.len(),
            idor.protected_tables.join(", "),
            idor.sql_dialect
        )),
        None => lines.push("IDOR: disabled".to_string()),
    }

    lines.push(format!(
        "Routes: {} param matcher(s), {} known route(s)",
        config.routes.param_matchers.len(),
        config.routes.known_routes.len()
    ));

    for tier in &config.rate_limiting.tiers {
        lines.push(format!(
            "Rate limit: {} request(s) per {} ms",
            tier.max_requests, tier.window_ms
        ));
    }
    for endpoint in &config.rate_limiting.endpoints {
        for tier in &endpoint.tiers {
            lines.push(format!(
                "Rate limit: {} {}: {} request(s) per {} ms",
                endpoint.method, endpoint.route, tier.max_requests, tier.window_ms
            ));
        }
    }

    lines.push(format!(
        "Blocking: {} bypassed IP(s), {} blocked user(s), {} user agent pattern(s)",
        config.blocking.bypassed_ips.len(),
        config.blocking.blocked_user_ids.len(),
        config.blocking.blocked_user_agents.len()
    ));
    lines
}
