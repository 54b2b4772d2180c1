//! `bastion normalize` command implementation.

use std::path::Path;

use anyhow::Result;
use bastion_engine::PolicyEngine;

use super::load_engine;

pub fn run(config_path: Option<&Path>, paths: &[String]) -> Result<()> {
    let engine = match config_path {
        Some(path) => load_engine(path)?.1,
        None => PolicyEngine::new(),
    };
    for path in paths {
        println!("{path} -> {}", engine.normalize_route(path));
    }
    Ok(())
}
