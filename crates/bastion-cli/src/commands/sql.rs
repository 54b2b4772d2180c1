//! `bastion check-sql` command implementation.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use bastion_core::RequestContext;
use bastion_idor::{BoundParameters, ParamValue};
use serde_json::Value as JsonValue;

use super::load_engine;

/// One statement check requested on the command line.
#[derive(Debug)]
pub struct SqlCheck {
    pub tenant: Option<String>,
    pub sql: String,
    pub params: Option<String>,
    pub idor_disabled: bool,
}

pub fn run(config_path: &Path, check: &SqlCheck) -> Result<()> {
    let (_, engine) = load_engine(config_path)?;
    if engine.idor_policy().is_none() {
        eprintln!("⚠️  No idor section in {}, every statement is allowed", config_path.display());
    }

    let bound = match &check.params {
        Some(raw) => parse_params(raw)?,
        None => BoundParameters::new(),
    };

    let mut ctx = RequestContext::new("127.0.0.1", "bastion-cli");
    if let Some(tenant) = &check.tenant {
        ctx.set_tenant_id(tenant.as_str());
    }

    let decision = if check.idor_disabled {
        ctx.with_idor_disabled(|ctx| engine.decide_for_sql(&check.sql, &bound, ctx))
    } else {
        engine.decide_for_sql(&check.sql, &bound, &ctx)
    };

    println!("{}", serde_json::to_string_pretty(&decision)?);
    if let Some(message) = decision.message() {
        eprintln!("❌ {message}");
    } else {
        eprintln!("✅ Allowed");
    }
    Ok(())
}

/// Parse `--params`: a JSON array binds positions 1, 2, ... and a JSON
/// object binds names.
fn parse_params(raw: &str) -> Result<BoundParameters> {
    let value: JsonValue = serde_json::from_str(raw).context("--params is not valid JSON")?;
    match value {
        JsonValue::Array(_) => {
            let values: Vec<ParamValue> =
                serde_json::from_value(value).context("--params contains an unsupported value")?;
            Ok(BoundParameters::from_positional(values))
        }
        JsonValue::Object(_) => {
            let values: BTreeMap<String, ParamValue> =
                serde_json::from_value(value).context("--params contains an unsupported value")?;
            Ok(BoundParameters::from_named(values))
        }
        _ => bail!("--params must be a JSON array or object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional_params() {
        let bound = parse_params(r#"["x", 42, null]"#).unwrap();
        assert_eq!(bound.len(), 3);
        assert_eq!(bound.get_positional(1), Some(ParamValue::Text("x".to_string())));
        assert_eq!(bound.get_positional(2), Some(ParamValue::Integer(42)));
        assert_eq!(bound.get_positional(3), Some(ParamValue::Null));
    }

    #[test]
    fn test_parse_named_params() {
        let bound = parse_params(r#"{"tenant": "A"}"#).unwrap();
        assert_eq!(bound.get_named(":tenant"), Some(ParamValue::Text("A".to_string())));
    }

    #[test]
    fn test_parse_params_rejects_scalars() {
        assert!(parse_params("42").is_err());
        assert!(parse_params("not json").is_err());
    }
}
