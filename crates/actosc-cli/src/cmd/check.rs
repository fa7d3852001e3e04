use crate::output::{print_json, print_table};
use actosc_core::config::{Config, ConfigWarning, WarnLevel};
use actosc_core::manifest::ActionManifest;
use actosc_core::resolver::{self, ParameterPlan};
use anyhow::Context;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ParameterRow {
    name: String,
    kind: &'static str,
    source: String,
    output: String,
}

fn rows(plan: &ParameterPlan, connected: Option<&str>) -> Vec<ParameterRow> {
    let mut rows = Vec::new();
    if let Some(name) = connected {
        rows.push(ParameterRow {
            name: name.to_string(),
            kind: "connected",
            source: "-".to_string(),
            output: "bool".to_string(),
        });
    }
    for p in &plan.basic {
        rows.push(ParameterRow {
            name: p.name.clone(),
            kind: "basic",
            source: p.target.reference.to_string(),
            output: p.target.output_kind.to_string(),
        });
    }
    for p in &plan.custom {
        let inputs: Vec<String> = p.targets.iter().map(|t| t.reference.to_string()).collect();
        rows.push(ParameterRow {
            name: p.name.clone(),
            kind: "custom",
            source: format!("{}  <- [{}]", p.expression.source(), inputs.join(", ")),
            output: "expression".to_string(),
        });
    }
    rows
}

fn print_warnings(warnings: &[ConfigWarning]) {
    for w in warnings {
        let prefix = match w.level {
            WarnLevel::Warning => "warning",
            WarnLevel::Error => "error",
        };
        println!("[{prefix}] {}", w.message);
    }
}

pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let warnings = config.validate();

    // Validation errors can also break planning, so report them first.
    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        if json {
            print_json(&serde_json::json!({
                "config": config_path,
                "warnings": warnings,
            }))?;
        } else {
            print_warnings(&warnings);
        }
        anyhow::bail!("config validation found errors");
    }

    let manifest_path = config.manifest_path(config_path);
    let manifest = ActionManifest::load(&manifest_path)
        .with_context(|| format!("failed to load {}", manifest_path.display()))?;
    let plan = resolver::plan(&config, &manifest).context("configuration is invalid")?;
    let rows = rows(&plan, config.connected_param.as_deref());

    if json {
        let value = serde_json::json!({
            "config": config_path,
            "manifest": manifest_path,
            "target": format!("{}:{}", config.ip, config.port),
            "warnings": warnings,
            "parameters": rows,
        });
        print_json(&value)?;
    } else {
        println!("config:   {}", config_path.display());
        println!("manifest: {}", manifest_path.display());
        println!("target:   {}:{}\n", config.ip, config.port);
        print_warnings(&warnings);
        if rows.is_empty() {
            println!("No parameters configured.");
        } else {
            let table: Vec<Vec<String>> = rows
                .iter()
                .map(|r| vec![r.name.clone(), r.kind.to_string(), r.output.clone(), r.source.clone()])
                .collect();
            print_table(&["NAME", "KIND", "OUTPUT", "SOURCE"], &table);
        }
    }
    Ok(())
}
