use crate::output::{print_json, print_table};
use actosc_core::config::Config;
use actosc_core::manifest::ActionManifest;
use anyhow::Context;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ActionRow<'a> {
    name: &'a str,
    path: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    supported: bool,
}

pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let manifest_path = config.manifest_path(config_path);
    let manifest = ActionManifest::load(&manifest_path)
        .with_context(|| format!("failed to load {}", manifest_path.display()))?;

    let rows: Vec<ActionRow> = manifest
        .actions
        .iter()
        .map(|a| ActionRow {
            name: a.short_name(),
            path: &a.name,
            kind: &a.kind,
            supported: a.value_type().is_some(),
        })
        .collect();

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No actions in {}.", manifest_path.display());
        return Ok(());
    }
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            let kind = if r.supported {
                r.kind.to_string()
            } else {
                format!("{} (unsupported)", r.kind)
            };
            vec![r.name.to_string(), kind, r.path.to_string()]
        })
        .collect();
    print_table(&["NAME", "TYPE", "PATH"], &table);
    Ok(())
}
