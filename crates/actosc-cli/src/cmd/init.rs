use actosc_core::{config::Config, io, manifest::ActionManifest};
use anyhow::Context;
use std::path::Path;

pub fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::starter();
    println!("Initializing actosc in: {}", actosc_core::paths::config_dir(config_path).display());

    // 1. config.yaml
    let data = serde_yaml::to_string(&config).context("failed to serialize config")?;
    let written = io::write_if_missing(config_path, data.as_bytes())
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    report(written, config_path);

    // 2. action manifest, wherever the config says it lives
    let existing = if written {
        config
    } else {
        Config::load(config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?
    };
    let manifest_path = existing.manifest_path(config_path);
    let manifest = ActionManifest::starter(&existing.action_set);
    let data = serde_json::to_string_pretty(&manifest).context("failed to serialize manifest")?;
    let written = io::write_if_missing(&manifest_path, data.as_bytes())
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;
    report(written, &manifest_path);

    Ok(())
}

fn report(written: bool, path: &Path) {
    if written {
        println!("  created: {}", path.display());
    } else {
        println!("  exists:  {}", path.display());
    }
}
