use actosc_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the config file to load.
///
/// Priority:
/// 1. `--config` flag / `ACTOSC_CONFIG` env var (passed in as `explicit`)
/// 2. `config.yaml` next to the executable, if it exists
/// 3. `config.yaml` in the working directory
pub fn resolve_config(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(paths::CONFIG_FILE)));
    if let Some(p) = beside_exe.filter(|p| p.is_file()) {
        return p;
    }

    cwd().join(paths::CONFIG_FILE)
}

/// Where `init` writes: the explicit path, else the working directory.
pub fn init_target(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => cwd().join(paths::CONFIG_FILE),
    }
}

fn cwd() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
