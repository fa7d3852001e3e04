use crate::error::{ActoscError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_BINDINGS_DIR: &str = "bindings";
pub const DEFAULT_MANIFEST_FILE: &str = "action_manifest.json";

pub const PARAMETER_ADDRESS_PREFIX: &str = "/avatar/parameters/";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Directory config-relative paths are resolved against.
pub fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `<config dir>/<bindings folder>/<manifest file>`
pub fn manifest_path(config_path: &Path, bindings_folder: &Path, manifest_file: &str) -> PathBuf {
    config_dir(config_path).join(bindings_folder).join(manifest_file)
}

/// OSC address a parameter is sent to.
pub fn parameter_address(name: &str) -> String {
    format!("{PARAMETER_ADDRESS_PREFIX}{name}")
}

// ---------------------------------------------------------------------------
// Parameter name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    // OSC address characters minus the pattern-matching ones.
    NAME_RE.get_or_init(|| Regex::new(r"^[^\s#*,?\[\]{}]+$").unwrap())
}

pub fn validate_parameter_name(name: &str) -> Result<()> {
    if name.starts_with('/') || name.ends_with('/') || !name_re().is_match(name) {
        return Err(ActoscError::InvalidParameterName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
