use crate::error::{ActoscError, Result};
use crate::expr::Expression;
use crate::paths;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// CustomParamConfig
// ---------------------------------------------------------------------------

/// A parameter computed from several actions by an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomParamConfig {
    #[serde(rename = "OSCName")]
    pub name: String,
    #[serde(rename = "Expression")]
    pub expression: String,
    /// Action references, exposed to the expression as `v[0]`, `v[1]`, ...
    #[serde(rename = "Actions", default)]
    pub actions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "IP", default = "default_ip")]
    pub ip: String,
    #[serde(rename = "Port", default = "default_port")]
    pub port: u16,
    #[serde(rename = "BindingsFolder", default = "default_bindings_folder")]
    pub bindings_folder: PathBuf,
    #[serde(rename = "ActionManifestFile", default = "default_manifest_file")]
    pub action_manifest_file: String,
    #[serde(rename = "ActionSetHandle", default = "default_action_set")]
    pub action_set: String,
    /// Parameter sent as `true` every tick while the tool runs.
    #[serde(rename = "ConnectedParam", default, skip_serializing_if = "Option::is_none")]
    pub connected_param: Option<String>,
    /// Output name → action reference, in declaration order.
    #[serde(rename = "Params", default)]
    pub params: IndexMap<String, String>,
    #[serde(rename = "CustomParams", default)]
    pub custom_params: Vec<CustomParamConfig>,
}

fn default_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_bindings_folder() -> PathBuf {
    PathBuf::from(paths::DEFAULT_BINDINGS_DIR)
}

fn default_manifest_file() -> String {
    paths::DEFAULT_MANIFEST_FILE.to_string()
}

fn default_action_set() -> String {
    "/actions/thumbparams".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            port: default_port(),
            bindings_folder: default_bindings_folder(),
            action_manifest_file: default_manifest_file(),
            action_set: default_action_set(),
            connected_param: None,
            params: IndexMap::new(),
            custom_params: Vec::new(),
        }
    }
}

impl Config {
    /// The config `actosc init` writes: one parameter of each flavour,
    /// matching [`ActionManifest::starter`](crate::manifest::ActionManifest::starter).
    pub fn starter() -> Self {
        let mut params = IndexMap::new();
        params.insert("LeftTrigger".to_string(), "LeftTrigger".to_string());
        params.insert("RightStickX".to_string(), "RightStick.x".to_string());
        params.insert("JumpPressed".to_string(), "boolean:ActionJump".to_string());
        Self {
            connected_param: Some("ControllersConnected".to_string()),
            params,
            custom_params: vec![
                CustomParamConfig {
                    name: "TriggerSum".to_string(),
                    expression: "min(v[0] + v[1], 1.0)".to_string(),
                    actions: vec!["LeftTrigger".to_string(), "RightTrigger".to_string()],
                },
                CustomParamConfig {
                    name: "LeftFist".to_string(),
                    expression: "min(v[0].fingerCurl) > 0.8".to_string(),
                    actions: vec!["LeftHandSkeleton".to_string()],
                },
            ],
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ActoscError::ConfigNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Apply command-line overrides of the OSC endpoint.
    pub fn with_endpoint(mut self, ip: Option<String>, port: Option<u16>) -> Self {
        if let Some(ip) = ip {
            self.ip = ip;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn manifest_path(&self, config_path: &Path) -> PathBuf {
        paths::manifest_path(config_path, &self.bindings_folder, &self.action_manifest_file)
    }

    /// Output names in dispatch order, excluding the connected flag.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.params
            .keys()
            .map(String::as_str)
            .chain(self.custom_params.iter().map(|p| p.name.as_str()))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Lint the config for likely mistakes. Hard errors (unknown actions, bad
    /// expressions) are reported by the resolver instead.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. Nothing to send
        if self.params.is_empty() && self.custom_params.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "no parameters configured; only the connected flag will be sent"
                    .to_string(),
            });
        }

        for param in &self.custom_params {
            // 2. Custom parameter without inputs
            if param.actions.is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("custom parameter '{}' declares no actions", param.name),
                });
            }

            // 3. Expression that ignores its inputs
            if let Ok(expr) = Expression::compile(&param.expression) {
                if !param.actions.is_empty() && !expr.reads_inputs() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "expression for '{}' never reads v; its actions are polled for nothing",
                            param.name
                        ),
                    });
                }
            }
        }

        // 4. Connected flag shadowing a real parameter
        if let Some(connected) = &self.connected_param {
            if self.parameter_names().any(|n| n == connected) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "ConnectedParam '{connected}' is also declared as a parameter"
                    ),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
