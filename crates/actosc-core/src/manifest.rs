use crate::action::ValueType;
use crate::error::{ActoscError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestAction {
    /// Full action path, e.g. `/actions/thumbparams/in/ActionJump`.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
}

impl ManifestAction {
    /// Last path segment, the name configs refer to.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn value_type(&self) -> Option<ValueType> {
        ValueType::from_manifest(&self.kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestActionSet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

/// The runtime's declaration of available input actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionManifest {
    #[serde(default)]
    pub actions: Vec<ManifestAction>,
    #[serde(default)]
    pub action_sets: Vec<ManifestActionSet>,
}

impl ActionManifest {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ActoscError::ManifestNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data)
    }

    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// One action of each supported type inside `action_set`, matching the
    /// references in [`Config::starter`](crate::config::Config::starter).
    pub fn starter(action_set: &str) -> Self {
        let set = action_set.trim_end_matches('/');
        let action = |name: &str, value_type: ValueType| ManifestAction {
            name: format!("{set}/in/{name}"),
            kind: value_type.as_manifest_str().to_string(),
            requirement: Some("optional".to_string()),
        };
        Self {
            actions: vec![
                action("LeftTrigger", ValueType::Scalar),
                action("RightTrigger", ValueType::Scalar),
                action("RightStick", ValueType::Vector2),
                action("ActionJump", ValueType::Boolean),
                action("LeftHandSkeleton", ValueType::Skeleton),
                action("RightHandPose", ValueType::Pose),
            ],
            action_sets: vec![ManifestActionSet {
                name: set.to_string(),
                usage: Some("leftright".to_string()),
            }],
        }
    }

    /// Look up an action by its short name. When several action sets declare
    /// the same short name the last declaration wins.
    pub fn find(&self, short_name: &str) -> Option<&ManifestAction> {
        self.actions.iter().rev().find(|a| a.short_name() == short_name)
    }

    /// Supported value type of `short_name`.
    pub fn value_type_of(&self, short_name: &str) -> Result<ValueType> {
        let action = self
            .find(short_name)
            .ok_or_else(|| ActoscError::UnknownAction(short_name.to_string()))?;
        action
            .value_type()
            .ok_or_else(|| ActoscError::UnsupportedActionType {
                action: short_name.to_string(),
                kind: action.kind.clone(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "default_bindings": [],
        "actions": [
            { "name": "/actions/thumbparams/in/ActionJump", "type": "boolean" },
            { "name": "/actions/thumbparams/in/Trigger", "type": "vector1", "requirement": "optional" },
            { "name": "/actions/thumbparams/in/Haptics", "type": "vibration" }
        ],
        "action_sets": [ { "name": "/actions/thumbparams", "usage": "leftright" } ],
        "localization": []
    }"#;

    #[test]
    fn parses_steamvr_manifest() {
        let m = ActionManifest::parse(MANIFEST).unwrap();
        assert_eq!(m.actions.len(), 3);
        assert_eq!(m.action_sets[0].name, "/actions/thumbparams");
        assert_eq!(m.actions[1].requirement.as_deref(), Some("optional"));
    }

    #[test]
    fn lookup_by_short_name() {
        let m = ActionManifest::parse(MANIFEST).unwrap();
        assert_eq!(m.value_type_of("ActionJump").unwrap(), ValueType::Boolean);
        assert_eq!(m.value_type_of("Trigger").unwrap(), ValueType::Scalar);
    }

    #[test]
    fn missing_action_is_named() {
        let m = ActionManifest::parse(MANIFEST).unwrap();
        let err = m.value_type_of("Nope").unwrap_err();
        assert_eq!(err.to_string(), "action in config not in action manifest: Nope");
    }

    #[test]
    fn unsupported_type_rejected() {
        let m = ActionManifest::parse(MANIFEST).unwrap();
        assert!(matches!(
            m.value_type_of("Haptics").unwrap_err(),
            ActoscError::UnsupportedActionType { ref kind, .. } if kind == "vibration"
        ));
    }

    #[test]
    fn starter_round_trips_through_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("action_manifest.json");
        ActionManifest::starter("/actions/thumbparams/").save(&path).unwrap();
        let loaded = ActionManifest::load(&path).unwrap();
        assert_eq!(loaded.actions.len(), 6);
        assert_eq!(loaded.actions[0].name, "/actions/thumbparams/in/LeftTrigger");
        assert_eq!(loaded.value_type_of("LeftHandSkeleton").unwrap(), ValueType::Skeleton);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ActionManifest::load(&dir.path().join("actions.json")).unwrap_err();
        assert!(matches!(err, ActoscError::ManifestNotFound(_)));
    }
}
