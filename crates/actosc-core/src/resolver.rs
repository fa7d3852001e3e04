//! Turns the config's parameter declarations into bound, typed parameters.
//!
//! Resolution is split in two: [`plan`] validates everything against the
//! manifest without touching the runtime, then [`ParameterPlan::bind`]
//! acquires one runtime handle per distinct action path.

use crate::action::{ActionRef, ValueType};
use crate::config::Config;
use crate::error::{ActoscError, Result};
use crate::expr::Expression;
use crate::manifest::ActionManifest;
use crate::paths;
use crate::runtime::{read_sample, ActionHandle, InputRuntime};
use crate::sample::{Sample, SampleKind};
use std::collections::{HashMap, HashSet};
use tracing::debug;

// ---------------------------------------------------------------------------
// Planned (validated, unbound) parameters
// ---------------------------------------------------------------------------

/// A validated action reference: the manifest type it reads and the kind of
/// value its field path selects.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTarget {
    pub reference: ActionRef,
    pub value_type: ValueType,
    pub output_kind: SampleKind,
}

impl ActionTarget {
    pub fn resolve(raw: &str, manifest: &ActionManifest) -> Result<Self> {
        let reference = ActionRef::parse(raw)?;
        let value_type = manifest.value_type_of(&reference.action)?;
        if let Some(declared) = reference.specifier {
            if declared != value_type {
                return Err(ActoscError::TypeMismatch {
                    reference: raw.to_string(),
                    declared: declared.to_string(),
                    manifest: value_type.to_string(),
                });
            }
        }
        let output_kind = SampleKind::from(value_type)
            .select(&reference.fields)
            .ok_or_else(|| ActoscError::UnresolvedAttribute(reference.action.clone()))?;
        Ok(Self {
            reference,
            value_type,
            output_kind,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BasicPlan {
    pub name: String,
    pub target: ActionTarget,
}

#[derive(Debug, Clone)]
pub struct CustomPlan {
    pub name: String,
    pub expression: Expression,
    pub targets: Vec<ActionTarget>,
}

/// Every configured parameter, validated but not yet bound to the runtime.
#[derive(Debug, Clone, Default)]
pub struct ParameterPlan {
    pub basic: Vec<BasicPlan>,
    pub custom: Vec<CustomPlan>,
}

/// Validate the config's parameters against the manifest.
pub fn plan(config: &Config, manifest: &ActionManifest) -> Result<ParameterPlan> {
    // 1. Output names
    let mut seen = HashSet::new();
    let names = config
        .parameter_names()
        .chain(config.connected_param.as_deref());
    for name in names {
        paths::validate_parameter_name(name)?;
        if !seen.insert(name) {
            return Err(ActoscError::DuplicateParameter(name.to_string()));
        }
    }

    // 2. Basic parameters map one action to one primitive value
    let mut basic = Vec::with_capacity(config.params.len());
    for (name, raw) in &config.params {
        let target = ActionTarget::resolve(raw, manifest)?;
        if !target.output_kind.is_primitive() {
            return Err(ActoscError::InvalidOutputType {
                param: name.clone(),
                found: target.output_kind.to_string(),
            });
        }
        debug!(param = %name, reference = %raw, kind = %target.output_kind, "resolved parameter");
        basic.push(BasicPlan {
            name: name.clone(),
            target,
        });
    }

    // 3. Custom parameters
    let mut custom = Vec::with_capacity(config.custom_params.len());
    for param in &config.custom_params {
        let targets = param
            .actions
            .iter()
            .map(|raw| ActionTarget::resolve(raw, manifest))
            .collect::<Result<Vec<_>>>()?;
        if param.expression.contains("__") {
            return Err(ActoscError::UnsafeExpression {
                param: param.name.clone(),
                expression: param.expression.clone(),
            });
        }
        let expression =
            Expression::compile(&param.expression).map_err(|error| ActoscError::Expression {
                param: param.name.clone(),
                error,
            })?;
        debug!(param = %param.name, inputs = targets.len(), "compiled custom parameter");
        custom.push(CustomPlan {
            name: param.name.clone(),
            expression,
            targets,
        });
    }

    Ok(ParameterPlan { basic, custom })
}

impl ParameterPlan {
    /// Acquire runtime handles for every target. Handles are shared between
    /// parameters reading the same action.
    pub fn bind<R: InputRuntime + ?Sized>(
        self,
        runtime: &mut R,
        action_set: &str,
    ) -> Result<ParameterSet> {
        let mut handles = HandleCache::default();
        let basic = self
            .basic
            .into_iter()
            .map(|p| {
                Ok(BasicParameter {
                    binding: handles.bind(runtime, action_set, p.target)?,
                    name: p.name,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let custom = self
            .custom
            .into_iter()
            .map(|p| {
                let bindings = p
                    .targets
                    .into_iter()
                    .map(|t| handles.bind(runtime, action_set, t))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CustomParameter {
                    name: p.name,
                    expression: p.expression,
                    bindings,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ParameterSet { basic, custom })
    }
}

#[derive(Default)]
struct HandleCache {
    handles: HashMap<String, ActionHandle>,
}

impl HandleCache {
    fn bind<R: InputRuntime + ?Sized>(
        &mut self,
        runtime: &mut R,
        action_set: &str,
        target: ActionTarget,
    ) -> Result<ActionBinding> {
        let path = target.reference.action_path(action_set);
        let handle = match self.handles.get(&path) {
            Some(handle) => *handle,
            None => {
                let handle = runtime.action_handle(&path)?;
                debug!(%path, handle = handle.0, "acquired action handle");
                self.handles.insert(path.clone(), handle);
                handle
            }
        };
        Ok(ActionBinding {
            target,
            path,
            handle,
        })
    }
}

// ---------------------------------------------------------------------------
// Bound parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ActionBinding {
    pub target: ActionTarget,
    /// Full runtime path, `<action set>/in/<action>`.
    pub path: String,
    pub handle: ActionHandle,
}

impl ActionBinding {
    /// Current value of the action with the field path applied.
    pub fn read<R: InputRuntime + ?Sized>(&self, runtime: &mut R) -> Result<Sample> {
        let sample = read_sample(runtime, self.handle, self.target.value_type)?;
        sample
            .select(&self.target.reference.fields)
            .ok_or_else(|| ActoscError::UnresolvedAttribute(self.target.reference.action.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct BasicParameter {
    pub name: String,
    pub binding: ActionBinding,
}

#[derive(Debug, Clone)]
pub struct CustomParameter {
    pub name: String,
    pub expression: Expression,
    /// In declaration order; `v[i]` reads `bindings[i]`.
    pub bindings: Vec<ActionBinding>,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    pub basic: Vec<BasicParameter>,
    pub custom: Vec<CustomParameter>,
}

impl ParameterSet {
    /// Output names in dispatch order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.basic
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.custom.iter().map(|p| p.name.as_str()))
    }

    pub fn max_name_len(&self) -> usize {
        self.names().map(str::len).max().unwrap_or(0)
    }
}

/// Validate and bind in one step.
pub fn resolve<R: InputRuntime + ?Sized>(
    config: &Config,
    manifest: &ActionManifest,
    runtime: &mut R,
) -> Result<ParameterSet> {
    plan(config, manifest)?.bind(runtime, &config.action_set)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Field;
    use crate::config::CustomParamConfig;
    use crate::replay::ReplayRuntime;

    const MANIFEST: &str = r#"{
        "actions": [
            { "name": "/actions/thumbparams/in/ActionJump", "type": "boolean" },
            { "name": "/actions/thumbparams/in/ActionX", "type": "vector1" },
            { "name": "/actions/thumbparams/in/ActionY", "type": "vector1" },
            { "name": "/actions/thumbparams/in/Stick", "type": "vector2" },
            { "name": "/actions/thumbparams/in/RightHand", "type": "pose" },
            { "name": "/actions/thumbparams/in/LeftHand", "type": "skeleton" },
            { "name": "/actions/thumbparams/in/Grip", "type": "vector3" }
        ]
    }"#;

    fn manifest() -> ActionManifest {
        ActionManifest::parse(MANIFEST).unwrap()
    }

    fn config(params: &[(&str, &str)]) -> Config {
        let mut cfg = Config::default();
        for (name, reference) in params {
            cfg.params.insert(name.to_string(), reference.to_string());
        }
        cfg
    }

    fn custom(name: &str, expression: &str, actions: &[&str]) -> CustomParamConfig {
        CustomParamConfig {
            name: name.to_string(),
            expression: expression.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn one_binding_per_basic_parameter() {
        let cfg = config(&[
            ("Jump", "boolean:ActionJump"),
            ("StickX", "Stick.x"),
            ("HandY", "RightHand.position.y"),
            ("Index", "LeftHand.fingerCurl.index"),
        ]);
        let set = resolve(&cfg, &manifest(), &mut ReplayRuntime::idle()).unwrap();
        assert_eq!(set.basic.len(), 4);
        assert_eq!(set.names().collect::<Vec<_>>(), ["Jump", "StickX", "HandY", "Index"]);
        assert_eq!(set.basic[2].binding.target.reference.fields, [Field::Position, Field::Y]);
        assert_eq!(set.basic[3].binding.target.output_kind, SampleKind::Float);
        assert_eq!(set.basic[0].binding.path, "/actions/thumbparams/in/ActionJump");
    }

    #[test]
    fn handles_are_cached_per_action() {
        let mut cfg = config(&[("X", "Stick.x"), ("Y", "Stick.y")]);
        cfg.custom_params.push(custom("Mag", "glm.length(v[0])", &["Stick"]));
        let mut runtime = ReplayRuntime::idle();
        let set = resolve(&cfg, &manifest(), &mut runtime).unwrap();
        assert_eq!(runtime.handle_lookups(), 1);
        assert_eq!(set.basic[0].binding.handle, set.custom[0].bindings[0].handle);
    }

    #[test]
    fn unknown_action_is_fatal() {
        let err = plan(&config(&[("Jump", "ActionJmp")]), &manifest()).unwrap_err();
        assert_eq!(err.to_string(), "action in config not in action manifest: ActionJmp");
    }

    #[test]
    fn bare_reference_takes_manifest_type() {
        let target = ActionTarget::resolve("ActionJump", &manifest()).unwrap();
        assert_eq!(target.reference.specifier, None);
        assert_eq!(target.value_type, ValueType::Boolean);
        assert_eq!(target.output_kind, SampleKind::Bool);

        let set = plan(&config(&[("Jump", "ActionJump")]), &manifest()).unwrap();
        assert_eq!(set.basic[0].target.value_type, ValueType::Boolean);
    }

    #[test]
    fn specifier_must_match_manifest() {
        let err = plan(&config(&[("Jump", "float:ActionJump")]), &manifest()).unwrap_err();
        assert!(matches!(err, ActoscError::TypeMismatch { .. }));
    }

    #[test]
    fn unsupported_manifest_type() {
        let err = plan(&config(&[("Grip", "Grip")]), &manifest()).unwrap_err();
        assert!(matches!(err, ActoscError::UnsupportedActionType { .. }));
    }

    #[test]
    fn field_path_checked_against_type() {
        let err = plan(&config(&[("Bad", "ActionX.x")]), &manifest()).unwrap_err();
        assert_eq!(err.to_string(), "unable to resolve attributes for action: ActionX");
        let err = plan(&config(&[("Bad", "RightHand.fingerCurl")]), &manifest()).unwrap_err();
        assert!(matches!(err, ActoscError::UnresolvedAttribute(_)));
    }

    #[test]
    fn composite_basic_parameter_rejected() {
        let err = plan(&config(&[("Hand", "RightHand.position")]), &manifest()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "parameter Hand has invalid type, must be bool/float/int, found: vector3"
        );
    }

    #[test]
    fn names_must_be_unique() {
        let mut cfg = config(&[("Jump", "ActionJump")]);
        cfg.custom_params.push(custom("Jump", "v[0]", &["ActionJump"]));
        assert!(matches!(
            plan(&cfg, &manifest()).unwrap_err(),
            ActoscError::DuplicateParameter(ref n) if n == "Jump"
        ));

        let mut cfg = config(&[("Jump", "ActionJump")]);
        cfg.connected_param = Some("Jump".into());
        assert!(matches!(
            plan(&cfg, &manifest()).unwrap_err(),
            ActoscError::DuplicateParameter(_)
        ));
    }

    #[test]
    fn names_must_be_osc_segments() {
        let err = plan(&config(&[("Left Trigger", "ActionX")]), &manifest()).unwrap_err();
        assert!(matches!(err, ActoscError::InvalidParameterName(_)));
    }

    #[test]
    fn dunder_rejected_before_compiling() {
        let mut cfg = Config::default();
        cfg.custom_params
            .push(custom("Evil", "v[0].__class__", &["ActionJump"]));
        let mut runtime = ReplayRuntime::idle();
        let err = resolve(&cfg, &manifest(), &mut runtime).unwrap_err();
        assert_eq!(
            err.to_string(),
            "possibly unsafe expression in parameter Evil: v[0].__class__"
        );
        assert_eq!(runtime.handle_lookups(), 0);
    }

    #[test]
    fn compile_errors_name_the_parameter() {
        let mut cfg = Config::default();
        cfg.custom_params.push(custom("Broken", "v[0] +", &["ActionX"]));
        let err = plan(&cfg, &manifest()).unwrap_err();
        assert!(matches!(err, ActoscError::Expression { ref param, .. } if param == "Broken"));
    }

    #[test]
    fn custom_bindings_keep_declaration_order() {
        let mut cfg = Config::default();
        cfg.custom_params
            .push(custom("Speed", "v[0] + v[1]", &["float:ActionY", "float:ActionX"]));
        let set = resolve(&cfg, &manifest(), &mut ReplayRuntime::idle()).unwrap();
        let actions: Vec<_> = set.custom[0]
            .bindings
            .iter()
            .map(|b| b.target.reference.action.as_str())
            .collect();
        assert_eq!(actions, ["ActionY", "ActionX"]);
    }

    #[test]
    fn composite_inputs_allowed_in_custom_parameters() {
        let mut cfg = Config::default();
        cfg.custom_params
            .push(custom("Height", "v[0].position.y", &["RightHand"]));
        let set = resolve(&cfg, &manifest(), &mut ReplayRuntime::idle()).unwrap();
        assert_eq!(set.custom[0].bindings[0].target.output_kind, SampleKind::Pose);
    }

    #[test]
    fn max_name_len() {
        let set = resolve(&config(&[("A", "ActionX"), ("Longest", "ActionY")]), &manifest(), &mut ReplayRuntime::idle())
            .unwrap();
        assert_eq!(set.max_name_len(), 7);
        assert_eq!(ParameterSet::default().max_name_len(), 0);
    }
}
