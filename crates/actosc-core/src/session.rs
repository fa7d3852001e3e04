use crate::config::Config;
use crate::dispatch::{OscSink, OscValue, OutputMessage};
use crate::error::{ActoscError, Result};
use crate::expr::Value;
use crate::manifest::ActionManifest;
use crate::resolver::{self, CustomParameter, ParameterSet};
use crate::runtime::{ActionSetHandle, InputRuntime};
use std::path::Path;
use tracing::info;

/// Everything one forwarding run needs: the input runtime, the resolved
/// parameters and the output sink.
pub struct Session<R: InputRuntime, S: OscSink> {
    runtime: R,
    parameters: ParameterSet,
    action_set: ActionSetHandle,
    connected_param: Option<String>,
    sink: S,
    ticks: u64,
}

impl<R: InputRuntime, S: OscSink> Session<R, S> {
    /// Load the manifest, resolve every parameter, register with the runtime
    /// and only then build the sink. Any configuration problem fails here,
    /// before a handle is acquired or a socket is opened.
    pub fn start<F>(config: &Config, manifest_path: &Path, mut runtime: R, make_sink: F) -> Result<Self>
    where
        F: FnOnce(&Config) -> Result<S>,
    {
        let manifest = ActionManifest::load(manifest_path)?;
        let plan = resolver::plan(config, &manifest)?;

        runtime.set_action_manifest(manifest_path)?;
        let action_set = runtime.action_set_handle(&config.action_set)?;
        let parameters = plan.bind(&mut runtime, &config.action_set)?;
        let sink = make_sink(config)?;

        info!(
            basic = parameters.basic.len(),
            custom = parameters.custom.len(),
            action_set = %config.action_set,
            "session started"
        );
        Ok(Self {
            runtime,
            parameters,
            action_set,
            connected_param: config.connected_param.clone(),
            sink,
            ticks: 0,
        })
    }

    /// Refresh input state, compute every parameter and hand the messages to
    /// the sink. The connected flag, when configured, comes first.
    pub fn tick(&mut self) -> Result<Vec<OutputMessage>> {
        self.runtime.update_action_state(self.action_set)?;

        let capacity = self.parameters.basic.len() + self.parameters.custom.len() + 1;
        let mut messages = Vec::with_capacity(capacity);
        if let Some(name) = &self.connected_param {
            messages.push(OutputMessage::new(name.as_str(), OscValue::Bool(true)));
        }
        for param in &self.parameters.basic {
            let sample = param.binding.read(&mut self.runtime)?;
            let value = OscValue::from_sample(&param.name, &sample)?;
            messages.push(OutputMessage::new(param.name.as_str(), value));
        }
        for param in &self.parameters.custom {
            let value = evaluate(param, &mut self.runtime)?;
            let value = OscValue::from_value(&param.name, &value)?;
            messages.push(OutputMessage::new(param.name.as_str(), value));
        }

        self.sink.send(&messages);
        self.ticks += 1;
        Ok(messages)
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl<R: InputRuntime, S: OscSink> Drop for Session<R, S> {
    fn drop(&mut self) {
        info!(ticks = self.ticks, "session stopped");
    }
}

/// Read a custom parameter's inputs in declaration order and evaluate its
/// expression over them.
pub fn evaluate<R: InputRuntime + ?Sized>(param: &CustomParameter, runtime: &mut R) -> Result<Value> {
    let inputs = param
        .bindings
        .iter()
        .map(|binding| binding.read(runtime))
        .collect::<Result<Vec<_>>>()?;
    param
        .expression
        .evaluate(&inputs)
        .map_err(|error| ActoscError::Evaluation {
            param: param.name.clone(),
            error,
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CustomParamConfig;
    use crate::dispatch::MemorySink;
    use crate::replay::{Frame, FrameValue, ReplayRuntime};
    use tempfile::TempDir;

    fn write_starter_manifest(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("action_manifest.json");
        ActionManifest::starter("/actions/thumbparams").save(&path).unwrap();
        path
    }

    fn frame(values: &[(&str, FrameValue)]) -> Frame {
        values
            .iter()
            .map(|(k, v)| (k.to_string(), Some(v.clone())))
            .collect()
    }

    fn memory(_: &Config) -> Result<MemorySink> {
        Ok(MemorySink::default())
    }

    #[test]
    fn connected_flag_first_then_declaration_order() {
        let dir = TempDir::new().unwrap();
        let manifest = write_starter_manifest(&dir);
        let runtime = ReplayRuntime::from_frames(vec![frame(&[
            ("LeftTrigger", FrameValue::Number(0.25)),
            ("RightTrigger", FrameValue::Number(0.5)),
            ("RightStick", FrameValue::Axes([-0.5, 1.0])),
            ("ActionJump", FrameValue::Bool(true)),
        ])]);

        let mut session = Session::start(&Config::starter(), &manifest, runtime, memory).unwrap();
        let messages = session.tick().unwrap();
        let names: Vec<_> = messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            ["ControllersConnected", "LeftTrigger", "RightStickX", "JumpPressed", "TriggerSum", "LeftFist"]
        );
        assert_eq!(messages[0].value, OscValue::Bool(true));
        assert_eq!(messages[1].value, OscValue::Float(0.25));
        assert_eq!(messages[2].value, OscValue::Float(-0.5));
        assert_eq!(messages[3].value, OscValue::Bool(true));
        assert_eq!(messages[4].value, OscValue::Float(0.75));
        // no skeletal data reads as an open hand
        assert_eq!(messages[5].value, OscValue::Bool(false));
        assert_eq!(session.sink().batches.len(), 1);
        assert_eq!(session.ticks(), 1);
        assert_eq!(session.runtime().manifest(), Some(manifest.as_path()));
    }

    #[test]
    fn evaluation_errors_name_the_parameter() {
        let dir = TempDir::new().unwrap();
        let manifest = write_starter_manifest(&dir);
        let mut config = Config::default();
        config.custom_params.push(CustomParamConfig {
            name: "Ratio".to_string(),
            expression: "v[0] / v[1]".to_string(),
            actions: vec!["LeftTrigger".to_string(), "RightTrigger".to_string()],
        });

        let mut session = Session::start(&config, &manifest, ReplayRuntime::idle(), memory).unwrap();
        let err = session.tick().unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to evaluate expression for parameter Ratio: division by zero"
        );
        assert!(session.sink().batches.is_empty());
    }

    #[test]
    fn composite_expression_result_is_fatal() {
        let dir = TempDir::new().unwrap();
        let manifest = write_starter_manifest(&dir);
        let mut config = Config::default();
        config.custom_params.push(CustomParamConfig {
            name: "Hand".to_string(),
            expression: "v[0].position".to_string(),
            actions: vec!["RightHandPose".to_string()],
        });

        let mut session = Session::start(&config, &manifest, ReplayRuntime::idle(), memory).unwrap();
        let err = session.tick().unwrap_err();
        assert!(matches!(
            err,
            ActoscError::InvalidOutputType { ref param, ref found } if param == "Hand" && found == "vector3"
        ));
    }

    #[test]
    fn sink_is_not_built_when_resolution_fails() {
        let dir = TempDir::new().unwrap();
        let manifest = write_starter_manifest(&dir);
        let mut config = Config::default();
        config.params.insert("Missing".into(), "NoSuchAction".into());

        let mut built = false;
        let result = Session::start(&config, &manifest, ReplayRuntime::idle(), |_| {
            built = true;
            Ok(MemorySink::default())
        });
        assert!(matches!(result, Err(ActoscError::UnknownAction(_))));
        assert!(!built);
    }

    #[test]
    fn missing_manifest_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = Session::start(
            &Config::default(),
            &dir.path().join("nope.json"),
            ReplayRuntime::idle(),
            memory,
        );
        assert!(matches!(result, Err(ActoscError::ManifestNotFound(_))));
    }
}
