use crate::error::Result;
use crate::runtime::{ActionHandle, ActionSetHandle, InputRuntime, RawPose, SkeletalSummary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Frame file format
// ---------------------------------------------------------------------------

/// One recorded action value. `null` in a frame means "no data".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameValue {
    Bool(bool),
    Number(f32),
    Axes([f32; 2]),
    Pose {
        matrix: [[f32; 4]; 3],
        #[serde(default)]
        velocity: [f32; 3],
        #[serde(default)]
        angular_velocity: [f32; 3],
    },
    Skeleton {
        curl: [f32; 5],
        #[serde(default)]
        splay: [f32; 4],
    },
}

/// Action short name → value for a single tick.
pub type Frame = HashMap<String, Option<FrameValue>>;

// ---------------------------------------------------------------------------
// ReplayRuntime
// ---------------------------------------------------------------------------

/// An [`InputRuntime`] that plays back recorded frames, one per
/// `update_action_state`, looping at the end.
#[derive(Debug, Default)]
pub struct ReplayRuntime {
    frames: Vec<Frame>,
    next: usize,
    current: Option<usize>,
    actions: Vec<String>,
    action_sets: Vec<String>,
    manifest: Option<PathBuf>,
    handle_lookups: usize,
}

impl ReplayRuntime {
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    /// No frames: every action reads released, zeroed or without data.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let frames: Vec<Frame> = serde_yaml::from_str(&data)?;
        Ok(Self::from_frames(frames))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Manifest registered through `set_action_manifest`.
    pub fn manifest(&self) -> Option<&Path> {
        self.manifest.as_deref()
    }

    /// Number of `action_handle` calls made so far.
    pub fn handle_lookups(&self) -> usize {
        self.handle_lookups
    }

    fn value(&self, action: ActionHandle) -> Option<&FrameValue> {
        let frame = self.frames.get(self.current?)?;
        let index = usize::try_from(action.0).ok()?.checked_sub(1)?;
        let name = self.actions.get(index)?;
        frame.get(name)?.as_ref()
    }
}

impl InputRuntime for ReplayRuntime {
    fn set_action_manifest(&mut self, path: &Path) -> Result<()> {
        self.manifest = Some(path.to_path_buf());
        Ok(())
    }

    fn action_set_handle(&mut self, name: &str) -> Result<ActionSetHandle> {
        let index = match self.action_sets.iter().position(|s| s == name) {
            Some(i) => i,
            None => {
                self.action_sets.push(name.to_string());
                self.action_sets.len() - 1
            }
        };
        Ok(ActionSetHandle(index as u64 + 1))
    }

    fn action_handle(&mut self, path: &str) -> Result<ActionHandle> {
        self.handle_lookups += 1;
        let name = path.rsplit('/').next().unwrap_or(path);
        let index = match self.actions.iter().position(|a| a == name) {
            Some(i) => i,
            None => {
                self.actions.push(name.to_string());
                self.actions.len() - 1
            }
        };
        Ok(ActionHandle(index as u64 + 1))
    }

    fn update_action_state(&mut self, _set: ActionSetHandle) -> Result<()> {
        if self.frames.is_empty() {
            return Ok(());
        }
        self.current = Some(self.next);
        self.next = (self.next + 1) % self.frames.len();
        Ok(())
    }

    fn digital(&mut self, action: ActionHandle) -> Result<bool> {
        Ok(match self.value(action) {
            Some(FrameValue::Bool(b)) => *b,
            Some(FrameValue::Number(n)) => *n != 0.0,
            _ => false,
        })
    }

    fn analog(&mut self, action: ActionHandle) -> Result<(f32, f32)> {
        Ok(match self.value(action) {
            Some(FrameValue::Number(n)) => (*n, 0.0),
            Some(FrameValue::Axes([x, y])) => (*x, *y),
            Some(FrameValue::Bool(b)) => (if *b { 1.0 } else { 0.0 }, 0.0),
            _ => (0.0, 0.0),
        })
    }

    fn pose(&mut self, action: ActionHandle) -> Result<RawPose> {
        Ok(match self.value(action) {
            Some(FrameValue::Pose {
                matrix,
                velocity,
                angular_velocity,
            }) => RawPose {
                device_to_absolute: *matrix,
                velocity: *velocity,
                angular_velocity: *angular_velocity,
            },
            _ => RawPose::default(),
        })
    }

    fn skeletal_summary(&mut self, action: ActionHandle) -> Result<Option<SkeletalSummary>> {
        Ok(match self.value(action) {
            Some(FrameValue::Skeleton { curl, splay }) => Some(SkeletalSummary {
                finger_curl: *curl,
                finger_splay: *splay,
            }),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
