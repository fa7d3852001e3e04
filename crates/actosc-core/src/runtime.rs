//! The seam to the VR input runtime.
//!
//! [`InputRuntime`] mirrors the small slice of a VR action API this tool
//! uses: register a manifest, look up handles, pump state once per tick and
//! query digital/analog/pose/skeletal data.

use crate::action::ValueType;
use crate::error::Result;
use crate::sample::{DevicePose, FingerCurl, FingerSplay, HandSkeleton, Sample};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionSetHandle(pub u64);

/// Raw pose data as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPose {
    /// Row-major 3x4 device-to-absolute transform.
    pub device_to_absolute: [[f32; 4]; 3],
    pub velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
}

impl Default for RawPose {
    fn default() -> Self {
        Self {
            device_to_absolute: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            ],
            velocity: [0.0; 3],
            angular_velocity: [0.0; 3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkeletalSummary {
    pub finger_curl: [f32; 5],
    pub finger_splay: [f32; 4],
}

pub trait InputRuntime {
    fn set_action_manifest(&mut self, path: &Path) -> Result<()>;

    fn action_set_handle(&mut self, name: &str) -> Result<ActionSetHandle>;

    fn action_handle(&mut self, path: &str) -> Result<ActionHandle>;

    /// Drain pending events and refresh action state for `set`.
    fn update_action_state(&mut self, set: ActionSetHandle) -> Result<()>;

    fn digital(&mut self, action: ActionHandle) -> Result<bool>;

    /// Analog axes `(x, y)`; one-dimensional actions report `y = 0`.
    fn analog(&mut self, action: ActionHandle) -> Result<(f32, f32)>;

    fn pose(&mut self, action: ActionHandle) -> Result<RawPose>;

    /// `Ok(None)` when the runtime has no skeletal data for the action.
    fn skeletal_summary(&mut self, action: ActionHandle) -> Result<Option<SkeletalSummary>>;
}

/// Read the current value of `action` as the shape `value_type` dictates.
pub fn read_sample<R: InputRuntime + ?Sized>(
    runtime: &mut R,
    action: ActionHandle,
    value_type: ValueType,
) -> Result<Sample> {
    let sample = match value_type {
        ValueType::Boolean => Sample::Bool(runtime.digital(action)?),
        ValueType::Scalar => Sample::Float(runtime.analog(action)?.0),
        ValueType::Vector2 => {
            let (x, y) = runtime.analog(action)?;
            Sample::Vector2(nalgebra::Vector2::new(x, y))
        }
        ValueType::Pose => {
            let raw = runtime.pose(action)?;
            Sample::Pose(DevicePose::from_transform(
                &raw.device_to_absolute,
                raw.velocity,
                raw.angular_velocity,
            ))
        }
        ValueType::Skeleton => {
            let summary = runtime.skeletal_summary(action)?.unwrap_or_default();
            Sample::Skeleton(HandSkeleton {
                curl: FingerCurl(summary.finger_curl),
                splay: FingerSplay(summary.finger_splay),
            })
        }
    };
    Ok(sample)
}
