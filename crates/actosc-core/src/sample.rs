//! Values read from input actions.
//!
//! Every action yields a [`Sample`]. Composite samples (poses, vectors,
//! skeletons) expose named [`Field`]s; a field path is checked against a
//! [`SampleKind`] once at startup and applied to live samples every tick.

use crate::action::{Field, ValueType};
use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector2, Vector3};
use std::fmt;

// ---------------------------------------------------------------------------
// Composite shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePose {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub velocity: Vector3<f32>,
    pub angular_velocity: Vector3<f32>,
}

impl DevicePose {
    /// Decompose a row-major 3x4 device-to-absolute transform.
    pub fn from_transform(m: &[[f32; 4]; 3], velocity: [f32; 3], angular_velocity: [f32; 3]) -> Self {
        let basis = Matrix3::from_fn(|r, c| f64::from(m[r][c]));
        // Closest rotation to the (possibly scaled) basis; a zero basis stays identity.
        let rotation = Rotation3::from_matrix_eps(&basis, 1.0e-9, 64, Rotation3::identity());
        Self {
            position: Vector3::new(m[0][3], m[1][3], m[2][3]),
            rotation: UnitQuaternion::from_rotation_matrix(&rotation).cast::<f32>(),
            velocity: Vector3::from(velocity),
            angular_velocity: Vector3::from(angular_velocity),
        }
    }
}

impl Default for DevicePose {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
        }
    }
}

/// Thumb, index, middle, ring, pinky.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FingerCurl(pub [f32; 5]);

/// Index, middle, ring, pinky.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FingerSplay(pub [f32; 4]);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandSkeleton {
    pub curl: FingerCurl,
    pub splay: FingerSplay,
}

/// Position of a non-thumb finger in a splay array (curl arrays are offset
/// by the thumb).
fn finger_slot(field: Field) -> Option<usize> {
    match field {
        Field::Index => Some(0),
        Field::Middle => Some(1),
        Field::Ring => Some(2),
        Field::Pinky => Some(3),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// SampleKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    Bool,
    Float,
    Vector2,
    Vector3,
    Quaternion,
    Pose,
    Skeleton,
    FingerCurl,
    FingerSplay,
}

impl SampleKind {
    /// Kind reached by selecting `field`, if that field exists.
    pub fn field(self, field: Field) -> Option<SampleKind> {
        let kind = match (self, field) {
            (SampleKind::Vector2, Field::X | Field::Y) => SampleKind::Float,
            (SampleKind::Vector3, Field::X | Field::Y | Field::Z) => SampleKind::Float,
            (SampleKind::Quaternion, Field::X | Field::Y | Field::Z | Field::W) => SampleKind::Float,
            (SampleKind::Pose, Field::Position | Field::Velocity | Field::AngularVelocity) => {
                SampleKind::Vector3
            }
            (SampleKind::Pose, Field::Rotation) => SampleKind::Quaternion,
            (SampleKind::Skeleton, Field::FingerCurl) => SampleKind::FingerCurl,
            (SampleKind::Skeleton, Field::FingerSplay) => SampleKind::FingerSplay,
            (SampleKind::FingerCurl, Field::Thumb) => SampleKind::Float,
            (SampleKind::FingerCurl | SampleKind::FingerSplay, f) if finger_slot(f).is_some() => {
                SampleKind::Float
            }
            _ => return None,
        };
        Some(kind)
    }

    pub fn select(self, fields: &[Field]) -> Option<SampleKind> {
        fields.iter().try_fold(self, |kind, &f| kind.field(f))
    }

    pub fn is_primitive(self) -> bool {
        matches!(self, SampleKind::Bool | SampleKind::Float)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SampleKind::Bool => "bool",
            SampleKind::Float => "float",
            SampleKind::Vector2 => "vector2",
            SampleKind::Vector3 => "vector3",
            SampleKind::Quaternion => "quaternion",
            SampleKind::Pose => "pose",
            SampleKind::Skeleton => "skeleton",
            SampleKind::FingerCurl => "finger curl",
            SampleKind::FingerSplay => "finger splay",
        }
    }
}

impl From<ValueType> for SampleKind {
    fn from(t: ValueType) -> Self {
        match t {
            ValueType::Boolean => SampleKind::Bool,
            ValueType::Scalar => SampleKind::Float,
            ValueType::Vector2 => SampleKind::Vector2,
            ValueType::Pose => SampleKind::Pose,
            ValueType::Skeleton => SampleKind::Skeleton,
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Sample
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Bool(bool),
    Float(f32),
    Vector2(Vector2<f32>),
    Vector3(Vector3<f32>),
    Quaternion(UnitQuaternion<f32>),
    Pose(DevicePose),
    Skeleton(HandSkeleton),
    FingerCurl(FingerCurl),
    FingerSplay(FingerSplay),
}

impl Sample {
    pub fn kind(&self) -> SampleKind {
        match self {
            Sample::Bool(_) => SampleKind::Bool,
            Sample::Float(_) => SampleKind::Float,
            Sample::Vector2(_) => SampleKind::Vector2,
            Sample::Vector3(_) => SampleKind::Vector3,
            Sample::Quaternion(_) => SampleKind::Quaternion,
            Sample::Pose(_) => SampleKind::Pose,
            Sample::Skeleton(_) => SampleKind::Skeleton,
            Sample::FingerCurl(_) => SampleKind::FingerCurl,
            Sample::FingerSplay(_) => SampleKind::FingerSplay,
        }
    }

    pub fn field(&self, field: Field) -> Option<Sample> {
        let sample = match (self, field) {
            (Sample::Vector2(v), Field::X) => Sample::Float(v.x),
            (Sample::Vector2(v), Field::Y) => Sample::Float(v.y),
            (Sample::Vector3(v), Field::X) => Sample::Float(v.x),
            (Sample::Vector3(v), Field::Y) => Sample::Float(v.y),
            (Sample::Vector3(v), Field::Z) => Sample::Float(v.z),
            (Sample::Quaternion(q), Field::X) => Sample::Float(q.quaternion().coords[0]),
            (Sample::Quaternion(q), Field::Y) => Sample::Float(q.quaternion().coords[1]),
            (Sample::Quaternion(q), Field::Z) => Sample::Float(q.quaternion().coords[2]),
            (Sample::Quaternion(q), Field::W) => Sample::Float(q.quaternion().coords[3]),
            (Sample::Pose(p), Field::Position) => Sample::Vector3(p.position),
            (Sample::Pose(p), Field::Rotation) => Sample::Quaternion(p.rotation),
            (Sample::Pose(p), Field::Velocity) => Sample::Vector3(p.velocity),
            (Sample::Pose(p), Field::AngularVelocity) => Sample::Vector3(p.angular_velocity),
            (Sample::Skeleton(s), Field::FingerCurl) => Sample::FingerCurl(s.curl),
            (Sample::Skeleton(s), Field::FingerSplay) => Sample::FingerSplay(s.splay),
            (Sample::FingerCurl(c), Field::Thumb) => Sample::Float(c.0[0]),
            (Sample::FingerCurl(c), f) => Sample::Float(c.0[finger_slot(f)? + 1]),
            (Sample::FingerSplay(s), f) => Sample::Float(s.0[finger_slot(f)?]),
            _ => return None,
        };
        Some(sample)
    }

    pub fn select(&self, fields: &[Field]) -> Option<Sample> {
        fields.iter().try_fold(*self, |sample, &f| sample.field(f))
    }

    /// Numeric components, for shapes that behave like a sequence of floats.
    pub fn components(&self) -> Option<Vec<f32>> {
        match self {
            Sample::Vector2(v) => Some(v.as_slice().to_vec()),
            Sample::Vector3(v) => Some(v.as_slice().to_vec()),
            Sample::Quaternion(q) => Some(q.quaternion().coords.as_slice().to_vec()),
            Sample::FingerCurl(c) => Some(c.0.to_vec()),
            Sample::FingerSplay(s) => Some(s.0.to_vec()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY_AT: [[f32; 4]; 3] = [
        [1.0, 0.0, 0.0, 0.5],
        [0.0, 1.0, 0.0, 1.5],
        [0.0, 0.0, 1.0, -2.0],
    ];

    #[test]
    fn pose_translation_from_last_column() {
        let pose = DevicePose::from_transform(&IDENTITY_AT, [0.0; 3], [0.0; 3]);
        assert_eq!(pose.position, Vector3::new(0.5, 1.5, -2.0));
        assert!(pose.rotation.angle() < 1e-6);
    }

    #[test]
    fn pose_rotation_about_y() {
        // 90 degrees about +Y
        let m = [
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0, 0.0],
        ];
        let pose = DevicePose::from_transform(&m, [0.0; 3], [0.0; 3]);
        let expected = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_2);
        assert!(pose.rotation.angle_to(&expected) < 1e-4);
    }

    #[test]
    fn kind_paths() {
        assert_eq!(
            SampleKind::Pose.select(&[Field::Position, Field::Z]),
            Some(SampleKind::Float)
        );
        assert_eq!(
            SampleKind::Skeleton.select(&[Field::FingerCurl]),
            Some(SampleKind::FingerCurl)
        );
        assert_eq!(SampleKind::Skeleton.select(&[Field::FingerSplay, Field::Thumb]), None);
        assert_eq!(SampleKind::Vector2.select(&[Field::Z]), None);
        assert_eq!(SampleKind::Bool.select(&[Field::X]), None);
        assert_eq!(SampleKind::Float.select(&[]), Some(SampleKind::Float));
    }

    #[test]
    fn sample_selection_matches_kind() {
        let skeleton = Sample::Skeleton(HandSkeleton {
            curl: FingerCurl([0.1, 0.2, 0.3, 0.4, 0.5]),
            splay: FingerSplay([0.6, 0.7, 0.8, 0.9]),
        });
        assert_eq!(
            skeleton.select(&[Field::FingerCurl, Field::Middle]),
            Some(Sample::Float(0.3))
        );
        assert_eq!(
            skeleton.select(&[Field::FingerSplay, Field::Index]),
            Some(Sample::Float(0.6))
        );
        assert_eq!(skeleton.select(&[Field::Position]), None);
    }

    #[test]
    fn quaternion_fields_are_xyzw() {
        let pose = Sample::Pose(DevicePose::default());
        assert_eq!(pose.select(&[Field::Rotation, Field::W]), Some(Sample::Float(1.0)));
        assert_eq!(pose.select(&[Field::Rotation, Field::X]), Some(Sample::Float(0.0)));
    }

    #[test]
    fn components_of_composites() {
        let v = Sample::Vector2(Vector2::new(0.25, -1.0));
        assert_eq!(v.components(), Some(vec![0.25, -1.0]));
        assert_eq!(Sample::FingerSplay(FingerSplay::default()).components().map(|c| c.len()), Some(4));
        assert!(Sample::Pose(DevicePose::default()).components().is_none());
        assert!(Sample::Bool(true).components().is_none());
    }
}
