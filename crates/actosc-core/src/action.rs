use crate::error::{ActoscError, Result};
use std::fmt;

// ---------------------------------------------------------------------------
// ValueType
// ---------------------------------------------------------------------------

/// The value shape an input action reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Boolean,
    Scalar,
    Vector2,
    Pose,
    Skeleton,
}

impl ValueType {
    pub fn all() -> &'static [ValueType] {
        &[
            ValueType::Boolean,
            ValueType::Scalar,
            ValueType::Vector2,
            ValueType::Pose,
            ValueType::Skeleton,
        ]
    }

    /// Type names as they appear in an action manifest.
    pub fn as_manifest_str(self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Scalar => "vector1",
            ValueType::Vector2 => "vector2",
            ValueType::Pose => "pose",
            ValueType::Skeleton => "skeleton",
        }
    }

    pub fn from_manifest(s: &str) -> Option<ValueType> {
        ValueType::all()
            .iter()
            .copied()
            .find(|t| t.as_manifest_str() == s)
    }

    /// Type specifiers accepted in front of an action reference
    /// (`boolean:ActionJump`, `float:Trigger`).
    pub fn from_specifier(s: &str) -> Option<ValueType> {
        match s {
            "boolean" | "bool" => Some(ValueType::Boolean),
            "vector1" | "float" | "scalar" => Some(ValueType::Scalar),
            "vector2" | "vec2" => Some(ValueType::Vector2),
            "pose" => Some(ValueType::Pose),
            "skeleton" => Some(ValueType::Skeleton),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_manifest_str())
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// A named component of a composite input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    X,
    Y,
    Z,
    W,
    Position,
    Rotation,
    Velocity,
    AngularVelocity,
    FingerCurl,
    FingerSplay,
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Field {
    pub fn parse(s: &str) -> Option<Field> {
        let field = match s {
            "x" => Field::X,
            "y" => Field::Y,
            "z" => Field::Z,
            "w" => Field::W,
            "position" => Field::Position,
            "rotation" => Field::Rotation,
            "velocity" => Field::Velocity,
            "angvelocity" | "angular_velocity" => Field::AngularVelocity,
            "fingerCurl" | "finger_curl" => Field::FingerCurl,
            "fingerSplay" | "finger_splay" => Field::FingerSplay,
            "thumb" => Field::Thumb,
            "index" => Field::Index,
            "middle" => Field::Middle,
            "ring" => Field::Ring,
            "pinky" => Field::Pinky,
            _ => return None,
        };
        Some(field)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::X => "x",
            Field::Y => "y",
            Field::Z => "z",
            Field::W => "w",
            Field::Position => "position",
            Field::Rotation => "rotation",
            Field::Velocity => "velocity",
            Field::AngularVelocity => "angvelocity",
            Field::FingerCurl => "fingerCurl",
            Field::FingerSplay => "fingerSplay",
            Field::Thumb => "thumb",
            Field::Index => "index",
            Field::Middle => "middle",
            Field::Ring => "ring",
            Field::Pinky => "pinky",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActionRef
// ---------------------------------------------------------------------------

/// A parsed action reference: `[type:]Action[.field...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRef {
    pub raw: String,
    pub specifier: Option<ValueType>,
    pub action: String,
    pub fields: Vec<Field>,
}

impl ActionRef {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| ActoscError::InvalidActionReference {
            reference: raw.to_string(),
            reason: reason.to_string(),
        };

        let (specifier, path) = match raw.split_once(':') {
            Some((spec, rest)) => {
                if rest.contains(':') {
                    return Err(invalid("more than one type specifier"));
                }
                let spec = spec.trim();
                let value_type = ValueType::from_specifier(spec).ok_or_else(|| {
                    ActoscError::InvalidTypeSpecifier {
                        reference: raw.to_string(),
                        specifier: spec.to_string(),
                    }
                })?;
                (Some(value_type), rest.trim())
            }
            None => (None, raw.trim()),
        };

        let mut parts = path.split('.');
        let action = parts.next().unwrap_or_default();
        if action.is_empty() {
            return Err(invalid("missing action name"));
        }

        let fields = parts
            .map(|part| Field::parse(part).ok_or_else(|| ActoscError::UnresolvedAttribute(raw.to_string())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: raw.to_string(),
            specifier,
            action: action.to_string(),
            fields,
        })
    }

    /// Full runtime path of the action inside `action_set`.
    pub fn action_path(&self, action_set: &str) -> String {
        format!("{}/in/{}", action_set.trim_end_matches('/'), self.action)
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_action() {
        let r = ActionRef::parse("ActionJump").unwrap();
        assert_eq!(r.action, "ActionJump");
        assert!(r.specifier.is_none());
        assert!(r.fields.is_empty());
    }

    #[test]
    fn parse_specifier_and_fields() {
        let r = ActionRef::parse("pose:RightHand.position.y").unwrap();
        assert_eq!(r.specifier, Some(ValueType::Pose));
        assert_eq!(r.action, "RightHand");
        assert_eq!(r.fields, vec![Field::Position, Field::Y]);
    }

    #[test]
    fn float_specifier_is_scalar() {
        let r = ActionRef::parse("float:ActionX").unwrap();
        assert_eq!(r.specifier, Some(ValueType::Scalar));
    }

    #[test]
    fn field_aliases() {
        let r = ActionRef::parse("LeftHand.finger_curl.index").unwrap();
        assert_eq!(r.fields, vec![Field::FingerCurl, Field::Index]);
        let r = ActionRef::parse("LeftHand.angular_velocity.x").unwrap();
        assert_eq!(r.fields, vec![Field::AngularVelocity, Field::X]);
    }

    #[test]
    fn unknown_specifier_rejected() {
        let err = ActionRef::parse("vector3:Thing").unwrap_err();
        assert!(matches!(
            err,
            ActoscError::InvalidTypeSpecifier { ref specifier, .. } if specifier == "vector3"
        ));
    }

    #[test]
    fn double_specifier_rejected() {
        let err = ActionRef::parse("boolean:float:Jump").unwrap_err();
        assert!(matches!(err, ActoscError::InvalidActionReference { .. }));
    }

    #[test]
    fn empty_action_rejected() {
        assert!(ActionRef::parse("").is_err());
        assert!(ActionRef::parse("boolean:").is_err());
        assert!(ActionRef::parse(".x").is_err());
    }

    #[test]
    fn unknown_field_names_the_reference() {
        let err = ActionRef::parse("Stick.q").unwrap_err();
        assert_eq!(err.to_string(), "unable to resolve attributes for action: Stick.q");
    }

    #[test]
    fn action_path_joins_set() {
        let r = ActionRef::parse("ActionJump").unwrap();
        assert_eq!(r.action_path("/actions/thumbparams"), "/actions/thumbparams/in/ActionJump");
        assert_eq!(r.action_path("/actions/thumbparams/"), "/actions/thumbparams/in/ActionJump");
    }

    #[test]
    fn manifest_type_names() {
        assert_eq!(ValueType::from_manifest("vector1"), Some(ValueType::Scalar));
        assert_eq!(ValueType::from_manifest("skeleton"), Some(ValueType::Skeleton));
        assert_eq!(ValueType::from_manifest("vector3"), None);
        assert_eq!(ValueType::from_manifest("float"), None);
    }
}
