use crate::expr::{EvalError, ParseError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActoscError {
    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("action manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("action in config not in action manifest: {0}")]
    UnknownAction(String),

    #[error("invalid action reference '{reference}': {reason}")]
    InvalidActionReference { reference: String, reason: String },

    #[error("unknown type specifier '{specifier}' in action reference '{reference}'")]
    InvalidTypeSpecifier { reference: String, specifier: String },

    #[error("action reference '{reference}' declares type {declared} but the manifest says {manifest}")]
    TypeMismatch {
        reference: String,
        declared: String,
        manifest: String,
    },

    #[error("action '{action}' has unsupported type '{kind}'")]
    UnsupportedActionType { action: String, kind: String },

    #[error("unable to resolve attributes for action: {0}")]
    UnresolvedAttribute(String),

    #[error("invalid parameter name '{0}': must be a non-empty OSC address segment")]
    InvalidParameterName(String),

    #[error("parameter declared more than once: {0}")]
    DuplicateParameter(String),

    #[error("possibly unsafe expression in parameter {param}: {expression}")]
    UnsafeExpression { param: String, expression: String },

    #[error("failed to compile expression for parameter {param}: {error}")]
    Expression { param: String, error: ParseError },

    #[error("failed to evaluate expression for parameter {param}: {error}")]
    Evaluation { param: String, error: EvalError },

    #[error("parameter {param} has invalid type, must be bool/float/int, found: {found}")]
    InvalidOutputType { param: String, found: String },

    #[error("parameter {param} produced integer {value}, which does not fit an OSC int32")]
    IntegerOutOfRange { param: String, value: i64 },

    #[error("input runtime error: {0}")]
    Runtime(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ActoscError>;
