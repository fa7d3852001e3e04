//! Custom parameter expressions.
//!
//! A small Python-flavoured language over the input sequence `v`. Source is
//! compiled once into a resolved tree: every name, field and function is bound
//! at compile time, and anything not in the builtin table is a compile error.

pub mod ast;
pub mod builtins;
mod eval;
pub mod lexer;
mod parser;
pub mod value;

pub use value::Value;

use crate::sample::Sample;
use ast::Expr;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unrecognised character at offset {offset}")]
    InvalidToken { offset: usize },

    #[error("expected {expected}, found '{found}' at offset {offset}")]
    Unexpected {
        expected: &'static str,
        found: String,
        offset: usize,
    },

    #[error("expected {expected}, found end of expression")]
    UnexpectedEnd { expected: &'static str },

    #[error("unknown name: {0}")]
    UnknownName(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("{name}() takes {expected} argument(s), {found} given")]
    Arity {
        name: &'static str,
        expected: String,
        found: usize,
    },

    #[error("empty expression")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unsupported operand types for {op}: {left} and {right}")]
    Operands {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("bad operand type for {op}: {found}")]
    Operand { op: &'static str, found: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric overflow")]
    Overflow,

    #[error("math domain error in {0}")]
    Domain(&'static str),

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("{found} has no field {field}")]
    NoField { field: &'static str, found: String },

    #[error("{0} is not indexable")]
    NotIndexable(String),

    #[error("{0} is not iterable")]
    NotIterable(String),

    #[error("{0}() of an empty sequence")]
    EmptySequence(&'static str),

    #[error("{func}() expects {expected}, found {found}")]
    Argument {
        func: &'static str,
        expected: &'static str,
        found: String,
    },
}

/// A compiled expression.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    pub fn compile(source: &str) -> Result<Self, ParseError> {
        let root = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// Evaluate against the current input values, in binding order.
    pub fn evaluate(&self, inputs: &[Sample]) -> Result<Value, EvalError> {
        let inputs: Rc<[Value]> = inputs.iter().copied().map(Value::from).collect();
        eval::eval(&self.root, &inputs)
    }

    /// Whether the expression refers to `v` at all.
    pub fn reads_inputs(&self) -> bool {
        self.root.reads_inputs()
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{FingerCurl, FingerSplay, HandSkeleton};
    use nalgebra::{Vector2, Vector3};

    fn run(src: &str, inputs: &[Sample]) -> Result<Value, EvalError> {
        Expression::compile(src).unwrap().evaluate(inputs)
    }

    fn float(value: Result<Value, EvalError>) -> f64 {
        match value {
            Ok(Value::Float(f)) => f,
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn speed_from_stick() {
        let stick = Sample::Vector2(Vector2::new(0.6, 0.8));
        let speed = float(run("(v[0].x ** 2 + v[0].y ** 2) ** 0.5", &[stick]));
        assert!((speed - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sums_scalars_like_python() {
        let out = float(run("v[0] + v[1]", &[Sample::Float(0.3), Sample::Float(0.4)]));
        assert!((out - 0.7).abs() < 1e-6);
    }

    #[test]
    fn booleans_and_short_circuit() {
        let inputs = [Sample::Bool(true), Sample::Bool(false)];
        assert_eq!(run("v[0] and v[1]", &inputs), Ok(Value::Bool(false)));
        assert_eq!(run("v[1] or 3", &inputs), Ok(Value::Int(3)));
        // right side is never evaluated
        assert_eq!(run("v[1] and v[5]", &inputs), Ok(Value::Bool(false)));
        assert_eq!(run("v[0] + v[0]", &inputs), Ok(Value::Int(2)));
    }

    #[test]
    fn conditional_picks_a_branch() {
        let inputs = [Sample::Float(0.9)];
        assert_eq!(run("1 if v[0] > 0.5 else 0", &inputs), Ok(Value::Int(1)));
        assert_eq!(run("1 if v[0] > 0.95 else 0", &inputs), Ok(Value::Int(0)));
    }

    #[test]
    fn range_test_chains_comparisons() {
        let range = Expression::compile("0.2 < v[0] < 0.8").unwrap();
        assert_eq!(range.evaluate(&[Sample::Float(0.5)]), Ok(Value::Bool(true)));
        assert_eq!(range.evaluate(&[Sample::Float(0.9)]), Ok(Value::Bool(false)));
        assert_eq!(range.evaluate(&[Sample::Float(0.1)]), Ok(Value::Bool(false)));
        // a false link stops the chain before later operands are evaluated
        assert_eq!(run("1 > 2 < v[5]", &[]), Ok(Value::Bool(false)));
        assert_eq!(run("1 < 2 == 2 != 3", &[]), Ok(Value::Bool(true)));
    }

    #[test]
    fn skeleton_fields() {
        let skeleton = Sample::Skeleton(HandSkeleton {
            curl: FingerCurl([0.9, 0.5, 0.85, 0.95, 1.0]),
            splay: FingerSplay([0.1, 0.2, 0.3, 0.4]),
        });
        assert_eq!(run("min(v[0].fingerCurl) > 0.8", &[skeleton]), Ok(Value::Bool(false)));
        let index = float(run("v[0].fingerCurl.index", &[skeleton]));
        assert!((index - 0.5).abs() < 1e-6);
        let thumb = float(run("v[-1].fingerCurl[0]", &[skeleton]));
        assert!((thumb - 0.9).abs() < 1e-6);
        assert_eq!(run("len(v[0].fingerSplay)", &[skeleton]), Ok(Value::Int(4)));
    }

    #[test]
    fn vector_math() {
        let a = Sample::Vector3(Vector3::new(1.0, 2.0, 2.0));
        let b = Sample::Vector3(Vector3::new(1.0, 0.0, 0.0));
        let length = float(run("glm.length(v[0] - v[1])", &[a, b]));
        assert!((length - 8f64.sqrt()).abs() < 1e-6);
        assert_eq!(run("len(v)", &[a, b]), Ok(Value::Int(2)));
    }

    #[test]
    fn evaluation_errors() {
        assert_eq!(run("v[0] / 0", &[Sample::Float(1.0)]), Err(EvalError::DivisionByZero));
        assert_eq!(
            run("v[2]", &[Sample::Float(1.0)]),
            Err(EvalError::IndexOutOfRange { index: 2, len: 1 })
        );
        assert_eq!(
            run("v[0].x", &[Sample::Float(1.0)]),
            Err(EvalError::NoField {
                field: "x",
                found: "float".into()
            })
        );
        assert!(matches!(
            run("v[0] + 1", &[Sample::Vector2(Vector2::new(0.0, 0.0))]),
            Err(EvalError::Operands { op: "+", .. })
        ));
    }

    #[test]
    fn reads_inputs() {
        assert!(Expression::compile("v[0] * 2").unwrap().reads_inputs());
        assert!(!Expression::compile("math.pi / 2").unwrap().reads_inputs());
    }

    #[test]
    fn compile_errors_are_reported() {
        assert!(matches!(
            Expression::compile("v[0].__class__"),
            Err(ParseError::UnknownField(_))
        ));
        assert_eq!(
            Expression::compile("__import__('os')").unwrap_err(),
            ParseError::InvalidToken { offset: 11 }
        );
        assert_eq!(
            Expression::compile("exec(v)").unwrap_err().to_string(),
            "unknown name: exec"
        );
    }

    #[test]
    fn constants() {
        let tau = float(run("math.tau / 2", &[]));
        assert!((tau - std::f64::consts::PI).abs() < 1e-12);
        assert_eq!(run("round(math.e)", &[]), Ok(Value::Int(3)));
    }
}
