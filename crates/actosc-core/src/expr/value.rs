use super::ast::BinaryOp;
use super::EvalError;
use crate::sample::Sample;
use nalgebra::{Vector2, Vector3};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// A runtime value inside an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Rc<[Value]>),
    /// A composite input value (pose, vector, skeleton, ...).
    Sample(Sample),
}

impl From<Sample> for Value {
    fn from(sample: Sample) -> Self {
        match sample {
            Sample::Bool(b) => Value::Bool(b),
            Sample::Float(f) => Value::Float(f64::from(f)),
            other => Value::Sample(other),
        }
    }
}

/// Numeric view of a value; booleans count as integers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Num::Int(i) => Value::Int(i),
            Num::Float(f) => Value::Float(f),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> String {
        match self {
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Sample(s) => s.kind().to_string(),
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::List(items) => !items.is_empty(),
            Value::Sample(_) => true,
        }
    }

    pub(crate) fn num(&self) -> Option<Num> {
        match self {
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            Value::Int(i) => Some(Num::Int(*i)),
            Value::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    /// Elements when iterated: list items, or the components of a composite.
    pub(crate) fn items(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items.to_vec()),
            Value::Sample(s) => s
                .components()
                .map(|c| c.into_iter().map(|f| Value::Float(f64::from(f))).collect()),
            _ => None,
        }
    }

    /// Float components of something vector-like (composite or list of numbers).
    pub(crate) fn floats(&self) -> Option<Vec<f64>> {
        self.items()?
            .iter()
            .map(|v| v.num().map(Num::as_f64))
            .collect()
    }

    pub(crate) fn iter_items(&self, func: &'static str) -> Result<Vec<Value>, EvalError> {
        self.items()
            .ok_or_else(|| EvalError::NotIterable(format!("{} (in {func}())", self.type_name())))
    }

    pub(crate) fn expect_f64(&self, func: &'static str) -> Result<f64, EvalError> {
        self.num().map(Num::as_f64).ok_or_else(|| EvalError::Argument {
            func,
            expected: "a number",
            found: self.type_name(),
        })
    }

    /// Python-style ordering between numbers.
    pub(crate) fn compare(&self, other: &Value, op: &'static str) -> Result<Ordering, EvalError> {
        let mismatch = || EvalError::Operands {
            op,
            left: self.type_name(),
            right: other.type_name(),
        };
        let (a, b) = match (self.num(), other.num()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(mismatch()),
        };
        let ord = match (a, b) {
            (Num::Int(a), Num::Int(b)) => a.cmp(&b),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()).ok_or_else(mismatch)?,
        };
        Ok(ord)
    }

    fn equals(&self, other: &Value) -> bool {
        match (self.num(), other.num()) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
            (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
            _ => self == other,
        }
    }

    // -----------------------------------------------------------------------
    // Operators
    // -----------------------------------------------------------------------

    pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
        match op {
            BinaryOp::Eq => return Ok(Value::Bool(left.equals(right))),
            BinaryOp::Ne => return Ok(Value::Bool(!left.equals(right))),
            BinaryOp::Lt => return Ok(Value::Bool(left.compare(right, "<")?.is_lt())),
            BinaryOp::Le => return Ok(Value::Bool(left.compare(right, "<=")?.is_le())),
            BinaryOp::Gt => return Ok(Value::Bool(left.compare(right, ">")?.is_gt())),
            BinaryOp::Ge => return Ok(Value::Bool(left.compare(right, ">=")?.is_ge())),
            _ => {}
        }

        if let Some(v) = vector_arith(op, left, right)? {
            return Ok(v);
        }

        let (a, b) = match (left.num(), right.num()) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(EvalError::Operands {
                    op: op.symbol(),
                    left: left.type_name(),
                    right: right.type_name(),
                })
            }
        };
        arith(op, a, b).map(Num::into_value)
    }

    pub fn negate(&self) -> Result<Value, EvalError> {
        match self {
            Value::Sample(Sample::Vector2(v)) => Ok(Value::Sample(Sample::Vector2(-v))),
            Value::Sample(Sample::Vector3(v)) => Ok(Value::Sample(Sample::Vector3(-v))),
            other => match other.num() {
                Some(Num::Int(i)) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
                Some(Num::Float(f)) => Ok(Value::Float(-f)),
                None => Err(EvalError::Operand {
                    op: "unary -",
                    found: other.type_name(),
                }),
            },
        }
    }

    pub fn positive(&self) -> Result<Value, EvalError> {
        match self {
            Value::Sample(Sample::Vector2(_) | Sample::Vector3(_)) => Ok(self.clone()),
            other => other.num().map(Num::into_value).ok_or_else(|| EvalError::Operand {
                op: "unary +",
                found: other.type_name(),
            }),
        }
    }

    pub fn index(&self, index: &Value) -> Result<Value, EvalError> {
        let i = match index {
            Value::Int(i) => *i,
            Value::Bool(b) => i64::from(*b),
            other => {
                return Err(EvalError::Operand {
                    op: "index",
                    found: other.type_name(),
                })
            }
        };
        let items = self
            .items()
            .ok_or_else(|| EvalError::NotIndexable(self.type_name()))?;
        let len = items.len();
        let resolved = if i < 0 { i + len as i64 } else { i };
        usize::try_from(resolved)
            .ok()
            .and_then(|r| items.get(r).cloned())
            .ok_or(EvalError::IndexOutOfRange { index: i, len })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Sample(s) => write!(f, "<{}>", s.kind()),
        }
    }
}

// ---------------------------------------------------------------------------
// Arithmetic helpers
// ---------------------------------------------------------------------------

fn arith(op: BinaryOp, a: Num, b: Num) -> Result<Num, EvalError> {
    match (a, b) {
        (Num::Int(a), Num::Int(b)) => int_arith(op, a, b),
        (a, b) => float_arith(op, a.as_f64(), b.as_f64()),
    }
}

fn int_arith(op: BinaryOp, a: i64, b: i64) -> Result<Num, EvalError> {
    let checked = |r: Option<i64>| r.map(Num::Int).ok_or(EvalError::Overflow);
    match op {
        BinaryOp::Add => checked(a.checked_add(b)),
        BinaryOp::Sub => checked(a.checked_sub(b)),
        BinaryOp::Mul => checked(a.checked_mul(b)),
        BinaryOp::Div => float_arith(op, a as f64, b as f64),
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let q = a.checked_div(b).ok_or(EvalError::Overflow)?;
            let floored = if a % b != 0 && ((a < 0) != (b < 0)) { q - 1 } else { q };
            Ok(Num::Int(floored))
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let m = a.checked_rem(b).ok_or(EvalError::Overflow)?;
            Ok(Num::Int(if m != 0 && ((m < 0) != (b < 0)) { m + b } else { m }))
        }
        BinaryOp::Pow => {
            if b < 0 {
                return float_arith(op, a as f64, b as f64);
            }
            let exp = u32::try_from(b).map_err(|_| EvalError::Overflow)?;
            checked(a.checked_pow(exp))
        }
        _ => unreachable!("comparison operators are handled before arithmetic"),
    }
}

fn float_arith(op: BinaryOp, a: f64, b: f64) -> Result<Num, EvalError> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let m = a % b;
            if m != 0.0 && ((m < 0.0) != (b < 0.0)) {
                m + b
            } else {
                m
            }
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = a.powf(b);
            if r.is_nan() && !a.is_nan() && !b.is_nan() {
                return Err(EvalError::Domain("**"));
            }
            r
        }
        _ => unreachable!("comparison operators are handled before arithmetic"),
    };
    Ok(Num::Float(result))
}

/// Element-wise vector arithmetic: vector ± vector, vector ± scalar either
/// way round, vector * scalar, scalar * vector, vector / scalar. `None` when
/// neither side is a vector.
fn vector_arith(op: BinaryOp, left: &Value, right: &Value) -> Result<Option<Value>, EvalError> {
    let mismatch = || EvalError::Operands {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    };
    let scalar = |v: &Value| v.num().map(|n| n.as_f64() as f32);

    let result = match (left, right) {
        (Value::Sample(Sample::Vector2(a)), Value::Sample(Sample::Vector2(b))) => match op {
            BinaryOp::Add => Sample::Vector2(a + b),
            BinaryOp::Sub => Sample::Vector2(a - b),
            _ => return Err(mismatch()),
        },
        (Value::Sample(Sample::Vector3(a)), Value::Sample(Sample::Vector3(b))) => match op {
            BinaryOp::Add => Sample::Vector3(a + b),
            BinaryOp::Sub => Sample::Vector3(a - b),
            _ => return Err(mismatch()),
        },
        (Value::Sample(Sample::Vector2(a)), other) | (other, Value::Sample(Sample::Vector2(a))) => {
            let s = scalar(other).ok_or_else(mismatch)?;
            Sample::Vector2(scale2(op, *a, s, matches!(left, Value::Sample(_)))?.ok_or_else(mismatch)?)
        }
        (Value::Sample(Sample::Vector3(a)), other) | (other, Value::Sample(Sample::Vector3(a))) => {
            let s = scalar(other).ok_or_else(mismatch)?;
            Sample::Vector3(scale3(op, *a, s, matches!(left, Value::Sample(_)))?.ok_or_else(mismatch)?)
        }
        _ => return Ok(None),
    };
    Ok(Some(Value::Sample(result)))
}

fn scale2(op: BinaryOp, v: Vector2<f32>, s: f32, vector_left: bool) -> Result<Option<Vector2<f32>>, EvalError> {
    Ok(match op {
        BinaryOp::Add => Some(v.add_scalar(s)),
        BinaryOp::Sub if vector_left => Some(v.add_scalar(-s)),
        BinaryOp::Sub => Some(v.map(|x| s - x)),
        BinaryOp::Mul => Some(v * s),
        BinaryOp::Div if vector_left => {
            if s == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Some(v / s)
        }
        _ => None,
    })
}

fn scale3(op: BinaryOp, v: Vector3<f32>, s: f32, vector_left: bool) -> Result<Option<Vector3<f32>>, EvalError> {
    Ok(match op {
        BinaryOp::Add => Some(v.add_scalar(s)),
        BinaryOp::Sub if vector_left => Some(v.add_scalar(-s)),
        BinaryOp::Sub => Some(v.map(|x| s - x)),
        BinaryOp::Mul => Some(v * s),
        BinaryOp::Div if vector_left => {
            if s == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Some(v / s)
        }
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
