//! Functions and constants reachable from expressions.
//!
//! Everything an expression can call is listed here; there is no dynamic
//! lookup, so nothing outside this table is reachable.

use super::ast::BinaryOp;
use super::value::{Num, Value};
use super::EvalError;
use crate::sample::Sample;
use nalgebra::{UnitQuaternion, Vector2, Vector3};
use std::cmp::Ordering;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    // Plain builtins
    Abs,
    All,
    Any,
    Bool,
    Divmod,
    Float,
    Int,
    Len,
    Max,
    Min,
    Pow,
    Round,
    Sum,
    // math.*
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Exp,
    Log,
    Log10,
    Floor,
    Ceil,
    Hypot,
    Degrees,
    Radians,
    Fabs,
    MathPow,
    // np.*
    NpAbs,
    Clip,
    Sign,
    Interp,
    Mean,
    NpMin,
    NpMax,
    NpSum,
    NpSqrt,
    NpFloor,
    NpCeil,
    // glm.*
    Length,
    Dot,
    Distance,
    Clamp,
    Mix,
    Normalize,
    Cross,
    EulerAngles,
    Angle,
}

/// Module-style prefixes accepted before a dot.
pub const NAMESPACES: &[&str] = &["math", "np", "glm"];

/// Resolve `name`, optionally qualified by `namespace`.
pub fn lookup(namespace: Option<&str>, name: &str) -> Option<Builtin> {
    let builtin = match (namespace, name) {
        (None, "abs") => Builtin::Abs,
        (None, "all") => Builtin::All,
        (None, "any") => Builtin::Any,
        (None, "divmod") => Builtin::Divmod,
        (None, "bool") => Builtin::Bool,
        (None, "float") => Builtin::Float,
        (None, "int") => Builtin::Int,
        (None, "len") => Builtin::Len,
        (None, "max") => Builtin::Max,
        (None, "min") => Builtin::Min,
        (None, "pow") => Builtin::Pow,
        (None, "round") => Builtin::Round,
        (None, "sum") => Builtin::Sum,

        (Some("math"), "sqrt") => Builtin::Sqrt,
        (Some("math"), "sin") => Builtin::Sin,
        (Some("math"), "cos") => Builtin::Cos,
        (Some("math"), "tan") => Builtin::Tan,
        (Some("math"), "asin") => Builtin::Asin,
        (Some("math"), "acos") => Builtin::Acos,
        (Some("math"), "atan") => Builtin::Atan,
        (Some("math"), "atan2") => Builtin::Atan2,
        (Some("math"), "exp") => Builtin::Exp,
        (Some("math"), "log") => Builtin::Log,
        (Some("math"), "log10") => Builtin::Log10,
        (Some("math"), "floor") => Builtin::Floor,
        (Some("math"), "ceil") => Builtin::Ceil,
        (Some("math"), "hypot") => Builtin::Hypot,
        (Some("math"), "degrees") => Builtin::Degrees,
        (Some("math"), "radians") => Builtin::Radians,
        (Some("math"), "fabs") => Builtin::Fabs,
        (Some("math"), "pow") => Builtin::MathPow,

        (Some("np"), "abs") => Builtin::NpAbs,
        (Some("np"), "clip") => Builtin::Clip,
        (Some("np"), "sign") => Builtin::Sign,
        (Some("np"), "interp") => Builtin::Interp,
        (Some("np"), "mean") => Builtin::Mean,
        (Some("np"), "min") => Builtin::NpMin,
        (Some("np"), "max") => Builtin::NpMax,
        (Some("np"), "sum") => Builtin::NpSum,
        (Some("np"), "sqrt") => Builtin::NpSqrt,
        (Some("np"), "floor") => Builtin::NpFloor,
        (Some("np"), "ceil") => Builtin::NpCeil,

        (Some("glm"), "length") => Builtin::Length,
        (Some("glm"), "dot") => Builtin::Dot,
        (Some("glm"), "distance") => Builtin::Distance,
        (Some("glm"), "clamp") => Builtin::Clamp,
        (Some("glm"), "mix") => Builtin::Mix,
        (Some("glm"), "normalize") => Builtin::Normalize,
        (Some("glm"), "cross") => Builtin::Cross,
        (Some("glm"), "eulerAngles") => Builtin::EulerAngles,
        (Some("glm"), "angle") => Builtin::Angle,
        _ => return None,
    };
    Some(builtin)
}

/// Named constants such as `math.pi`.
pub fn constant(namespace: &str, name: &str) -> Option<f64> {
    use std::f64::consts;
    match (namespace, name) {
        ("math" | "np", "pi") => Some(consts::PI),
        ("math" | "np", "e") => Some(consts::E),
        ("math", "tau") => Some(consts::TAU),
        _ => None,
    }
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Abs => "abs",
            Builtin::All => "all",
            Builtin::Any => "any",
            Builtin::Divmod => "divmod",
            Builtin::Bool => "bool",
            Builtin::Float => "float",
            Builtin::Int => "int",
            Builtin::Len => "len",
            Builtin::Max => "max",
            Builtin::Min => "min",
            Builtin::Pow => "pow",
            Builtin::Round => "round",
            Builtin::Sum => "sum",
            Builtin::Sqrt => "math.sqrt",
            Builtin::Sin => "math.sin",
            Builtin::Cos => "math.cos",
            Builtin::Tan => "math.tan",
            Builtin::Asin => "math.asin",
            Builtin::Acos => "math.acos",
            Builtin::Atan => "math.atan",
            Builtin::Atan2 => "math.atan2",
            Builtin::Exp => "math.exp",
            Builtin::Log => "math.log",
            Builtin::Log10 => "math.log10",
            Builtin::Floor => "math.floor",
            Builtin::Ceil => "math.ceil",
            Builtin::Hypot => "math.hypot",
            Builtin::Degrees => "math.degrees",
            Builtin::Radians => "math.radians",
            Builtin::Fabs => "math.fabs",
            Builtin::MathPow => "math.pow",
            Builtin::NpAbs => "np.abs",
            Builtin::Clip => "np.clip",
            Builtin::Sign => "np.sign",
            Builtin::Interp => "np.interp",
            Builtin::Mean => "np.mean",
            Builtin::NpMin => "np.min",
            Builtin::NpMax => "np.max",
            Builtin::NpSum => "np.sum",
            Builtin::NpSqrt => "np.sqrt",
            Builtin::NpFloor => "np.floor",
            Builtin::NpCeil => "np.ceil",
            Builtin::Length => "glm.length",
            Builtin::Dot => "glm.dot",
            Builtin::Distance => "glm.distance",
            Builtin::Clamp => "glm.clamp",
            Builtin::Mix => "glm.mix",
            Builtin::Normalize => "glm.normalize",
            Builtin::Cross => "glm.cross",
            Builtin::EulerAngles => "glm.eulerAngles",
            Builtin::Angle => "glm.angle",
        }
    }

    /// Accepted argument counts as `(min, max)`; `None` means unbounded.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Builtin::Bool | Builtin::Float | Builtin::Int => (0, Some(1)),
            Builtin::Max | Builtin::Min | Builtin::Hypot => (1, None),
            Builtin::Round | Builtin::Sum | Builtin::Log => (1, Some(2)),
            Builtin::Pow
            | Builtin::Divmod
            | Builtin::Atan2
            | Builtin::MathPow
            | Builtin::Dot
            | Builtin::Distance
            | Builtin::Cross => (2, Some(2)),
            Builtin::Clip | Builtin::Interp | Builtin::Clamp | Builtin::Mix => (3, Some(3)),
            _ => (1, Some(1)),
        }
    }

    pub fn accepts(self, count: usize) -> bool {
        let (min, max) = self.arity();
        count >= min && max.map_or(true, |max| count <= max)
    }

    pub fn arity_text(self) -> String {
        match self.arity() {
            (min, Some(max)) if min == max => min.to_string(),
            (min, Some(max)) => format!("{min} to {max}"),
            (min, None) => format!("at least {min}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Apply `func` to already evaluated arguments. Argument counts were checked
/// when the expression was compiled.
pub fn call(func: Builtin, args: Vec<Value>) -> Result<Value, EvalError> {
    let name = func.name();
    let arg = |i: usize| &args[i];
    let float = |i: usize| args[i].expect_f64(name);

    match func {
        Builtin::Abs => abs(arg(0), name),
        Builtin::All => Ok(Value::Bool(arg(0).iter_items(name)?.iter().all(Value::truthy))),
        Builtin::Any => Ok(Value::Bool(arg(0).iter_items(name)?.iter().any(Value::truthy))),
        Builtin::Bool => Ok(Value::Bool(args.first().is_some_and(Value::truthy))),
        Builtin::Float => match args.first() {
            None => Ok(Value::Float(0.0)),
            Some(v) => Ok(Value::Float(v.expect_f64(name)?)),
        },
        Builtin::Int => match args.first() {
            None => Ok(Value::Int(0)),
            Some(v) => match v.num() {
                Some(Num::Int(i)) => Ok(Value::Int(i)),
                Some(Num::Float(f)) => float_to_int(f.trunc()).map(Value::Int),
                None => Err(argument(name, "a number", v)),
            },
        },
        Builtin::Len => {
            let len = arg(0).iter_items(name)?.len();
            Ok(Value::Int(len as i64))
        }
        Builtin::Max => extreme(&args, name, Ordering::Greater),
        Builtin::Min => extreme(&args, name, Ordering::Less),
        Builtin::Pow => Value::binary(BinaryOp::Pow, arg(0), arg(1)),
        Builtin::Divmod => {
            let quotient = Value::binary(BinaryOp::FloorDiv, arg(0), arg(1))?;
            let remainder = Value::binary(BinaryOp::Mod, arg(0), arg(1))?;
            Ok(Value::List(Rc::from(vec![quotient, remainder])))
        }
        Builtin::Round => round(&args, name),
        Builtin::Sum => {
            let start = args.get(1).cloned().unwrap_or(Value::Int(0));
            arg(0)
                .iter_items(name)?
                .iter()
                .try_fold(start, |acc, item| Value::binary(BinaryOp::Add, &acc, item))
        }

        Builtin::Sqrt => {
            let x = float(0)?;
            if x < 0.0 {
                return Err(EvalError::Domain(name));
            }
            Ok(Value::Float(x.sqrt()))
        }
        Builtin::Sin => Ok(Value::Float(float(0)?.sin())),
        Builtin::Cos => Ok(Value::Float(float(0)?.cos())),
        Builtin::Tan => Ok(Value::Float(float(0)?.tan())),
        Builtin::Asin | Builtin::Acos => {
            let x = float(0)?;
            if !(-1.0..=1.0).contains(&x) {
                return Err(EvalError::Domain(name));
            }
            Ok(Value::Float(if func == Builtin::Asin { x.asin() } else { x.acos() }))
        }
        Builtin::Atan => Ok(Value::Float(float(0)?.atan())),
        Builtin::Atan2 => Ok(Value::Float(float(0)?.atan2(float(1)?))),
        Builtin::Exp => finite(float(0)?.exp()),
        Builtin::Log => {
            let x = float(0)?;
            if x <= 0.0 {
                return Err(EvalError::Domain(name));
            }
            match args.get(1) {
                None => Ok(Value::Float(x.ln())),
                Some(base) => {
                    let base = base.expect_f64(name)?;
                    if base <= 0.0 {
                        return Err(EvalError::Domain(name));
                    }
                    if base == 1.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    Ok(Value::Float(x.ln() / base.ln()))
                }
            }
        }
        Builtin::Log10 => {
            let x = float(0)?;
            if x <= 0.0 {
                return Err(EvalError::Domain(name));
            }
            Ok(Value::Float(x.log10()))
        }
        Builtin::Floor | Builtin::Ceil => match arg(0).num() {
            Some(Num::Int(i)) => Ok(Value::Int(i)),
            Some(Num::Float(f)) => {
                let r = if func == Builtin::Floor { f.floor() } else { f.ceil() };
                float_to_int(r).map(Value::Int)
            }
            None => Err(argument(name, "a number", arg(0))),
        },
        Builtin::Hypot => {
            let sum: f64 = args
                .iter()
                .map(|a| a.expect_f64(name).map(|x| x * x))
                .sum::<Result<f64, _>>()?;
            Ok(Value::Float(sum.sqrt()))
        }
        Builtin::Degrees => Ok(Value::Float(float(0)?.to_degrees())),
        Builtin::Radians => Ok(Value::Float(float(0)?.to_radians())),
        Builtin::Fabs => Ok(Value::Float(float(0)?.abs())),
        Builtin::MathPow => {
            let (x, y) = (float(0)?, float(1)?);
            if x == 0.0 && y < 0.0 {
                return Err(EvalError::Domain(name));
            }
            let r = x.powf(y);
            if r.is_nan() && !x.is_nan() && !y.is_nan() {
                return Err(EvalError::Domain(name));
            }
            finite(r)
        }

        Builtin::NpAbs => match arg(0).num() {
            Some(Num::Int(i)) => i.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
            _ => elementwise(arg(0), name, |x| Ok(x.abs())),
        },
        Builtin::Sign => match arg(0).num() {
            Some(Num::Int(i)) => Ok(Value::Int(i.signum())),
            _ => elementwise(arg(0), name, |x| Ok(sign(x))),
        },
        Builtin::NpSqrt => elementwise(arg(0), name, |x| {
            if x < 0.0 {
                Err(EvalError::Domain(name))
            } else {
                Ok(x.sqrt())
            }
        }),
        Builtin::NpFloor => elementwise(arg(0), name, |x| Ok(x.floor())),
        Builtin::NpCeil => elementwise(arg(0), name, |x| Ok(x.ceil())),
        Builtin::Clip | Builtin::Clamp => {
            let (lo, hi) = (float(1)?, float(2)?);
            elementwise(arg(0), name, |x| Ok(x.max(lo).min(hi)))
        }
        Builtin::Interp => interp(float(0)?, arg(1), arg(2), name),
        Builtin::Mean => {
            let xs = floats(arg(0), name)?;
            if xs.is_empty() {
                return Err(EvalError::EmptySequence(name));
            }
            Ok(Value::Float(xs.iter().sum::<f64>() / xs.len() as f64))
        }
        Builtin::NpMin => extreme(&args, name, Ordering::Less),
        Builtin::NpMax => extreme(&args, name, Ordering::Greater),
        Builtin::NpSum => {
            let xs = floats(arg(0), name)?;
            Ok(Value::Float(xs.iter().sum()))
        }

        Builtin::Length => match arg(0).num() {
            Some(n) => Ok(Value::Float(n.as_f64().abs())),
            None => Ok(Value::Float(norm(&floats(arg(0), name)?))),
        },
        Builtin::Dot => {
            let (a, b) = paired(arg(0), arg(1), name)?;
            Ok(Value::Float(a.iter().zip(&b).map(|(x, y)| x * y).sum()))
        }
        Builtin::Distance => {
            let (a, b) = paired(arg(0), arg(1), name)?;
            let diff: Vec<f64> = a.iter().zip(&b).map(|(x, y)| x - y).collect();
            Ok(Value::Float(norm(&diff)))
        }
        Builtin::Mix => {
            let t = float(2)?;
            if arg(0).num().is_some() && arg(1).num().is_some() {
                let (a, b) = (float(0)?, float(1)?);
                return Ok(Value::Float(a * (1.0 - t) + b * t));
            }
            let (a, b) = paired(arg(0), arg(1), name)?;
            let mixed = a.iter().zip(&b).map(|(x, y)| x * (1.0 - t) + y * t).collect();
            Ok(rebuild(arg(0), mixed))
        }
        Builtin::Normalize => {
            let xs = floats(arg(0), name)?;
            let length = norm(&xs);
            if length == 0.0 {
                return Err(EvalError::Domain(name));
            }
            Ok(rebuild(arg(0), xs.iter().map(|x| x / length).collect()))
        }
        Builtin::Cross => {
            let (a, b) = paired(arg(0), arg(1), name)?;
            let (&[ax, ay, az], &[bx, by, bz]) = (a.as_slice(), b.as_slice()) else {
                return Err(EvalError::Argument {
                    func: name,
                    expected: "3-component vectors",
                    found: format!("length {}", a.len()),
                });
            };
            let c = Vector3::new(ax, ay, az).cross(&Vector3::new(bx, by, bz));
            Ok(Value::Sample(Sample::Vector3(c.cast::<f32>())))
        }
        // Angles about x, y and z, in radians.
        Builtin::EulerAngles => {
            let (x, y, z) = quaternion(arg(0), name)?.euler_angles();
            Ok(Value::Sample(Sample::Vector3(Vector3::new(x, y, z))))
        }
        Builtin::Angle => Ok(Value::Float(f64::from(quaternion(arg(0), name)?.angle()))),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn argument(func: &'static str, expected: &'static str, found: &Value) -> EvalError {
    EvalError::Argument {
        func,
        expected,
        found: found.type_name(),
    }
}

fn finite(x: f64) -> Result<Value, EvalError> {
    if x.is_infinite() {
        return Err(EvalError::Overflow);
    }
    Ok(Value::Float(x))
}

fn float_to_int(x: f64) -> Result<i64, EvalError> {
    if x.is_nan() {
        return Err(EvalError::Domain("int"));
    }
    // i64::MAX is not exactly representable; 2^63 is the first value out of range.
    if x >= 9_223_372_036_854_775_808.0 || x < -9_223_372_036_854_775_808.0 {
        return Err(EvalError::Overflow);
    }
    Ok(x as i64)
}

fn quaternion(value: &Value, func: &'static str) -> Result<UnitQuaternion<f32>, EvalError> {
    match value {
        Value::Sample(Sample::Quaternion(q)) => Ok(*q),
        other => Err(argument(func, "a quaternion", other)),
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}

fn norm(xs: &[f64]) -> f64 {
    xs.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn floats(value: &Value, func: &'static str) -> Result<Vec<f64>, EvalError> {
    value
        .floats()
        .ok_or_else(|| argument(func, "a sequence of numbers", value))
}

fn paired(a: &Value, b: &Value, func: &'static str) -> Result<(Vec<f64>, Vec<f64>), EvalError> {
    let (xa, xb) = (floats(a, func)?, floats(b, func)?);
    if xa.len() != xb.len() {
        return Err(EvalError::Argument {
            func,
            expected: "sequences of equal length",
            found: format!("lengths {} and {}", xa.len(), xb.len()),
        });
    }
    Ok((xa, xb))
}

/// Shape `components` like `template`: vectors stay vectors, anything else
/// becomes a list.
fn rebuild(template: &Value, components: Vec<f64>) -> Value {
    match (template, components.as_slice()) {
        (Value::Sample(Sample::Vector2(_)), &[x, y]) => {
            Value::Sample(Sample::Vector2(Vector2::new(x as f32, y as f32)))
        }
        (Value::Sample(Sample::Vector3(_)), &[x, y, z]) => {
            Value::Sample(Sample::Vector3(Vector3::new(x as f32, y as f32, z as f32)))
        }
        _ => Value::List(components.into_iter().map(Value::Float).collect::<Rc<[Value]>>()),
    }
}

/// Apply `f` to a scalar, or to every component of a vector-like value.
fn elementwise(
    value: &Value,
    func: &'static str,
    f: impl Fn(f64) -> Result<f64, EvalError>,
) -> Result<Value, EvalError> {
    if let Some(n) = value.num() {
        return f(n.as_f64()).map(Value::Float);
    }
    let mapped = floats(value, func)?
        .into_iter()
        .map(f)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rebuild(value, mapped))
}

fn abs(value: &Value, func: &'static str) -> Result<Value, EvalError> {
    match value.num() {
        Some(Num::Int(i)) => i.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
        Some(Num::Float(f)) => Ok(Value::Float(f.abs())),
        None => Err(argument(func, "a number", value)),
    }
}

/// `max`/`min`: one argument is iterated, several are compared directly.
/// Ties keep the first candidate.
fn extreme(args: &[Value], func: &'static str, want: Ordering) -> Result<Value, EvalError> {
    let candidates = match args {
        [single] => single.iter_items(func)?,
        many => many.to_vec(),
    };
    let mut iter = candidates.into_iter();
    let mut best = iter.next().ok_or(EvalError::EmptySequence(func))?;
    for item in iter {
        if item.compare(&best, func)? == want {
            best = item;
        }
    }
    Ok(best)
}

fn round(args: &[Value], func: &'static str) -> Result<Value, EvalError> {
    let value = &args[0];
    let digits = match args.get(1) {
        None => None,
        Some(Value::Int(d)) => Some(*d),
        Some(Value::Bool(b)) => Some(i64::from(*b)),
        Some(other) => return Err(argument(func, "an integer digit count", other)),
    };
    match (value.num(), digits) {
        (Some(Num::Int(i)), None) => Ok(Value::Int(i)),
        (Some(Num::Float(f)), None) => float_to_int(f.round_ties_even()).map(Value::Int),
        (Some(Num::Int(i)), Some(d)) => round_int(i, d).map(Value::Int),
        (Some(Num::Float(f)), Some(d)) => {
            let d = i32::try_from(d.clamp(-308, 308)).map_err(|_| EvalError::Overflow)?;
            let scale = 10f64.powi(d);
            let scaled = f * scale;
            if !scaled.is_finite() {
                return Ok(Value::Float(f));
            }
            Ok(Value::Float(scaled.round_ties_even() / scale))
        }
        (None, _) => Err(argument(func, "a number", value)),
    }
}

/// Round an integer to `digits` decimal places, half to even.
fn round_int(value: i64, digits: i64) -> Result<i64, EvalError> {
    if digits >= 0 {
        return Ok(value);
    }
    let exp = u32::try_from(-digits).map_err(|_| EvalError::Overflow)?;
    let Some(step) = 10i64.checked_pow(exp) else {
        return Ok(0);
    };
    let (q, r) = (value.div_euclid(step), value.rem_euclid(step));
    let up = match (2 * r).cmp(&step) {
        Ordering::Greater => true,
        Ordering::Equal => q % 2 != 0,
        Ordering::Less => false,
    };
    let q = if up { q + 1 } else { q };
    q.checked_mul(step).ok_or(EvalError::Overflow)
}

fn interp(x: f64, xp: &Value, fp: &Value, func: &'static str) -> Result<Value, EvalError> {
    let (xs, ys) = paired(xp, fp, func)?;
    let (Some(&first), Some(&last)) = (xs.first(), xs.last()) else {
        return Err(EvalError::EmptySequence(func));
    };
    if x <= first {
        return Ok(Value::Float(ys[0]));
    }
    if x >= last {
        return Ok(Value::Float(ys[ys.len() - 1]));
    }
    for i in 1..xs.len() {
        if x <= xs[i] {
            let span = xs[i] - xs[i - 1];
            let t = if span == 0.0 { 0.0 } else { (x - xs[i - 1]) / span };
            return Ok(Value::Float(ys[i - 1] + t * (ys[i] - ys[i - 1])));
        }
    }
    Ok(Value::Float(ys[ys.len() - 1]))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
