use super::ast::{Expr, LogicalOp, UnaryOp};
use super::builtins;
use super::value::Value;
use super::EvalError;
use std::rc::Rc;

/// Evaluate `expr` against the input sequence.
pub fn eval(expr: &Expr, inputs: &Rc<[Value]>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Inputs => Ok(Value::List(Rc::clone(inputs))),
        Expr::List(items) => {
            let values = items
                .iter()
                .map(|item| eval(item, inputs))
                .collect::<Result<Rc<[Value]>, _>>()?;
            Ok(Value::List(values))
        }
        Expr::Unary { op, operand } => {
            let value = eval(operand, inputs)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                UnaryOp::Neg => value.negate(),
                UnaryOp::Pos => value.positive(),
            }
        }
        Expr::Binary { op, left, right } => {
            let left = eval(left, inputs)?;
            let right = eval(right, inputs)?;
            Value::binary(*op, &left, &right)
        }
        Expr::Logical { op, left, right } => {
            let left = eval(left, inputs)?;
            let short_circuit = match op {
                LogicalOp::And => !left.truthy(),
                LogicalOp::Or => left.truthy(),
            };
            if short_circuit {
                Ok(left)
            } else {
                eval(right, inputs)
            }
        }
        Expr::Chain { first, links } => {
            let mut left = eval(first, inputs)?;
            for (op, right) in links {
                let right = eval(right, inputs)?;
                let holds = Value::binary(*op, &left, &right)?;
                if !holds.truthy() {
                    return Ok(holds);
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if eval(condition, inputs)?.truthy() {
                eval(then, inputs)
            } else {
                eval(otherwise, inputs)
            }
        }
        Expr::Index { target, index } => {
            let target = eval(target, inputs)?;
            let index = eval(index, inputs)?;
            target.index(&index)
        }
        Expr::Field { target, field } => match eval(target, inputs)? {
            Value::Sample(sample) => sample.field(*field).map(Value::from).ok_or_else(|| {
                EvalError::NoField {
                    field: field.as_str(),
                    found: sample.kind().to_string(),
                }
            }),
            other => Err(EvalError::NoField {
                field: field.as_str(),
                found: other.type_name(),
            }),
        },
        Expr::Call { func, args } => {
            let args = args
                .iter()
                .map(|arg| eval(arg, inputs))
                .collect::<Result<Vec<_>, _>>()?;
            builtins::call(*func, args)
        }
    }
}
