use super::builtins::Builtin;
use super::value::Value;
use crate::action::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Resolved expression tree. Names are bound at parse time, so evaluation
/// never looks anything up by string.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// The input sequence `v`.
    Inputs,
    List(Vec<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `a < b <= c`: each link compares against the previous operand, which
    /// is evaluated once.
    Chain {
        first: Box<Expr>,
        links: Vec<(BinaryOp, Expr)>,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Field {
        target: Box<Expr>,
        field: Field,
    },
    Call {
        func: Builtin,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn reads_inputs(&self) -> bool {
        match self {
            Expr::Inputs => true,
            Expr::Literal(_) => false,
            Expr::List(items) => items.iter().any(Expr::reads_inputs),
            Expr::Unary { operand, .. } => operand.reads_inputs(),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.reads_inputs() || right.reads_inputs()
            }
            Expr::Chain { first, links } => {
                first.reads_inputs() || links.iter().any(|(_, e)| e.reads_inputs())
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => condition.reads_inputs() || then.reads_inputs() || otherwise.reads_inputs(),
            Expr::Index { target, index } => target.reads_inputs() || index.reads_inputs(),
            Expr::Field { target, .. } => target.reads_inputs(),
            Expr::Call { args, .. } => args.iter().any(Expr::reads_inputs),
        }
    }
}
