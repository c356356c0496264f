//! Expression trees, arguments, parameters and assignments.
//!
//! These are produced by the external parser. The small constructor helpers
//! exist so hosts and tests can build trees without a grammar.

use crate::Location;

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    /// Returns the source-level symbol for this operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// Logical operators evaluate their right operand lazily.
    pub const fn is_short_circuit(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
}

/// Literal constants.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Undef,
    Bool(bool),
    Number(f64),
    String(String),
}

/// An expression with its source location.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expr {
    pub kind: ExprKind,
    pub location: Location,
}

/// Expression variants.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    Literal(Literal),
    /// Variable reference; `$`-prefixed names are special variables.
    Identifier(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Vector(Vec<Expr>),
    /// `[begin : step : end]`; a missing step means 1.
    Range {
        begin: Box<Expr>,
        step: Option<Box<Expr>>,
        end: Box<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    /// `.x`, `.y`, `.z` member access on vectors.
    Member {
        target: Box<Expr>,
        member: String,
    },
    /// Function call by name. Heap-allocated arguments: each one holds an
    /// `Expr`, so they cannot live inline.
    Call {
        name: String,
        arguments: Vec<Argument>,
    },
    /// `let (a = 1, b = a) body`.
    Let {
        assignments: Vec<Assignment>,
        body: Box<Expr>,
    },
}

impl Expr {
    /// Create an expression at a location.
    pub fn new(kind: ExprKind, location: Location) -> Self {
        Expr { kind, location }
    }

    fn synthesized(kind: ExprKind) -> Self {
        Expr::new(kind, Location::NONE)
    }

    pub fn undef() -> Self {
        Self::synthesized(ExprKind::Literal(Literal::Undef))
    }

    pub fn bool(value: bool) -> Self {
        Self::synthesized(ExprKind::Literal(Literal::Bool(value)))
    }

    pub fn number(value: f64) -> Self {
        Self::synthesized(ExprKind::Literal(Literal::Number(value)))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::synthesized(ExprKind::Literal(Literal::String(value.into())))
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::synthesized(ExprKind::Identifier(name.into()))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::synthesized(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::synthesized(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn ternary(condition: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Self::synthesized(ExprKind::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    pub fn vector(items: Vec<Expr>) -> Self {
        Self::synthesized(ExprKind::Vector(items))
    }

    pub fn range(begin: Expr, step: Option<Expr>, end: Expr) -> Self {
        Self::synthesized(ExprKind::Range {
            begin: Box::new(begin),
            step: step.map(Box::new),
            end: Box::new(end),
        })
    }

    pub fn index(target: Expr, index: Expr) -> Self {
        Self::synthesized(ExprKind::Index {
            target: Box::new(target),
            index: Box::new(index),
        })
    }

    pub fn member(target: Expr, member: impl Into<String>) -> Self {
        Self::synthesized(ExprKind::Member {
            target: Box::new(target),
            member: member.into(),
        })
    }

    pub fn call(name: impl Into<String>, arguments: impl IntoIterator<Item = Argument>) -> Self {
        Self::synthesized(ExprKind::Call {
            name: name.into(),
            arguments: arguments.into_iter().collect(),
        })
    }

    pub fn let_in(assignments: Vec<Assignment>, body: Expr) -> Self {
        Self::synthesized(ExprKind::Let {
            assignments,
            body: Box::new(body),
        })
    }

    /// Replace the location of this expression.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

/// A call-site argument: optionally named.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expr,
}

impl Argument {
    pub fn positional(value: Expr) -> Self {
        Argument { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Expr) -> Self {
        Argument {
            name: Some(name.into()),
            value,
        }
    }
}

/// A declared parameter of a module or function.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    pub name: String,
    /// Evaluated against the defining frame when the caller omits the argument.
    pub default: Option<Expr>,
}

impl Parameter {
    pub fn required(name: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: Expr) -> Self {
        Parameter {
            name: name.into(),
            default: Some(default),
        }
    }
}

/// `name = expression;`
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    pub name: String,
    /// `None` binds `undef`.
    pub expr: Option<Expr>,
    pub location: Location,
}

impl Assignment {
    pub fn new(name: impl Into<String>, expr: Expr) -> Self {
        Assignment {
            name: name.into(),
            expr: Some(expr),
            location: Location::NONE,
        }
    }

    /// Replace the location of this assignment.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

#[cfg(test)]
mod tests;
