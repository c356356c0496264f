//! Unary and binary operators on runtime values.
//!
//! Operators never fail: any operand combination without a meaning yields
//! `Undefined`. `&&` and `||` are short-circuited by the evaluator before it
//! gets here; the eager forms below only exist for completeness.

use std::cmp::Ordering;

use scad_ir::{BinaryOp, UnaryOp};

use crate::Value;

/// Apply a binary operator to two evaluated operands.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => elementwise(left, right, |a, b| a + b),
        BinaryOp::Sub => elementwise(left, right, |a, b| a - b),
        BinaryOp::Mul => multiply(left, right),
        BinaryOp::Div => divide(left, right),
        BinaryOp::Mod => numeric(left, right, |a, b| a % b),
        BinaryOp::Pow => numeric(left, right, f64::powf),
        BinaryOp::Eq => Value::Bool(left == right),
        BinaryOp::NotEq => Value::Bool(left != right),
        BinaryOp::Lt => compare(left, right, Ordering::is_lt),
        BinaryOp::LtEq => compare(left, right, Ordering::is_le),
        BinaryOp::Gt => compare(left, right, Ordering::is_gt),
        BinaryOp::GtEq => compare(left, right, Ordering::is_ge),
        BinaryOp::And => Value::Bool(left.is_truthy() && right.is_truthy()),
        BinaryOp::Or => Value::Bool(left.is_truthy() || right.is_truthy()),
    }
}

/// Apply a unary operator.
pub fn unary(op: UnaryOp, operand: &Value) -> Value {
    match op {
        UnaryOp::Not => Value::Bool(!operand.is_truthy()),
        UnaryOp::Neg => negate(operand),
        UnaryOp::Pos => match operand {
            Value::Number(_) | Value::Vector(_) => operand.clone(),
            _ => Value::Undefined,
        },
    }
}

fn numeric(left: &Value, right: &Value, f: impl Fn(f64, f64) -> f64) -> Value {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Value::Number(f(*a, *b)),
        _ => Value::Undefined,
    }
}

/// Numbers combine directly; vectors pair up element by element and the
/// result is as long as the shorter operand.
fn elementwise(left: &Value, right: &Value, f: fn(f64, f64) -> f64) -> Value {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Value::Number(f(*a, *b)),
        (Value::Vector(a), Value::Vector(b)) => {
            Value::vector(a.iter().zip(b).map(|(x, y)| elementwise(x, y, f)))
        }
        _ => Value::Undefined,
    }
}

fn multiply(left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Value::Number(a * b),
        (Value::Vector(items), Value::Number(_)) => {
            Value::vector(items.iter().map(|item| multiply(item, right)))
        }
        (Value::Number(_), Value::Vector(items)) => {
            Value::vector(items.iter().map(|item| multiply(left, item)))
        }
        (Value::Vector(a), Value::Vector(b)) => dot(a, b),
        _ => Value::Undefined,
    }
}

fn dot(a: &[Value], b: &[Value]) -> Value {
    if a.len() != b.len() {
        return Value::Undefined;
    }
    let mut sum = 0.0;
    for (x, y) in a.iter().zip(b) {
        match (x, y) {
            (Value::Number(x), Value::Number(y)) => sum += x * y,
            _ => return Value::Undefined,
        }
    }
    Value::Number(sum)
}

fn divide(left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Value::Number(a / b),
        (Value::Vector(items), Value::Number(_)) => {
            Value::vector(items.iter().map(|item| divide(item, right)))
        }
        (Value::Number(_), Value::Vector(items)) => {
            Value::vector(items.iter().map(|item| divide(left, item)))
        }
        _ => Value::Undefined,
    }
}

fn compare(left: &Value, right: &Value, test: fn(Ordering) -> bool) -> Value {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    };
    match ordering {
        Some(ordering) => Value::Bool(test(ordering)),
        None => Value::Undefined,
    }
}

fn negate(operand: &Value) -> Value {
    match operand {
        Value::Number(n) => Value::Number(-n),
        Value::Vector(items) => Value::vector(items.iter().map(negate)),
        _ => Value::Undefined,
    }
}
