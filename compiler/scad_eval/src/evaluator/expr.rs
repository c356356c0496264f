//! Expression evaluation.

use scad_ir::{BinaryOp, Expr, ExprKind, Literal};

use super::Evaluator;
use crate::frame::{FrameKind, FrameRef};
use crate::operators;
use crate::{EvalError, RangeValue, Value};

impl Evaluator<'_> {
    /// Evaluate `expr` against `frame`.
    ///
    /// Type mismatches produce `Undefined` without a diagnostic. Unknown
    /// names produce `Undefined` with one.
    pub fn eval_expr(&mut self, frame: &FrameRef, expr: &Expr) -> Result<Value, EvalError> {
        self.counters.count_expression();
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                Literal::Undef => Value::Undefined,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),
            ExprKind::Identifier(name) => self.lookup_variable(frame, name, expr.location, false),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(frame, operand)?;
                Ok(operators::unary(*op, &value))
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval_expr(frame, left)?;
                match op {
                    BinaryOp::And if !left.is_truthy() => Ok(Value::Bool(false)),
                    BinaryOp::Or if left.is_truthy() => Ok(Value::Bool(true)),
                    BinaryOp::And | BinaryOp::Or => {
                        let right = self.eval_expr(frame, right)?;
                        Ok(Value::Bool(right.is_truthy()))
                    }
                    _ => {
                        let right = self.eval_expr(frame, right)?;
                        Ok(operators::binary(*op, &left, &right))
                    }
                }
            }
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_expr(frame, condition)?.is_truthy() {
                    self.eval_expr(frame, then_branch)
                } else {
                    self.eval_expr(frame, else_branch)
                }
            }
            ExprKind::Vector(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(frame, item)?);
                }
                Ok(Value::Vector(values))
            }
            ExprKind::Range { begin, step, end } => {
                let begin = self.eval_expr(frame, begin)?;
                let step = match step {
                    Some(step) => self.eval_expr(frame, step)?,
                    None => Value::Number(1.0),
                };
                let end = self.eval_expr(frame, end)?;
                Ok(match (begin, step, end) {
                    (Value::Number(begin), Value::Number(step), Value::Number(end)) => {
                        Value::Range(RangeValue::new(begin, step, end))
                    }
                    _ => Value::Undefined,
                })
            }
            ExprKind::Index { target, index } => {
                let target = self.eval_expr(frame, target)?;
                let index = self.eval_expr(frame, index)?;
                Ok(target.index(&index))
            }
            ExprKind::Member { target, member } => {
                let target = self.eval_expr(frame, target)?;
                Ok(target.member(member))
            }
            ExprKind::Call { name, arguments } => {
                self.call_function(frame, name, arguments, expr.location)
            }
            ExprKind::Let { assignments, body } => {
                let block = self.new_frame(frame, FrameKind::Block);
                self.in_frame(&block, |ev| -> Result<Value, EvalError> {
                    for assignment in assignments {
                        let value = match &assignment.expr {
                            Some(expr) => ev.eval_expr(&block, expr)?,
                            None => Value::Undefined,
                        };
                        block.borrow_mut().set_variable(&assignment.name, value);
                    }
                    ev.eval_expr(&block, body)
                })
            }
        }
    }
}
