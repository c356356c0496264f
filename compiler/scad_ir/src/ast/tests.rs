use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_binary_symbols() {
    assert_eq!(BinaryOp::Add.as_symbol(), "+");
    assert_eq!(BinaryOp::Pow.as_symbol(), "^");
    assert_eq!(BinaryOp::NotEq.as_symbol(), "!=");
    assert_eq!(BinaryOp::Or.as_symbol(), "||");
}

#[test]
fn test_short_circuit_ops() {
    assert!(BinaryOp::And.is_short_circuit());
    assert!(BinaryOp::Or.is_short_circuit());
    assert!(!BinaryOp::Add.is_short_circuit());
    assert!(!BinaryOp::Eq.is_short_circuit());
}

#[test]
fn test_constructors_use_synthesized_location() {
    let expr = Expr::binary(BinaryOp::Add, Expr::number(1.0), Expr::ident("x"));
    assert_eq!(expr.location, Location::NONE);
    let ExprKind::Binary { op, left, right } = expr.kind else {
        panic!("expected a binary expression");
    };
    assert_eq!(op, BinaryOp::Add);
    assert_eq!(left.kind, ExprKind::Literal(Literal::Number(1.0)));
    assert_eq!(right.kind, ExprKind::Identifier("x".to_string()));
}

#[test]
fn test_at_overrides_location() {
    let expr = Expr::ident("y").at(Location::new(4, 2));
    assert_eq!(expr.location, Location::new(4, 2));
    let assignment = Assignment::new("y", Expr::number(2.0)).at(Location::new(5, 1));
    assert_eq!(assignment.location, Location::new(5, 1));
}

#[test]
fn test_call_collects_arguments() {
    let expr = Expr::call(
        "max",
        [
            Argument::positional(Expr::number(1.0)),
            Argument::named("b", Expr::number(2.0)),
        ],
    );
    let ExprKind::Call { name, arguments } = expr.kind else {
        panic!("expected a call");
    };
    assert_eq!(name, "max");
    assert_eq!(arguments.len(), 2);
    assert_eq!(arguments[0].name, None);
    assert_eq!(arguments[1].name.as_deref(), Some("b"));
}

#[test]
fn test_nested_calls() {
    let inner = Expr::call("g", [Argument::positional(Expr::ident("x"))]);
    let outer = Expr::call("f", [Argument::positional(inner.clone()), Argument::named("n", inner)]);
    let ExprKind::Call { arguments, .. } = &outer.kind else {
        panic!("expected a call");
    };
    assert_eq!(arguments.len(), 2);
    let ExprKind::Call { name, arguments: inner_args } = &arguments[1].value.kind else {
        panic!("expected a nested call");
    };
    assert_eq!(name, "g");
    assert_eq!(inner_args[0].value, Expr::ident("x"));
}

#[test]
fn test_parameters() {
    let p = Parameter::required("n");
    assert!(p.default.is_none());
    let q = Parameter::with_default("n", Expr::number(1.0));
    assert_eq!(q.default, Some(Expr::number(1.0)));
}
