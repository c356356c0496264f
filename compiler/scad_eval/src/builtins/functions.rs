//! Builtin functions.
//!
//! Every function takes positional values and returns `Undefined` when the
//! arguments have the wrong shape. Angles are in degrees.

use super::BuiltinFunction;
use crate::Value;

macro_rules! builtin {
    ($name:literal, $call:expr) => {
        BuiltinFunction {
            name: $name,
            call: $call,
        }
    };
}

/// The builtin function table.
pub static FUNCTIONS: [BuiltinFunction; 29] = [
    // Math
    builtin!("abs", |args| unary(args, f64::abs)),
    builtin!("sign", |args| unary(args, sign)),
    builtin!("sqrt", |args| unary(args, f64::sqrt)),
    builtin!("pow", |args| binary(args, f64::powf)),
    builtin!("exp", |args| unary(args, f64::exp)),
    builtin!("ln", |args| unary(args, f64::ln)),
    builtin!("log", log),
    builtin!("floor", |args| unary(args, f64::floor)),
    builtin!("ceil", |args| unary(args, f64::ceil)),
    builtin!("round", |args| unary(args, f64::round)),
    builtin!("min", |args| fold(args, f64::min)),
    builtin!("max", |args| fold(args, f64::max)),
    builtin!("norm", norm),
    // Trigonometry
    builtin!("sin", |args| unary(args, sin_degrees)),
    builtin!("cos", |args| unary(args, cos_degrees)),
    builtin!("tan", |args| unary(args, tan_degrees)),
    builtin!("asin", |args| unary(args, |x| x.asin().to_degrees())),
    builtin!("acos", |args| unary(args, |x| x.acos().to_degrees())),
    builtin!("atan", |args| unary(args, |x| x.atan().to_degrees())),
    builtin!("atan2", |args| binary(args, |y, x| y.atan2(x).to_degrees())),
    // Lists and strings
    builtin!("len", len),
    builtin!("concat", concat),
    builtin!("str", join),
    builtin!("lookup", lookup),
    // Type tests
    builtin!("is_undef", |args| {
        Value::Bool(matches!(args.first(), None | Some(Value::Undefined)))
    }),
    builtin!("is_num", |args| {
        Value::Bool(matches!(args.first(), Some(Value::Number(n)) if !n.is_nan()))
    }),
    builtin!("is_bool", |args| {
        Value::Bool(matches!(args.first(), Some(Value::Bool(_))))
    }),
    builtin!("is_string", |args| {
        Value::Bool(matches!(args.first(), Some(Value::String(_))))
    }),
    builtin!("is_list", |args| {
        Value::Bool(matches!(args.first(), Some(Value::Vector(_))))
    }),
];

fn number(args: &[Value], i: usize) -> Option<f64> {
    args.get(i).and_then(Value::as_number)
}

fn unary(args: &[Value], f: impl Fn(f64) -> f64) -> Value {
    number(args, 0).map_or(Value::Undefined, |x| Value::Number(f(x)))
}

fn binary(args: &[Value], f: impl Fn(f64, f64) -> f64) -> Value {
    match (number(args, 0), number(args, 1)) {
        (Some(a), Some(b)) => Value::Number(f(a, b)),
        _ => Value::Undefined,
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// `log(x)` is base 10; `log(b, x)` is base `b`.
fn log(args: &[Value]) -> Value {
    match (number(args, 0), number(args, 1)) {
        (Some(x), None) if args.len() == 1 => Value::Number(x.log10()),
        (Some(base), Some(x)) => Value::Number(x.ln() / base.ln()),
        _ => Value::Undefined,
    }
}

/// `min(a, b, ...)` over numbers, or `min([a, b, ...])` over one vector.
fn fold(args: &[Value], f: fn(f64, f64) -> f64) -> Value {
    let values = match args {
        [Value::Vector(items)] => items.as_slice(),
        _ => args,
    };
    let mut acc: Option<f64> = None;
    for value in values {
        let Some(x) = value.as_number() else {
            return Value::Undefined;
        };
        acc = Some(acc.map_or(x, |a| f(a, x)));
    }
    acc.map_or(Value::Undefined, Value::Number)
}

fn norm(args: &[Value]) -> Value {
    let Some(items) = args.first().and_then(Value::as_vector) else {
        return Value::Undefined;
    };
    let mut sum = 0.0;
    for item in items {
        let Some(x) = item.as_number() else {
            return Value::Undefined;
        };
        sum += x * x;
    }
    Value::Number(sum.sqrt())
}

/// Multiples of 90 degrees give exact results.
fn quadrant(degrees: f64) -> Option<i64> {
    if degrees.is_finite() && degrees % 90.0 == 0.0 {
        Some(((degrees / 90.0) as i64).rem_euclid(4))
    } else {
        None
    }
}

fn sin_degrees(x: f64) -> f64 {
    match quadrant(x) {
        Some(0 | 2) => 0.0,
        Some(1) => 1.0,
        Some(_) => -1.0,
        None => x.to_radians().sin(),
    }
}

fn cos_degrees(x: f64) -> f64 {
    match quadrant(x) {
        Some(0) => 1.0,
        Some(2) => -1.0,
        Some(_) => 0.0,
        None => x.to_radians().cos(),
    }
}

fn tan_degrees(x: f64) -> f64 {
    match quadrant(x) {
        Some(0 | 2) => 0.0,
        Some(1) => f64::INFINITY,
        Some(_) => f64::NEG_INFINITY,
        None => x.to_radians().tan(),
    }
}

fn len(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Vector(items)) => Value::Number(items.len() as f64),
        Some(Value::String(s)) => Value::Number(s.chars().count() as f64),
        _ => Value::Undefined,
    }
}

/// Vectors are spliced one level deep; anything else is appended as is.
fn concat(args: &[Value]) -> Value {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Value::Vector(items) => out.extend(items.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Value::Vector(out)
}

fn join(args: &[Value]) -> Value {
    Value::String(args.iter().map(Value::to_display_string).collect())
}

/// `lookup(key, [[k0, v0], [k1, v1], ...])` with linear interpolation.
///
/// Keys outside the table clamp to the nearest end.
fn lookup(args: &[Value]) -> Value {
    let (Some(key), Some(table)) = (number(args, 0), args.get(1).and_then(Value::as_vector)) else {
        return Value::Undefined;
    };
    let mut points = Vec::with_capacity(table.len());
    for row in table {
        let pair = row.as_vector().unwrap_or_default();
        if let (Some(k), Some(v)) = (
            pair.first().and_then(Value::as_number),
            pair.get(1).and_then(Value::as_number),
        ) {
            points.push((k, v));
        }
    }
    let (Some(&lowest), Some(&highest)) = (
        points.iter().min_by(|a, b| a.0.total_cmp(&b.0)),
        points.iter().max_by(|a, b| a.0.total_cmp(&b.0)),
    ) else {
        return Value::Undefined;
    };
    if key <= lowest.0 {
        return Value::Number(lowest.1);
    }
    if key >= highest.0 {
        return Value::Number(highest.1);
    }
    // Closest keys on either side.
    let mut below = lowest;
    let mut above = highest;
    for &(k, v) in &points {
        if k <= key && k > below.0 {
            below = (k, v);
        }
        if k >= key && k < above.0 {
            above = (k, v);
        }
    }
    if above.0 == below.0 {
        return Value::Number(below.1);
    }
    let t = (key - below.0) / (above.0 - below.0);
    Value::Number(below.1 + t * (above.1 - below.1))
}

#[cfg(test)]
pub(super) fn find(name: &str) -> Option<&'static BuiltinFunction> {
    FUNCTIONS.iter().find(|f| f.name == name)
}
