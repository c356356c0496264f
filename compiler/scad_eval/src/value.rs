//! Runtime values.
//!
//! The language is dynamically typed with six kinds of value. Numbers are
//! always `f64`; there is no integer type.

use std::fmt;

/// Largest number of elements a range may produce in a `for` loop.
pub const MAX_FOR_ELEMENTS: u64 = 1_000_000;

/// Largest number of elements a range may select in `children()`.
pub const MAX_CHILDREN_ELEMENTS: u64 = 10_000;

/// A runtime value.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    #[default]
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    Vector(Vec<Value>),
    Range(RangeValue),
}

/// `[begin : step : end]`, inclusive of `end` when it is hit exactly.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeValue {
    pub begin: f64,
    pub step: f64,
    pub end: f64,
}

impl RangeValue {
    pub fn new(begin: f64, step: f64, end: f64) -> Self {
        RangeValue { begin, step, end }
    }

    /// Number of values the range produces, saturating at `u32::MAX`.
    ///
    /// A zero step or an infinite bound yields the saturated count so that
    /// callers reject the range by its size rather than looping forever.
    pub fn num_values(&self) -> u64 {
        let RangeValue { begin, step, end } = *self;
        let max = u64::from(u32::MAX);
        if begin.is_nan() || step.is_nan() || end.is_nan() {
            return 0;
        }
        if (step < 0.0 && begin < end) || (step >= 0.0 && begin > end) {
            return 0;
        }
        if begin == end || step.is_infinite() {
            return 1;
        }
        if begin.is_infinite() || end.is_infinite() || step == 0.0 {
            return max;
        }
        let steps = (end - begin) / step;
        // Nudge up so 0.1-style steps that land just below a whole count
        // still include the end value.
        let steps = (steps + steps.abs() * f64::EPSILON).floor();
        if steps >= max as f64 {
            max
        } else {
            steps as u64 + 1
        }
    }

    /// The values of the range, computed as `begin + i * step`.
    pub fn iter(&self) -> impl Iterator<Item = f64> {
        let RangeValue { begin, step, .. } = *self;
        let count = if step == 0.0 || step.is_nan() {
            0
        } else {
            self.num_values()
        };
        (0..count).map(move |i| begin + step * i as f64)
    }
}

impl Value {
    /// Build a vector value from any iterator of values.
    pub fn vector(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Vector(items.into_iter().collect())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Truthiness used by `if`, `?:`, `!`, `&&` and `||`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Vector(items) => !items.is_empty(),
            Value::Range(_) => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[Value]> {
        match self {
            Value::Vector(items) => Some(items),
            _ => None,
        }
    }

    /// Name of the value's type, as shown in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Vector(_) => "vector",
            Value::Range(_) => "range",
        }
    }

    /// `value[index]`. Anything out of range or ill-typed is `Undefined`.
    pub fn index(&self, index: &Value) -> Value {
        let Some(i) = index.as_number().and_then(to_index) else {
            return Value::Undefined;
        };
        match self {
            Value::Vector(items) => items.get(i).cloned().unwrap_or_default(),
            Value::String(s) => s
                .chars()
                .nth(i)
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default(),
            Value::Range(range) => match i {
                0 => Value::Number(range.begin),
                1 => Value::Number(range.step),
                2 => Value::Number(range.end),
                _ => Value::Undefined,
            },
            _ => Value::Undefined,
        }
    }

    /// `.x`, `.y` and `.z` on vectors.
    pub fn member(&self, name: &str) -> Value {
        let i = match name {
            "x" => 0,
            "y" => 1,
            "z" => 2,
            _ => return Value::Undefined,
        };
        match self {
            Value::Vector(items) => items.get(i).cloned().unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    /// Text as produced by `str()`: top-level strings are not quoted.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

fn to_index(n: f64) -> Option<usize> {
    let floored = n.floor();
    if floored.is_nan() || floored < 0.0 || floored >= usize::MAX as f64 {
        None
    } else {
        Some(floored as usize)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undef"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Value::Vector(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Range(range) => write!(
                f,
                "[{} : {} : {}]",
                format_number(range.begin),
                format_number(range.step),
                format_number(range.end)
            ),
        }
    }
}

/// Format a number like C's `%g`: six significant digits, trailing zeros
/// dropped, scientific notation for exponents below -4 or above 5.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    // Round to six significant digits first; the exponent of the rounded
    // value decides the notation.
    let sci = format!("{n:.5e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        );
    }

    let decimals = usize::try_from(5 - exponent).unwrap_or(0);
    trim_fraction(&format!("{n:.decimals$}")).to_string()
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

#[cfg(test)]
mod tests;
