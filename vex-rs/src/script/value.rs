//! Runtime value type for Ex expressions.
//!
//! Strings and numbers coerce into each other the way vi-like editors do:
//! a string used as a number contributes its leading decimal digits.

use std::fmt;

use super::error::ExError;

/// An Ex script runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match item {
                        Value::Str(s) => write!(f, "'{}'", s.replace('\'', "''"))?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

impl Value {
    /// Coerce to boolean: a number is true when non-zero.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::List(items) => !items.is_empty(),
            other => other.as_int() != 0,
        }
    }

    /// Coerce to `i64`.  Strings contribute their leading (signed) digits.
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(n) => *n,
            Value::Str(s) => leading_int(s),
            Value::List(items) => items.len() as i64,
        }
    }

    /// Name of the type, as returned by `type()`-style introspection.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
        }
    }

    // ── Arithmetic helpers ────────────────────────────────────────────────────

    pub fn arith_add(&self, rhs: &Value) -> Value {
        match (self, rhs) {
            (Value::List(a), Value::List(b)) => {
                Value::List(a.iter().chain(b.iter()).cloned().collect())
            }
            _ => Value::Int(self.as_int().wrapping_add(rhs.as_int())),
        }
    }

    pub fn arith_sub(&self, rhs: &Value) -> Value {
        Value::Int(self.as_int().wrapping_sub(rhs.as_int()))
    }

    pub fn arith_mul(&self, rhs: &Value) -> Value {
        Value::Int(self.as_int().wrapping_mul(rhs.as_int()))
    }

    pub fn arith_div(&self, rhs: &Value) -> Result<Value, ExError> {
        match rhs.as_int() {
            0 => Err(ExError::DivideByZero),
            b => Ok(Value::Int(self.as_int().wrapping_div(b))),
        }
    }

    pub fn arith_rem(&self, rhs: &Value) -> Result<Value, ExError> {
        match rhs.as_int() {
            0 => Err(ExError::DivideByZero),
            b => Ok(Value::Int(self.as_int().wrapping_rem(b))),
        }
    }

    pub fn arith_neg(&self) -> Value {
        Value::Int(self.as_int().wrapping_neg())
    }

    /// String concatenation (`.`).
    pub fn concat(&self, rhs: &Value) -> Value {
        Value::Str(format!("{self}{rhs}"))
    }

    /// Relational comparison.
    ///
    /// Two strings compare as strings; anything involving a number compares
    /// numerically; lists compare element-wise.
    pub fn cmp_value(&self, rhs: &Value) -> std::cmp::Ordering {
        match (self, rhs) {
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.cmp_value(y);
                    if ord != std::cmp::Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.as_int().cmp(&rhs.as_int()),
        }
    }
}

/// Parse the leading signed decimal integer of `s` (`"12abc"` → 12, `"x"` → 0).
fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (neg, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let n: i64 = digits[..end].parse().unwrap_or(0);
    if neg {
        -n
    } else {
        n
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Int(if b { 1 } else { 0 })
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
