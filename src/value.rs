use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::callable::{Callable, Instance};
use crate::expr::LiteralValue;
use crate::token::format_number;

/// A runtime value.  The variant set is closed: every operator and coercion
/// rule in the interpreter matches on it exhaustively.
#[derive(Debug, Clone)]
pub enum Value {
    Callable(Callable),
    Instance(Rc<RefCell<Instance>>),
    Number(f64),
    String(String),
    Bool(bool),
    Nil,
}

impl Value {
    /// Truthiness of a value, or `None` when the value has none.
    ///
    /// `nil` is false, strings are truthy iff non‑empty, numbers iff non‑zero
    /// and booleans are themselves.  Callables and instances have no
    /// truthiness; testing them is a runtime type error.
    pub fn truthiness(&self) -> Option<bool> {
        match self {
            Value::Nil => Some(false),
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            Value::String(s) => Some(!s.is_empty()),
            Value::Callable(_) | Value::Instance(_) => None,
        }
    }

    /// Short kind name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Callable(Callable::Class(_)) => "class",
            Value::Callable(_) => "function",
            Value::Instance(_) => "instance",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Nil => "nil",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl PartialEq for Value {
    /// Value equality without coercion.  Callables and instances compare by
    /// identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&LiteralValue> for Value {
    fn from(literal: &LiteralValue) -> Self {
        match literal {
            LiteralValue::Number(n) => Value::Number(*n),
            LiteralValue::Str(s) => Value::String(s.clone()),
            LiteralValue::True => Value::Bool(true),
            LiteralValue::False => Value::Bool(false),
            LiteralValue::Nil => Value::Nil,
        }
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
            Value::Callable(callable) => write!(f, "{}", callable),

            Value::Instance(instance) => write!(f, "{}", instance.borrow()),

            Value::Number(n) => f.write_str(&format_number(*n)),

            Value::String(s) => write!(f, "{}", s),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Nil => write!(f, "nil"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_keep_a_fraction_when_printed() {
        assert_eq!(Value::Number(3.0).to_string(), "3.0");
        assert_eq!(Value::Number(-7.0).to_string(), "-7.0");
        assert_eq!(Value::Number(15.28).to_string(), "15.28");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
        assert_eq!(Value::Number(1e15).to_string(), "1000000000000000.0");
        assert_eq!(
            Value::Number(123456789012345678901234567890.0).to_string(),
            "123456789012345680000000000000.0"
        );
        assert_eq!(Value::Number(-2e20).to_string(), "-200000000000000000000.0");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
    }

    #[test]
    fn truthiness_follows_the_language_rules() {
        assert_eq!(Value::Nil.truthiness(), Some(false));
        assert_eq!(Value::from("").truthiness(), Some(false));
        assert_eq!(Value::from("a").truthiness(), Some(true));
        assert_eq!(Value::Number(0.0).truthiness(), Some(false));
        assert_eq!(Value::Number(2.0).truthiness(), Some(true));
        assert_eq!(Value::Bool(false).truthiness(), Some(false));
    }

    #[test]
    fn equality_never_coerces() {
        assert_ne!(Value::from("3"), Value::Number(3.0));
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_eq!(Value::Nil, Value::Nil);
        assert_eq!(Value::from("a"), Value::from("a"));
    }
}
