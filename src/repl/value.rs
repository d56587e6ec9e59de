//! Dynamic Values
//!
//! The values that evaluators hand back to the session and that the writer
//! renders. Arrays and objects are shared handles so that cyclic structures
//! can be built; everything is `Send + Sync` so completions may cross tasks.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

/// Shared, mutable array storage
pub type ArrayRef = Arc<RwLock<Vec<Value>>>;

/// Shared, mutable object storage (insertion ordered)
pub type ObjectRef = Arc<RwLock<IndexMap<String, Value>>>;

/// A dynamically typed value
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(String),
    /// Symbol with its description
    Symbol(String),
    Array(ArrayRef),
    Object(ObjectRef),
    /// Opaque callable; only the name is kept
    Function(Option<String>),
    Error(Arc<ErrorValue>),
    Proxy(Arc<ProxyValue>),
}

/// Thrown error object
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    /// Constructor name, e.g. `TypeError`
    pub name: String,
    pub message: String,
    /// Optional stack text printed below the headline
    pub stack: Option<String>,
}

/// Proxy wrapper around a target
#[derive(Debug, Clone)]
pub struct ProxyValue {
    pub target: Value,
    pub handler: Value,
}

impl Value {
    /// Create an array value
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(RwLock::new(items)))
    }

    /// Create an object value from key/value pairs
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Object(Arc::new(RwLock::new(map)))
    }

    /// Create an error value
    pub fn error(
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Value::Error(Arc::new(ErrorValue {
            name: name.into(),
            message: message.into(),
            stack: None,
        }))
    }

    /// Create a proxy value
    pub fn proxy(
        target: Value,
        handler: Value,
    ) -> Self {
        Value::Proxy(Arc::new(ProxyValue { target, handler }))
    }

    /// Wrap any error type as an `Error` value
    pub fn from_error<E: fmt::Display + ?Sized>(err: &E) -> Self {
        Value::error("Error", err.to_string())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// JavaScript truthiness
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::BigInt(n) => *n != 0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// `typeof` result
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Function(_) => "function",
            Value::Proxy(p) => p.target.type_of(),
            Value::Array(_) | Value::Object(_) | Value::Error(_) => "object",
        }
    }

    /// Identity of shared storage, used for cycle detection
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(Arc::as_ptr(a) as *const () as usize),
            Value::Object(o) => Some(Arc::as_ptr(o) as *const () as usize),
            Value::Proxy(p) => Some(Arc::as_ptr(p) as *const () as usize),
            _ => None,
        }
    }

    /// Strict equality (`===`); shared values compare by identity
    pub fn strict_eq(
        &self,
        other: &Value,
    ) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => Arc::ptr_eq(a, b),
            (Value::Symbol(_), Value::Symbol(_)) | (Value::Function(_), Value::Function(_)) => false,
            _ => match (self.identity(), other.identity()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<anyhow::Error> for Value {
    fn from(err: anyhow::Error) -> Self {
        Value::error("Error", format!("{:#}", err))
    }
}

/// Render a number the way JavaScript's `Number#toString` does
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{}", n);
    }

    // Exponent form: Rust prints `1e21`, JavaScript prints `1e+21`
    let formatted = format!("{:e}", n);
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => formatted,
    }
}

/// String conversion used by `+` concatenation.
///
/// An array reached again while it is being joined renders as empty.
pub fn to_display_string(value: &Value) -> String {
    join_string(value, &mut Vec::new())
}

fn join_string(
    value: &Value,
    seen: &mut Vec<usize>,
) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::BigInt(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Symbol(d) => format!("Symbol({})", d),
        Value::Array(_) | Value::Proxy(_) => {
            let id = value.identity().unwrap_or_default();
            if seen.contains(&id) {
                return String::new();
            }
            seen.push(id);
            let text = match value {
                Value::Array(items) => items
                    .read()
                    .iter()
                    .map(|v| match v {
                        Value::Undefined | Value::Null => String::new(),
                        other => join_string(other, seen),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
                Value::Proxy(p) => join_string(&p.target, seen),
                _ => String::new(),
            };
            seen.pop();
            text
        }
        Value::Object(_) => "[object Object]".to_string(),
        Value::Function(name) => format!("function {}() {{}}", name.as_deref().unwrap_or("")),
        Value::Error(e) if e.message.is_empty() => e.name.clone(),
        Value::Error(e) => format!("{}: {}", e.name, e.message),
    }
}
