//! YAML value representation.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a sequence.
///
/// Anchored collections are registered before their children are read, so
/// aliases (including self-references) see the same allocation.
pub type Sequence = Rc<RefCell<Vec<Value>>>;

/// Shared handle to a mapping. Keys keep insertion order.
pub type Mapping = Rc<RefCell<IndexMap<String, Value>>>;

/// A loaded YAML value.
///
/// Documents containing a self-referencing anchor produce reference cycles;
/// comparing or debug-printing such a value does not terminate.
#[derive(Clone, PartialEq)]
pub enum Value {
    /// Null value, also the value of an empty node.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Arbitrary-precision integer.
    Integer(BigInt),
    /// 64-bit floating-point number.
    Float(f64),
    /// String.
    String(String),
    /// Decoded `!!binary` data.
    Bytes(Vec<u8>),
    /// `!!timestamp` value.
    Timestamp(DateTime<FixedOffset>),
    /// Sequence of values.
    Sequence(Sequence),
    /// String-keyed mapping.
    Mapping(Mapping),
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Value {
    /// Wrap a vector as a fresh shared sequence.
    pub fn sequence(items: Vec<Value>) -> Self {
        Value::Sequence(Rc::new(RefCell::new(items)))
    }

    /// Wrap a map as a fresh shared mapping.
    pub fn mapping(entries: IndexMap<String, Value>) -> Self {
        Value::Mapping(Rc::new(RefCell::new(entries)))
    }

    /// Returns `true` if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns a reference to the integer if this is an `Integer`.
    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Integer` that fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(ToPrimitive::to_i64)
    }

    /// Returns the float value if this is a `Float`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a reference to the bytes if this is `Bytes`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the timestamp if this is a `Timestamp`.
    pub fn as_timestamp(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the shared handle if this is a `Sequence`.
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Value::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Returns the shared handle if this is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up `key` in a mapping.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_mapping()
            .and_then(|map| map.borrow().get(key).cloned())
    }

    /// Look up position `index` in a sequence.
    pub fn index(&self, index: usize) -> Option<Value> {
        self.as_sequence()
            .and_then(|seq| seq.borrow().get(index).cloned())
    }

    /// Number of entries in a collection; scalars have none.
    pub fn len(&self) -> usize {
        match self {
            Value::Sequence(seq) => seq.borrow().len(),
            Value::Mapping(map) => map.borrow().len(),
            _ => 0,
        }
    }

    /// Returns `true` for scalars and empty collections.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The text a scalar takes when used as a mapping key.
    ///
    /// Collections have no scalar text; callers decide how keys built from
    /// sequences are joined.
    pub(crate) fn scalar_text(&self) -> Option<String> {
        match self {
            Value::Null => Some("null".to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Float(f) => Some(float_text(*f)),
            Value::String(s) => Some(s.clone()),
            Value::Bytes(b) => Some(
                b.iter()
                    .map(u8::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Value::Timestamp(t) => Some(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Sequence(_) | Value::Mapping(_) => None,
        }
    }
}

/// Shortest text for a float key, spelling the non-finite values out.
fn float_text(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if f != 0.0 && (f.abs() >= 1e21 || f.abs() < 1e-6) {
        let text = format!("{:e}", f);
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => text,
        }
    } else {
        format!("{}", f)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => {
                if n.is_nan() {
                    write!(f, ".nan")
                } else if n.is_infinite() {
                    if *n > 0.0 {
                        write!(f, ".inf")
                    } else {
                        write!(f, "-.inf")
                    }
                } else {
                    write!(f, "{:?}", n)
                }
            }
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => {
                write!(f, "!!binary <")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, ">")
            }
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Sequence(seq) => f.debug_list().entries(seq.borrow().iter()).finish(),
            Value::Mapping(map) => f.debug_map().entries(map.borrow().iter()).finish(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Integer(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(BigInt::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::sequence(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::mapping(entries)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Value::Timestamp(t)
    }
}
