//! Read-only views of field values.

use std::fmt;

/// Static kind of a field, known when the schema is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Signed integer
    Int,
    /// Unsigned integer
    Uint,
    /// Floating point
    Float,
    /// Boolean
    Bool,
    /// UTF-8 text
    Text,
    /// Raw byte sequence
    Bytes,
    /// Collection of scalar elements
    List(Elem),
    /// Nested record
    Record,
    /// A kind the engine does not understand
    Opaque,
}

impl Kind {
    /// Returns `true` for integer and float kinds.
    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Int | Kind::Uint | Kind::Float)
    }

    /// The scalar kind rules compare against: the element kind for
    /// collections, the kind itself otherwise.
    pub fn scalar(self) -> Kind {
        match self {
            Kind::List(elem) => elem.kind(),
            other => other,
        }
    }
}

/// Element kind of a collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elem {
    /// Signed integer elements
    Int,
    /// Unsigned integer elements
    Uint,
    /// Float elements
    Float,
    /// Boolean elements
    Bool,
    /// Text elements
    Text,
}

impl Elem {
    /// The matching scalar [`Kind`].
    pub fn kind(self) -> Kind {
        match self {
            Elem::Int => Kind::Int,
            Elem::Uint => Kind::Uint,
            Elem::Float => Kind::Float,
            Elem::Bool => Kind::Bool,
            Elem::Text => Kind::Text,
        }
    }
}

/// Borrowed view of a field value, as seen by the rule engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// `None` in an optional field
    Null,
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    Uint(u64),
    /// Floating point
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Text
    Text(&'a str),
    /// Byte sequence
    Bytes(&'a [u8]),
    /// Collection elements
    List(Vec<Value<'a>>),
    /// Present, but not something rules can inspect
    Opaque,
}

impl<'a> Value<'a> {
    /// Numeric value as `f64`, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(i) => Some(i as f64),
            Value::Uint(u) => Some(u as f64),
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Text value, if this is text.
    pub fn as_text(&self) -> Option<&'a str> {
        match *self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Zero/empty/nil test used by `required`.
    ///
    /// Numbers and booleans are never empty: `0` and `false` are values.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Int(_)
            | Value::Uint(_)
            | Value::Float(_)
            | Value::Bool(_)
            | Value::Opaque => false,
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Opaque => write!(f, "<opaque>"),
        }
    }
}
