//! The tagged value model
//!
//! A small universe of shapes covering everything the record layer needs:
//! integers (handles, counts), strings, homogeneous arrays, and tagged
//! variants for sum types. Variant tags are part of the file format.

/// A decoded on-disk value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// 32-bit integer (handles, lengths, enum payloads)
    Int(i32),

    /// UTF-8 string
    Str(String),

    /// Length-prefixed homogeneous sequence
    Array(Vec<Value>),

    /// Sum-type constructor: `tag` is the stable discriminant, `fields`
    /// the constructor arguments (possibly empty)
    Tagged { tag: u8, fields: Vec<Value> },
}

impl Value {
    /// Shorthand for a fieldless variant
    pub fn unit(tag: u8) -> Value {
        Value::Tagged {
            tag,
            fields: Vec::new(),
        }
    }

    /// Shorthand for a variant with fields
    pub fn tagged(tag: u8, fields: Vec<Value>) -> Value {
        Value::Tagged { tag, fields }
    }

    /// Interpret as an integer
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Interpret as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret as an array slice
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Interpret as a tagged variant
    pub fn as_tagged(&self) -> Option<(u8, &[Value])> {
        match self {
            Value::Tagged { tag, fields } => Some((*tag, fields)),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(s)
    }
}
