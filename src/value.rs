//! Decoded values (what the codec produces from bytes and consumes to build them).

use std::collections::HashMap;
use std::fmt;

/// A single decoded value (field or compound).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    /// Half and single precision floats.
    Float(f32),
    Double(f64),
    Str(String),
    /// Enum integer that matched a named variant.
    Enum(EnumValue),
    Bytes(Vec<u8>),
    Struct(HashMap<String, Value>),
    List(Vec<Value>),
}

/// Symbolic enum value: variant name plus the underlying integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

impl Value {
    /// Build a struct value from `(name, value)` pairs.
    pub fn structure<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Struct(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Short variant name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::U8(_) | Value::U16(_) | Value::U32(_) | Value::U64(_) => "unsigned integer",
            Value::I8(_) | Value::I16(_) | Value::I32(_) | Value::I64(_) => "signed integer",
            Value::Float(_) | Value::Double(_) => "float",
            Value::Str(_) => "string",
            Value::Enum(_) => "enum",
            Value::Bytes(_) => "bytes",
            Value::Struct(_) => "struct",
            Value::List(_) => "list",
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U8(x) => Some(*x as u64),
            Value::U16(x) => Some(*x as u64),
            Value::U32(x) => Some(*x as u64),
            Value::U64(x) => Some(*x),
            Value::I8(_) | Value::I16(_) | Value::I32(_) | Value::I64(_) => {
                self.as_i64().and_then(|n| n.try_into().ok())
            }
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(x) => Some(*x as i64),
            Value::I16(x) => Some(*x as i64),
            Value::I32(x) => Some(*x as i64),
            Value::I64(x) => Some(*x),
            Value::U8(x) => Some(*x as i64),
            Value::U16(x) => Some(*x as i64),
            Value::U32(x) => Some(*x as i64),
            Value::U64(x) => (*x).try_into().ok(),
            Value::Enum(e) => Some(e.value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x as f64),
            Value::Double(x) => Some(*x),
            _ => self.as_i64().map(|n| n as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Struct(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Replace a symbolic enum with its display string; other values are returned as is.
    pub fn unwrap_enum(self) -> Value {
        match self {
            Value::Enum(e) => Value::Str(e.name),
            other => other,
        }
    }
}

fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect::<Vec<_>>().join(" ")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(x) => write!(f, "{}", x),
            Value::U16(x) => write!(f, "{}", x),
            Value::U32(x) => write!(f, "{}", x),
            Value::U64(x) => write!(f, "{}", x),
            Value::I8(x) => write!(f, "{}", x),
            Value::I16(x) => write!(f, "{}", x),
            Value::I32(x) => write!(f, "{}", x),
            Value::I64(x) => write!(f, "{}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Double(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Enum(e) => write!(f, "{}", e.name),
            Value::Bytes(b) => write!(f, "hex({})", hex_string(b)),
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
            Value::Struct(m) => {
                let mut keys: Vec<_> = m.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, k) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, m[k])?;
                }
                write!(f, "}}")
            }
        }
    }
}
