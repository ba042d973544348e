//! Primitive type registry: (byte order, numeric kind, width) to canonical name.
//!
//! Names follow the `Int{bits}{s|u}{b|l|n}` / `Float{bits}{b|l|n}` convention, e.g.
//! `Int32ul` is a little-endian unsigned 32-bit integer and `Float16n` a native-order
//! half float.

use crate::error::VisiError;
use std::fmt;

/// Byte order of a multi-byte primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Big,
    Little,
    /// Host byte order.
    Native,
}

impl ByteOrder {
    fn suffix(self) -> char {
        match self {
            ByteOrder::Big => 'b',
            ByteOrder::Little => 'l',
            ByteOrder::Native => 'n',
        }
    }

    /// Big or little, with `Native` mapped to the target's endianness.
    pub fn resolved(self) -> ByteOrder {
        match self {
            ByteOrder::Native if cfg!(target_endian = "big") => ByteOrder::Big,
            ByteOrder::Native => ByteOrder::Little,
            other => other,
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Big => write!(f, "big"),
            ByteOrder::Little => write!(f, "little"),
            ByteOrder::Native => write!(f, "native"),
        }
    }
}

/// Numeric element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumKind {
    Signed,
    Unsigned,
    Float,
}

impl fmt::Display for NumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumKind::Signed => write!(f, "signed"),
            NumKind::Unsigned => write!(f, "unsigned"),
            NumKind::Float => write!(f, "float"),
        }
    }
}

/// A registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
    pub name: &'static str,
    pub width: usize,
}

static REGISTRY: [(ByteOrder, NumKind, usize, &str); 33] = [
    (ByteOrder::Big, NumKind::Unsigned, 1, "Int8ub"),
    (ByteOrder::Big, NumKind::Unsigned, 2, "Int16ub"),
    (ByteOrder::Big, NumKind::Unsigned, 4, "Int32ub"),
    (ByteOrder::Big, NumKind::Unsigned, 8, "Int64ub"),
    (ByteOrder::Big, NumKind::Signed, 1, "Int8sb"),
    (ByteOrder::Big, NumKind::Signed, 2, "Int16sb"),
    (ByteOrder::Big, NumKind::Signed, 4, "Int32sb"),
    (ByteOrder::Big, NumKind::Signed, 8, "Int64sb"),
    (ByteOrder::Little, NumKind::Unsigned, 1, "Int8ul"),
    (ByteOrder::Little, NumKind::Unsigned, 2, "Int16ul"),
    (ByteOrder::Little, NumKind::Unsigned, 4, "Int32ul"),
    (ByteOrder::Little, NumKind::Unsigned, 8, "Int64ul"),
    (ByteOrder::Little, NumKind::Signed, 1, "Int8sl"),
    (ByteOrder::Little, NumKind::Signed, 2, "Int16sl"),
    (ByteOrder::Little, NumKind::Signed, 4, "Int32sl"),
    (ByteOrder::Little, NumKind::Signed, 8, "Int64sl"),
    (ByteOrder::Native, NumKind::Unsigned, 1, "Int8un"),
    (ByteOrder::Native, NumKind::Unsigned, 2, "Int16un"),
    (ByteOrder::Native, NumKind::Unsigned, 4, "Int32un"),
    (ByteOrder::Native, NumKind::Unsigned, 8, "Int64un"),
    (ByteOrder::Native, NumKind::Signed, 1, "Int8sn"),
    (ByteOrder::Native, NumKind::Signed, 2, "Int16sn"),
    (ByteOrder::Native, NumKind::Signed, 4, "Int32sn"),
    (ByteOrder::Native, NumKind::Signed, 8, "Int64sn"),
    (ByteOrder::Big, NumKind::Float, 2, "Float16b"),
    (ByteOrder::Little, NumKind::Float, 2, "Float16l"),
    (ByteOrder::Native, NumKind::Float, 2, "Float16n"),
    (ByteOrder::Big, NumKind::Float, 4, "Float32b"),
    (ByteOrder::Little, NumKind::Float, 4, "Float32l"),
    (ByteOrder::Native, NumKind::Float, 4, "Float32n"),
    (ByteOrder::Big, NumKind::Float, 8, "Float64b"),
    (ByteOrder::Little, NumKind::Float, 8, "Float64l"),
    (ByteOrder::Native, NumKind::Float, 8, "Float64n"),
];

/// Look up a primitive. Unsupported combinations are an error, never a guess.
pub fn lookup(order: ByteOrder, kind: NumKind, width: usize) -> Result<Primitive, VisiError> {
    REGISTRY
        .iter()
        .find(|(o, k, w, _)| *o == order && *k == kind && *w == width)
        .map(|&(_, _, width, name)| Primitive { name, width })
        .ok_or(VisiError::Lookup { order, kind, width })
}

/// Canonical name built from the naming convention, for labels on entries that may
/// be absent from the registry (diagnostics only).
pub(crate) fn describe(order: ByteOrder, kind: NumKind, width: usize) -> String {
    match kind {
        NumKind::Float => format!("Float{}{}", width * 8, order.suffix()),
        NumKind::Signed => format!("Int{}s{}", width * 8, order.suffix()),
        NumKind::Unsigned => format!("Int{}u{}", width * 8, order.suffix()),
    }
}
