//! Schema tree: declarative description of a binary structure.
//!
//! A [`Schema`] is the root structure: an ordered list of [`Subcon`]s, each an optional
//! name attached to a [`Node`]. Nodes nest through [`Node::Struct`] and [`Node::Array`].

use crate::primitive::{ByteOrder, NumKind};

/// Root structure definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub fields: Vec<Subcon>,
}

impl Schema {
    pub fn new(fields: Vec<Subcon>) -> Self {
        Schema { fields }
    }

    /// Position of a named field in the root scope.
    pub fn position(&self, name: &str) -> Option<usize> {
        position_in(&self.fields, name)
    }
}

pub(crate) fn position_in(fields: &[Subcon], name: &str) -> Option<usize> {
    fields.iter().position(|f| f.name.as_deref() == Some(name))
}

/// A (possibly anonymous) schema node within a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Subcon {
    pub name: Option<String>,
    pub node: Node,
}

impl Subcon {
    pub fn anonymous(node: Node) -> Self {
        Subcon { name: None, node }
    }
}

/// Shorthand for a named [`Subcon`].
pub fn field(name: impl Into<String>, node: Node) -> Subcon {
    Subcon {
        name: Some(name.into()),
        node,
    }
}

/// Node kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal bytes, checked on parse and written on build.
    Const(Vec<u8>),
    Scalar(ScalarSpec),
    /// Integer with symbolic names for some of its values.
    Enum {
        base: ScalarSpec,
        variants: Vec<(String, i64)>,
    },
    String {
        encoding: Encoding,
        kind: StringKind,
    },
    Struct(Vec<Subcon>),
    Array {
        count: ArrayCount,
        element: Box<Node>,
    },
    /// Zeroed filler bytes.
    Padding(usize),
}

impl Node {
    pub fn scalar(order: ByteOrder, kind: NumKind, width: usize) -> Self {
        Node::Scalar(ScalarSpec { order, kind, width })
    }

    pub fn enumeration<S: Into<String>>(
        base: ScalarSpec,
        variants: impl IntoIterator<Item = (S, i64)>,
    ) -> Self {
        Node::Enum {
            base,
            variants: variants.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    pub fn constant(bytes: impl Into<Vec<u8>>) -> Self {
        Node::Const(bytes.into())
    }

    pub fn cstring(encoding: Encoding) -> Self {
        Node::String {
            encoding,
            kind: StringKind::NullTerminated,
        }
    }

    pub fn padded_string(size: usize, encoding: Encoding) -> Self {
        Node::String {
            encoding,
            kind: StringKind::FixedSized(size),
        }
    }

    pub fn pascal_string(prefix: LengthPrefix, encoding: Encoding) -> Self {
        Node::String {
            encoding,
            kind: StringKind::Prefixed(prefix),
        }
    }

    pub fn structure(fields: Vec<Subcon>) -> Self {
        Node::Struct(fields)
    }

    /// Array of `count` elements, `count` fixed in the schema.
    pub fn array(count: usize, element: Node) -> Self {
        Node::Array {
            count: ArrayCount::Fixed(count),
            element: Box::new(element),
        }
    }

    /// Array whose element count is the decoded value of an earlier sibling field.
    pub fn array_sized_by(field: impl Into<String>, element: Node) -> Self {
        Node::Array {
            count: ArrayCount::Field(field.into()),
            element: Box::new(element),
        }
    }
}

/// Byte order, kind and width of a numeric primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScalarSpec {
    pub order: ByteOrder,
    pub kind: NumKind,
    pub width: usize,
}

impl ScalarSpec {
    pub const fn new(order: ByteOrder, kind: NumKind, width: usize) -> Self {
        ScalarSpec { order, kind, width }
    }

    pub const INT8UL: ScalarSpec = ScalarSpec::new(ByteOrder::Little, NumKind::Unsigned, 1);
    pub const INT16UL: ScalarSpec = ScalarSpec::new(ByteOrder::Little, NumKind::Unsigned, 2);
    pub const INT32UL: ScalarSpec = ScalarSpec::new(ByteOrder::Little, NumKind::Unsigned, 4);
    pub const INT8SB: ScalarSpec = ScalarSpec::new(ByteOrder::Big, NumKind::Signed, 1);
    pub const INT32SB: ScalarSpec = ScalarSpec::new(ByteOrder::Big, NumKind::Signed, 4);
    pub const INT32SL: ScalarSpec = ScalarSpec::new(ByteOrder::Little, NumKind::Signed, 4);
    pub const FLOAT32L: ScalarSpec = ScalarSpec::new(ByteOrder::Little, NumKind::Float, 4);
}

/// Text encoding of a string node. Multi-byte encodings are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Ascii,
    Utf8,
    Utf16,
    Utf32,
}

impl Encoding {
    /// Code unit width; also the width of the null terminator.
    pub fn unit_width(self) -> usize {
        match self {
            Encoding::Ascii | Encoding::Utf8 => 1,
            Encoding::Utf16 => 2,
            Encoding::Utf32 => 4,
        }
    }
}

/// How a string's extent is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    /// Terminated by one zero code unit.
    NullTerminated,
    /// Exactly this many bytes, zero padded.
    FixedSized(usize),
    /// Byte count stored in front of the data.
    Prefixed(LengthPrefix),
}

/// Encoding of a string's length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthPrefix {
    /// LEB128 unsigned varint.
    VarInt,
    Int(ScalarSpec),
}

impl LengthPrefix {
    /// Encoded width of the prefix for a payload of `len` bytes.
    pub fn width_for(self, len: usize) -> usize {
        match self {
            LengthPrefix::VarInt => varint_width(len as u64),
            LengthPrefix::Int(spec) => spec.width,
        }
    }
}

pub(crate) fn varint_width(mut n: u64) -> usize {
    let mut width = 1;
    while n >= 0x80 {
        n >>= 7;
        width += 1;
    }
    width
}

/// Element count of an array node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayCount {
    Fixed(usize),
    /// Name of an earlier sibling holding the count.
    Field(String),
}
