//! Schema node classification: map a [`Subcon`] to the closed set of shapes the layout
//! engine knows how to measure.

use crate::error::VisiError;
use crate::primitive;
use crate::schema::{ArrayCount, Encoding, Node, ScalarSpec, StringKind, Subcon};

/// Structural variant of a named schema node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind<'a> {
    Constant(&'a [u8]),
    Scalar(ScalarSpec),
    EnumScalar(ScalarSpec),
    String {
        encoding: Encoding,
        kind: StringKind,
    },
    Nested(&'a [Subcon]),
    ArrayOfStruct {
        count: &'a ArrayCount,
        fields: &'a [Subcon],
    },
    ArrayOfScalar {
        count: &'a ArrayCount,
        element: ScalarSpec,
    },
}

impl FieldKind<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Constant(_) => "constant",
            FieldKind::Scalar(_) => "scalar",
            FieldKind::EnumScalar(_) => "enum",
            FieldKind::String { .. } => "string",
            FieldKind::Nested(_) => "struct",
            FieldKind::ArrayOfStruct { .. } => "array of struct",
            FieldKind::ArrayOfScalar { .. } => "array of scalar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classified<'a> {
    pub name: &'a str,
    pub kind: FieldKind<'a>,
}

/// Classify one node. Anonymous nodes, padding and arrays of anything but structs or
/// plain scalars are rejected with the node's shape in the error.
pub fn classify(sub: &Subcon) -> Result<Classified<'_>, VisiError> {
    let unsupported = || VisiError::Classification {
        name: sub.name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
        shape: shape(&sub.node),
    };
    let name = sub.name.as_deref().ok_or_else(unsupported)?;
    let kind = match &sub.node {
        Node::Const(bytes) => FieldKind::Constant(bytes),
        Node::Scalar(spec) => FieldKind::Scalar(*spec),
        Node::Enum { base, .. } => FieldKind::EnumScalar(*base),
        Node::String { encoding, kind } => FieldKind::String {
            encoding: *encoding,
            kind: *kind,
        },
        Node::Struct(fields) => FieldKind::Nested(fields),
        Node::Array { count, element } => match element.as_ref() {
            Node::Struct(fields) => FieldKind::ArrayOfStruct { count, fields },
            Node::Scalar(spec) => FieldKind::ArrayOfScalar {
                count,
                element: *spec,
            },
            _ => return Err(unsupported()),
        },
        Node::Padding(_) => return Err(unsupported()),
    };
    Ok(Classified { name, kind })
}

/// One-line description of a node's shape for diagnostics.
pub(crate) fn shape(node: &Node) -> String {
    match node {
        Node::Const(bytes) => format!("Const(Bytes[{}])", bytes.len()),
        Node::Scalar(s) => primitive::describe(s.order, s.kind, s.width),
        Node::Enum { base, .. } => format!("Enum({})", primitive::describe(base.order, base.kind, base.width)),
        Node::String { encoding, kind } => format!("{:?} string ({:?})", kind, encoding),
        Node::Struct(fields) => format!("Struct with {} fields", fields.len()),
        Node::Array { count, element } => {
            let count = match count {
                ArrayCount::Fixed(n) => n.to_string(),
                ArrayCount::Field(name) => format!("this.{}", name),
            };
            format!("Array[{}] of {}", count, shape(element))
        }
        Node::Padding(n) => format!("Padding({})", n),
    }
}
