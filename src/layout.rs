//! Layout engine: flatten a schema + decoded value into an ordered sequence of leaf
//! [`Field`]s with lengths, end offsets, nesting and parents.
//!
//! ## Walk
//!
//! The engine walks the schema depth-first. Each scope (the root, a nested struct, one
//! array element) is located in the decoded value by a [`Path`] of name/index steps.
//! Paths are values: every recursive call receives its own extended copy, so nothing has
//! to be reset between siblings.
//!
//! Containers never produce a [`Field`] of their own. A nested struct adds one nesting
//! level for its leaves; an array of structs adds one level and walks each element with
//! the path `[.., array, index]`. An array of scalars is a single leaf.
//!
//! ## Sibling counts
//!
//! An array may take its element count from an earlier sibling's decoded value. Only
//! siblings already walked in the same scope are eligible: a reference to a later
//! sibling (or to the array itself) is a [`DependencyReason::ForwardReference`].
//!
//! ## Offsets and colors
//!
//! After the walk a single forward pass sets each field's `offset` to the running sum of
//! lengths (end of field) and draws its color from the [`Palette`].

use crate::classify::{classify, Classified, FieldKind};
use crate::codec;
use crate::config::Config;
use crate::error::{DependencyReason, VisiError};
use crate::field::{Field, Palette};
use crate::primitive;
use crate::schema::{position_in, ArrayCount, Schema, StringKind, Subcon};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;

/// One step into a decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Name(String),
    Index(usize),
}

/// Location of a scope inside the decoded value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    pub fn root() -> Self {
        Path::default()
    }

    pub fn child(&self, name: &str) -> Path {
        let mut steps = self.steps.clone();
        steps.push(PathStep::Name(name.to_string()));
        Path { steps }
    }

    pub fn index(&self, index: usize) -> Path {
        let mut steps = self.steps.clone();
        steps.push(PathStep::Index(index));
        Path { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Last name step (array indices skipped); empty at the root.
    pub fn parent_name(&self) -> &str {
        self.steps
            .iter()
            .rev()
            .find_map(|s| match s {
                PathStep::Name(n) => Some(n.as_str()),
                PathStep::Index(_) => None,
            })
            .unwrap_or("")
    }

    /// Follow the path from `root`.
    pub fn resolve<'v>(&self, root: &'v Value) -> Result<&'v Value, VisiError> {
        let mut current = root;
        for (i, step) in self.steps.iter().enumerate() {
            let next = match step {
                PathStep::Name(n) => current.as_struct().and_then(|m| m.get(n)),
                PathStep::Index(idx) => current.as_list().and_then(|l| l.get(*idx)),
            };
            current = next.ok_or_else(|| VisiError::ValueNotFound {
                path: Path {
                    steps: self.steps[..=i].to_vec(),
                }
                .to_string(),
            })?;
        }
        Ok(current)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "<root>");
        }
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Name(n) if i == 0 => write!(f, "{}", n)?,
                PathStep::Name(n) => write!(f, ".{}", n)?,
                PathStep::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

/// Compute the field sequence for `value` under `schema`.
pub fn layout(schema: &Schema, value: &Value, config: &Config) -> Result<Vec<Field>, VisiError> {
    let mut fields = Vec::new();
    walk(&schema.fields, value, &Path::root(), 0, &mut fields)?;
    assign_offsets_and_colors(&mut fields, config.color);
    Ok(fields)
}

/// Running end offsets and positional colors.
pub fn assign_offsets_and_colors(fields: &mut [Field], color: bool) {
    let mut palette = Palette::new(color);
    let mut offset = 0;
    for f in fields.iter_mut() {
        offset += f.length;
        f.offset = offset;
        f.color = palette.next_color();
    }
}

fn walk(
    subcons: &[Subcon],
    root: &Value,
    path: &Path,
    nested: usize,
    out: &mut Vec<Field>,
) -> Result<(), VisiError> {
    let scope = path
        .resolve(root)?
        .as_struct()
        .ok_or_else(|| mismatch(path, "a struct"))?;
    let parent = path.parent_name();
    let mut visited: Vec<&str> = Vec::with_capacity(subcons.len());

    for sub in subcons {
        let Classified { name, kind } = classify(sub)?;
        let field_path = path.child(name);
        tracing::debug!(
            name,
            kind = kind.label(),
            path = %field_path,
            nested,
            "classified field"
        );
        let leaf = |type_label: String, length: usize, value: Value| Field {
            name: name.to_string(),
            type_label,
            length,
            value,
            parent: parent.to_string(),
            nested,
            offset: 0,
            color: None,
        };

        match kind {
            FieldKind::Constant(bytes) => {
                let value = scope
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| Value::Bytes(bytes.to_vec()));
                out.push(leaf(format!("Const(Bytes[{}])", bytes.len()), bytes.len(), value));
            }
            FieldKind::Scalar(spec) => {
                let p = primitive::lookup(spec.order, spec.kind, spec.width)?;
                let value = lookup_value(scope, name, &field_path)?.clone();
                out.push(leaf(p.name.to_string(), p.width, value));
            }
            FieldKind::EnumScalar(spec) => {
                let p = primitive::lookup(spec.order, spec.kind, spec.width)?;
                let value = lookup_value(scope, name, &field_path)?.clone().unwrap_enum();
                out.push(leaf(format!("Enum({})", p.name), p.width, value));
            }
            FieldKind::String { encoding, kind } => {
                let value = lookup_value(scope, name, &field_path)?;
                let text = value.as_str().ok_or_else(|| mismatch(&field_path, "a string"))?;
                let encoded = codec::encode_text(text, encoding)
                    .map_err(VisiError::Encoding)?
                    .len();
                let (label, length) = match kind {
                    StringKind::NullTerminated => ("CString", encoded + encoding.unit_width()),
                    StringKind::FixedSized(size) => ("PaddedString", size),
                    StringKind::Prefixed(prefix) => ("PascalString", encoded + prefix.width_for(encoded)),
                };
                let shown = Value::str(text.trim_end_matches('\0'));
                out.push(leaf(label.to_string(), length, shown));
            }
            FieldKind::Nested(fields) => {
                walk(fields, root, &field_path, nested + 1, out)?;
            }
            FieldKind::ArrayOfStruct { count, fields } => {
                let n = resolve_count(name, count, scope, subcons, &visited)?;
                for idx in 0..n {
                    walk(fields, root, &field_path.index(idx), nested + 1, out)?;
                }
            }
            FieldKind::ArrayOfScalar { count, element } => {
                let n = resolve_count(name, count, scope, subcons, &visited)?;
                let p = primitive::lookup(element.order, element.kind, element.width)?;
                let value = lookup_value(scope, name, &field_path)?.clone();
                out.push(leaf(format!("Array[{}]", p.name), n * p.width, value));
            }
        }
        visited.push(name);
    }
    Ok(())
}

fn lookup_value<'v>(
    scope: &'v HashMap<String, Value>,
    name: &str,
    path: &Path,
) -> Result<&'v Value, VisiError> {
    scope.get(name).ok_or_else(|| VisiError::ValueNotFound {
        path: path.to_string(),
    })
}

fn mismatch(path: &Path, expected: &'static str) -> VisiError {
    VisiError::ValueMismatch {
        path: path.to_string(),
        expected,
    }
}

/// Element count of an array: the literal, or the decoded value of an already visited
/// sibling in the same scope.
fn resolve_count(
    array: &str,
    count: &ArrayCount,
    scope: &HashMap<String, Value>,
    siblings: &[Subcon],
    visited: &[&str],
) -> Result<usize, VisiError> {
    let reference = match count {
        ArrayCount::Fixed(n) => return Ok(*n),
        ArrayCount::Field(reference) => reference,
    };
    let fail = |reason| VisiError::DependencyResolution {
        array: array.to_string(),
        reference: reference.clone(),
        reason,
    };
    if !visited.contains(&reference.as_str()) {
        return Err(fail(if position_in(siblings, reference).is_some() {
            DependencyReason::ForwardReference
        } else {
            DependencyReason::Missing
        }));
    }
    let value = scope.get(reference).ok_or_else(|| fail(DependencyReason::Missing))?;
    let n = value.as_u64().ok_or_else(|| fail(DependencyReason::NotAnInteger))?;
    usize::try_from(n).map_err(|_| fail(DependencyReason::NotAnInteger))
}
