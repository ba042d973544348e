//! Build/parse binary data from a [`Schema`].
//!
//! Handles every node kind the schema model can express: constants, scalars (any byte
//! order, including half floats), enums, the three string kinds in four encodings,
//! nested structs, arrays with fixed or sibling-sized counts, and padding.

use crate::primitive::{self, ByteOrder, NumKind};
use crate::schema::{ArrayCount, Encoding, LengthPrefix, Node, ScalarSpec, Schema, StringKind, Subcon};
use crate::value::{EnumValue, Value};
use byteorder::{BigEndian, ByteOrder as _, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("field {name}: {source}")]
    Field {
        name: String,
        #[source]
        source: Box<CodecError>,
    },
    #[error("missing value")]
    MissingValue,
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("constant mismatch: expected {expected:02x?}, found {found:02x?}")]
    ConstMismatch { expected: Vec<u8>, found: Vec<u8> },
    #[error("unknown enum variant: {0}")]
    UnknownVariant(String),
    #[error("{value} does not fit in {ty}")]
    OutOfRange { value: String, ty: String },
    #[error("invalid string: {0}")]
    InvalidString(String),
    #[error("Length/count mismatch: {0}")]
    LengthMismatch(String),
    #[error("count field {0} is missing or not a non-negative integer")]
    Count(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl CodecError {
    fn in_field(self, name: Option<&str>) -> CodecError {
        CodecError::Field {
            name: name.unwrap_or("<anonymous>").to_string(),
            source: Box::new(self),
        }
    }
}

/// Decode `bytes` into a struct value. Trailing bytes beyond the schema are ignored.
pub fn parse(schema: &Schema, bytes: &[u8]) -> Result<Value, CodecError> {
    let mut cursor = Cursor::new(bytes);
    let value = decode_fields(&mut cursor, &schema.fields)?;
    let consumed = cursor.position() as usize;
    if consumed < bytes.len() {
        tracing::debug!(consumed, total = bytes.len(), "parse left trailing bytes");
    }
    Ok(value)
}

/// Encode a struct value. Constants and padding need no entry in `value`.
pub fn build(schema: &Schema, value: &Value) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    encode_fields(&mut out, &schema.fields, value)?;
    Ok(out)
}

/// Encode text without terminator or prefix.
pub fn encode_text(text: &str, encoding: Encoding) -> Result<Vec<u8>, CodecError> {
    match encoding {
        Encoding::Ascii => {
            if !text.is_ascii() {
                return Err(CodecError::InvalidString(format!("{:?} is not ascii", text)));
            }
            Ok(text.as_bytes().to_vec())
        }
        Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
        Encoding::Utf16 => {
            let mut out = Vec::with_capacity(text.len() * 2);
            for unit in text.encode_utf16() {
                out.write_u16::<LittleEndian>(unit)?;
            }
            Ok(out)
        }
        Encoding::Utf32 => {
            let mut out = Vec::with_capacity(text.len() * 4);
            for c in text.chars() {
                out.write_u32::<LittleEndian>(c as u32)?;
            }
            Ok(out)
        }
    }
}

/// Decode text; `bytes` must be a whole number of code units.
pub fn decode_text(bytes: &[u8], encoding: Encoding) -> Result<String, CodecError> {
    let unit = encoding.unit_width();
    if bytes.len() % unit != 0 {
        return Err(CodecError::InvalidString(format!(
            "{} bytes is not a whole number of {}-byte units",
            bytes.len(),
            unit
        )));
    }
    match encoding {
        Encoding::Ascii => {
            if !bytes.is_ascii() {
                return Err(CodecError::InvalidString("non-ascii byte".to_string()));
            }
            Ok(bytes.iter().map(|&b| b as char).collect())
        }
        Encoding::Utf8 => String::from_utf8(bytes.to_vec())
            .map_err(|e| CodecError::InvalidString(e.to_string())),
        Encoding::Utf16 => {
            let units: Vec<u16> = bytes.chunks_exact(2).map(LittleEndian::read_u16).collect();
            String::from_utf16(&units).map_err(|e| CodecError::InvalidString(e.to_string()))
        }
        Encoding::Utf32 => bytes
            .chunks_exact(4)
            .map(|c| {
                let n = LittleEndian::read_u32(c);
                char::from_u32(n)
                    .ok_or_else(|| CodecError::InvalidString(format!("invalid code point {:#x}", n)))
            })
            .collect(),
    }
}

fn decode_fields(r: &mut Cursor<&[u8]>, fields: &[Subcon]) -> Result<Value, CodecError> {
    let mut ctx = DecodeContext::default();
    for f in fields {
        let start = r.position();
        let v = decode_node(r, &f.node, &ctx).map_err(|e| e.in_field(f.name.as_deref()))?;
        tracing::trace!(field = f.name.as_deref().unwrap_or("<anonymous>"), start, end = r.position(), "decoded");
        if let Some(name) = &f.name {
            ctx.set(name.clone(), v);
        }
    }
    Ok(Value::Struct(ctx.values))
}

fn decode_node(r: &mut Cursor<&[u8]>, node: &Node, ctx: &DecodeContext) -> Result<Value, CodecError> {
    match node {
        Node::Const(expected) => {
            let mut buf = vec![0u8; expected.len()];
            r.read_exact(&mut buf)?;
            if &buf != expected {
                return Err(CodecError::ConstMismatch {
                    expected: expected.clone(),
                    found: buf,
                });
            }
            Ok(Value::Bytes(buf))
        }
        Node::Scalar(spec) => decode_scalar(r, spec),
        Node::Enum { base, variants } => {
            let v = decode_scalar(r, base)?;
            let n = v.as_i64();
            Ok(variants
                .iter()
                .find(|(_, value)| Some(*value) == n)
                .map(|(name, value)| {
                    Value::Enum(EnumValue {
                        name: name.clone(),
                        value: *value,
                    })
                })
                .unwrap_or(v))
        }
        Node::String { encoding, kind } => decode_string(r, *encoding, kind),
        Node::Struct(fields) => decode_fields(r, fields),
        Node::Array { count, element } => {
            let n = match count {
                ArrayCount::Fixed(n) => *n,
                ArrayCount::Field(name) => {
                    let n = ctx
                        .get(name)
                        .and_then(Value::as_u64)
                        .ok_or_else(|| CodecError::Count(name.clone()))?;
                    let remaining = remaining(r);
                    if n > remaining {
                        return Err(CodecError::LengthMismatch(format!(
                            "count {} = {} exceeds the {} bytes left",
                            name, n, remaining
                        )));
                    }
                    n as usize
                }
            };
            let mut items = Vec::with_capacity(n.min(4096));
            for _ in 0..n {
                items.push(decode_node(r, element, ctx)?);
            }
            Ok(Value::List(items))
        }
        Node::Padding(n) => {
            let mut buf = vec![0u8; *n];
            r.read_exact(&mut buf)?;
            Ok(Value::Bytes(buf))
        }
    }
}

macro_rules! read_ordered {
    ($r:expr, $order:expr, $method:ident) => {
        match $order {
            ByteOrder::Big => $r.$method::<BigEndian>()?,
            _ => $r.$method::<LittleEndian>()?,
        }
    };
}

macro_rules! write_ordered {
    ($w:expr, $order:expr, $method:ident, $v:expr) => {
        match $order {
            ByteOrder::Big => $w.$method::<BigEndian>($v)?,
            _ => $w.$method::<LittleEndian>($v)?,
        }
    };
}

fn check_supported(spec: &ScalarSpec) -> Result<(), CodecError> {
    primitive::lookup(spec.order, spec.kind, spec.width)
        .map(|_| ())
        .map_err(|_| CodecError::Unsupported(primitive::describe(spec.order, spec.kind, spec.width)))
}

fn decode_scalar(r: &mut Cursor<&[u8]>, spec: &ScalarSpec) -> Result<Value, CodecError> {
    check_supported(spec)?;
    let order = spec.order.resolved();
    Ok(match (spec.kind, spec.width) {
        (NumKind::Unsigned, 1) => Value::U8(r.read_u8()?),
        (NumKind::Unsigned, 2) => Value::U16(read_ordered!(r, order, read_u16)),
        (NumKind::Unsigned, 4) => Value::U32(read_ordered!(r, order, read_u32)),
        (NumKind::Unsigned, _) => Value::U64(read_ordered!(r, order, read_u64)),
        (NumKind::Signed, 1) => Value::I8(r.read_i8()?),
        (NumKind::Signed, 2) => Value::I16(read_ordered!(r, order, read_i16)),
        (NumKind::Signed, 4) => Value::I32(read_ordered!(r, order, read_i32)),
        (NumKind::Signed, _) => Value::I64(read_ordered!(r, order, read_i64)),
        (NumKind::Float, 2) => Value::Float(f16_to_f32(read_ordered!(r, order, read_u16))),
        (NumKind::Float, 4) => Value::Float(read_ordered!(r, order, read_f32)),
        (NumKind::Float, _) => Value::Double(read_ordered!(r, order, read_f64)),
    })
}

fn decode_string(r: &mut Cursor<&[u8]>, encoding: Encoding, kind: &StringKind) -> Result<Value, CodecError> {
    let unit = encoding.unit_width();
    let text = match kind {
        StringKind::NullTerminated => {
            let mut data = Vec::new();
            let mut buf = vec![0u8; unit];
            loop {
                r.read_exact(&mut buf)?;
                if buf.iter().all(|&b| b == 0) {
                    break;
                }
                data.extend_from_slice(&buf);
            }
            decode_text(&data, encoding)?
        }
        StringKind::FixedSized(size) => {
            let mut buf = vec![0u8; *size];
            r.read_exact(&mut buf)?;
            let mut end = buf.len() - buf.len() % unit;
            while end >= unit && buf[end - unit..end].iter().all(|&b| b == 0) {
                end -= unit;
            }
            decode_text(&buf[..end], encoding)?
        }
        StringKind::Prefixed(prefix) => {
            let len = read_prefix(r, prefix)?;
            let mut buf = vec![0u8; len];
            r.read_exact(&mut buf)?;
            decode_text(&buf, encoding)?
        }
    };
    Ok(Value::Str(text))
}

fn remaining(r: &Cursor<&[u8]>) -> u64 {
    let len = r.get_ref().len() as u64;
    len - r.position().min(len)
}

fn read_prefix(r: &mut Cursor<&[u8]>, prefix: &LengthPrefix) -> Result<usize, CodecError> {
    let n = match prefix {
        LengthPrefix::VarInt => {
            let mut n = 0u64;
            let mut shift = 0u32;
            loop {
                let b = r.read_u8()?;
                if shift >= 64 {
                    return Err(CodecError::LengthMismatch("varint too long".to_string()));
                }
                n |= ((b & 0x7f) as u64) << shift;
                if b & 0x80 == 0 {
                    // a zero final byte after the first means a padded (overlong) encoding
                    if b == 0 && shift > 0 {
                        return Err(CodecError::LengthMismatch("overlong varint length prefix".to_string()));
                    }
                    break;
                }
                shift += 7;
            }
            n
        }
        LengthPrefix::Int(spec) => decode_scalar(r, spec)?
            .as_u64()
            .ok_or_else(|| CodecError::LengthMismatch("negative or non-integer length prefix".to_string()))?,
    };
    let remaining = remaining(r);
    if n > remaining {
        return Err(CodecError::LengthMismatch(format!(
            "prefix says {} bytes, {} remain",
            n, remaining
        )));
    }
    Ok(n as usize)
}

fn encode_fields(w: &mut Vec<u8>, fields: &[Subcon], value: &Value) -> Result<(), CodecError> {
    let scope = value.as_struct().ok_or(CodecError::TypeMismatch {
        expected: "struct",
        found: value.kind_name(),
    })?;
    let ctx = EncodeContext::from_values(scope);
    for f in fields {
        let v = f.name.as_deref().and_then(|n| ctx.get(n));
        encode_node(w, &f.node, v, &ctx).map_err(|e| e.in_field(f.name.as_deref()))?;
    }
    Ok(())
}

fn encode_node(
    w: &mut Vec<u8>,
    node: &Node,
    v: Option<&Value>,
    ctx: &EncodeContext,
) -> Result<(), CodecError> {
    match node {
        Node::Const(expected) => {
            if let Some(found) = v.and_then(Value::as_bytes) {
                if found != expected.as_slice() {
                    return Err(CodecError::ConstMismatch {
                        expected: expected.clone(),
                        found: found.to_vec(),
                    });
                }
            }
            w.write_all(expected)?;
            Ok(())
        }
        Node::Padding(n) => {
            w.write_all(&vec![0u8; *n])?;
            Ok(())
        }
        Node::Scalar(spec) => encode_scalar(w, spec, v.ok_or(CodecError::MissingValue)?),
        Node::Enum { base, variants } => {
            let v = v.ok_or(CodecError::MissingValue)?;
            let n = match v {
                Value::Str(name) => variants
                    .iter()
                    .find(|(variant, _)| variant == name)
                    .map(|(_, n)| *n)
                    .ok_or_else(|| CodecError::UnknownVariant(name.clone()))?,
                other => other.as_i64().ok_or(CodecError::TypeMismatch {
                    expected: "enum name or integer",
                    found: other.kind_name(),
                })?,
            };
            encode_scalar(w, base, &Value::I64(n))
        }
        Node::String { encoding, kind } => {
            let v = v.ok_or(CodecError::MissingValue)?;
            let text = v.as_str().ok_or(CodecError::TypeMismatch {
                expected: "string",
                found: v.kind_name(),
            })?;
            encode_string(w, text, *encoding, kind)
        }
        Node::Struct(fields) => encode_fields(w, fields, v.ok_or(CodecError::MissingValue)?),
        Node::Array { count, element } => {
            let v = v.ok_or(CodecError::MissingValue)?;
            let items = v.as_list().ok_or(CodecError::TypeMismatch {
                expected: "list",
                found: v.kind_name(),
            })?;
            let expected = match count {
                ArrayCount::Fixed(n) => *n,
                ArrayCount::Field(name) => ctx
                    .get(name)
                    .and_then(Value::as_u64)
                    .ok_or_else(|| CodecError::Count(name.clone()))? as usize,
            };
            if items.len() != expected {
                return Err(CodecError::LengthMismatch(format!(
                    "array has {} items, count is {}",
                    items.len(),
                    expected
                )));
            }
            for item in items {
                encode_node(w, element, Some(item), ctx)?;
            }
            Ok(())
        }
    }
}

fn out_of_range(value: impl ToString, spec: &ScalarSpec) -> CodecError {
    CodecError::OutOfRange {
        value: value.to_string(),
        ty: primitive::describe(spec.order, spec.kind, spec.width),
    }
}

fn encode_scalar(w: &mut Vec<u8>, spec: &ScalarSpec, v: &Value) -> Result<(), CodecError> {
    check_supported(spec)?;
    let order = spec.order.resolved();
    match spec.kind {
        NumKind::Unsigned => {
            let n = v.as_u64().ok_or(CodecError::TypeMismatch {
                expected: "unsigned integer",
                found: v.kind_name(),
            })?;
            match spec.width {
                1 => w.write_u8(u8::try_from(n).map_err(|_| out_of_range(n, spec))?)?,
                2 => write_ordered!(w, order, write_u16, u16::try_from(n).map_err(|_| out_of_range(n, spec))?),
                4 => write_ordered!(w, order, write_u32, u32::try_from(n).map_err(|_| out_of_range(n, spec))?),
                _ => write_ordered!(w, order, write_u64, n),
            }
        }
        NumKind::Signed => {
            let n = v.as_i64().ok_or(CodecError::TypeMismatch {
                expected: "integer",
                found: v.kind_name(),
            })?;
            match spec.width {
                1 => w.write_i8(i8::try_from(n).map_err(|_| out_of_range(n, spec))?)?,
                2 => write_ordered!(w, order, write_i16, i16::try_from(n).map_err(|_| out_of_range(n, spec))?),
                4 => write_ordered!(w, order, write_i32, i32::try_from(n).map_err(|_| out_of_range(n, spec))?),
                _ => write_ordered!(w, order, write_i64, n),
            }
        }
        NumKind::Float => {
            let x = v.as_f64().ok_or(CodecError::TypeMismatch {
                expected: "float",
                found: v.kind_name(),
            })?;
            match spec.width {
                2 => write_ordered!(w, order, write_u16, f32_to_f16(x as f32)),
                4 => write_ordered!(w, order, write_f32, x as f32),
                _ => write_ordered!(w, order, write_f64, x),
            }
        }
    }
    Ok(())
}

fn encode_string(w: &mut Vec<u8>, text: &str, encoding: Encoding, kind: &StringKind) -> Result<(), CodecError> {
    let data = encode_text(text, encoding)?;
    match kind {
        StringKind::NullTerminated => {
            w.write_all(&data)?;
            w.write_all(&vec![0u8; encoding.unit_width()])?;
        }
        StringKind::FixedSized(size) => {
            if data.len() > *size {
                return Err(CodecError::InvalidString(format!(
                    "{} bytes do not fit in {}",
                    data.len(),
                    size
                )));
            }
            w.write_all(&data)?;
            w.write_all(&vec![0u8; size - data.len()])?;
        }
        StringKind::Prefixed(LengthPrefix::VarInt) => {
            let mut n = data.len() as u64;
            loop {
                let b = (n & 0x7f) as u8;
                n >>= 7;
                if n == 0 {
                    w.write_u8(b)?;
                    break;
                }
                w.write_u8(b | 0x80)?;
            }
            w.write_all(&data)?;
        }
        StringKind::Prefixed(LengthPrefix::Int(spec)) => {
            encode_scalar(w, spec, &Value::U64(data.len() as u64))?;
            w.write_all(&data)?;
        }
    }
    Ok(())
}

/// IEEE 754 binary16 to binary32.
fn f16_to_f32(h: u16) -> f32 {
    let sign = ((h >> 15) & 1) as u32;
    let exp = ((h >> 10) & 0x1f) as u32;
    let frac = (h & 0x3ff) as u32;
    let bits = match exp {
        0 if frac == 0 => sign << 31,
        0 => {
            let v = frac as f32 / 16_777_216.0;
            return if sign == 1 { -v } else { v };
        }
        0x1f => (sign << 31) | 0x7f80_0000 | (frac << 13),
        _ => (sign << 31) | ((exp + 112) << 23) | (frac << 13),
    };
    f32::from_bits(bits)
}

/// IEEE 754 binary32 to binary16, rounding half up.
fn f32_to_f16(v: f32) -> u16 {
    let bits = v.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let frac = bits & 0x007f_ffff;
    if exp == 0xff {
        return sign | 0x7c00 | if frac != 0 { 0x200 } else { 0 };
    }
    let e = exp - 127 + 15;
    if e >= 0x1f {
        return sign | 0x7c00;
    }
    if e <= 0 {
        if e < -10 {
            return sign;
        }
        let m = frac | 0x0080_0000;
        let shift = (14 - e) as u32;
        let half = 1u32 << (shift - 1);
        return sign | ((m + half) >> shift) as u16;
    }
    let rounded = (frac + 0x1000) >> 13;
    sign | (((e as u32) << 10) + rounded) as u16
}

#[derive(Default)]
struct DecodeContext {
    values: HashMap<String, Value>,
}

impl DecodeContext {
    fn get(&self, k: &str) -> Option<&Value> {
        self.values.get(k)
    }
    fn set(&mut self, k: String, v: Value) {
        self.values.insert(k, v);
    }
}

struct EncodeContext<'a> {
    values: &'a HashMap<String, Value>,
}

impl<'a> EncodeContext<'a> {
    fn from_values(m: &'a HashMap<String, Value>) -> Self {
        EncodeContext { values: m }
    }
    fn get(&self, k: &str) -> Option<&'a Value> {
        self.values.get(k)
    }
}
