//! [`VisiStruct`]: one schema with its bytes, decoded value and field layout.

use crate::codec;
use crate::config::Config;
use crate::error::VisiError;
use crate::field::Field;
use crate::hex::{self, HexCell};
use crate::layout;
use crate::render;
use crate::schema::Schema;
use crate::value::Value;
use std::fmt;

/// Inspection session over a single schema and buffer.
///
/// Whichever of bytes / decoded value is not supplied is derived with the codec, and
/// the field layout is computed, once at construction. The session is immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct VisiStruct {
    schema: Schema,
    raw: Vec<u8>,
    parsed: Value,
    fields: Vec<Field>,
    config: Config,
}

impl VisiStruct {
    pub fn new(
        schema: Schema,
        raw: Option<Vec<u8>>,
        parsed: Option<Value>,
        config: Config,
    ) -> Result<Self, VisiError> {
        let (raw, parsed) = match (raw, parsed) {
            (None, None) => return Err(VisiError::Construction),
            (Some(raw), Some(parsed)) => (raw, parsed),
            (Some(raw), None) => {
                let parsed = codec::parse(&schema, &raw).map_err(VisiError::Decoding)?;
                (raw, parsed)
            }
            (None, Some(parsed)) => {
                let raw = codec::build(&schema, &parsed).map_err(VisiError::Encoding)?;
                (raw, parsed)
            }
        };
        let fields = layout::layout(&schema, &parsed, &config)?;
        let total: usize = fields.last().map_or(0, |f| f.offset);
        if total != raw.len() {
            tracing::debug!(laid_out = total, buffer = raw.len(), "layout does not cover the whole buffer");
        }
        Ok(VisiStruct {
            schema,
            raw,
            parsed,
            fields,
            config,
        })
    }

    pub fn from_bytes(schema: Schema, raw: Vec<u8>) -> Result<Self, VisiError> {
        Self::new(schema, Some(raw), None, Config::default())
    }

    pub fn from_value(schema: Schema, parsed: Value) -> Result<Self, VisiError> {
        Self::new(schema, None, Some(parsed), Config::default())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn parsed(&self) -> &Value {
        &self.parsed
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Hex rows at an explicit width.
    pub fn hex_rows(&self, row_width: usize) -> Vec<Vec<HexCell>> {
        hex::partition(&self.raw, &self.fields, row_width)
    }

    /// Fields followed by hex rows at the configured width, ANSI-colored when color is on.
    pub fn render(&self) -> String {
        let ansi = self.config.color;
        let mut out = render::fields_text(&self.fields, ansi);
        out.push_str(&render::hex_rows_text(&self.hex_rows(self.config.row_width), ansi));
        out
    }
}

/// Plain text: field listing and hex rows without escape codes.
impl fmt::Display for VisiStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::fields_text(&self.fields, false))?;
        f.write_str(&render::hex_rows_text(&self.hex_rows(self.config.row_width), false))
    }
}
