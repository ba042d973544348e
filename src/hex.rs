//! Hex partitioner: split a byte buffer into fixed-width rows of cells, each cell tagged
//! with the color of the field that owns the byte.

use crate::field::{Color, Field};

/// Placeholder text for cells past the end of the buffer.
pub const PLACEHOLDER: &str = "..";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HexCell {
    Byte { value: u8, color: Option<Color> },
    /// Fills the last row to full width; never colored.
    Padding,
}

impl HexCell {
    /// Two lowercase hex digits, or [`PLACEHOLDER`].
    pub fn text(&self) -> String {
        match self {
            HexCell::Byte { value, .. } => format!("{:02x}", value),
            HexCell::Padding => PLACEHOLDER.to_string(),
        }
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            HexCell::Byte { color, .. } => *color,
            HexCell::Padding => None,
        }
    }
}

/// Partition `raw` into rows of `row_width` cells (zero is treated as one).
///
/// `fields` must be in emission order. Byte `i` takes the color of the first field whose
/// end offset is past `i`; bytes beyond the last field stay uncolored.
pub fn partition(raw: &[u8], fields: &[Field], row_width: usize) -> Vec<Vec<HexCell>> {
    let row_width = row_width.max(1);
    let mut owners = fields.iter().peekable();
    let mut cells: Vec<HexCell> = Vec::with_capacity(raw.len().div_ceil(row_width) * row_width);

    for (i, &value) in raw.iter().enumerate() {
        while owners.next_if(|f| f.offset <= i).is_some() {}
        let color = owners.peek().and_then(|f| f.color);
        cells.push(HexCell::Byte { value, color });
    }
    let pad = (row_width - raw.len() % row_width) % row_width;
    cells.extend(std::iter::repeat(HexCell::Padding).take(pad));

    cells.chunks(row_width).map(|row| row.to_vec()).collect()
}
