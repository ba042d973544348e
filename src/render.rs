//! Format fields and hex rows for display: plain text or ANSI-colored.

use crate::field::{Color, Field};
use crate::hex::HexCell;
use terminal_size::{terminal_size, Width};

/// Terminal columns consumed per hex cell when sizing rows to the terminal.
pub const COLUMNS_PER_CELL: usize = 8;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Wrap `text` in the SGR code for `color`; uncolored text is returned unchanged.
pub fn paint(text: &str, color: Option<Color>) -> String {
    match color {
        Some(c) => format!("\x1b[{}m{}{}", c.ansi_code(), text, RESET),
        None => text.to_string(),
    }
}

fn bold(text: &str, ansi: bool) -> String {
    if ansi {
        format!("{}{}{}", BOLD, text, RESET)
    } else {
        text.to_string()
    }
}

/// `Container:` header, then one line per field, with a `parent:` line each time the
/// parent changes.
pub fn fields_text(fields: &[Field], ansi: bool) -> String {
    let mut text = bold("Container:", ansi);
    text.push('\n');
    let mut parent = "";
    for field in fields {
        if !field.parent.is_empty() && field.parent != parent {
            let indentation = "  ".repeat(field.nested);
            text.push_str(&bold(&format!("{}{}:", indentation, field.parent), ansi));
            text.push('\n');
            parent = field.parent.as_str();
        }
        let line = field.to_string();
        if ansi {
            text.push_str(&paint(&line, field.color));
        } else {
            text.push_str(&line);
        }
        text.push('\n');
    }
    text
}

/// One line per row; each cell rendered as ` xx `.
pub fn hex_rows_text(rows: &[Vec<HexCell>], ansi: bool) -> String {
    let mut text = String::new();
    for row in rows {
        for cell in row {
            let s = format!(" {} ", cell.text());
            if ansi {
                text.push_str(&paint(&s, cell.color()));
            } else {
                text.push_str(&s);
            }
        }
        text.push('\n');
    }
    text
}

/// Hex cells per row for the attached terminal (80 columns when unknown).
pub fn terminal_row_width() -> usize {
    let columns = match terminal_size() {
        Some((Width(w), _)) => w as usize,
        None => 80,
    };
    row_width_for(columns)
}

pub fn row_width_for(columns: usize) -> usize {
    (columns / COLUMNS_PER_CELL).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn leaf(name: &str, parent: &str, nested: usize, offset: usize, color: Option<Color>) -> Field {
        Field {
            name: name.into(),
            type_label: "Int8ul".into(),
            length: 1,
            value: Value::U8(7),
            parent: parent.into(),
            nested,
            offset,
            color,
        }
    }

    #[test]
    fn parent_header_printed_once_per_run() {
        let fields = vec![
            leaf("a", "", 0, 1, None),
            leaf("b", "inner", 1, 2, None),
            leaf("c", "inner", 1, 3, None),
        ];
        let text = fields_text(&fields, false);
        assert_eq!(
            text,
            "Container:\n  a Int8ul : 7 | sz=1 offset=1\n  inner:\n    b Int8ul : 7 | sz=1 offset=2\n    c Int8ul : 7 | sz=1 offset=3\n"
        );
    }

    #[test]
    fn ansi_wraps_colored_lines_only() {
        assert_eq!(paint("x", Some(Color::Cyan)), "\x1b[36mx\x1b[0m");
        assert_eq!(paint("x", None), "x");
        let rows = vec![vec![
            HexCell::Byte { value: 0xab, color: Some(Color::Red) },
            HexCell::Padding,
        ]];
        assert_eq!(hex_rows_text(&rows, false), " ab  .. \n");
        assert_eq!(hex_rows_text(&rows, true), "\x1b[31m ab \x1b[0m .. \n");
    }

    #[test]
    fn row_width_from_columns() {
        assert_eq!(row_width_for(80), 10);
        assert_eq!(row_width_for(3), 1);
        assert!(terminal_row_width() >= 1);
    }
}
