//! One row of the flattened layout, plus the color palette rows are tagged with.

use crate::value::Value;
use std::fmt;

/// A leaf of the schema with its decoded value and byte extent.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Declared name; unique within its parent scope only (array elements repeat it).
    pub name: String,
    /// Canonical type label, e.g. `Int32ul`, `Enum(Int8ul)`, `Array[Float32l]`.
    pub type_label: String,
    /// Encoded byte width.
    pub length: usize,
    pub value: Value,
    /// Nearest enclosing struct or array name; empty at top level.
    pub parent: String,
    /// Number of enclosing structs/arrays.
    pub nested: usize,
    /// End offset: running total of lengths up to and including this field.
    pub offset: usize,
    /// `None` when color output is disabled.
    pub color: Option<Color>,
}

impl Field {
    /// Start offset (`offset - length`).
    pub fn start(&self) -> usize {
        self.offset - self.length
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indentation = "  ".repeat(self.nested + 1);
        write!(
            f,
            "{}{} {} : {} | sz={} offset={}",
            indentation, self.name, self.type_label, self.value, self.length, self.offset
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Cyan,
    Green,
    Blue,
    Yellow,
    Purple,
    Red,
}

impl Color {
    pub const PALETTE: [Color; 6] = [
        Color::Cyan,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Purple,
        Color::Red,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Color::Cyan => "cyan",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Purple => "purple",
            Color::Red => "red",
        }
    }

    /// ANSI SGR foreground code.
    pub fn ansi_code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
            Color::Purple => 35,
            Color::Cyan => 36,
        }
    }
}

/// Cyclic color source, advanced once per emitted field. Disabled palettes yield `None`.
#[derive(Debug, Clone)]
pub struct Palette {
    enabled: bool,
    next: usize,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Palette { enabled, next: 0 }
    }

    pub fn next_color(&mut self) -> Option<Color> {
        if !self.enabled {
            return None;
        }
        let c = Color::PALETTE[self.next % Color::PALETTE.len()];
        self.next += 1;
        Some(c)
    }
}
