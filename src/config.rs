//! Rendering configuration.

/// Options threaded into layout and hex partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Tag fields and hex cells with palette colors.
    pub color: bool,
    /// Hex cells per row.
    pub row_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            color: true,
            row_width: 16,
        }
    }
}

impl Config {
    pub fn with_color(self, color: bool) -> Self {
        Self { color, ..self }
    }

    /// Zero is clamped to one cell per row.
    pub fn with_row_width(self, row_width: usize) -> Self {
        Self {
            row_width: row_width.max(1),
            ..self
        }
    }

    /// Row width sized to the attached terminal (see [`crate::render::terminal_row_width`]).
    pub fn for_terminal(self) -> Self {
        self.with_row_width(crate::render::terminal_row_width())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let c = Config::default().with_color(false).with_row_width(0);
        assert!(!c.color);
        assert_eq!(c.row_width, 1);
        assert!(Config::default().for_terminal().row_width >= 1);
    }
}
