use core::fmt;

use crate::vga_buffer::{BUFFER_HEIGHT, BUFFER_WIDTH};

/// Errors returned by the coordinate-taking operations of the text driver.
///
/// Everything else the driver does is a plain memory or port write and
/// cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtyError {
    /// The `(col, row)` pair lies outside the 80x25 grid.
    OutOfBounds { col: usize, row: usize },
    /// A linear cell offset at or past `BUFFER_WIDTH * BUFFER_HEIGHT`.
    OffsetOutOfRange(u16),
}

impl fmt::Display for TtyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtyError::OutOfBounds { col, row } => write!(
                f,
                "cell ({}, {}) is outside the {}x{} text surface",
                col, row, BUFFER_WIDTH, BUFFER_HEIGHT
            ),
            TtyError::OffsetOutOfRange(offset) => write!(
                f,
                "cell offset {} is past the last cell ({})",
                offset,
                BUFFER_WIDTH * BUFFER_HEIGHT - 1
            ),
        }
    }
}
