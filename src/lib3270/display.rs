//! TN3270 Display Buffer Management
//!
//! [`ScreenBuffer`] is the `rows x cols` character grid shown to the
//! operator. It holds one ASCII byte per cell in row-major order plus the
//! cursor position, and knows nothing about fields.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::address::Address;
use crate::error::{ScreenError, ScreenResult};

/// Fill byte for empty cells
pub const BLANK: u8 = b' ';

/// Standard 3270 screen sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScreenSize {
    /// Model 2: 24 rows x 80 columns (1920 characters)
    #[default]
    Model2,
    /// Model 3: 32 rows x 80 columns (2560 characters)
    Model3,
    /// Model 4: 43 rows x 80 columns (3440 characters)
    Model4,
    /// Model 5: 27 rows x 132 columns (3564 characters)
    Model5,
    /// Any other geometry
    Custom { rows: u8, cols: u8 },
}

impl ScreenSize {
    /// Get the number of rows for this screen size
    pub fn rows(&self) -> u8 {
        match self {
            Self::Model2 => 24,
            Self::Model3 => 32,
            Self::Model4 => 43,
            Self::Model5 => 27,
            Self::Custom { rows, .. } => *rows,
        }
    }

    /// Get the number of columns for this screen size
    pub fn cols(&self) -> u8 {
        match self {
            Self::Model2 | Self::Model3 | Self::Model4 => 80,
            Self::Model5 => 132,
            Self::Custom { cols, .. } => *cols,
        }
    }

    /// Get the total buffer size (rows * cols)
    pub fn buffer_size(&self) -> usize {
        self.rows() as usize * self.cols() as usize
    }
}

/// Row-major character grid with a cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenBuffer {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
    cursor: usize,
}

impl ScreenBuffer {
    /// Create a blank `rows x cols` screen
    pub fn new(rows: u8, cols: u8) -> Self {
        let rows = rows.max(1) as usize;
        let cols = cols.max(1) as usize;
        Self {
            rows,
            cols,
            cells: vec![BLANK; rows * cols],
            cursor: 0,
        }
    }

    /// Create a blank screen for a model size
    pub fn with_size(size: ScreenSize) -> Self {
        Self::new(size.rows(), size.cols())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cells
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    fn offset(&self, row: usize, col: usize) -> ScreenResult<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(ScreenError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    fn check_offset(&self, offset: usize) -> ScreenResult<()> {
        if offset >= self.cells.len() {
            return Err(ScreenError::InvalidAddress {
                address: offset,
                buffer_size: self.cells.len(),
            });
        }
        Ok(())
    }

    pub fn write_char(&mut self, row: usize, col: usize, byte: u8) -> ScreenResult<()> {
        let offset = self.offset(row, col)?;
        self.cells[offset] = byte;
        Ok(())
    }

    pub fn read_char(&self, row: usize, col: usize) -> ScreenResult<u8> {
        let offset = self.offset(row, col)?;
        Ok(self.cells[offset])
    }

    /// Write one cell by buffer offset
    pub fn write_linear(&mut self, offset: usize, byte: u8) -> ScreenResult<()> {
        self.check_offset(offset)?;
        self.cells[offset] = byte;
        Ok(())
    }

    /// Read one cell by buffer offset
    pub fn read_linear(&self, offset: usize) -> ScreenResult<u8> {
        self.check_offset(offset)?;
        Ok(self.cells[offset])
    }

    /// Write a run of bytes starting at `(row, col)`, continuing onto
    /// following rows
    pub fn write_text(&mut self, row: usize, col: usize, text: &[u8]) -> ScreenResult<()> {
        let start = self.offset(row, col)?;
        let end = self.span_end(start, text.len())?;
        self.cells[start..end].copy_from_slice(text);
        Ok(())
    }

    /// Read `len` cells starting at `(row, col)`
    pub fn read_text(&self, row: usize, col: usize, len: usize) -> ScreenResult<&[u8]> {
        let start = self.offset(row, col)?;
        let end = self.span_end(start, len)?;
        Ok(&self.cells[start..end])
    }

    /// Copy cells starting at a buffer offset into `dst`
    pub fn read_into(&self, offset: usize, dst: &mut [u8]) -> ScreenResult<()> {
        let end = self.span_end(offset, dst.len())?;
        dst.copy_from_slice(&self.cells[offset..end]);
        Ok(())
    }

    fn span_end(&self, start: usize, len: usize) -> ScreenResult<usize> {
        let end = start.saturating_add(len);
        if end > self.cells.len() {
            return Err(ScreenError::LengthExceedsScreen {
                offset: start,
                len,
                buffer_size: self.cells.len(),
            });
        }
        Ok(end)
    }

    /// One row as text
    pub fn row_text(&self, row: usize) -> ScreenResult<String> {
        let start = self.offset(row, 0)?;
        Ok(self.cells[start..start + self.cols]
            .iter()
            .map(|&b| printable(b))
            .collect())
    }

    /// Raw cell bytes in row-major order
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    /// Blank every cell and home the cursor
    pub fn clear(&mut self) {
        self.cells.fill(BLANK);
        self.cursor = 0;
    }

    pub fn cursor(&self) -> Address {
        Address {
            row: (self.cursor / self.cols) as u8,
            col: (self.cursor % self.cols) as u8,
        }
    }

    pub fn cursor_offset(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, address: Address) -> ScreenResult<()> {
        self.cursor = self.offset(address.row as usize, address.col as usize)?;
        Ok(())
    }

    pub fn set_cursor_offset(&mut self, offset: usize) -> ScreenResult<()> {
        self.check_offset(offset)?;
        self.cursor = offset;
        Ok(())
    }
}

fn printable(byte: u8) -> char {
    if byte == b' ' || byte.is_ascii_graphic() || byte >= 0xA0 {
        byte as char
    } else {
        '.'
    }
}

impl fmt::Display for ScreenBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.chunks(self.cols).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for &byte in row {
                write!(f, "{}", printable(byte))?;
            }
        }
        Ok(())
    }
}

impl Default for ScreenBuffer {
    fn default() -> Self {
        Self::with_size(ScreenSize::Model2)
    }
}
