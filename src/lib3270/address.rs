//! Buffer address encoding
//!
//! Orders such as SBA carry a two-byte buffer address. The default encoding
//! is the row-major linear offset `row * cols + col` as a big-endian `u16`.
//! The historical IBM encodings (12-bit with six bits per byte drawn from a
//! graphic-character table, and 14-bit binary) are available through
//! [`AddressMode`] for hosts that still send them.

use serde::{Deserialize, Serialize};

use crate::error::{ScreenError, ScreenResult};

/// A screen cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address {
    pub row: u8,
    pub col: u8,
}

impl Address {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

/// Two-byte buffer address encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressMode {
    /// Big-endian `row * cols + col`
    #[default]
    RowMajor,
    /// IBM 12-bit addressing, six bits per byte
    Legacy12Bit,
    /// IBM 14-bit binary addressing
    Legacy14Bit,
}

impl AddressMode {
    /// Largest buffer the encoding can address
    pub fn max_buffer_size(self) -> usize {
        match self {
            AddressMode::RowMajor => u16::MAX as usize + 1,
            AddressMode::Legacy12Bit => 1 << 12,
            AddressMode::Legacy14Bit => 1 << 14,
        }
    }
}

/// IBM buffer address byte tables
pub mod legacy {
    /// Graphic byte for each 6-bit address value
    pub const ADDRESS_TABLE: [u8; 64] = [
        0x40, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7,
        0xC8, 0xC9, 0x4A, 0x4B, 0x4C, 0x4D, 0x4E, 0x4F,
        0x50, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7,
        0xD8, 0xD9, 0x5A, 0x5B, 0x5C, 0x5D, 0x5E, 0x5F,
        0x60, 0x61, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7,
        0xE8, 0xE9, 0x6A, 0x6B, 0x6C, 0x6D, 0x6E, 0x6F,
        0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7,
        0xF8, 0xF9, 0x7A, 0x7B, 0x7C, 0x7D, 0x7E, 0x7F,
    ];

    /// Encode a 12-bit address as two table bytes
    pub fn encode_12bit(address: u16) -> [u8; 2] {
        [
            ADDRESS_TABLE[((address >> 6) & 0x3F) as usize],
            ADDRESS_TABLE[(address & 0x3F) as usize],
        ]
    }

    /// Encode a 14-bit address in binary form
    pub fn encode_14bit(address: u16) -> [u8; 2] {
        [((address >> 8) & 0x3F) as u8, (address & 0xFF) as u8]
    }

    /// Decode either legacy form
    ///
    /// The two high bits of the first byte are zero only in 14-bit binary
    /// addresses; every table byte has at least one of them set.
    pub fn decode(bytes: [u8; 2]) -> u16 {
        let [b1, b2] = bytes;
        if b1 & 0xC0 == 0 {
            ((b1 as u16 & 0x3F) << 8) | b2 as u16
        } else {
            ((b1 as u16 & 0x3F) << 6) | (b2 as u16 & 0x3F)
        }
    }
}

/// Converts between [`Address`], linear offsets and wire bytes for one
/// screen geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressCodec {
    rows: u16,
    cols: u16,
    mode: AddressMode,
}

impl AddressCodec {
    /// Row-major codec for a `rows x cols` screen
    ///
    /// Zero dimensions are raised to one.
    pub fn new(rows: u8, cols: u8) -> Self {
        Self {
            rows: rows.max(1) as u16,
            cols: cols.max(1) as u16,
            mode: AddressMode::RowMajor,
        }
    }

    pub fn with_mode(mut self, mode: AddressMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    pub fn cols(&self) -> usize {
        self.cols as usize
    }

    pub fn mode(&self) -> AddressMode {
        self.mode
    }

    pub fn buffer_size(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Encode without validation
    pub fn to_bytes(&self, address: Address) -> [u8; 2] {
        let linear = (address.row as usize * self.cols() + address.col as usize) as u16;
        self.linear_to_bytes(linear)
    }

    /// Decode without validation; rows beyond 255 saturate
    pub fn from_bytes(&self, bytes: [u8; 2]) -> Address {
        let linear = self.bytes_to_linear(bytes);
        Address {
            row: u8::try_from(linear / self.cols()).unwrap_or(u8::MAX),
            col: (linear % self.cols()) as u8,
        }
    }

    /// Encode a position that must lie on the screen
    pub fn encode(&self, address: Address) -> ScreenResult<[u8; 2]> {
        self.validate(address)?;
        Ok(self.to_bytes(address))
    }

    /// Decode bytes that must name a cell on the screen
    pub fn decode(&self, bytes: [u8; 2]) -> ScreenResult<Address> {
        let linear = self.decode_linear(bytes)?;
        self.from_linear(linear)
    }

    /// Encode a linear buffer offset
    pub fn encode_linear(&self, offset: usize) -> ScreenResult<[u8; 2]> {
        self.check_linear(offset)?;
        Ok(self.linear_to_bytes(offset as u16))
    }

    /// Decode bytes to a linear buffer offset
    pub fn decode_linear(&self, bytes: [u8; 2]) -> ScreenResult<usize> {
        let linear = self.bytes_to_linear(bytes);
        self.check_linear(linear)?;
        Ok(linear)
    }

    pub fn to_linear(&self, address: Address) -> usize {
        address.row as usize * self.cols() + address.col as usize
    }

    pub fn from_linear(&self, offset: usize) -> ScreenResult<Address> {
        self.check_linear(offset)?;
        Ok(Address {
            row: (offset / self.cols()) as u8,
            col: (offset % self.cols()) as u8,
        })
    }

    /// Check that a position lies on the screen
    pub fn validate(&self, address: Address) -> ScreenResult<()> {
        if address.row as u16 >= self.rows || address.col as u16 >= self.cols {
            return Err(ScreenError::InvalidAddress {
                address: self.to_linear(address),
                buffer_size: self.buffer_size(),
            });
        }
        Ok(())
    }

    fn check_linear(&self, offset: usize) -> ScreenResult<()> {
        if offset >= self.buffer_size() {
            return Err(ScreenError::InvalidAddress {
                address: offset,
                buffer_size: self.buffer_size(),
            });
        }
        Ok(())
    }

    fn linear_to_bytes(&self, linear: u16) -> [u8; 2] {
        match self.mode {
            AddressMode::RowMajor => linear.to_be_bytes(),
            AddressMode::Legacy12Bit => legacy::encode_12bit(linear),
            AddressMode::Legacy14Bit => legacy::encode_14bit(linear),
        }
    }

    fn bytes_to_linear(&self, bytes: [u8; 2]) -> usize {
        match self.mode {
            AddressMode::RowMajor => u16::from_be_bytes(bytes) as usize,
            AddressMode::Legacy12Bit | AddressMode::Legacy14Bit => legacy::decode(bytes) as usize,
        }
    }
}

impl Default for AddressCodec {
    fn default() -> Self {
        Self::new(24, 80)
    }
}
