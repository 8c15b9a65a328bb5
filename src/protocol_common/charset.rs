//! Character set conversion between ASCII, Latin-1 and APL
//!
//! A [`CharsetConverter`] is configured with a source set, a target set and
//! an [`ErrorMode`] that decides what happens to bytes without a mapping.
//! EBCDIC is not reachable from here. EBCDIC data goes through
//! [`super::ebcdic`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Supported character sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterSet {
    Ascii,
    Latin1,
    Apl,
    Ebcdic,
}

impl fmt::Display for CharacterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CharacterSet::Ascii => "ASCII",
            CharacterSet::Latin1 => "Latin-1",
            CharacterSet::Apl => "APL",
            CharacterSet::Ebcdic => "EBCDIC",
        };
        f.write_str(name)
    }
}

/// Policy for bytes that have no mapping in the target set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Emit [`REPLACEMENT_CHAR`]
    #[default]
    Replace,
    /// Emit nothing
    Skip,
    /// Fail with `UnknownCharacter`
    Error,
}

/// Substitute emitted in [`ErrorMode::Replace`]
pub const REPLACEMENT_CHAR: u8 = b'?';

/// ASCII punctuation and its APL graphic-escape code point
const APL_PUNCTUATION: [(u8, u8); 20] = [
    (b'[', 0xAD),
    (b']', 0xBD),
    (b'{', 0xC0),
    (b'}', 0xD0),
    (b'\\', 0xB7),
    (b'|', 0xBF),
    (b'~', 0x80),
    (b'^', 0x71),
    (b'*', 0xAF),
    (b'_', 0x6D),
    (b'<', 0x8C),
    (b'>', 0xAE),
    (b'=', 0xBE),
    (b'+', 0x4E),
    (b'-', 0x60),
    (b'/', 0x61),
    (b'!', 0x5A),
    (b'?', 0x6F),
    (b'&', 0x50),
    (b'@', 0x7C),
];

fn ascii_to_apl(byte: u8) -> Option<u8> {
    APL_PUNCTUATION
        .iter()
        .find(|(ascii, _)| *ascii == byte)
        .map(|(_, apl)| *apl)
}

fn apl_to_ascii(byte: u8) -> Option<u8> {
    APL_PUNCTUATION
        .iter()
        .find(|(_, apl)| *apl == byte)
        .map(|(ascii, _)| *ascii)
}

/// Converter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterConfig {
    pub source: CharacterSet,
    pub target: CharacterSet,
    pub error_mode: ErrorMode,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            source: CharacterSet::Apl,
            target: CharacterSet::Ascii,
            error_mode: ErrorMode::Replace,
        }
    }
}

/// Byte-wise character set converter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharsetConverter {
    config: ConverterConfig,
}

impl CharsetConverter {
    pub fn new(source: CharacterSet, target: CharacterSet, error_mode: ErrorMode) -> Self {
        Self::from_config(ConverterConfig {
            source,
            target,
            error_mode,
        })
    }

    pub fn from_config(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ConverterConfig {
        self.config
    }

    pub fn source(&self) -> CharacterSet {
        self.config.source
    }

    pub fn target(&self) -> CharacterSet {
        self.config.target
    }

    pub fn error_mode(&self) -> ErrorMode {
        self.config.error_mode
    }

    /// Convert one byte
    ///
    /// `Ok(None)` means the byte was dropped under [`ErrorMode::Skip`].
    pub fn convert_byte(&self, byte: u8) -> CodecResult<Option<u8>> {
        use CharacterSet::*;

        let ConverterConfig { source, target, .. } = self.config;
        if source == Ebcdic || target == Ebcdic {
            return Err(CodecError::EbcdicConversionNotSupported {
                from_set: source,
                to_set: target,
            });
        }
        if source == target {
            return Ok(Some(byte));
        }

        let mapped = match (source, target) {
            (Ascii, Apl) | (Latin1, Apl) => ascii_to_apl(byte),
            (Apl, Ascii) | (Apl, Latin1) => apl_to_ascii(byte),
            (Latin1, Ascii) | (Ascii, Latin1) => (byte < 0x80).then_some(byte),
            _ => None,
        };

        match mapped {
            Some(out) => Ok(Some(out)),
            None => self.unmapped(byte),
        }
    }

    fn unmapped(&self, byte: u8) -> CodecResult<Option<u8>> {
        match self.config.error_mode {
            ErrorMode::Replace => Ok(Some(REPLACEMENT_CHAR)),
            ErrorMode::Skip => Ok(None),
            ErrorMode::Error => Err(CodecError::UnknownCharacter {
                byte,
                from_set: self.config.source,
                to_set: self.config.target,
            }),
        }
    }

    /// Convert a buffer into a new vector
    pub fn convert(&self, src: &[u8]) -> CodecResult<Vec<u8>> {
        let mut out = Vec::with_capacity(src.len());
        for &byte in src {
            if let Some(converted) = self.convert_byte(byte)? {
                out.push(converted);
            }
        }
        Ok(out)
    }

    /// Convert into `dst`, returning the number of bytes written
    pub fn convert_into(&self, src: &[u8], dst: &mut [u8]) -> CodecResult<usize> {
        if dst.len() < src.len() {
            return Err(CodecError::BufferTooSmall {
                needed: src.len(),
                available: dst.len(),
            });
        }
        let mut written = 0;
        for &byte in src {
            if let Some(converted) = self.convert_byte(byte)? {
                dst[written] = converted;
                written += 1;
            }
        }
        Ok(written)
    }
}

impl Default for CharsetConverter {
    fn default() -> Self {
        Self::from_config(ConverterConfig::default())
    }
}
