//! Error handling for TN3270R
//!
//! Errors are grouped by the component that raises them. Each category enum
//! carries the context needed for diagnostics (positions, sizes, field
//! indices), and every message ends with a concrete `Recovery:` suggestion so
//! it can be shown to an operator as-is.

use std::io;

use thiserror::Error;

use crate::protocol_common::charset::CharacterSet;

/// Top-level error type for TN3270R operations
#[derive(Debug, Error)]
pub enum Tn3270Error {
    /// Command/order stream and framing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    /// Structured field payload errors
    #[error("Structured field error: {0}")]
    StructuredField(#[from] StructuredFieldError),
    /// Character conversion errors
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    /// Screen buffer addressing errors
    #[error("Screen error: {0}")]
    Screen(#[from] ScreenError),
    /// Field model and data entry errors
    #[error("Field error: {0}")]
    Field(#[from] FieldError),
    /// External field storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// Transport errors reported by the network layer
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Coarse grouping used for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Parse,
    Codec,
    Screen,
    Field,
    Storage,
    Connection,
    Config,
}

impl Tn3270Error {
    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Tn3270Error::Parse(_) | Tn3270Error::StructuredField(_) => ErrorCategory::Parse,
            Tn3270Error::Codec(_) => ErrorCategory::Codec,
            Tn3270Error::Screen(_) => ErrorCategory::Screen,
            Tn3270Error::Field(_) => ErrorCategory::Field,
            Tn3270Error::Storage(_) => ErrorCategory::Storage,
            Tn3270Error::Connection(_) => ErrorCategory::Connection,
            Tn3270Error::Config(_) => ErrorCategory::Config,
        }
    }

    /// The `Recovery:` suggestion embedded in the message
    pub fn recovery_suggestion(&self) -> Option<String> {
        let message = self.to_string();
        message
            .find("Recovery:")
            .map(|pos| message[pos + "Recovery:".len()..].trim().to_string())
    }
}

fn expected_suffix(expected: &Option<&'static str>) -> String {
    match expected {
        Some(what) => format!(", expected {what}"),
        None => String::new(),
    }
}

/// Stream parsing and framing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected end of buffer at position {position} (buffer size {buffer_size}){}. Recovery: keep the bytes buffered and retry once more data arrives", expected_suffix(.expected))]
    EndOfBuffer {
        position: usize,
        buffer_size: usize,
        expected: Option<&'static str>,
    },

    #[error("insufficient data at position {position}: need {needed} bytes, buffer size {buffer_size}{}. Recovery: check the record framing or wait for the rest of the record", expected_suffix(.expected))]
    InsufficientData {
        position: usize,
        buffer_size: usize,
        needed: usize,
        expected: Option<&'static str>,
    },

    #[error("invalid command code 0x{code:02X} at position {position} (buffer size {buffer_size}). Recovery: discard this record and resynchronize on the next end-of-record marker")]
    InvalidCommandCode {
        code: u8,
        position: usize,
        buffer_size: usize,
    },

    #[error("structured field at position {position} declares {declared} bytes but only {remaining} remain. Recovery: the stream is out of sync; drop the record and request a screen refresh")]
    IncompleteField {
        position: usize,
        declared: usize,
        remaining: usize,
    },

    #[error("stream buffer overflow: {buffered} bytes buffered, {incoming} incoming, capacity {capacity}. Recovery: parse pending records before feeding more data or raise the stream buffer capacity")]
    BufferOverflow {
        capacity: usize,
        buffered: usize,
        incoming: usize,
    },
}

/// Type-specific structured field payload errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuredFieldError {
    #[error("color pair payload is {actual} bytes, need {required}. Recovery: ignore the record and keep the current palette")]
    InvalidColorPair { actual: usize, required: usize },

    #[error("extended field attribute payload is {actual} bytes, need {required}. Recovery: ignore the record and keep the field's current attributes")]
    InvalidExtendedField { actual: usize, required: usize },

    #[error("field validation payload is {actual} bytes, need {required}. Recovery: ignore the record; the field stays unvalidated")]
    InvalidValidationRule { actual: usize, required: usize },

    #[error("seal/unseal payload is {actual} bytes, need {required}. Recovery: ignore the record and keep the current seal state")]
    InvalidSealUnseal { actual: usize, required: usize },

    #[error("transparency payload is {actual} bytes, need {required}. Recovery: ignore the record and keep the field opaque")]
    InvalidTransparency { actual: usize, required: usize },

    #[error("character set payload is {actual} bytes, need {required}. Recovery: ignore the record and keep the active character set")]
    InvalidCharacterSet { actual: usize, required: usize },
}

/// Character conversion errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("value 0x{value:X} is not 7-bit ASCII. Recovery: strip or replace non-ASCII characters before encoding")]
    InvalidAsciiValue { value: u32 },

    #[error("destination holds {available} bytes but {needed} are required. Recovery: allocate a destination at least as long as the source")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("byte 0x{byte:02X} has no mapping from {from_set} to {to_set}. Recovery: use the replace or skip error mode")]
    UnknownCharacter {
        byte: u8,
        from_set: CharacterSet,
        to_set: CharacterSet,
    },

    #[error("conversion from {from_set} to {to_set} is not supported by the converter. Recovery: use the EBCDIC codec for EBCDIC data")]
    EbcdicConversionNotSupported {
        from_set: CharacterSet,
        to_set: CharacterSet,
    },
}

/// Screen buffer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenError {
    #[error("position ({row}, {col}) is outside the {rows}x{cols} screen. Recovery: clamp the position to the screen geometry")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("buffer address {address} is outside the {buffer_size}-cell buffer. Recovery: check the configured screen model and address mode")]
    InvalidAddress { address: usize, buffer_size: usize },

    #[error("{len} bytes starting at offset {offset} run past the {buffer_size}-cell buffer. Recovery: shorten the text or start it earlier on the screen")]
    LengthExceedsScreen {
        offset: usize,
        len: usize,
        buffer_size: usize,
    },
}

/// Field model and data entry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field {index} at address {address} is protected. Recovery: tab to an unprotected field before typing")]
    Protected { index: usize, address: u16 },

    #[error("field {index} is full ({length} bytes). Recovery: tab to the next field or backspace first")]
    Full { index: usize, length: usize },

    #[error("offset {offset} is outside a field of length {length}. Recovery: keep offsets below the field length")]
    OutOfBounds { offset: usize, length: usize },

    #[error("no unprotected fields among {count} fields. Recovery: wait for the host to send an input screen")]
    NoUnprotectedFields { count: usize },

    #[error("no field is selected. Recovery: call home() or tab() to select an input field")]
    NoCurrentField,

    #[error("field index {index} is invalid ({count} fields). Recovery: re-read the field list after screen updates")]
    InvalidFieldIndex { index: usize, count: usize },

    #[error("field at {start} (length {length}) overlaps field {existing_index} at {existing_start}. Recovery: remove the existing field or pick a non-overlapping range")]
    Overlap {
        start: u16,
        length: usize,
        existing_index: usize,
        existing_start: u16,
    },

    #[error("field {index} cursor is already at the start. Recovery: nothing to delete; move to another field")]
    AlreadyAtFieldStart { index: usize },

    #[error("field at {start} with length {length} does not fit a {buffer_size}-cell buffer. Recovery: use a non-zero length that ends inside the buffer")]
    InvalidLength {
        start: u16,
        length: usize,
        buffer_size: usize,
    },

    #[error("field at {start} failed validation: {reason}. Recovery: correct the input before sending it to the host")]
    ValidationFailed { start: u16, reason: String },
}

/// External field storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("field storage full: requested {requested} bytes, {remaining} of {capacity} remaining. Recovery: compact or reset the storage, or raise its capacity")]
    StorageFull {
        requested: usize,
        remaining: usize,
        capacity: usize,
    },

    #[error("field holds {expected} bytes but {actual} were supplied. Recovery: pad or truncate the data to the field length")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("handle ({offset}, {length}) is outside the {used} bytes in use. Recovery: handles are invalidated by reset(); look the field up again")]
    InvalidHandle {
        offset: usize,
        length: usize,
        used: usize,
    },

    #[error("offset {offset} is outside a {length}-byte field slot. Recovery: keep offsets below the field length")]
    OffsetOutOfRange { offset: usize, length: usize },
}

/// Network-layer errors consumed through the same taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("not connected. Recovery: connect to the host before sending data")]
    NotConnected,

    #[error("invalid host address '{address}'. Recovery: check the host name and port")]
    InvalidAddress { address: String },

    #[error("connection refused by {host}:{port}. Recovery: verify the host is up and the port accepts TN3270 sessions")]
    ConnectionRefused { host: String, port: u16 },

    #[error("{operation} timed out after {timeout_ms}ms. Recovery: retry, or raise the timeout for slow links")]
    Timeout { operation: String, timeout_ms: u64 },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for '{parameter}': {reason}. Recovery: fix the parameter or delete it to use the default")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    #[error("cannot access config file {path}: {source}. Recovery: check the path and its permissions")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed config JSON: {0}. Recovery: fix the JSON or delete the file to regenerate defaults")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for TN3270R operations
pub type Result<T> = std::result::Result<T, Tn3270Error>;

/// Result type alias for parse operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type alias for structured field decoding
pub type StructuredFieldResult<T> = std::result::Result<T, StructuredFieldError>;

/// Result type alias for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Result type alias for screen operations
pub type ScreenResult<T> = std::result::Result<T, ScreenError>;

/// Result type alias for field operations
pub type FieldResult<T> = std::result::Result<T, FieldError>;

/// Result type alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type alias for configuration
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_message_has_recovery() {
        let errors: Vec<Tn3270Error> = vec![
            ParseError::EndOfBuffer { position: 0, buffer_size: 0, expected: Some("command code") }.into(),
            ParseError::InvalidCommandCode { code: 0x99, position: 0, buffer_size: 2 }.into(),
            ParseError::IncompleteField { position: 0, declared: 9, remaining: 4 }.into(),
            StructuredFieldError::InvalidColorPair { actual: 1, required: 3 }.into(),
            CodecError::InvalidAsciiValue { value: 0x80 }.into(),
            CodecError::EbcdicConversionNotSupported {
                from_set: CharacterSet::Ebcdic,
                to_set: CharacterSet::Ascii,
            }
            .into(),
            ScreenError::OutOfBounds { row: 30, col: 0, rows: 24, cols: 80 }.into(),
            FieldError::Protected { index: 0, address: 1 }.into(),
            FieldError::NoCurrentField.into(),
            StorageError::StorageFull { requested: 5, remaining: 4, capacity: 10 }.into(),
            ConnectionError::Timeout { operation: "read".to_string(), timeout_ms: 500 }.into(),
        ];

        for err in errors {
            let suggestion = err.recovery_suggestion();
            assert!(suggestion.is_some(), "missing recovery in: {err}");
            assert!(!suggestion.unwrap().is_empty());
        }
    }

    #[test]
    fn test_categories() {
        let parse: Tn3270Error = ParseError::InvalidCommandCode { code: 0, position: 0, buffer_size: 1 }.into();
        assert_eq!(parse.category(), ErrorCategory::Parse);

        let sf: Tn3270Error = StructuredFieldError::InvalidSealUnseal { actual: 0, required: 1 }.into();
        assert_eq!(sf.category(), ErrorCategory::Parse);

        let field: Tn3270Error = FieldError::Full { index: 2, length: 10 }.into();
        assert_eq!(field.category(), ErrorCategory::Field);

        let conn: Tn3270Error = ConnectionError::NotConnected.into();
        assert_eq!(conn.category(), ErrorCategory::Connection);
    }

    #[test]
    fn test_expected_hint_in_message() {
        let err = ParseError::InsufficientData {
            position: 3,
            buffer_size: 4,
            needed: 2,
            expected: Some("buffer address"),
        };
        let message = err.to_string();
        assert!(message.contains("expected buffer address"));
        assert!(message.contains("position 3"));
    }
}
