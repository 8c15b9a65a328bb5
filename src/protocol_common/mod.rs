//! Shared protocol functionality
//!
//! - [`ebcdic`] - EBCDIC CP037 tables and codec
//! - [`charset`] - ASCII/Latin-1/APL converter with unknown-character policy
//! - [`traits`] - Protocol trait abstractions
//!
//! # Examples
//!
//! ```
//! use tn3270r::protocol_common::ebcdic::{decode_byte, encode_byte};
//!
//! assert_eq!(decode_byte(0xC1), b'A');
//! assert_eq!(encode_byte(b'A').unwrap(), 0xC1);
//! ```

pub mod charset;
pub mod ebcdic;
pub mod traits;

pub use charset::{CharacterSet, CharsetConverter, ConverterConfig, ErrorMode};
pub use traits::TerminalProtocol;
