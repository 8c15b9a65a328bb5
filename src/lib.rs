//! TN3270R: a TN3270 terminal-protocol engine
//!
//! Decodes the 3270 data stream sent by a mainframe host, keeps a
//! field-structured screen buffer up to date, and routes keystrokes back
//! into field content ready for EBCDIC encoding.

/// PROTOCOL COMMON: EBCDIC tables, character-set conversion and protocol traits
pub mod protocol_common;

/// LIB3270: IBM 3270 data stream implementation
/// Address codec, screen buffer, field model, parsers, executor and data entry
pub mod lib3270;

/// Error taxonomy shared by every component
pub mod error;

/// Explicit logger context passed into engine entry points
pub mod logging;

/// Engine configuration (screen geometry, buffer capacities, converter settings)
pub mod config;

pub use error::{Result, Tn3270Error};
pub use lib3270::Terminal3270;
pub use logging::StreamLogger;

/// Crate version string
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Protocol implemented by this engine
pub fn protocol_version() -> &'static str {
    "TN3270"
}
