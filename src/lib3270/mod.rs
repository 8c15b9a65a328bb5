//! IBM 3270 data stream implementation (TN3270)
//!
//! # Overview
//!
//! The 3270 is a block-mode terminal: the host paints a whole screen of
//! fields with one command, the operator fills in the unprotected fields
//! locally, and an AID key sends the modified fields back in one reply.
//!
//! # Architecture
//!
//! - [`codes`] - command, order, structured field and AID codes
//! - [`address`] - two-byte buffer address encoding
//! - [`display`] - screen buffer and cursor
//! - [`field`] - field attributes, field manager and validation
//! - [`storage`] - fixed-capacity external field content
//! - [`cache`] - last-lookup cache used by the field manager
//! - [`parser`] - command/order parsing and `IAC EOR` framing
//! - [`structured`] - Write Structured Field records
//! - [`executor`] - applies commands to screen and fields
//! - [`outbound`] - Read Buffer / Read Modified replies
//! - [`data_entry`] - operator keystrokes into fields
//! - [`protocol`] - [`Terminal3270`], the per-session engine
//!
//! # Example Usage
//!
//! ```rust
//! use tn3270r::lib3270::{frame_record, Terminal3270, CMD_ERASE_WRITE, ORDER_SF};
//! use tn3270r::StreamLogger;
//!
//! let mut terminal = Terminal3270::with_defaults();
//! let mut logger = StreamLogger::new("doc");
//! terminal
//!     .receive(&frame_record(&[CMD_ERASE_WRITE, 0x02, ORDER_SF, 0x00]), &mut logger)
//!     .unwrap();
//! terminal.type_text("HELLO").unwrap();
//! assert_eq!(terminal.screen().read_text(0, 1, 5).unwrap(), b"HELLO");
//! ```

pub mod address;
pub mod cache;
pub mod codes;
pub mod data_entry;
pub mod display;
pub mod executor;
pub mod field;
pub mod outbound;
pub mod parser;
pub mod protocol;
pub mod storage;
pub mod structured;

// Re-exports for easy access
pub use address::{Address, AddressCodec, AddressMode};
pub use codes::*;
pub use data_entry::{DataEntryController, EntryState};
pub use display::{ScreenBuffer, ScreenSize};
pub use executor::{ExecOutcome, Executor};
pub use field::{ExtendedAttributes, Field, FieldAttribute, FieldManager, ValidationRule};
pub use parser::{frame_record, parse_command, parse_orders, parse_stream, Command, Order, StreamItem, StreamParser};
pub use protocol::Terminal3270;
pub use storage::{FieldDataStorage, FieldHandle};
pub use structured::{parse_field, parse_fields, parse_fields_lenient, ParsedFields, StructuredField};

pub use crate::protocol_common::ebcdic::{ascii_to_ebcdic, ebcdic_to_ascii};
