//! Command and order stream parsing
//!
//! A host record is one command byte followed by command data. For the
//! write family the data is a WCC byte and then an interleaving of orders
//! and EBCDIC text. [`parse_stream`] splits that data into [`StreamItem`]s;
//! [`StreamParser`] cuts a byte stream into records on telnet `IAC EOR`.

use std::collections::VecDeque;

use super::codes::{CommandCode, OrderCode, WireEnum};
use crate::error::{ParseError, ParseResult};

/// Telnet "interpret as command"
pub const IAC: u8 = 0xFF;
/// Telnet end-of-record
pub const EOR: u8 = 0xEF;

/// One top-level host instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub code: CommandCode,
    pub data: Vec<u8>,
}

/// One order inside write data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub code: OrderCode,
    /// Fixed-length payload; empty if the stream was truncated
    pub data: Vec<u8>,
}

/// Orders and text runs in stream order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    Order(Order),
    Text(Vec<u8>),
}

/// Split a record into its command code and data
pub fn parse_command(record: &[u8]) -> ParseResult<Command> {
    let (&code, data) = record.split_first().ok_or(ParseError::EndOfBuffer {
        position: 0,
        buffer_size: 0,
        expected: Some("command code"),
    })?;
    let code = CommandCode::from_u8(code).ok_or(ParseError::InvalidCommandCode {
        code,
        position: 0,
        buffer_size: record.len(),
    })?;
    Ok(Command {
        code,
        data: data.to_vec(),
    })
}

/// Whether a byte is a displayable EBCDIC text byte rather than an order
pub fn is_text_byte(byte: u8) -> bool {
    (0x20..=0xFE).contains(&byte) && OrderCode::from_u8(byte).is_none()
}

/// Split write data (after the WCC) into orders and text runs
///
/// Bytes that are neither text nor a known order are skipped.
pub fn parse_stream(data: &[u8]) -> Vec<StreamItem> {
    let mut items = Vec::new();
    let mut text = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let byte = data[pos];
        pos += 1;

        if is_text_byte(byte) {
            text.push(byte);
            continue;
        }
        let Some(code) = OrderCode::from_u8(byte) else {
            continue;
        };

        if !text.is_empty() {
            items.push(StreamItem::Text(std::mem::take(&mut text)));
        }
        let needed = code.payload_len();
        let order_data = if pos + needed <= data.len() {
            data[pos..pos + needed].to_vec()
        } else {
            Vec::new()
        };
        pos = (pos + needed).min(data.len());
        items.push(StreamItem::Order(Order {
            code,
            data: order_data,
        }));
    }

    if !text.is_empty() {
        items.push(StreamItem::Text(text));
    }
    items
}

/// Orders in write data, text dropped
pub fn parse_orders(data: &[u8]) -> Vec<Order> {
    parse_stream(data)
        .into_iter()
        .filter_map(|item| match item {
            StreamItem::Order(order) => Some(order),
            StreamItem::Text(_) => None,
        })
        .collect()
}

/// Escape `IAC` bytes in a record and terminate it with `IAC EOR`
pub fn frame_record(record: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(record.len() + 2);
    for &byte in record {
        framed.push(byte);
        if byte == IAC {
            framed.push(IAC);
        }
    }
    framed.extend_from_slice(&[IAC, EOR]);
    framed
}

/// Incremental record parser over a bounded buffer
///
/// Bytes may arrive in any chunking. Complete records are cut at
/// `IAC EOR`; `IAC IAC` unescapes to `0xFF` and other two-byte telnet
/// commands are dropped.
#[derive(Debug, Clone)]
pub struct StreamParser {
    ring: VecDeque<u8>,
    capacity: usize,
}

impl StreamParser {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: VecDeque::with_capacity(capacity.min(64 * 1024)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes waiting for a record terminator
    pub fn buffered(&self) -> usize {
        self.ring.len()
    }

    /// Append bytes; nothing is taken if they would not fit
    pub fn feed(&mut self, bytes: &[u8]) -> ParseResult<usize> {
        if self.ring.len() + bytes.len() > self.capacity {
            return Err(ParseError::BufferOverflow {
                capacity: self.capacity,
                buffered: self.ring.len(),
                incoming: bytes.len(),
            });
        }
        self.ring.extend(bytes);
        Ok(bytes.len())
    }

    /// Offset just past the next `IAC EOR`, if buffered
    fn record_end(&self) -> Option<usize> {
        let mut i = 0;
        while i + 1 < self.ring.len() {
            if self.ring[i] == IAC {
                if self.ring[i + 1] == EOR {
                    return Some(i + 2);
                }
                i += 2;
            } else {
                i += 1;
            }
        }
        None
    }

    pub fn has_complete_record(&self) -> bool {
        self.record_end().is_some()
    }

    /// Parse the next complete record
    ///
    /// `Ok(None)` leaves any partial record buffered. A record that fails to
    /// parse is still consumed.
    pub fn parse_next(&mut self) -> ParseResult<Option<Command>> {
        while let Some(end) = self.record_end() {
            let mut record = Vec::with_capacity(end - 2);
            let mut raw = self.ring.drain(..end).take(end - 2);
            while let Some(byte) = raw.next() {
                if byte != IAC {
                    record.push(byte);
                } else if raw.next() == Some(IAC) {
                    record.push(IAC);
                }
            }
            drop(raw);

            if record.is_empty() {
                continue;
            }
            return parse_command(&record).map(Some);
        }
        Ok(None)
    }

    /// Drop everything buffered
    pub fn reset(&mut self) {
        self.ring.clear();
    }
}
