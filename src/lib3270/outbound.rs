//! Inbound reply construction (terminal to host)
//!
//! Every reply starts with the AID byte and the two-byte cursor address.
//! Screen content is ASCII/Latin-1 internally and is EBCDIC-encoded here.

use super::address::AddressCodec;
use super::codes::{AidKey, WireEnum, ORDER_SBA, ORDER_SF};
use super::display::{ScreenBuffer, BLANK};
use super::field::FieldManager;
use crate::error::Result;
use crate::protocol_common::ebcdic::latin1_to_ebcdic;

fn reply_header(aid: AidKey, codec: &AddressCodec, screen: &ScreenBuffer) -> Result<Vec<u8>> {
    let mut reply = Vec::with_capacity(screen.size() + 3);
    reply.push(aid.to_u8());
    reply.extend_from_slice(&codec.encode_linear(screen.cursor_offset())?);
    Ok(reply)
}

/// Read Buffer reply: the whole screen, attribute cells as SF orders
pub fn read_buffer_reply(
    aid: AidKey,
    codec: &AddressCodec,
    screen: &ScreenBuffer,
    fields: &FieldManager,
) -> Result<Vec<u8>> {
    let mut reply = reply_header(aid, codec, screen)?;
    let mut attrs = fields
        .fields()
        .iter()
        .filter(|f| f.start_address > 0)
        .map(|f| (f.start_address as usize - 1, f.attribute.to_byte()))
        .peekable();

    for (offset, &byte) in screen.as_bytes().iter().enumerate() {
        match attrs.peek() {
            Some(&(attr_offset, attr)) if attr_offset == offset => {
                reply.extend_from_slice(&[ORDER_SF, attr]);
                attrs.next();
            }
            _ => reply.push(latin1_to_ebcdic(byte)),
        }
    }
    Ok(reply)
}

/// Read Modified reply: SBA plus content of every field with its MDT set
///
/// Trailing blanks are not sent. Clear and PA keys produce a short read
/// (AID only) unless `all` is set.
pub fn read_modified_reply(
    aid: AidKey,
    codec: &AddressCodec,
    screen: &ScreenBuffer,
    fields: &FieldManager,
    all: bool,
) -> Result<Vec<u8>> {
    if aid.is_short_read() && !all {
        return Ok(vec![aid.to_u8()]);
    }

    let mut reply = reply_header(aid, codec, screen)?;
    for (index, field) in fields.fields().iter().enumerate() {
        if !field.is_modified() {
            continue;
        }
        reply.push(ORDER_SBA);
        reply.extend_from_slice(&codec.encode_linear(field.start_address as usize)?);

        let content = fields.field_content(index)?;
        let used = content
            .iter()
            .rposition(|&b| b != BLANK && b != 0x00)
            .map_or(0, |p| p + 1);
        reply.extend(content[..used].iter().map(|&b| latin1_to_ebcdic(b)));
    }
    Ok(reply)
}
