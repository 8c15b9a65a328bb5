//! Command execution against the screen and field model
//!
//! The executor owns the host-side state that persists between commands:
//! the buffer address orders are applied at, keyboard lock and alarm state,
//! and whatever structured fields have installed (color palette, seal,
//! active character set).

use std::collections::BTreeMap;

use super::address::AddressCodec;
use super::codes::{AidKey, CommandCode, OrderCode, Wcc};
use super::display::{ScreenBuffer, BLANK};
use super::field::{Field, FieldAttribute, FieldManager};
use super::outbound;
use super::parser::{parse_stream, Command, Order, StreamItem};
use super::structured::{parse_fields_lenient, StructuredField};
use crate::error::Result;
use crate::logging::StreamLogger;
use crate::protocol_common::charset::{CharsetConverter, REPLACEMENT_CHAR};
use crate::protocol_common::ebcdic;

/// Result of executing one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Screen and fields were updated
    Updated,
    /// Bytes to send back to the host
    Reply(Vec<u8>),
    /// Structured field records that were applied
    StructuredFields(Vec<StructuredField>),
}

/// Foreground and background of a color pair
pub type ColorPair = (u8, u8);

/// Applies host commands
#[derive(Debug, Clone)]
pub struct Executor {
    codec: AddressCodec,
    graphic: CharsetConverter,
    buffer_address: usize,
    insert_cursor: Option<usize>,
    keyboard_locked: bool,
    alarm: bool,
    sealed: bool,
    color_pairs: BTreeMap<u8, ColorPair>,
    character_set: Option<(u8, u16)>,
    aid: AidKey,
}

impl Executor {
    /// `graphic` converts characters introduced by Graphic Escape
    pub fn new(codec: AddressCodec, graphic: CharsetConverter) -> Self {
        Self {
            codec,
            graphic,
            buffer_address: 0,
            insert_cursor: None,
            keyboard_locked: true,
            alarm: false,
            sealed: false,
            color_pairs: BTreeMap::new(),
            character_set: None,
            aid: AidKey::NoAid,
        }
    }

    pub fn codec(&self) -> &AddressCodec {
        &self.codec
    }

    pub fn buffer_address(&self) -> usize {
        self.buffer_address
    }

    pub fn is_keyboard_locked(&self) -> bool {
        self.keyboard_locked
    }

    pub fn is_alarm(&self) -> bool {
        self.alarm
    }

    /// Acknowledge the alarm
    pub fn clear_alarm(&mut self) {
        self.alarm = false;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn color_pair(&self, pair_id: u8) -> Option<ColorPair> {
        self.color_pairs.get(&pair_id).copied()
    }

    /// Active character set id and code page
    pub fn character_set(&self) -> Option<(u8, u16)> {
        self.character_set
    }

    /// AID reported by read commands
    pub fn aid(&self) -> AidKey {
        self.aid
    }

    pub fn set_aid(&mut self, aid: AidKey) {
        self.aid = aid;
    }

    /// Inhibit input until the host restores the keyboard
    pub fn lock_keyboard(&mut self) {
        self.keyboard_locked = true;
    }

    /// Return to the power-on state
    pub fn reset(&mut self) {
        *self = Self::new(self.codec, self.graphic);
    }

    /// Execute one command
    pub fn execute(
        &mut self,
        command: &Command,
        screen: &mut ScreenBuffer,
        fields: &mut FieldManager,
        logger: &mut StreamLogger,
    ) -> Result<ExecOutcome> {
        logger.debug(format_args!(
            "executing {:?} with {} data bytes",
            command.code,
            command.data.len()
        ));

        match command.code {
            CommandCode::Write | CommandCode::EraseWrite | CommandCode::EraseWriteAlternate => {
                self.write(command.code.is_erase(), &command.data, screen, fields, logger)?;
                Ok(ExecOutcome::Updated)
            }
            CommandCode::ReadBuffer => Ok(ExecOutcome::Reply(outbound::read_buffer_reply(
                self.aid,
                &self.codec,
                screen,
                fields,
            )?)),
            CommandCode::ReadModified | CommandCode::ReadModifiedAll => {
                let all = command.code == CommandCode::ReadModifiedAll;
                Ok(ExecOutcome::Reply(outbound::read_modified_reply(
                    self.aid,
                    &self.codec,
                    screen,
                    fields,
                    all,
                )?))
            }
            CommandCode::EraseAllUnprotected => {
                self.erase_all_unprotected(screen, fields)?;
                Ok(ExecOutcome::Updated)
            }
            CommandCode::WriteStructuredField => {
                let parsed = parse_fields_lenient(&command.data)?;
                for (position, e) in &parsed.skipped {
                    logger.warn(format_args!("structured field at offset {position} skipped: {e}"));
                }
                for record in &parsed.records {
                    self.apply_structured_field(record, fields, logger);
                }
                Ok(ExecOutcome::StructuredFields(parsed.records))
            }
        }
    }

    fn write(
        &mut self,
        erase: bool,
        data: &[u8],
        screen: &mut ScreenBuffer,
        fields: &mut FieldManager,
        logger: &mut StreamLogger,
    ) -> Result<()> {
        let wcc = Wcc::from_byte(data.first().copied().unwrap_or(0));

        if erase {
            screen.clear();
            fields.clear();
            self.buffer_address = 0;
        }
        self.keyboard_locked = true;
        self.insert_cursor = None;
        if wcc.reset_mdt {
            fields.reset_mdt();
        }

        let mut graphic_escape = false;
        for item in parse_stream(data.get(1..).unwrap_or(&[])) {
            match item {
                StreamItem::Order(order) => {
                    graphic_escape = false;
                    self.apply_order(&order, screen, fields, logger, &mut graphic_escape)?;
                }
                StreamItem::Text(bytes) => {
                    for byte in bytes {
                        let ch = if graphic_escape {
                            graphic_escape = false;
                            match self.graphic_char(byte, logger) {
                                Some(ch) => ch,
                                None => continue,
                            }
                        } else {
                            ebcdic::decode_byte(byte)
                        };
                        self.put_char(ch, screen, fields)?;
                    }
                }
            }
        }

        if let Some(offset) = self.insert_cursor.take() {
            screen.set_cursor_offset(offset)?;
        }
        if wcc.restore_keyboard {
            self.keyboard_locked = false;
            self.aid = AidKey::NoAid;
        }
        if wcc.alarm {
            self.alarm = true;
            logger.info("alarm requested by host");
        }
        Ok(())
    }

    fn graphic_char(&self, byte: u8, logger: &mut StreamLogger) -> Option<u8> {
        match self.graphic.convert_byte(byte) {
            Ok(converted) => converted,
            Err(e) => {
                logger.warn(format_args!("graphic escape 0x{byte:02X}: {e}"));
                Some(REPLACEMENT_CHAR)
            }
        }
    }

    fn put_char(&mut self, ch: u8, screen: &mut ScreenBuffer, fields: &mut FieldManager) -> Result<()> {
        let offset = self.buffer_address;
        screen.write_linear(offset, ch)?;
        fields.sync_screen_cell(offset, ch)?;
        self.buffer_address = (offset + 1) % screen.size();
        Ok(())
    }

    fn apply_order(
        &mut self,
        order: &Order,
        screen: &mut ScreenBuffer,
        fields: &mut FieldManager,
        logger: &mut StreamLogger,
        graphic_escape: &mut bool,
    ) -> Result<()> {
        match order.code {
            OrderCode::SetBufferAddress => match order.data.as_slice() {
                &[hi, lo] => match self.codec.decode_linear([hi, lo]) {
                    Ok(offset) => self.buffer_address = offset,
                    Err(e) => logger.warn(format_args!("SBA ignored: {e}")),
                },
                _ => logger.warn("SBA ignored: truncated address"),
            },
            OrderCode::StartField => {
                let Some(&byte) = order.data.first() else {
                    logger.warn("SF ignored: missing attribute byte");
                    return Ok(());
                };
                if FieldAttribute::has_reserved_bits(byte) {
                    logger.debug(format_args!("SF attribute 0x{byte:02X} has reserved bits set"));
                }
                let attr_address = self.buffer_address;
                screen.write_linear(attr_address, BLANK)?;
                let created = fields.start_field(attr_address, FieldAttribute::from_byte(byte), screen.as_bytes())?;
                if created.is_none() {
                    logger.trace(format_args!("SF at {attr_address} leaves no room for a field"));
                }
                self.buffer_address = (attr_address + 1) % screen.size();
            }
            OrderCode::InsertCursor => self.insert_cursor = Some(self.buffer_address),
            OrderCode::ProgramTab => {
                self.buffer_address = fields
                    .next_unprotected_after_address(self.buffer_address)
                    .and_then(|index| fields.get_field(index).ok())
                    .map_or(0, |field| field.start_address as usize);
            }
            OrderCode::EraseUnprotected => {
                for range in fields.erase_unprotected(self.buffer_address)? {
                    for offset in range {
                        screen.write_linear(offset, BLANK)?;
                    }
                }
            }
            OrderCode::GraphicEscape => *graphic_escape = true,
            OrderCode::SetAttribute => logger.debug("SA order ignored"),
        }
        Ok(())
    }

    fn erase_all_unprotected(&mut self, screen: &mut ScreenBuffer, fields: &mut FieldManager) -> Result<()> {
        for range in fields.erase_unprotected(0)? {
            for offset in range {
                screen.write_linear(offset, BLANK)?;
            }
        }
        fields.reset_mdt();

        self.buffer_address = fields
            .first_unprotected()
            .and_then(|index| fields.get_field(index).ok())
            .map_or(0, |field| field.start_address as usize);
        screen.set_cursor_offset(self.buffer_address)?;
        self.keyboard_locked = false;
        self.aid = AidKey::NoAid;
        Ok(())
    }

    fn apply_structured_field(&mut self, record: &StructuredField, fields: &mut FieldManager, logger: &mut StreamLogger) {
        match *record {
            StructuredField::ColorPair { pair_id, foreground, background } => {
                self.color_pairs.insert(pair_id, (foreground, background));
            }
            StructuredField::ExtendedField { field_index, highlighting, foreground, background } => {
                with_field(fields, field_index, logger, |field| {
                    field.extended.highlighting = Some(highlighting);
                    field.extended.foreground_color = Some(foreground);
                    field.extended.background_color = Some(background);
                });
            }
            StructuredField::ValidationRule { field_index, rule } => {
                with_field(fields, field_index, logger, |field| field.extended.validation = Some(rule));
            }
            StructuredField::SealUnseal { sealed } => self.sealed = sealed,
            StructuredField::Transparency { field_index, level } => {
                with_field(fields, field_index, logger, |field| field.extended.transparency = Some(level));
            }
            StructuredField::CharacterSet { set_id, code_page } => {
                self.character_set = Some((set_id, code_page));
                logger.debug(format_args!("character set {set_id} code page {code_page}"));
            }
            StructuredField::Unknown { field_type, ref data } => {
                logger.info(format_args!(
                    "unknown structured field type 0x{field_type:02X} ({} bytes) kept",
                    data.len()
                ));
            }
        }
    }
}

/// Apply a per-field record; unknown field indices are logged and skipped
fn with_field(fields: &mut FieldManager, index: u8, logger: &mut StreamLogger, apply: impl FnOnce(&mut Field)) {
    match fields.get_field_mut(index as usize) {
        Ok(field) => apply(field),
        Err(e) => logger.warn(format_args!("structured field skipped: {e}")),
    }
}
