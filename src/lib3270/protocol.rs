//! 3270 terminal engine
//!
//! [`Terminal3270`] ties the components together for one session: bytes from
//! the host go through the incremental parser and the executor, keystrokes
//! go through the data entry controller, and read replies queue up for the
//! transport to collect.

use std::collections::VecDeque;

use super::address::AddressCodec;
use super::codes::AidKey;
use super::data_entry::DataEntryController;
use super::display::ScreenBuffer;
use super::executor::{ExecOutcome, Executor};
use super::field::FieldManager;
use super::outbound;
use super::parser::{Command, StreamParser};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::logging::StreamLogger;
use crate::protocol_common::charset::CharsetConverter;
use crate::protocol_common::traits::TerminalProtocol;

/// One TN3270 session's protocol state
#[derive(Debug, Clone)]
pub struct Terminal3270 {
    codec: AddressCodec,
    screen: ScreenBuffer,
    fields: FieldManager,
    executor: Executor,
    parser: StreamParser,
    entry: DataEntryController,
    pending_replies: VecDeque<Vec<u8>>,
}

impl Terminal3270 {
    /// Build an engine from a validated configuration
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Model 2 (24x80) with default settings
    pub fn with_defaults() -> Self {
        Self::build(&EngineConfig::default())
    }

    fn build(config: &EngineConfig) -> Self {
        let size = config.screen_size;
        let codec = AddressCodec::new(size.rows(), size.cols()).with_mode(config.address_mode);
        let buffer_size = codec.buffer_size();
        let fields = if config.field_storage_capacity == 0 {
            FieldManager::new(buffer_size)
        } else {
            FieldManager::with_storage(buffer_size, config.field_storage_capacity)
        };

        Self {
            codec,
            screen: ScreenBuffer::with_size(size),
            fields,
            executor: Executor::new(codec, CharsetConverter::from_config(config.converter)),
            parser: StreamParser::new(config.stream_buffer_capacity),
            entry: DataEntryController::new(),
            pending_replies: VecDeque::new(),
        }
    }

    /// Feed host bytes and execute every complete command
    ///
    /// Records that fail to parse are logged and skipped; the rest of the
    /// input is still processed. Read replies are also queued for
    /// [`TerminalProtocol::generate_response`].
    pub fn receive(&mut self, bytes: &[u8], logger: &mut StreamLogger) -> Result<Vec<ExecOutcome>> {
        self.parser.feed(bytes)?;

        let mut outcomes = Vec::new();
        loop {
            let command = match self.parser.parse_next() {
                Ok(Some(command)) => command,
                Ok(None) => break,
                Err(e) => {
                    logger.warn(format_args!("record skipped: {e}"));
                    continue;
                }
            };
            outcomes.push(self.execute(&command, logger)?);
        }
        Ok(outcomes)
    }

    /// Execute one already-framed command
    ///
    /// When the command rebuilds the field list, data entry follows the
    /// current field to its new index by start address. Erase commands, or a
    /// current field that no longer starts where it did, reset it.
    pub fn execute(&mut self, command: &Command, logger: &mut StreamLogger) -> Result<ExecOutcome> {
        let anchor = self
            .entry
            .current_field()
            .map(|index| self.fields.get_field(index).ok().map(|field| field.start_address));

        let outcome = self
            .executor
            .execute(command, &mut self.screen, &mut self.fields, logger);

        match anchor {
            _ if command.code.is_erase() => self.entry.reset(),
            Some(Some(start)) => self.entry.follow(start, &self.fields),
            Some(None) => self.entry.reset(),
            None => {}
        }

        let outcome = outcome?;
        if let ExecOutcome::Reply(bytes) = &outcome {
            self.pending_replies.push_back(bytes.clone());
        }
        Ok(outcome)
    }

    pub fn type_char(&mut self, byte: u8) -> Result<()> {
        self.entry
            .write_char(byte, &mut self.fields, &mut self.screen, &self.codec)
    }

    /// Type a run of characters, stopping at the first rejected one
    pub fn type_text(&mut self, text: &str) -> Result<()> {
        text.bytes().try_for_each(|byte| self.type_char(byte))
    }

    pub fn tab(&mut self) -> Result<usize> {
        let index = self.entry.tab(&self.fields)?;
        self.sync_cursor()?;
        Ok(index)
    }

    pub fn home(&mut self) -> Result<usize> {
        let index = self.entry.home(&self.fields)?;
        self.sync_cursor()?;
        Ok(index)
    }

    pub fn backspace(&mut self) -> Result<()> {
        self.entry.backspace(&mut self.fields, &mut self.screen, &self.codec)
    }

    pub fn clear_field(&mut self) -> Result<()> {
        self.entry.clear_field(&mut self.fields, &mut self.screen, &self.codec)
    }

    fn sync_cursor(&mut self) -> Result<()> {
        if let Some(offset) = self.entry.cursor_address(&self.fields) {
            if offset < self.screen.size() {
                self.screen.set_cursor_offset(offset)?;
            }
        }
        Ok(())
    }

    /// Read Modified reply for `aid` without changing session state
    pub fn read_modified_reply(&self, aid: AidKey) -> Result<Vec<u8>> {
        outbound::read_modified_reply(aid, &self.codec, &self.screen, &self.fields, false)
    }

    /// Press an AID key: validate input, build the inbound reply and lock
    /// the keyboard
    ///
    /// Validation failures leave the session untouched so the operator can
    /// correct the field.
    pub fn submit(&mut self, aid: AidKey) -> Result<Vec<u8>> {
        if !aid.is_short_read() {
            for (index, field) in self.fields.fields().iter().enumerate() {
                if !field.is_protected() {
                    self.fields.validate_field(index)?;
                }
            }
        }
        let reply = self.read_modified_reply(aid)?;
        self.executor.set_aid(aid);
        self.executor.lock_keyboard();
        Ok(reply)
    }

    pub fn codec(&self) -> &AddressCodec {
        &self.codec
    }

    pub fn screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    pub fn fields(&self) -> &FieldManager {
        &self.fields
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn entry(&self) -> &DataEntryController {
        &self.entry
    }

    /// Bytes buffered waiting for `IAC EOR`
    pub fn buffered(&self) -> usize {
        self.parser.buffered()
    }

    pub fn is_keyboard_locked(&self) -> bool {
        self.executor.is_keyboard_locked()
    }

    /// Screen contents as text, one line per row
    pub fn screen_text(&self) -> String {
        self.screen.to_string()
    }
}

impl TerminalProtocol for Terminal3270 {
    fn process_data(&mut self, data: &[u8], logger: &mut StreamLogger) -> Result<()> {
        self.receive(data, logger).map(|_| ())
    }

    fn generate_response(&mut self) -> Option<Vec<u8>> {
        self.pending_replies.pop_front()
    }

    fn reset(&mut self) {
        self.screen.clear();
        self.fields.clear();
        self.executor.reset();
        self.parser.reset();
        self.entry.reset();
        self.pending_replies.clear();
    }

    fn protocol_name(&self) -> &str {
        "TN3270"
    }
}
