//! Operator data entry
//!
//! [`DataEntryController`] tracks which field the operator is typing into
//! and the offset within it. Every keystroke updates the field content and
//! the mirrored screen cell, and sets the field's MDT. Operations that need
//! a current field select one with [`DataEntryController::home`] first.

use super::address::AddressCodec;
use super::display::{ScreenBuffer, BLANK};
use super::field::FieldManager;
use crate::error::{FieldError, FieldResult, Result};

/// Where typed characters go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryState {
    #[default]
    NoCurrentField,
    AtField { index: usize, offset: usize },
}

#[derive(Debug, Clone, Default)]
pub struct DataEntryController {
    state: EntryState,
}

impl DataEntryController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub fn current_field(&self) -> Option<usize> {
        match self.state {
            EntryState::AtField { index, .. } => Some(index),
            EntryState::NoCurrentField => None,
        }
    }

    /// Forget the current field; used after the host rebuilds the screen
    pub fn reset(&mut self) {
        self.state = EntryState::NoCurrentField;
    }

    /// Keep the entry on the field starting at `start_address` after the
    /// field list changed
    ///
    /// The offset is clamped to the field's new length. Without a field at
    /// that address the state is reset.
    pub fn follow(&mut self, start_address: u16, fields: &FieldManager) {
        let EntryState::AtField { offset, .. } = self.state else {
            return;
        };
        self.state = match fields
            .fields()
            .binary_search_by_key(&start_address, |field| field.start_address)
        {
            Ok(index) => EntryState::AtField {
                index,
                offset: offset.min(fields.fields()[index].length),
            },
            Err(_) => EntryState::NoCurrentField,
        };
    }

    /// Buffer offset of the entry cursor
    pub fn cursor_address(&self, fields: &FieldManager) -> Option<usize> {
        match self.state {
            EntryState::AtField { index, offset } => fields
                .get_field(index)
                .ok()
                .map(|field| field.start_address as usize + offset),
            EntryState::NoCurrentField => None,
        }
    }

    /// Move to the first unprotected field
    pub fn home(&mut self, fields: &FieldManager) -> FieldResult<usize> {
        let index = fields.first_unprotected().ok_or(FieldError::NoUnprotectedFields {
            count: fields.count(),
        })?;
        self.state = EntryState::AtField { index, offset: 0 };
        Ok(index)
    }

    /// Move to the next unprotected field, wrapping around
    ///
    /// Without a current field this lands on the first unprotected field.
    pub fn tab(&mut self, fields: &FieldManager) -> FieldResult<usize> {
        let next = match self.state {
            EntryState::AtField { index, .. } if index < fields.count() => fields.next_unprotected(index),
            _ => fields.first_unprotected(),
        };
        let index = next.ok_or(FieldError::NoUnprotectedFields {
            count: fields.count(),
        })?;
        self.state = EntryState::AtField { index, offset: 0 };
        Ok(index)
    }

    /// Make `index` the current field, protected or not
    pub fn select_field(&mut self, index: usize, fields: &FieldManager) -> FieldResult<()> {
        fields.get_field(index)?;
        self.state = EntryState::AtField { index, offset: 0 };
        Ok(())
    }

    fn current(&mut self, fields: &FieldManager) -> FieldResult<(usize, usize)> {
        match self.state {
            EntryState::AtField { index, offset } if index < fields.count() => Ok((index, offset)),
            _ => self.home(fields).map(|index| (index, 0)),
        }
    }

    fn check_unprotected(fields: &FieldManager, index: usize) -> FieldResult<()> {
        let field = fields.get_field(index)?;
        if field.is_protected() {
            return Err(FieldError::Protected {
                index,
                address: field.start_address,
            });
        }
        Ok(())
    }

    /// Type one character at the entry cursor
    pub fn write_char(
        &mut self,
        byte: u8,
        fields: &mut FieldManager,
        screen: &mut ScreenBuffer,
        codec: &AddressCodec,
    ) -> Result<()> {
        let (index, offset) = self.current(fields)?;
        Self::check_unprotected(fields, index)?;
        let field = fields.get_field(index)?;
        if offset >= field.length {
            return Err(FieldError::Full {
                index,
                length: field.length,
            }
            .into());
        }
        let start = field.start_address as usize;

        fields.set_field_char(index, offset, byte)?;
        fields.mark_modified(index, true)?;
        mirror(codec, screen, start + offset, byte)?;

        self.state = EntryState::AtField {
            index,
            offset: offset + 1,
        };
        move_cursor(screen, start + offset + 1)
    }

    /// Erase the character before the entry cursor
    pub fn backspace(&mut self, fields: &mut FieldManager, screen: &mut ScreenBuffer, codec: &AddressCodec) -> Result<()> {
        let (index, offset) = self.current(fields)?;
        Self::check_unprotected(fields, index)?;
        if offset == 0 {
            return Err(FieldError::AlreadyAtFieldStart { index }.into());
        }
        let start = fields.get_field(index)?.start_address as usize;
        let offset = offset - 1;

        fields.set_field_char(index, offset, BLANK)?;
        fields.mark_modified(index, true)?;
        mirror(codec, screen, start + offset, BLANK)?;

        self.state = EntryState::AtField { index, offset };
        move_cursor(screen, start + offset)
    }

    /// Blank the current field and return to its first cell
    pub fn clear_field(&mut self, fields: &mut FieldManager, screen: &mut ScreenBuffer, codec: &AddressCodec) -> Result<()> {
        let (index, _) = self.current(fields)?;
        Self::check_unprotected(fields, index)?;
        let field = fields.get_field(index)?;
        let (start, length) = (field.start_address as usize, field.length);

        fields.fill_field(index, BLANK)?;
        fields.mark_modified(index, true)?;
        for cell in start..start + length {
            mirror(codec, screen, cell, BLANK)?;
        }

        self.state = EntryState::AtField { index, offset: 0 };
        move_cursor(screen, start)
    }
}

fn mirror(codec: &AddressCodec, screen: &mut ScreenBuffer, offset: usize, byte: u8) -> Result<()> {
    let address = codec.from_linear(offset)?;
    screen.write_char(address.row as usize, address.col as usize, byte)?;
    Ok(())
}

fn move_cursor(screen: &mut ScreenBuffer, offset: usize) -> Result<()> {
    if offset < screen.size() {
        screen.set_cursor_offset(offset)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Tn3270Error;
    use crate::lib3270::field::FieldAttribute;

    struct Rig {
        entry: DataEntryController,
        fields: FieldManager,
        screen: ScreenBuffer,
        codec: AddressCodec,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                entry: DataEntryController::new(),
                fields: FieldManager::with_storage(1920, 1024),
                screen: ScreenBuffer::new(24, 80),
                codec: AddressCodec::new(24, 80),
            }
        }

        fn type_bytes(&mut self, text: &[u8]) -> Result<()> {
            for &b in text {
                self.entry.write_char(b, &mut self.fields, &mut self.screen, &self.codec)?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_follow_by_start_address() {
        let mut rig = Rig::new();
        rig.fields.add_field(41, 10, FieldAttribute::default()).unwrap();
        rig.entry.select_field(0, &rig.fields).unwrap();
        rig.type_bytes(b"AB").unwrap();

        // A field inserted ahead shifts the index
        rig.fields.add_field(1, 5, FieldAttribute::default()).unwrap();
        rig.entry.follow(41, &rig.fields);
        assert_eq!(rig.entry.state(), EntryState::AtField { index: 1, offset: 2 });

        rig.entry.follow(60, &rig.fields);
        assert_eq!(rig.entry.state(), EntryState::NoCurrentField);
    }

    #[test]
    fn test_type_then_backspace() {
        let mut rig = Rig::new();
        rig.fields.add_field(81, 10, FieldAttribute::default()).unwrap();

        rig.type_bytes(b"ABC").unwrap();
        rig.entry.backspace(&mut rig.fields, &mut rig.screen, &rig.codec).unwrap();

        assert_eq!(rig.fields.field_content(0).unwrap(), b"AB        ");
        assert_eq!(rig.entry.state(), EntryState::AtField { index: 0, offset: 2 });
        assert_eq!(rig.screen.read_text(1, 1, 3).unwrap(), b"AB ");
        assert!(rig.fields.get_field(0).unwrap().is_modified());
        assert_eq!(rig.entry.cursor_address(&rig.fields), Some(83));
    }

    #[test]
    fn test_protected_field_rejects_without_mutation() {
        let mut rig = Rig::new();
        rig.fields.add_field(10, 5, FieldAttribute::default().with_protected(true)).unwrap();
        rig.entry.select_field(0, &rig.fields).unwrap();

        let err = rig.type_bytes(b"X").unwrap_err();
        assert!(matches!(err, Tn3270Error::Field(FieldError::Protected { index: 0, address: 10 })));
        assert_eq!(rig.fields.field_content(0).unwrap(), b"     ");
        assert_eq!(rig.screen.read_char(0, 10), Ok(b' '));
        assert!(!rig.fields.get_field(0).unwrap().is_modified());
    }

    #[test]
    fn test_field_full() {
        let mut rig = Rig::new();
        rig.fields.add_field(0, 2, FieldAttribute::default()).unwrap();
        rig.type_bytes(b"AB").unwrap();
        let err = rig.type_bytes(b"C").unwrap_err();
        assert!(matches!(err, Tn3270Error::Field(FieldError::Full { index: 0, length: 2 })));
        assert_eq!(rig.fields.field_content(0).unwrap(), b"AB");
    }

    #[test]
    fn test_implicit_home() {
        let mut rig = Rig::new();
        rig.fields.add_field(0, 5, FieldAttribute::default().with_protected(true)).unwrap();
        rig.fields.add_field(10, 5, FieldAttribute::default()).unwrap();

        rig.type_bytes(b"Q").unwrap();
        assert_eq!(rig.entry.current_field(), Some(1));
        assert_eq!(rig.screen.read_char(0, 10), Ok(b'Q'));
    }

    #[test]
    fn test_no_unprotected_fields() {
        let mut rig = Rig::new();
        rig.fields.add_field(0, 5, FieldAttribute::default().with_protected(true)).unwrap();
        assert_eq!(rig.entry.home(&rig.fields), Err(FieldError::NoUnprotectedFields { count: 1 }));
        assert!(rig.type_bytes(b"A").is_err());
        assert_eq!(rig.entry.state(), EntryState::NoCurrentField);
    }

    #[test]
    fn test_tab_wraps() {
        let mut rig = Rig::new();
        rig.fields.add_field(0, 5, FieldAttribute::default()).unwrap();
        rig.fields.add_field(10, 5, FieldAttribute::default().with_protected(true)).unwrap();
        rig.fields.add_field(20, 5, FieldAttribute::default()).unwrap();

        assert_eq!(rig.entry.tab(&rig.fields), Ok(0));
        assert_eq!(rig.entry.tab(&rig.fields), Ok(2));
        assert_eq!(rig.entry.tab(&rig.fields), Ok(0));
    }

    #[test]
    fn test_backspace_at_start() {
        let mut rig = Rig::new();
        rig.fields.add_field(0, 5, FieldAttribute::default()).unwrap();
        let err = rig
            .entry
            .backspace(&mut rig.fields, &mut rig.screen, &rig.codec)
            .unwrap_err();
        assert!(matches!(err, Tn3270Error::Field(FieldError::AlreadyAtFieldStart { index: 0 })));
    }

    #[test]
    fn test_clear_field() {
        let mut rig = Rig::new();
        rig.fields.add_field(5, 4, FieldAttribute::default()).unwrap();
        rig.type_bytes(b"WXYZ").unwrap();
        rig.entry.clear_field(&mut rig.fields, &mut rig.screen, &rig.codec).unwrap();

        assert_eq!(rig.fields.field_content(0).unwrap(), b"    ");
        assert_eq!(rig.screen.read_text(0, 5, 4).unwrap(), b"    ");
        assert_eq!(rig.entry.state(), EntryState::AtField { index: 0, offset: 0 });
        assert_eq!(rig.screen.cursor_offset(), 5);
    }
}
