//! Field attribute and management logic for 3270
//!
//! A field is the run of cells following an attribute cell, up to the next
//! attribute cell or the end of the buffer. The attribute cell itself is
//! not part of the field: `start_address` is the first content cell.
//!
//! [`FieldManager`] keeps the fields of one screen in ascending address
//! order, owns their content (inline or in a shared
//! [`FieldDataStorage`]) and the lookup cache.

use std::ops::Range;

use super::cache::FieldCache;
use super::codes::{VALIDATION_MANDATORY_ENTRY, VALIDATION_MANDATORY_FILL, VALIDATION_TRIGGER};
use super::display::BLANK;
use super::storage::{FieldDataStorage, FieldHandle};
use crate::error::{FieldError, FieldResult, Result, StorageError, StorageResult, Tn3270Error};

/// 3270 field attribute byte
///
/// Bit layout, least significant first:
///
/// | bit | meaning |
/// |---|---|
/// | 0 | protected |
/// | 1 | numeric |
/// | 2 | hidden (non-display) |
/// | 3 | intensified |
/// | 4 | modified data tag (MDT) |
/// | 5-7 | reserved, always zero |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldAttribute(u8);

impl FieldAttribute {
    pub const PROTECTED: u8 = 0x01;
    pub const NUMERIC: u8 = 0x02;
    pub const HIDDEN: u8 = 0x04;
    pub const INTENSIFIED: u8 = 0x08;
    pub const MODIFIED: u8 = 0x10;
    pub const RESERVED_MASK: u8 = 0xE0;

    /// Decode a wire byte; reserved bits are dropped
    pub fn from_byte(byte: u8) -> Self {
        Self(byte & !Self::RESERVED_MASK)
    }

    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// Whether a wire byte carries any reserved bits
    pub fn has_reserved_bits(byte: u8) -> bool {
        byte & Self::RESERVED_MASK != 0
    }

    pub fn is_protected(self) -> bool {
        self.0 & Self::PROTECTED != 0
    }

    pub fn is_numeric(self) -> bool {
        self.0 & Self::NUMERIC != 0
    }

    pub fn is_hidden(self) -> bool {
        self.0 & Self::HIDDEN != 0
    }

    pub fn is_intensified(self) -> bool {
        self.0 & Self::INTENSIFIED != 0
    }

    /// Check if Modified Data Tag (MDT) is set
    pub fn is_modified(self) -> bool {
        self.0 & Self::MODIFIED != 0
    }

    /// Set the Modified Data Tag (MDT)
    pub fn set_modified(&mut self, modified: bool) {
        self.set(Self::MODIFIED, modified);
    }

    fn set(&mut self, bit: u8, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    pub fn with_protected(mut self, on: bool) -> Self {
        self.set(Self::PROTECTED, on);
        self
    }

    pub fn with_numeric(mut self, on: bool) -> Self {
        self.set(Self::NUMERIC, on);
        self
    }

    pub fn with_hidden(mut self, on: bool) -> Self {
        self.set(Self::HIDDEN, on);
        self
    }

    pub fn with_intensified(mut self, on: bool) -> Self {
        self.set(Self::INTENSIFIED, on);
        self
    }

    pub fn with_modified(mut self, on: bool) -> Self {
        self.set(Self::MODIFIED, on);
        self
    }
}

/// Input validation installed by a field validation structured field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationRule {
    /// Mandatory fill / mandatory entry / trigger bits
    pub bits: u8,
    /// Minimum entered length (0 = no minimum)
    pub min_length: u8,
    /// Maximum entered length (0 = no maximum)
    pub max_length: u8,
}

impl ValidationRule {
    pub fn is_mandatory_fill(&self) -> bool {
        self.bits & VALIDATION_MANDATORY_FILL != 0
    }

    pub fn is_mandatory_entry(&self) -> bool {
        self.bits & VALIDATION_MANDATORY_ENTRY != 0
    }

    pub fn is_trigger(&self) -> bool {
        self.bits & VALIDATION_TRIGGER != 0
    }
}

/// Extended Field Attributes
///
/// Set by structured fields after the field has been created.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtendedAttributes {
    /// Highlighting attribute (normal, blink, reverse, underscore)
    pub highlighting: Option<u8>,

    /// Foreground color
    pub foreground_color: Option<u8>,

    /// Background color
    pub background_color: Option<u8>,

    /// Character set
    pub charset: Option<u8>,

    /// Field validation (mandatory fill, mandatory entry, trigger, lengths)
    pub validation: Option<ValidationRule>,

    /// Transparency level
    pub transparency: Option<u8>,
}

impl ExtendedAttributes {
    /// Create new extended attributes with all fields set to None
    pub fn new() -> Self {
        Self::default()
    }

    /// Set highlighting attribute
    pub fn with_highlighting(mut self, highlighting: u8) -> Self {
        self.highlighting = Some(highlighting);
        self
    }

    /// Set foreground color
    pub fn with_foreground(mut self, color: u8) -> Self {
        self.foreground_color = Some(color);
        self
    }

    /// Set background color
    pub fn with_background(mut self, color: u8) -> Self {
        self.background_color = Some(color);
        self
    }

    /// Set character set
    pub fn with_charset(mut self, charset: u8) -> Self {
        self.charset = Some(charset);
        self
    }

    /// Set validation rule
    pub fn with_validation(mut self, rule: ValidationRule) -> Self {
        self.validation = Some(rule);
        self
    }

    pub fn with_transparency(mut self, level: u8) -> Self {
        self.transparency = Some(level);
        self
    }
}

/// Where a field's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldContent {
    Owned(Vec<u8>),
    External(FieldHandle),
}

/// One field on the screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Buffer offset of the first content cell
    pub start_address: u16,
    pub length: usize,
    pub attribute: FieldAttribute,
    pub extended: ExtendedAttributes,
    content: FieldContent,
}

impl Field {
    /// Field with inline content filled with blanks
    pub fn new(start_address: u16, length: usize, attribute: FieldAttribute) -> Self {
        Self {
            start_address,
            length,
            attribute,
            extended: ExtendedAttributes::default(),
            content: FieldContent::Owned(vec![BLANK; length]),
        }
    }

    pub fn content_ref(&self) -> &FieldContent {
        &self.content
    }

    pub fn is_protected(&self) -> bool {
        self.attribute.is_protected()
    }

    pub fn is_modified(&self) -> bool {
        self.attribute.is_modified()
    }

    /// Buffer offset one past the last content cell
    pub fn end_address(&self) -> usize {
        self.start_address as usize + self.length
    }

    pub fn contains(&self, address: usize) -> bool {
        address >= self.start_address as usize && address < self.end_address()
    }

    pub fn content<'a>(&'a self, storage: &'a FieldDataStorage) -> StorageResult<&'a [u8]> {
        match &self.content {
            FieldContent::Owned(bytes) => Ok(bytes),
            FieldContent::External(handle) => storage.get(*handle),
        }
    }

    /// Content as text, trailing blanks kept
    pub fn text(&self, storage: &FieldDataStorage) -> StorageResult<String> {
        Ok(self.content(storage)?.iter().map(|&b| b as char).collect())
    }

    pub fn set_char(&mut self, storage: &mut FieldDataStorage, offset: usize, byte: u8) -> Result<()> {
        if offset >= self.length {
            return Err(FieldError::OutOfBounds {
                offset,
                length: self.length,
            }
            .into());
        }
        match &mut self.content {
            FieldContent::Owned(bytes) => bytes[offset] = byte,
            FieldContent::External(handle) => storage.set_byte(*handle, offset, byte)?,
        }
        Ok(())
    }

    /// Overwrite every cell with `byte`
    pub fn fill(&mut self, storage: &mut FieldDataStorage, byte: u8) -> StorageResult<()> {
        self.fill_from(storage, 0, byte)
    }

    fn fill_from(&mut self, storage: &mut FieldDataStorage, from: usize, byte: u8) -> StorageResult<()> {
        let from = from.min(self.length);
        match &mut self.content {
            FieldContent::Owned(bytes) => bytes[from..].fill(byte),
            FieldContent::External(handle) => storage.get_mut(*handle)?[from..].fill(byte),
        }
        Ok(())
    }

    /// Check content against the numeric attribute and any validation rule
    pub fn validate_content(&self, content: &[u8]) -> FieldResult<()> {
        let fail = |reason: &str| FieldError::ValidationFailed {
            start: self.start_address,
            reason: reason.to_string(),
        };
        let is_blank = |b: u8| b == BLANK || b == 0x00;

        if let Some(rule) = self.extended.validation {
            // Check mandatory fill - all positions must be filled
            if rule.is_mandatory_fill() && content.iter().any(|&b| is_blank(b)) {
                return Err(fail("mandatory fill: field must be completely filled"));
            }

            // Check mandatory entry - at least one character must be entered
            if rule.is_mandatory_entry() && content.iter().all(|&b| is_blank(b)) {
                return Err(fail("mandatory entry: field must have at least one character"));
            }

            let entered = content.iter().rposition(|&b| !is_blank(b)).map_or(0, |p| p + 1);
            if rule.min_length > 0 && entered > 0 && entered < rule.min_length as usize {
                return Err(fail("entry shorter than the minimum length"));
            }
            if rule.max_length > 0 && entered > rule.max_length as usize {
                return Err(fail("entry longer than the maximum length"));
            }
        }

        // Check numeric field - only digits allowed
        if self.attribute.is_numeric() && content.iter().any(|&b| !is_blank(b) && !b.is_ascii_digit()) {
            return Err(fail("numeric field: only digits allowed"));
        }

        Ok(())
    }
}

/// Field Manager for tracking fields on the screen
#[derive(Debug, Clone)]
pub struct FieldManager {
    buffer_size: usize,
    fields: Vec<Field>,
    storage: FieldDataStorage,
    external: bool,
    cache: FieldCache,
}

impl FieldManager {
    /// Manager keeping field content inline
    pub fn new(buffer_size: usize) -> Self {
        Self::with_storage(buffer_size, 0)
    }

    /// Manager keeping field content in a pre-sized store of `capacity`
    /// bytes; 0 keeps content inline
    pub fn with_storage(buffer_size: usize, capacity: usize) -> Self {
        Self {
            buffer_size,
            fields: Vec::new(),
            storage: FieldDataStorage::new(capacity),
            external: capacity > 0,
            cache: FieldCache::new(),
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn is_external(&self) -> bool {
        self.external
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn count(&self) -> usize {
        self.fields.len()
    }

    pub fn storage(&self) -> &FieldDataStorage {
        &self.storage
    }

    pub fn cache(&self) -> &FieldCache {
        &self.cache
    }

    /// Register a blank field covering `length` cells from `start`
    pub fn add_field(&mut self, start: u16, length: usize, attribute: FieldAttribute) -> Result<usize> {
        self.insert_field(start, length, attribute, None)
    }

    fn insert_field(
        &mut self,
        start: u16,
        length: usize,
        attribute: FieldAttribute,
        initial: Option<&[u8]>,
    ) -> Result<usize> {
        if length == 0 || start as usize + length > self.buffer_size {
            return Err(FieldError::InvalidLength {
                start,
                length,
                buffer_size: self.buffer_size,
            }
            .into());
        }

        let pos = self.fields.partition_point(|f| f.start_address < start);
        let end = start as usize + length;
        let overlapping = [pos.checked_sub(1), Some(pos)]
            .into_iter()
            .flatten()
            .find(|&i| {
                self.fields.get(i).map_or(false, |f| {
                    (f.start_address as usize) < end && (start as usize) < f.end_address()
                })
            });
        if let Some(existing_index) = overlapping {
            return Err(FieldError::Overlap {
                start,
                length,
                existing_index,
                existing_start: self.fields[existing_index].start_address,
            }
            .into());
        }

        let content = if self.external {
            let handle = match initial {
                Some(data) => self.storage.add_field(data)?,
                None => self.storage.reserve(length, BLANK)?,
            };
            FieldContent::External(handle)
        } else {
            FieldContent::Owned(initial.map_or_else(|| vec![BLANK; length], <[u8]>::to_vec))
        };

        self.fields.insert(
            pos,
            Field {
                start_address: start,
                length,
                attribute,
                extended: ExtendedAttributes::default(),
                content,
            },
        );
        self.cache.invalidate();
        Ok(pos)
    }

    pub fn get_field(&self, index: usize) -> FieldResult<&Field> {
        self.fields.get(index).ok_or(FieldError::InvalidFieldIndex {
            index,
            count: self.fields.len(),
        })
    }

    pub fn get_field_mut(&mut self, index: usize) -> FieldResult<&mut Field> {
        let count = self.fields.len();
        self.fields
            .get_mut(index)
            .ok_or(FieldError::InvalidFieldIndex { index, count })
    }

    pub fn remove_field(&mut self, index: usize) -> FieldResult<Field> {
        self.get_field(index)?;
        self.cache.invalidate();
        Ok(self.fields.remove(index))
    }

    /// Drop every field and release storage
    pub fn clear(&mut self) {
        self.fields.clear();
        self.storage.reset();
        self.cache.invalidate();
    }

    /// Index of the field containing `address`
    pub fn find_field_at(&mut self, address: u16) -> Option<usize> {
        let fields = &self.fields;
        if let Some(index) = self
            .cache
            .lookup(address, fields.len(), |i| fields[i].contains(address as usize))
        {
            return Some(index);
        }

        let index = self.field_index_at(address as usize)?;
        self.cache.store(address, index);
        Some(index)
    }

    /// Uncached lookup
    pub fn field_index_at(&self, address: usize) -> Option<usize> {
        let pos = self
            .fields
            .partition_point(|f| f.start_address as usize <= address);
        let index = pos.checked_sub(1)?;
        self.fields[index].contains(address).then_some(index)
    }

    pub fn field_content(&self, index: usize) -> Result<&[u8]> {
        Ok(self.get_field(index)?.content(&self.storage)?)
    }

    pub fn field_text(&self, index: usize) -> Result<String> {
        Ok(self.get_field(index)?.text(&self.storage)?)
    }

    /// Store one byte of field content; the MDT is left alone
    pub fn set_field_char(&mut self, index: usize, offset: usize, byte: u8) -> Result<()> {
        let count = self.fields.len();
        let field = self
            .fields
            .get_mut(index)
            .ok_or(FieldError::InvalidFieldIndex { index, count })?;
        field.set_char(&mut self.storage, offset, byte)
    }

    pub fn fill_field(&mut self, index: usize, byte: u8) -> Result<()> {
        let count = self.fields.len();
        let field = self
            .fields
            .get_mut(index)
            .ok_or(FieldError::InvalidFieldIndex { index, count })?;
        field.fill(&mut self.storage, byte)?;
        Ok(())
    }

    pub fn mark_modified(&mut self, index: usize, modified: bool) -> FieldResult<()> {
        self.get_field_mut(index)?.attribute.set_modified(modified);
        Ok(())
    }

    /// Check a field's content against its attributes
    pub fn validate_field(&self, index: usize) -> Result<()> {
        let field = self.get_field(index)?;
        field.validate_content(field.content(&self.storage)?)?;
        Ok(())
    }

    /// Define a field from an attribute cell written by the host
    ///
    /// Any field that contains `attr_address` is cut short at it, and a
    /// field previously defined by the same attribute cell is replaced. The
    /// new field runs from `attr_address + 1` up to the next field's
    /// attribute cell or the end of the buffer, and takes its initial
    /// content from `screen`. Returns `None` when that leaves no room (two
    /// adjacent attribute cells, or an attribute in the last cell).
    pub fn start_field(
        &mut self,
        attr_address: usize,
        attribute: FieldAttribute,
        screen: &[u8],
    ) -> Result<Option<usize>> {
        self.cache.invalidate();

        if let Some(index) = self.field_index_at(attr_address) {
            let kept = attr_address - self.fields[index].start_address as usize;
            self.truncate_field(index, kept)?;
        }
        if let Some(index) = self
            .fields
            .iter()
            .position(|f| f.start_address as usize == attr_address + 1)
        {
            self.fields.remove(index);
        }

        let start = attr_address + 1;
        let next_attr = self
            .fields
            .iter()
            .find(|f| f.start_address as usize > start)
            .map_or(self.buffer_size, |f| f.start_address as usize - 1);
        if start >= next_attr || start >= self.buffer_size {
            return Ok(None);
        }

        let length = next_attr - start;
        let initial = screen.get(start..next_attr).map(<[u8]>::to_vec);
        let initial = initial.unwrap_or_else(|| vec![BLANK; length]);

        match self.insert_field(start as u16, length, attribute, Some(&initial)) {
            Err(Tn3270Error::Storage(StorageError::StorageFull { .. })) => {
                self.compact()?;
                self.insert_field(start as u16, length, attribute, Some(&initial))
                    .map(Some)
            }
            other => other.map(Some),
        }
    }

    fn truncate_field(&mut self, index: usize, length: usize) -> Result<()> {
        if length == 0 {
            self.fields.remove(index);
            return Ok(());
        }
        let field = &mut self.fields[index];
        match &mut field.content {
            FieldContent::Owned(bytes) => bytes.truncate(length),
            FieldContent::External(handle) => *handle = self.storage.shrink(*handle, length)?,
        }
        field.length = length;
        Ok(())
    }

    /// Rewrite the store so only live field content occupies it
    pub fn compact(&mut self) -> Result<()> {
        if !self.external {
            return Ok(());
        }
        let contents = self
            .fields
            .iter()
            .map(|f| f.content(&self.storage).map(<[u8]>::to_vec))
            .collect::<StorageResult<Vec<_>>>()?;
        self.storage.reset();
        for (field, data) in self.fields.iter_mut().zip(contents) {
            field.content = FieldContent::External(self.storage.add_field(&data)?);
        }
        Ok(())
    }

    /// Mirror a host write to a screen cell into the containing field
    pub fn sync_screen_cell(&mut self, address: usize, byte: u8) -> Result<()> {
        if let Some(index) = self.find_field_at(address as u16) {
            let offset = address - self.fields[index].start_address as usize;
            self.set_field_char(index, offset, byte)?;
        }
        Ok(())
    }

    /// Blank unprotected content from `from` to the end of the buffer,
    /// returning the cleared cell ranges
    pub fn erase_unprotected(&mut self, from: usize) -> Result<Vec<Range<usize>>> {
        let mut cleared = Vec::new();
        for field in self.fields.iter_mut() {
            if field.is_protected() || field.end_address() <= from {
                continue;
            }
            let start = (field.start_address as usize).max(from);
            field.fill_from(&mut self.storage, start - field.start_address as usize, BLANK)?;
            cleared.push(start..field.end_address());
        }
        Ok(cleared)
    }

    pub fn modified_fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.fields.iter().filter(|f| f.is_modified())
    }

    /// Clear the MDT on every field
    pub fn reset_mdt(&mut self) {
        for field in &mut self.fields {
            field.attribute.set_modified(false);
        }
    }

    pub fn first_unprotected(&self) -> Option<usize> {
        self.fields.iter().position(|f| !f.is_protected())
    }

    /// Next unprotected field after `after`, wrapping around; a lone
    /// unprotected field is its own successor
    pub fn next_unprotected(&self, after: usize) -> Option<usize> {
        let count = self.fields.len();
        (1..=count)
            .map(|step| (after + step) % count)
            .find(|&i| !self.fields[i].is_protected())
    }

    /// First unprotected field starting after `address`, wrapping around
    pub fn next_unprotected_after_address(&self, address: usize) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| !f.is_protected() && f.start_address as usize > address)
            .or_else(|| self.first_unprotected())
    }

    /// `(start_address, length)` of every field in order
    pub fn offsets(&self) -> Vec<(u16, usize)> {
        self.fields.iter().map(|f| (f.start_address, f.length)).collect()
    }
}
