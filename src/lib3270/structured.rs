//! Structured field records carried by Write Structured Field
//!
//! Each record is `[type:1][length:2 big-endian][body]`, where `length`
//! counts from the type byte to the end of the record. The first body byte
//! is the flags byte; the remaining layout depends on the type.

use super::codes::{StructuredFieldType, WireCode};
use super::field::ValidationRule;
use crate::error::{ParseError, ParseResult, Result, StructuredFieldError, Tn3270Error};

/// Bytes in a record header
pub const HEADER_LEN: usize = 3;

/// Record type and total length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuredFieldHeader {
    pub field_type: WireCode<StructuredFieldType>,
    /// Header plus body length
    pub length: u16,
}

impl StructuredFieldHeader {
    pub fn to_buffer(&self) -> [u8; HEADER_LEN] {
        let [hi, lo] = self.length.to_be_bytes();
        [self.field_type.to_u8(), hi, lo]
    }

    pub fn from_buffer(buf: &[u8]) -> ParseResult<Self> {
        if buf.len() < HEADER_LEN {
            return Err(ParseError::InsufficientData {
                position: 0,
                buffer_size: buf.len(),
                needed: HEADER_LEN,
                expected: Some("structured field header"),
            });
        }
        Ok(Self {
            field_type: WireCode::from_u8(buf[0]),
            length: u16::from_be_bytes([buf[1], buf[2]]),
        })
    }

    /// Body length, zero for malformed headers shorter than themselves
    pub fn payload_len(&self) -> usize {
        (self.length as usize).saturating_sub(HEADER_LEN)
    }
}

/// A decoded structured field record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredField {
    ColorPair {
        pair_id: u8,
        foreground: u8,
        background: u8,
    },
    ExtendedField {
        field_index: u8,
        highlighting: u8,
        foreground: u8,
        background: u8,
    },
    ValidationRule {
        field_index: u8,
        rule: ValidationRule,
    },
    SealUnseal {
        sealed: bool,
    },
    Transparency {
        field_index: u8,
        level: u8,
    },
    CharacterSet {
        set_id: u8,
        code_page: u16,
    },
    Unknown {
        field_type: u8,
        data: Vec<u8>,
    },
}

impl StructuredField {
    pub fn field_type(&self) -> WireCode<StructuredFieldType> {
        use StructuredFieldType as T;
        match self {
            Self::ColorPair { .. } => WireCode::Known(T::ColorPair),
            Self::ExtendedField { .. } => WireCode::Known(T::ExtendedField),
            Self::ValidationRule { .. } => WireCode::Known(T::FieldValidation),
            Self::SealUnseal { .. } => WireCode::Known(T::SealUnseal),
            Self::Transparency { .. } => WireCode::Known(T::Transparency),
            Self::CharacterSet { .. } => WireCode::Known(T::CharacterSet),
            Self::Unknown { field_type, .. } => WireCode::from_u8(*field_type),
        }
    }

    fn body(&self) -> Vec<u8> {
        match self {
            Self::ColorPair { pair_id, foreground, background } => vec![*pair_id, *foreground, *background],
            Self::ExtendedField { field_index, highlighting, foreground, background } => {
                vec![*field_index, *highlighting, *foreground, *background]
            }
            Self::ValidationRule { field_index, rule } => {
                vec![*field_index, rule.bits, rule.min_length, rule.max_length]
            }
            Self::SealUnseal { sealed } => vec![u8::from(*sealed)],
            Self::Transparency { field_index, level } => vec![*field_index, *level],
            Self::CharacterSet { set_id, code_page } => {
                let [hi, lo] = code_page.to_be_bytes();
                vec![*set_id, hi, lo]
            }
            Self::Unknown { data, .. } => data.clone(),
        }
    }

    /// Encode the record with its header
    pub fn to_bytes(&self) -> Vec<u8> {
        let body = self.body();
        let header = StructuredFieldHeader {
            field_type: self.field_type(),
            length: (HEADER_LEN + body.len()) as u16,
        };
        let mut out = header.to_buffer().to_vec();
        out.extend(body);
        out
    }
}

fn require(body: &[u8], required: usize, err: fn(usize, usize) -> StructuredFieldError) -> Result<()> {
    if body.len() < required {
        return Err(err(body.len(), required).into());
    }
    Ok(())
}

fn decode_body(field_type: WireCode<StructuredFieldType>, body: &[u8]) -> Result<StructuredField> {
    use StructuredFieldError as E;
    use StructuredFieldType as T;

    let field = match field_type {
        WireCode::Known(T::ColorPair) => {
            require(body, 3, |actual, required| E::InvalidColorPair { actual, required })?;
            StructuredField::ColorPair {
                pair_id: body[0],
                foreground: body[1],
                background: body[2],
            }
        }
        WireCode::Known(T::ExtendedField) => {
            require(body, 4, |actual, required| E::InvalidExtendedField { actual, required })?;
            StructuredField::ExtendedField {
                field_index: body[0],
                highlighting: body[1],
                foreground: body[2],
                background: body[3],
            }
        }
        WireCode::Known(T::FieldValidation) => {
            require(body, 4, |actual, required| E::InvalidValidationRule { actual, required })?;
            StructuredField::ValidationRule {
                field_index: body[0],
                rule: ValidationRule {
                    bits: body[1],
                    min_length: body[2],
                    max_length: body[3],
                },
            }
        }
        WireCode::Known(T::SealUnseal) => {
            require(body, 1, |actual, required| E::InvalidSealUnseal { actual, required })?;
            StructuredField::SealUnseal { sealed: body[0] != 0 }
        }
        WireCode::Known(T::Transparency) => {
            require(body, 2, |actual, required| E::InvalidTransparency { actual, required })?;
            StructuredField::Transparency {
                field_index: body[0],
                level: body[1],
            }
        }
        WireCode::Known(T::CharacterSet) => {
            require(body, 3, |actual, required| E::InvalidCharacterSet { actual, required })?;
            StructuredField::CharacterSet {
                set_id: body[0],
                code_page: u16::from_be_bytes([body[1], body[2]]),
            }
        }
        WireCode::Unknown(code) => StructuredField::Unknown {
            field_type: code,
            data: body.to_vec(),
        },
    };
    Ok(field)
}

/// Decode the record at the start of `buf`, returning it and the bytes
/// it occupies
pub fn parse_field(buf: &[u8]) -> Result<(StructuredField, usize)> {
    let header = StructuredFieldHeader::from_buffer(buf)?;
    let length = header.length as usize;
    if length < HEADER_LEN {
        return Err(ParseError::InsufficientData {
            position: 0,
            buffer_size: buf.len(),
            needed: HEADER_LEN,
            expected: Some("structured field length of at least 3"),
        }
        .into());
    }
    if length > buf.len() {
        return Err(ParseError::IncompleteField {
            position: 0,
            declared: length,
            remaining: buf.len(),
        }
        .into());
    }
    let field = decode_body(header.field_type, &buf[HEADER_LEN..length])?;
    Ok((field, length))
}

/// Records decoded by [`parse_fields_lenient`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFields {
    pub records: Vec<StructuredField>,
    /// Buffer offset and error of every record skipped for a short body
    pub skipped: Vec<(usize, StructuredFieldError)>,
}

fn scan(
    buf: &[u8],
    mut on_invalid: impl FnMut(usize, StructuredFieldError) -> Result<()>,
) -> Result<Vec<StructuredField>> {
    let mut fields = Vec::new();
    let mut pos = 0;

    while buf.len() - pos >= HEADER_LEN {
        let header = StructuredFieldHeader::from_buffer(&buf[pos..])?;
        let length = header.length as usize;
        if length < HEADER_LEN {
            break;
        }
        match parse_field(&buf[pos..]) {
            Ok((field, _)) => fields.push(field),
            Err(Tn3270Error::StructuredField(e)) => on_invalid(pos, e)?,
            Err(Tn3270Error::Parse(ParseError::IncompleteField { declared, remaining, .. })) => {
                return Err(ParseError::IncompleteField {
                    position: pos,
                    declared,
                    remaining,
                }
                .into());
            }
            Err(e) => return Err(e),
        }
        pos += length;
    }
    Ok(fields)
}

/// Decode consecutive records
///
/// Stops quietly at the end of the buffer or at trailing bytes that do not
/// form a header (fewer than three bytes, or a declared length below three).
/// The first record with a short body fails the whole buffer.
pub fn parse_fields(buf: &[u8]) -> Result<Vec<StructuredField>> {
    scan(buf, |_, e| Err(e.into()))
}

/// Decode consecutive records, stepping over any whose body is too short
/// for its type
///
/// A skipped record still advances by its declared length. A record that
/// runs past the end of the buffer fails with `IncompleteField`.
pub fn parse_fields_lenient(buf: &[u8]) -> Result<ParsedFields> {
    let mut skipped = Vec::new();
    let records = scan(buf, |pos, e| {
        skipped.push((pos, e));
        Ok(())
    })?;
    Ok(ParsedFields { records, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_color_pair_record() {
        let (field, consumed) = parse_field(&[0x0B, 0x00, 0x06, 0x01, 0xF2, 0xF4]).unwrap();
        assert_eq!(consumed, 6);
        assert_eq!(
            field,
            StructuredField::ColorPair { pair_id: 0x01, foreground: 0xF2, background: 0xF4 }
        );
    }

    #[test]
    fn test_incomplete_field() {
        let err = parse_fields(&[0x0B, 0x00, 0x09, 0x01]).unwrap_err();
        assert!(matches!(
            err,
            Tn3270Error::Parse(ParseError::IncompleteField { position: 0, declared: 9, remaining: 4 })
        ));
    }

    #[test]
    fn test_short_body_errors() {
        let err = parse_field(&[0x0C, 0x00, 0x05, 0x00, 0xF1]).unwrap_err();
        assert!(matches!(
            err,
            Tn3270Error::StructuredField(StructuredFieldError::InvalidExtendedField { actual: 2, required: 4 })
        ));

        let err = parse_field(&[0x0E, 0x00, 0x03]).unwrap_err();
        assert!(matches!(
            err,
            Tn3270Error::StructuredField(StructuredFieldError::InvalidSealUnseal { actual: 0, required: 1 })
        ));
    }

    #[test]
    fn test_unknown_type_preserved() {
        let (field, _) = parse_field(&[0x7A, 0x00, 0x05, 0xAB, 0xCD]).unwrap();
        assert_eq!(field, StructuredField::Unknown { field_type: 0x7A, data: vec![0xAB, 0xCD] });
        assert_eq!(field.to_bytes(), vec![0x7A, 0x00, 0x05, 0xAB, 0xCD]);
    }

    #[test]
    fn test_multiple_records_and_trailing_garbage() {
        let mut buf = StructuredField::SealUnseal { sealed: true }.to_bytes();
        buf.extend(
            StructuredField::CharacterSet { set_id: 1, code_page: 0x0025 }.to_bytes(),
        );
        buf.extend([0x0F, 0x00]);

        let fields = parse_fields(&buf).unwrap();
        assert_eq!(
            fields,
            vec![
                StructuredField::SealUnseal { sealed: true },
                StructuredField::CharacterSet { set_id: 1, code_page: 0x0025 },
            ]
        );

        // A declared length below the header size ends the scan
        let fields = parse_fields(&[0x0E, 0x00, 0x04, 0x01, 0x0B, 0x00, 0x02]).unwrap();
        assert_eq!(fields, vec![StructuredField::SealUnseal { sealed: true }]);
    }

    #[test]
    fn test_incomplete_field_position() {
        let mut buf = StructuredField::SealUnseal { sealed: false }.to_bytes();
        buf.extend([0x0B, 0x00, 0x09, 0x01]);
        assert!(matches!(
            parse_fields(&buf),
            Err(Tn3270Error::Parse(ParseError::IncompleteField { position: 4, declared: 9, remaining: 4 }))
        ));
    }

    #[test]
    fn test_lenient_scan_steps_over_short_body() {
        let mut buf = StructuredField::ColorPair { pair_id: 1, foreground: 2, background: 3 }.to_bytes();
        buf.extend([0x0B, 0x00, 0x05, 0x02, 0x04]);
        buf.extend(StructuredField::SealUnseal { sealed: true }.to_bytes());

        assert!(matches!(
            parse_fields(&buf),
            Err(Tn3270Error::StructuredField(StructuredFieldError::InvalidColorPair { actual: 2, required: 3 }))
        ));

        let parsed = parse_fields_lenient(&buf).unwrap();
        assert_eq!(
            parsed.records,
            vec![
                StructuredField::ColorPair { pair_id: 1, foreground: 2, background: 3 },
                StructuredField::SealUnseal { sealed: true },
            ]
        );
        assert_eq!(
            parsed.skipped,
            vec![(6, StructuredFieldError::InvalidColorPair { actual: 2, required: 3 })]
        );

        // Running off the end is still fatal
        buf.extend([0x0B, 0x00, 0x09, 0x01]);
        assert!(matches!(
            parse_fields_lenient(&buf),
            Err(Tn3270Error::Parse(ParseError::IncompleteField { position: 15, declared: 9, remaining: 4 }))
        ));
    }

    #[test]
    fn test_validation_record() {
        let (field, _) = parse_field(&[0x0D, 0x00, 0x07, 0x02, 0x06, 0x01, 0x08]).unwrap();
        assert_eq!(
            field,
            StructuredField::ValidationRule {
                field_index: 2,
                rule: ValidationRule { bits: 0x06, min_length: 1, max_length: 8 },
            }
        );
    }

    proptest! {
        #[test]
        fn prop_header_round_trip(field_type in any::<u8>(), length in any::<u16>()) {
            let header = StructuredFieldHeader {
                field_type: WireCode::from_u8(field_type),
                length,
            };
            let decoded = StructuredFieldHeader::from_buffer(&header.to_buffer()).unwrap();
            prop_assert_eq!(decoded, header);
        }
    }
}
