//! EBCDIC (code page 037) to ASCII/Latin-1 conversion
//!
//! The two 256-entry tables below are the byte-exact contract for the
//! engine's character data. Decoding is total: every EBCDIC byte maps to a
//! Latin-1 byte, and the 7-bit half of that mapping is plain ASCII.
//! Encoding through [`encode_byte`] accepts 7-bit ASCII only; the full
//! Latin-1 inverse is available through [`latin1_to_ebcdic`] for reply
//! generation, where screen cells may hold any decoded byte.

use crate::error::{CodecError, CodecResult};

/// EBCDIC CP037 to Latin-1 translation table, indexed by EBCDIC byte
pub static EBCDIC_TO_ASCII: [u8; 256] = [
    /* 00 */ 0x00, 0x01, 0x02, 0x03, 0x9C, 0x09, 0x86, 0x7F, 0x97, 0x8D, 0x8E, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
    /* 10 */ 0x10, 0x11, 0x12, 0x13, 0x9D, 0x85, 0x08, 0x87, 0x18, 0x19, 0x92, 0x8F, 0x1C, 0x1D, 0x1E, 0x1F,
    /* 20 */ 0x80, 0x81, 0x82, 0x83, 0x84, 0x0A, 0x17, 0x1B, 0x88, 0x89, 0x8A, 0x8B, 0x8C, 0x05, 0x06, 0x07,
    /* 30 */ 0x90, 0x91, 0x16, 0x93, 0x94, 0x95, 0x96, 0x04, 0x98, 0x99, 0x9A, 0x9B, 0x14, 0x15, 0x9E, 0x1A,
    /* 40 */ 0x20, 0xA0, 0xE2, 0xE4, 0xE0, 0xE1, 0xE3, 0xE5, 0xE7, 0xF1, 0xA2, 0x2E, 0x3C, 0x28, 0x2B, 0x7C,
    /* 50 */ 0x26, 0xE9, 0xEA, 0xEB, 0xE8, 0xED, 0xEE, 0xEF, 0xEC, 0xDF, 0x21, 0x24, 0x2A, 0x29, 0x3B, 0xAC,
    /* 60 */ 0x2D, 0x2F, 0xC2, 0xC4, 0xC0, 0xC1, 0xC3, 0xC5, 0xC7, 0xD1, 0xA6, 0x2C, 0x25, 0x5F, 0x3E, 0x3F,
    /* 70 */ 0xF8, 0xC9, 0xCA, 0xCB, 0xC8, 0xCD, 0xCE, 0xCF, 0xCC, 0x60, 0x3A, 0x23, 0x40, 0x27, 0x3D, 0x22,
    /* 80 */ 0xD8, 0x61, 0x62, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0xAB, 0xBB, 0xF0, 0xFD, 0xFE, 0xB1,
    /* 90 */ 0xB0, 0x6A, 0x6B, 0x6C, 0x6D, 0x6E, 0x6F, 0x70, 0x71, 0x72, 0xAA, 0xBA, 0xE6, 0xB8, 0xC6, 0xA4,
    /* A0 */ 0xB5, 0x7E, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7A, 0xA1, 0xBF, 0xD0, 0xDD, 0xDE, 0xAE,
    /* B0 */ 0x5E, 0xA3, 0xA5, 0xB7, 0xA9, 0xA7, 0xB6, 0xBC, 0xBD, 0xBE, 0x5B, 0x5D, 0xAF, 0xA8, 0xB4, 0xD7,
    /* C0 */ 0x7B, 0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0xAD, 0xF4, 0xF6, 0xF2, 0xF3, 0xF5,
    /* D0 */ 0x7D, 0x4A, 0x4B, 0x4C, 0x4D, 0x4E, 0x4F, 0x50, 0x51, 0x52, 0xB9, 0xFB, 0xFC, 0xF9, 0xFA, 0xFF,
    /* E0 */ 0x5C, 0xF7, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5A, 0xB2, 0xD4, 0xD6, 0xD2, 0xD3, 0xD5,
    /* F0 */ 0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0xB3, 0xDB, 0xDC, 0xD9, 0xDA, 0x9F,
];

/// Latin-1 to EBCDIC CP037 translation table, indexed by Latin-1 byte
pub static ASCII_TO_EBCDIC: [u8; 256] = [
    /* 00 */ 0x00, 0x01, 0x02, 0x03, 0x37, 0x2D, 0x2E, 0x2F, 0x16, 0x05, 0x25, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
    /* 10 */ 0x10, 0x11, 0x12, 0x13, 0x3C, 0x3D, 0x32, 0x26, 0x18, 0x19, 0x3F, 0x27, 0x1C, 0x1D, 0x1E, 0x1F,
    /* 20 */ 0x40, 0x5A, 0x7F, 0x7B, 0x5B, 0x6C, 0x50, 0x7D, 0x4D, 0x5D, 0x5C, 0x4E, 0x6B, 0x60, 0x4B, 0x61,
    /* 30 */ 0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0x7A, 0x5E, 0x4C, 0x7E, 0x6E, 0x6F,
    /* 40 */ 0x7C, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6,
    /* 50 */ 0xD7, 0xD8, 0xD9, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xBA, 0xE0, 0xBB, 0xB0, 0x6D,
    /* 60 */ 0x79, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96,
    /* 70 */ 0x97, 0x98, 0x99, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xC0, 0x4F, 0xD0, 0xA1, 0x07,
    /* 80 */ 0x20, 0x21, 0x22, 0x23, 0x24, 0x15, 0x06, 0x17, 0x28, 0x29, 0x2A, 0x2B, 0x2C, 0x09, 0x0A, 0x1B,
    /* 90 */ 0x30, 0x31, 0x1A, 0x33, 0x34, 0x35, 0x36, 0x08, 0x38, 0x39, 0x3A, 0x3B, 0x04, 0x14, 0x3E, 0xFF,
    /* A0 */ 0x41, 0xAA, 0x4A, 0xB1, 0x9F, 0xB2, 0x6A, 0xB5, 0xBD, 0xB4, 0x9A, 0x8A, 0x5F, 0xCA, 0xAF, 0xBC,
    /* B0 */ 0x90, 0x8F, 0xEA, 0xFA, 0xBE, 0xA0, 0xB6, 0xB3, 0x9D, 0xDA, 0x9B, 0x8B, 0xB7, 0xB8, 0xB9, 0xAB,
    /* C0 */ 0x64, 0x65, 0x62, 0x66, 0x63, 0x67, 0x9E, 0x68, 0x74, 0x71, 0x72, 0x73, 0x78, 0x75, 0x76, 0x77,
    /* D0 */ 0xAC, 0x69, 0xED, 0xEE, 0xEB, 0xEF, 0xEC, 0xBF, 0x80, 0xFD, 0xFE, 0xFB, 0xFC, 0xAD, 0xAE, 0x59,
    /* E0 */ 0x44, 0x45, 0x42, 0x46, 0x43, 0x47, 0x9C, 0x48, 0x54, 0x51, 0x52, 0x53, 0x58, 0x55, 0x56, 0x57,
    /* F0 */ 0x8C, 0x49, 0xCD, 0xCE, 0xCB, 0xCF, 0xCC, 0xE1, 0x70, 0xDD, 0xDE, 0xDB, 0xDC, 0x8D, 0x8E, 0xDF,
];

/// EBCDIC space
pub const EBCDIC_SPACE: u8 = 0x40;

/// Decode one EBCDIC byte
///
/// # Examples
///
/// ```
/// use tn3270r::protocol_common::ebcdic::decode_byte;
///
/// assert_eq!(decode_byte(0xC1), b'A');
/// ```
#[inline]
pub fn decode_byte(ebcdic: u8) -> u8 {
    EBCDIC_TO_ASCII[ebcdic as usize]
}

/// Encode one 7-bit ASCII byte
///
/// Fails with `InvalidAsciiValue` for values above 127.
#[inline]
pub fn encode_byte(ascii: u8) -> CodecResult<u8> {
    if ascii > 0x7F {
        return Err(CodecError::InvalidAsciiValue { value: ascii as u32 });
    }
    Ok(ASCII_TO_EBCDIC[ascii as usize])
}

/// Encode one Latin-1 byte (total)
#[inline]
pub fn latin1_to_ebcdic(byte: u8) -> u8 {
    ASCII_TO_EBCDIC[byte as usize]
}

/// Decode `src` into `dst`, returning the number of bytes written
pub fn decode(src: &[u8], dst: &mut [u8]) -> CodecResult<usize> {
    if dst.len() < src.len() {
        return Err(CodecError::BufferTooSmall {
            needed: src.len(),
            available: dst.len(),
        });
    }
    for (out, &byte) in dst.iter_mut().zip(src) {
        *out = decode_byte(byte);
    }
    Ok(src.len())
}

/// Encode `src` into `dst`, returning the number of bytes written
///
/// Stops at the first non-ASCII byte; `dst` may be partially written.
pub fn encode(src: &[u8], dst: &mut [u8]) -> CodecResult<usize> {
    if dst.len() < src.len() {
        return Err(CodecError::BufferTooSmall {
            needed: src.len(),
            available: dst.len(),
        });
    }
    for (out, &byte) in dst.iter_mut().zip(src) {
        *out = encode_byte(byte)?;
    }
    Ok(src.len())
}

/// Decode into a freshly allocated buffer
pub fn decode_alloc(src: &[u8]) -> Vec<u8> {
    src.iter().map(|&b| decode_byte(b)).collect()
}

/// Encode into a freshly allocated buffer
pub fn encode_alloc(src: &[u8]) -> CodecResult<Vec<u8>> {
    src.iter().map(|&b| encode_byte(b)).collect()
}

/// Convert an EBCDIC byte to a character
pub fn ebcdic_to_ascii(byte: u8) -> char {
    char::from(decode_byte(byte))
}

/// Convert an ASCII character to EBCDIC
pub fn ascii_to_ebcdic(ch: char) -> CodecResult<u8> {
    if !ch.is_ascii() {
        return Err(CodecError::InvalidAsciiValue { value: ch as u32 });
    }
    encode_byte(ch as u8)
}

/// Convert a run of EBCDIC bytes to a string
pub fn ebcdic_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| ebcdic_to_ascii(b)).collect()
}

/// Convert an ASCII string to EBCDIC bytes
pub fn string_to_ebcdic(s: &str) -> CodecResult<Vec<u8>> {
    s.chars().map(ascii_to_ebcdic).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_letters_and_digits() {
        assert_eq!(decode_byte(0xC1), 0x41);
        assert_eq!(encode_byte(0x41).unwrap(), 0xC1);

        assert_eq!(ebcdic_to_ascii(0x81), 'a');
        assert_eq!(ebcdic_to_ascii(0xE9), 'Z');
        assert_eq!(ebcdic_to_ascii(0xF0), '0');
        assert_eq!(ebcdic_to_ascii(0xF9), '9');
        assert_eq!(ebcdic_to_ascii(EBCDIC_SPACE), ' ');
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(ascii_to_ebcdic('[').unwrap(), 0xBA);
        assert_eq!(ascii_to_ebcdic(']').unwrap(), 0xBB);
        assert_eq!(ascii_to_ebcdic('|').unwrap(), 0x4F);
        assert_eq!(ascii_to_ebcdic('!').unwrap(), 0x5A);
        assert_eq!(ascii_to_ebcdic('{').unwrap(), 0xC0);
        assert_eq!(ascii_to_ebcdic('\\').unwrap(), 0xE0);
    }

    #[test]
    fn test_tables_are_inverse() {
        for byte in 0..=255u8 {
            assert_eq!(latin1_to_ebcdic(decode_byte(byte)), byte);
            assert_eq!(decode_byte(latin1_to_ebcdic(byte)), byte);
        }
    }

    #[test]
    fn test_encode_rejects_non_ascii() {
        assert_eq!(
            encode_byte(0x80),
            Err(CodecError::InvalidAsciiValue { value: 0x80 })
        );
        assert!(ascii_to_ebcdic('é').is_err());
    }

    #[test]
    fn test_buffer_variants() {
        let mut dst = [0u8; 5];
        assert_eq!(encode(b"HELLO", &mut dst).unwrap(), 5);
        assert_eq!(dst, [0xC8, 0xC5, 0xD3, 0xD3, 0xD6]);

        let mut back = [0u8; 8];
        assert_eq!(decode(&dst, &mut back).unwrap(), 5);
        assert_eq!(&back[..5], b"HELLO");

        let mut small = [0u8; 2];
        assert_eq!(
            encode(b"HELLO", &mut small),
            Err(CodecError::BufferTooSmall { needed: 5, available: 2 })
        );
        assert!(decode(&dst, &mut small).is_err());

        let mut dst = [0u8; 3];
        assert!(matches!(
            encode(&[b'A', 0xC9, b'B'], &mut dst),
            Err(CodecError::InvalidAsciiValue { value: 0xC9 })
        ));
    }

    #[test]
    fn test_string_helpers() {
        let bytes = string_to_ebcdic("LOGON APPLID(TSO)").unwrap();
        assert_eq!(ebcdic_to_string(&bytes), "LOGON APPLID(TSO)");
        assert_eq!(decode_alloc(&encode_alloc(b"abc").unwrap()), b"abc");
    }

    proptest! {
        #[test]
        fn prop_printable_ascii_round_trip(s in "[ -~]{0,64}") {
            let encoded = encode_alloc(s.as_bytes()).unwrap();
            prop_assert_eq!(decode_alloc(&encoded), s.as_bytes().to_vec());
        }

        #[test]
        fn prop_decode_is_total(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
            let mut dst = vec![0u8; bytes.len()];
            prop_assert_eq!(decode(&bytes, &mut dst).unwrap(), bytes.len());
        }
    }
}
