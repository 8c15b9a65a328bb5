//! TN3270 Integration Tests
//!
//! Drive the engine through its public API the way a transport would:
//! framed host records in, keystrokes, inbound replies out.

use tn3270r::config::EngineConfig;
use tn3270r::error::{FieldError, ParseError, StorageError, Tn3270Error};
use tn3270r::lib3270::address::legacy;
use tn3270r::lib3270::{
    frame_record, parse_command, parse_orders, AddressMode, AidKey, CommandCode, ExecOutcome, FieldAttribute,
    FieldManager, ScreenSize, StructuredField, Terminal3270, AID_ENTER, AID_PA1, CMD_ERASE_WRITE,
    CMD_ERASE_WRITE_ALTERNATE, CMD_READ_BUFFER, CMD_READ_MODIFIED, CMD_SNA_WRITE_STRUCTURED_FIELD, CMD_WRITE,
    CMD_WRITE_STRUCTURED_FIELD, COLOR_RED, COLOR_WHITE, ORDER_IC, ORDER_PT, ORDER_SBA, ORDER_SF, WCC_ALARM,
    WCC_RESET_MDT, WCC_RESTORE,
};
use tn3270r::protocol_common::ebcdic::{ascii_to_ebcdic, ebcdic_to_ascii, string_to_ebcdic};
use tn3270r::protocol_common::traits::TerminalProtocol;
use tn3270r::StreamLogger;

fn logger() -> StreamLogger {
    StreamLogger::new("integration").with_capture(64)
}

/// Protected label, unprotected input, protected stopper on row 2
fn form(label: &str) -> Vec<u8> {
    let mut record = vec![CMD_ERASE_WRITE, WCC_RESTORE, ORDER_SBA, 0x00, 0x50, ORDER_SF, 0x01];
    record.extend(string_to_ebcdic(label).unwrap());
    record.extend([ORDER_SBA, 0x00, 0x5A, ORDER_SF, 0x00, ORDER_IC]);
    record.extend([ORDER_SBA, 0x00, 0x64, ORDER_SF, 0x01]);
    frame_record(&record)
}

#[test]
fn test_write_with_empty_order_byte() {
    let command = parse_command(b"\x01\x00").unwrap();
    assert_eq!(command.code, CommandCode::Write);
    assert_eq!(command.data, vec![0x00]);
    assert!(parse_orders(&[0x00]).is_empty());
}

#[test]
fn test_ebcdic_letter_a() {
    assert_eq!(ebcdic_to_ascii(0xC1), 'A');
    assert_eq!(ascii_to_ebcdic('A').unwrap(), 0xC1);
}

#[test]
fn test_structured_field_records() {
    let mut term = Terminal3270::with_defaults();
    let mut log = logger();
    let mut record = vec![CMD_WRITE_STRUCTURED_FIELD, 0x0B, 0x00, 0x06, 0x01, 0x02, 0x03];
    record.extend([0xFF, 0x00, 0x05, 0xAA, 0xBB]);

    let outcomes = term.receive(&frame_record(&record), &mut log).unwrap();
    assert_eq!(
        outcomes,
        vec![ExecOutcome::StructuredFields(vec![
            StructuredField::ColorPair { pair_id: 1, foreground: 2, background: 3 },
            StructuredField::Unknown { field_type: 0xFF, data: vec![0xAA, 0xBB] },
        ])]
    );
    assert_eq!(term.executor().color_pair(1), Some((2, 3)));
    assert_eq!(log.count(log::Level::Info), 1);
}

#[test]
fn test_short_structured_field_does_not_stall_stream() {
    let mut term = Terminal3270::with_defaults();
    let mut log = logger();
    let mut input = frame_record(&[
        CMD_WRITE_STRUCTURED_FIELD,
        0x0B, 0x00, 0x06, 0x01, 0x02, 0x03, // color pair 1
        0x0B, 0x00, 0x05, 0x02, 0x04, // color pair with a two-byte body
    ]);
    input.extend(frame_record(&[CMD_WRITE, 0x00, 0xC1]));

    let outcomes = term.receive(&input, &mut log).unwrap();
    assert_eq!(
        outcomes,
        vec![
            ExecOutcome::StructuredFields(vec![StructuredField::ColorPair {
                pair_id: 1,
                foreground: 2,
                background: 3
            }]),
            ExecOutcome::Updated,
        ]
    );
    assert_eq!(term.executor().color_pair(1), Some((2, 3)));
    assert_eq!(term.executor().color_pair(2), None);
    assert_eq!(term.screen().read_char(0, 0), Ok(b'A'));
    assert_eq!(term.buffered(), 0);
    assert_eq!(log.count(log::Level::Warn), 1);
}

#[test]
fn test_sna_structured_field_code() {
    let mut term = Terminal3270::with_defaults();
    let mut log = logger();
    let mut record = vec![CMD_SNA_WRITE_STRUCTURED_FIELD];
    record.extend(StructuredField::ColorPair { pair_id: 4, foreground: COLOR_RED, background: COLOR_WHITE }.to_bytes());
    term.receive(&frame_record(&record), &mut log).unwrap();
    assert_eq!(term.executor().color_pair(4), Some((COLOR_RED, COLOR_WHITE)));
}

#[test]
fn test_type_three_then_backspace() {
    let mut term = Terminal3270::with_defaults();
    let mut log = logger();
    term.receive(&form("NAME"), &mut log).unwrap();

    for ch in [b'A', b'B', b'C'] {
        term.type_char(ch).unwrap();
    }
    term.backspace().unwrap();

    let fields = term.fields();
    let content = fields.field_content(1).unwrap();
    assert_eq!(content.len(), 9);
    assert!(content.starts_with(b"AB "));
    assert!(content[2..].iter().all(|&b| b == b' '));
    assert_eq!(
        term.entry().state(),
        tn3270r::lib3270::EntryState::AtField { index: 1, offset: 2 }
    );
}

#[test]
fn test_login_round_trip() {
    let mut term = Terminal3270::with_defaults();
    let mut log = logger();
    term.receive(&form("USER"), &mut log).unwrap();
    assert_eq!(term.screen().row_text(1).unwrap().trim_end(), " USER");
    assert_eq!(term.screen().cursor_offset(), 91);

    term.type_text("ALICE").unwrap();
    let reply = term.submit(AidKey::Enter).unwrap();

    let mut expected = vec![AID_ENTER, 0x00, 0x60, ORDER_SBA, 0x00, 0x5B];
    expected.extend(string_to_ebcdic("ALICE").unwrap());
    assert_eq!(reply, expected);
    assert!(term.is_keyboard_locked());

    // Host answers with a plain write that resets MDTs and unlocks
    term.receive(&frame_record(&[CMD_WRITE, WCC_RESET_MDT | WCC_RESTORE | WCC_ALARM]), &mut log)
        .unwrap();
    assert!(!term.is_keyboard_locked());
    assert!(term.executor().is_alarm());
    assert_eq!(term.fields().modified_fields().count(), 0);
    assert_eq!(term.read_modified_reply(AidKey::Enter).unwrap(), vec![AID_ENTER, 0x00, 0x60]);
}

#[test]
fn test_read_buffer_reply_queued() {
    let mut term = Terminal3270::new(&EngineConfig {
        screen_size: ScreenSize::Custom { rows: 2, cols: 10 },
        ..EngineConfig::default()
    })
    .unwrap();
    let mut log = logger();
    term.receive(&frame_record(&[CMD_ERASE_WRITE, 0x00, ORDER_SF, 0x01, 0xC8, 0xC9]), &mut log)
        .unwrap();
    term.receive(&frame_record(&[CMD_READ_BUFFER]), &mut log).unwrap();

    let reply = term.generate_response().unwrap();
    assert_eq!(&reply[..7], &[0x60, 0x00, 0x00, ORDER_SF, 0x01, 0xC8, 0xC9]);
    assert_eq!(reply.len(), 3 + 21);
    assert!(term.generate_response().is_none());
}

#[test]
fn test_short_read_for_pa_key() {
    let mut term = Terminal3270::with_defaults();
    let mut log = logger();
    term.receive(&form("ID"), &mut log).unwrap();
    term.type_text("42").unwrap();
    assert_eq!(term.submit(AidKey::PA1).unwrap(), vec![AID_PA1]);

    // Read Modified from the host reports the AID that was pressed
    term.receive(&frame_record(&[CMD_READ_MODIFIED]), &mut log).unwrap();
    assert_eq!(term.generate_response(), Some(vec![AID_PA1]));
}

#[test]
fn test_typing_without_input_fields_changes_nothing() {
    let mut term = Terminal3270::with_defaults();
    let mut log = logger();
    term.receive(&frame_record(&[CMD_ERASE_WRITE, WCC_RESTORE, ORDER_SF, 0x01, 0xC1]), &mut log)
        .unwrap();

    let before = term.screen().as_bytes().to_vec();
    let err = term.type_char(b'X').unwrap_err();
    assert!(matches!(err, Tn3270Error::Field(FieldError::NoUnprotectedFields { count: 1 })));
    assert_eq!(term.screen().as_bytes(), before.as_slice());
}

#[test]
fn test_program_tab_and_tab_key() {
    let mut term = Terminal3270::with_defaults();
    let mut log = logger();
    let record = frame_record(&[
        CMD_ERASE_WRITE, WCC_RESTORE,
        ORDER_SF, 0x00, // input at 1
        ORDER_SBA, 0x00, 0x0A, ORDER_SF, 0x01, // protected at 11
        ORDER_SBA, 0x00, 0x14, ORDER_SF, 0x00, // input at 21
        ORDER_SBA, 0x00, 0x1E, ORDER_SF, 0x01, // protected at 31
        ORDER_SBA, 0x00, 0x05, ORDER_PT, 0xE7, // PT from 5 lands on 21
    ]);
    term.receive(&record, &mut log).unwrap();
    assert_eq!(term.screen().read_char(0, 21), Ok(b'X'));

    assert_eq!(term.tab().unwrap(), 0);
    assert_eq!(term.tab().unwrap(), 2);
    assert_eq!(term.tab().unwrap(), 0);
    assert_eq!(term.screen().cursor_offset(), 1);
}

#[test]
fn test_chunked_delivery() {
    let mut term = Terminal3270::with_defaults();
    let mut log = logger();
    let mut stream = form("PASSWORD");
    stream.extend(frame_record(&[CMD_WRITE, 0x00, ORDER_SBA, 0x00, 0x00, 0xC8, 0xC9]));

    let mut executed = 0;
    for chunk in stream.chunks(3) {
        executed += term.receive(chunk, &mut log).unwrap().len();
    }
    assert_eq!(executed, 2);
    assert_eq!(term.buffered(), 0);
    assert_eq!(term.screen().read_text(0, 0, 2).unwrap(), b"HI");
    assert_eq!(term.fields().count(), 3);
}

#[test]
fn test_oversized_input_rejected() {
    let mut term = Terminal3270::new(&EngineConfig {
        stream_buffer_capacity: 8,
        ..EngineConfig::default()
    })
    .unwrap();
    let mut log = logger();
    let err = term.receive(&[0x40; 9], &mut log).unwrap_err();
    assert!(matches!(err, Tn3270Error::Parse(ParseError::BufferOverflow { capacity: 8, .. })));
    assert_eq!(term.buffered(), 0);
}

#[test]
fn test_legacy_addressing() {
    let config = EngineConfig {
        address_mode: AddressMode::Legacy12Bit,
        ..EngineConfig::default()
    };
    let mut term = Terminal3270::new(&config).unwrap();
    let mut log = logger();
    let [b1, b2] = legacy::encode_12bit(85);
    term.receive(&frame_record(&[CMD_ERASE_WRITE_ALTERNATE, 0x00, ORDER_SBA, b1, b2, 0xC1]), &mut log)
        .unwrap();
    assert_eq!(term.screen().read_char(1, 5), Ok(b'A'));

    // Model 5 (3564 cells) still fits 12-bit addressing
    let config = EngineConfig {
        screen_size: ScreenSize::Model5,
        address_mode: AddressMode::Legacy12Bit,
        ..EngineConfig::default()
    };
    assert!(Terminal3270::new(&config).is_ok());
}

#[test]
fn test_storage_full_boundary() {
    let mut fields = FieldManager::with_storage(1920, 10);
    fields.add_field(0, 10, FieldAttribute::default()).unwrap();
    let err = fields.add_field(20, 1, FieldAttribute::default()).unwrap_err();
    assert!(matches!(
        err,
        Tn3270Error::Storage(StorageError::StorageFull { requested: 1, remaining: 0, capacity: 10 })
    ));
}

#[test]
fn test_reset_returns_to_power_on() {
    let mut term = Terminal3270::with_defaults();
    let mut log = logger();
    term.receive(&form("X"), &mut log).unwrap();
    term.receive(&frame_record(&[CMD_READ_BUFFER]), &mut log).unwrap();
    term.reset();

    assert_eq!(term.fields().count(), 0);
    assert!(term.generate_response().is_none());
    assert!(term.screen_text().trim().is_empty());
}
