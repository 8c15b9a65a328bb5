//! Offline 3270 data stream analyzer
//!
//! Usage: `analyze_3270_stream <capture> [config.json]`
//!
//! The capture is either raw bytes or a hex dump (whitespace ignored). If it
//! contains no `IAC EOR` the whole capture is treated as one record.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tn3270r::config::EngineConfig;
use tn3270r::lib3270::parser::{frame_record, parse_stream, StreamItem, StreamParser, EOR, IAC};
use tn3270r::lib3270::structured::parse_fields_lenient;
use tn3270r::lib3270::{CommandCode, ExecOutcome, Terminal3270};
use tn3270r::protocol_common::ebcdic::ebcdic_to_string;
use tn3270r::StreamLogger;

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.is_empty() || digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect()
}

fn load_capture(path: &str) -> Result<Vec<u8>> {
    let raw = fs::read(path).with_context(|| format!("reading capture {path}"))?;
    let bytes = match std::str::from_utf8(&raw).ok().and_then(decode_hex) {
        Some(decoded) => decoded,
        None => raw,
    };
    if bytes.windows(2).any(|w| w == [IAC, EOR]) {
        Ok(bytes)
    } else {
        Ok(frame_record(&bytes))
    }
}

fn describe_write_data(data: &[u8]) {
    let Some((&wcc, rest)) = data.split_first() else {
        println!("   (no WCC)");
        return;
    };
    println!("   WCC 0x{wcc:02X}");
    for item in parse_stream(rest) {
        match item {
            StreamItem::Order(order) => println!("   {:?} {:02X?}", order.code, order.data),
            StreamItem::Text(text) => println!("   text {:?}", ebcdic_to_string(&text)),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(capture) = args.next() else {
        bail!("usage: analyze_3270_stream <capture> [config.json]");
    };
    let config = match args.next() {
        Some(path) => EngineConfig::load(Path::new(&path)).with_context(|| format!("loading config {path}"))?,
        None => EngineConfig::load_or_default(),
    };

    let stream = load_capture(&capture)?;
    println!("3270 data stream analysis: {} bytes", stream.len());

    let mut terminal = Terminal3270::new(&config)?;
    let mut logger = StreamLogger::from_config(&config.logging)?;
    let mut parser = StreamParser::new(stream.len().max(config.stream_buffer_capacity));
    parser.feed(&stream)?;

    let mut record = 0;
    loop {
        let command = match parser.parse_next() {
            Ok(Some(command)) => command,
            Ok(None) => break,
            Err(e) => {
                println!("\nrecord {record}: {e}");
                record += 1;
                continue;
            }
        };
        println!("\nrecord {record}: {:?} ({} data bytes)", command.code, command.data.len());
        record += 1;

        match command.code {
            CommandCode::WriteStructuredField => match parse_fields_lenient(&command.data) {
                Ok(parsed) => {
                    parsed.records.iter().for_each(|field| println!("   {field:?}"));
                    for (offset, e) in &parsed.skipped {
                        println!("   skipped at {offset}: {e}");
                    }
                }
                Err(e) => println!("   {e}"),
            },
            code if code.is_write() => describe_write_data(&command.data),
            _ => {}
        }

        match terminal.execute(&command, &mut logger) {
            Ok(ExecOutcome::Reply(reply)) => println!("   reply {reply:02X?}"),
            Ok(_) => {}
            Err(e) => println!("   execution failed: {e}"),
        }
    }
    if parser.buffered() > 0 {
        println!("\n{} trailing bytes without IAC EOR", parser.buffered());
    }

    println!("\nScreen:");
    println!("{}", terminal.screen_text());
    println!("\nFields:");
    for (index, field) in terminal.fields().fields().iter().enumerate() {
        println!(
            "   #{index} start {} length {} attr 0x{:02X}",
            field.start_address,
            field.length,
            field.attribute.to_byte()
        );
    }
    Ok(())
}
