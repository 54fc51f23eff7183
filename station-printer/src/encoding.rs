//! Windows-1252 encoding utilities for the thermal printer
//!
//! The CSN-A2 class mechanism prints single-byte codepages. Ticket
//! text is Italian, so everything outside ASCII (accented vowels,
//! the degree sign) goes through Windows-1252. This module provides:
//! - Printable width of a string (in columns)
//! - Truncating/padding strings to column widths
//! - Converting UTF-8 to Windows-1252 while preserving escape commands

/// Get the printed column width of a string
///
/// Every Windows-1252 byte occupies one column on the printer.
/// Characters the codepage cannot represent still take one column
/// (they are printed as `?`).
pub fn latin1_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to fit within a column width
pub fn truncate_latin1(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad a string to a specific column width
///
/// If the string is longer than the width, it will be truncated.
pub fn pad_latin1(s: &str, width: usize, align_right: bool) -> String {
    let current = latin1_width(s);
    if current >= width {
        return truncate_latin1(s, width);
    }
    let spaces = width - current;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

// Codepage select: ESC t 16 (WPC1252)
const SELECT_CP1252: [u8; 3] = [0x1B, 0x74, 16];

/// Convert mixed UTF-8 content (with escape commands) to Windows-1252
///
/// ASCII bytes (0x00-0x7F) pass through exactly as is, which protects
/// the escape commands from being corrupted. Only bytes >= 0x80 are
/// treated as UTF-8 sequences and re-encoded. Characters outside the
/// codepage are replaced with `?`.
///
/// The INIT command (ESC @) resets the printer's codepage selection,
/// so the codepage select is re-emitted after every INIT.
pub fn convert_to_latin1(bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len() + 8);

    // Select the codepage at the start
    result.extend_from_slice(&SELECT_CP1252);

    let mut buffer = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        // INIT command (ESC @ = 0x1B 0x40) drops the codepage selection
        if b == 0x1B && i + 1 < bytes.len() && bytes[i + 1] == 0x40 {
            flush_buffer(&mut buffer, &mut result);
            result.push(0x1B);
            result.push(0x40);
            result.extend_from_slice(&SELECT_CP1252);
            i += 2;
            continue;
        }

        if b < 128 {
            // ASCII byte (command or plain text)
            flush_buffer(&mut buffer, &mut result);
            result.push(b);
        } else {
            // Part of a UTF-8 multi-byte character
            buffer.push(b);
        }
        i += 1;
    }

    flush_buffer(&mut buffer, &mut result);
    result
}

/// Flush the pending non-ASCII bytes, re-encoding them to Windows-1252
fn flush_buffer(buffer: &mut Vec<u8>, result: &mut Vec<u8>) {
    if buffer.is_empty() {
        return;
    }

    let s = String::from_utf8_lossy(buffer);
    for c in s.chars() {
        let mut tmp = [0u8; 4];
        let (encoded, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut tmp));
        if had_errors {
            result.push(b'?');
        } else {
            result.extend_from_slice(&encoded);
        }
    }
    buffer.clear();
}
