//! Logging helpers that keep modem traffic and SMS bodies on a single log line.
//!
//! Raw AT responses are full of `\r\n` pairs and the occasional control byte
//! (SUB, ESC), so anything that came off the serial link goes through
//! [`escape_log`] before it reaches a log macro.

use std::fmt::Write;

/// Longest preview emitted for a single value.
const MAX_PREVIEW: usize = 300;

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
/// - other control characters => `\\xNN`
///
/// Output is capped at [`MAX_PREVIEW`] characters followed by an ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Same as [`escape_log`] for raw bytes read from the modem.
pub fn escape_bytes(bytes: &[u8]) -> String {
    escape_log(&String::from_utf8_lossy(bytes))
}

/// Mask all but the last three digits of a phone number for info-level logs.
///
/// `+64211234567` becomes `+********567`. Numbers of three characters or fewer
/// are returned unchanged.
pub fn mask_number(number: &str) -> String {
    let total = number.chars().count();
    if total <= 3 {
        return number.to_string();
    }
    number
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if i >= total - 3 || c == '+' {
                c
            } else {
                '*'
            }
        })
        .collect()
}
