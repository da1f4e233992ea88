//! AT command encoding for text-mode SMS.
//!
//! Every command line ends with a bare carriage return. The SMS body that
//! follows `AT+CMGS` is terminated with SUB (Ctrl-Z); ESC abandons it.

use std::fmt;

/// Command line terminator.
pub const LINE_END: &[u8] = b"\r";
/// Ctrl-Z: end of SMS body, submit.
pub const SUB: u8 = 0x1A;
/// Abort an SMS body without sending.
pub const ESC: u8 = 0x1B;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtCommand<'a> {
    /// `ATZ`
    Reset,
    /// `AT+CMGF=1`
    TextMode,
    /// `AT+CMGL="REC UNREAD"`
    ListUnread,
    /// `AT+CMGS="<number>"`
    Compose { recipient: &'a str },
    /// `AT+CMGD=<id>`
    Delete { id: &'a str },
}

impl AtCommand<'_> {
    /// Bytes to put on the wire, terminator included.
    pub fn encode(&self) -> Vec<u8> {
        let mut line = self.to_string().into_bytes();
        line.extend_from_slice(LINE_END);
        line
    }
}

impl fmt::Display for AtCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtCommand::Reset => f.write_str("ATZ"),
            AtCommand::TextMode => f.write_str("AT+CMGF=1"),
            AtCommand::ListUnread => f.write_str("AT+CMGL=\"REC UNREAD\""),
            AtCommand::Compose { recipient } => write!(f, "AT+CMGS=\"{}\"", recipient),
            AtCommand::Delete { id } => write!(f, "AT+CMGD={}", id),
        }
    }
}

/// SMS body line as written after the compose prompt.
pub fn encode_body(text: &str) -> Vec<u8> {
    let mut line = text.as_bytes().to_vec();
    line.extend_from_slice(LINE_END);
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_byte_exact_commands() {
        assert_eq!(AtCommand::Reset.encode(), b"ATZ\r");
        assert_eq!(AtCommand::TextMode.encode(), b"AT+CMGF=1\r");
        assert_eq!(AtCommand::ListUnread.encode(), b"AT+CMGL=\"REC UNREAD\"\r");
        assert_eq!(
            AtCommand::Compose {
                recipient: "+64211234567"
            }
            .encode(),
            b"AT+CMGS=\"+64211234567\"\r"
        );
        assert_eq!(AtCommand::Delete { id: "3" }.encode(), b"AT+CMGD=3\r");
    }

    #[test]
    fn body_gets_carriage_return() {
        assert_eq!(encode_body("hi"), b"hi\r");
        assert_eq!(encode_body(""), b"\r");
    }
}
