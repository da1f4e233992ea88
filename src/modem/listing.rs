//! Parser for `AT+CMGL` listing responses.
//!
//! A listing looks like
//!
//! ```text
//! AT+CMGL="REC UNREAD"
//! +CMGL: 1,"REC UNREAD","+64211234567","","24/05/01,09:12:44+48"
//! -43.53,172.63
//! +CMGL: 2,"REC UNREAD","+64277654321","","24/05/01,09:13:02+48"
//! help
//!
//! OK
//! ```
//!
//! Each `+CMGL:` segment contributes one record: the header line gives the
//! storage index (field 0) and the quoted sender (field 2), the next line is
//! the body. Multi-line bodies are not reassembled; only the first body line
//! is kept.

/// Token that opens every entry in a listing.
pub const LISTING_DELIMITER: &str = "+CMGL:";

/// One unread SMS as reported by the modem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// Storage index assigned by the modem; used for `AT+CMGD`.
    pub id: String,
    pub sender: String,
    pub body: String,
}

/// Why a listing segment produced no record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("segment has {lines} line(s); need a header and a body")]
    TooFewLines { lines: usize },

    #[error("header has no message id")]
    MissingId,

    #[error("header has {fields} field(s); sender is field 3")]
    MissingSender { fields: usize },
}

/// Parse every segment, keeping the reason for the ones that were dropped.
///
/// Text before the first delimiter (command echo, leftovers of an earlier
/// response) is not a segment and is ignored.
pub fn parse_listing_entries(raw: &str) -> Vec<Result<MessageRecord, SkipReason>> {
    raw.split(LISTING_DELIMITER)
        .skip(1)
        .map(parse_segment)
        .collect()
}

/// Records in listing order; malformed segments are dropped.
pub fn parse_listing(raw: &str) -> Vec<MessageRecord> {
    parse_listing_entries(raw)
        .into_iter()
        .filter_map(Result::ok)
        .collect()
}

fn parse_segment(segment: &str) -> Result<MessageRecord, SkipReason> {
    let lines = split_lines(segment);
    if lines.len() < 2 {
        return Err(SkipReason::TooFewLines { lines: lines.len() });
    }

    let fields: Vec<&str> = lines[0].split(',').collect();
    let id = fields[0].trim();
    if id.is_empty() {
        return Err(SkipReason::MissingId);
    }
    let sender = fields
        .get(2)
        .ok_or(SkipReason::MissingSender {
            fields: fields.len(),
        })?
        .replace('"', "")
        .trim()
        .to_string();

    Ok(MessageRecord {
        id: id.to_string(),
        sender,
        body: lines[1].trim().to_string(),
    })
}

/// Split on `\r\n`, `\n` or a lone `\r`, without a trailing empty line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}
