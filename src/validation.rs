//! Validation of values that get spliced into AT command lines.
//!
//! Sender numbers come straight off the air. A number carrying a quote or a
//! carriage return would terminate `AT+CMGS="…"` early and let the rest of the
//! string run as a modem command, so both the recipient and the listing id are
//! checked before any command is built from them.

/// Longest dialable number accepted (E.164 allows 15 digits plus `+`; some
/// networks report longer service numbers).
pub const MAX_RECIPIENT_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipientError {
    #[error("Recipient number is empty")]
    Empty,

    #[error("Recipient number is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Recipient number contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },

    #[error("Recipient number has no digits")]
    NoDigits,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageIdError {
    #[error("Message id is empty")]
    Empty,

    #[error("Message id is not a storage index: {0}")]
    NotNumeric(String),
}

/// Check a sender number before it is used as an `AT+CMGS` recipient.
///
/// Allowed: a single leading `+`, digits, and the `*` / `#` used by service
/// short codes.
pub fn validate_recipient(number: &str) -> Result<(), RecipientError> {
    if number.is_empty() {
        return Err(RecipientError::Empty);
    }
    if number.chars().count() > MAX_RECIPIENT_LEN {
        return Err(RecipientError::TooLong {
            max: MAX_RECIPIENT_LEN,
        });
    }

    let invalid: String = number
        .char_indices()
        .filter(|&(i, c)| !(c.is_ascii_digit() || c == '*' || c == '#' || (c == '+' && i == 0)))
        .map(|(_, c)| c)
        .collect();
    if !invalid.is_empty() {
        return Err(RecipientError::InvalidCharacters {
            chars: crate::logutil::escape_log(&invalid),
        });
    }

    if !number.chars().any(|c| c.is_ascii_digit()) {
        return Err(RecipientError::NoDigits);
    }
    Ok(())
}

/// Check a listing id before it is used in `AT+CMGD=<id>`.
pub fn validate_message_id(id: &str) -> Result<(), MessageIdError> {
    if id.is_empty() {
        return Err(MessageIdError::Empty);
    }
    if !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(MessageIdError::NotNumeric(crate::logutil::escape_log(id)));
    }
    Ok(())
}
