//! Multi-step send and single-step delete over a [`Transport`].
//!
//! Sending is a small state machine driven only by settle delays:
//!
//! ```text
//! Idle --AT+CMGS--> AwaitingPrompt --body\r--> BodySent --SUB--> Terminated
//! ```
//!
//! If a write fails once the compose command is out, ESC is written so the
//! modem drops back to command mode instead of waiting for a body.

use log::{debug, info, warn};
use tokio::time::sleep;

use super::commands::{encode_body, AtCommand, ESC, SUB};
use super::transport::{Transport, TransportError};
use crate::config::TimingConfig;
use crate::logutil::{escape_bytes, mask_number};
use crate::validation::{validate_message_id, validate_recipient, MessageIdError, RecipientError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    /// Nothing written yet.
    Idle,
    /// `AT+CMGS` written; modem should be showing its `>` prompt.
    AwaitingPrompt,
    /// Body written; waiting to terminate.
    BodySent,
    /// SUB written; the modem owns the message now.
    Terminated,
}

impl SendState {
    /// True while the modem is in body-input mode.
    pub fn is_composing(self) -> bool {
        matches!(self, SendState::AwaitingPrompt | SendState::BodySent)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("refusing to send to {recipient}: {source}")]
    InvalidRecipient {
        recipient: String,
        #[source]
        source: RecipientError,
    },

    #[error("send failed in state {state:?}: {source}")]
    Transport {
        state: SendState,
        #[source]
        source: TransportError,
    },
}

impl SendError {
    pub fn is_closed(&self) -> bool {
        matches!(self, SendError::Transport { source, .. } if source.is_closed())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("cannot delete: {0}")]
    InvalidId(#[from] MessageIdError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DeleteError {
    pub fn is_closed(&self) -> bool {
        matches!(self, DeleteError::Transport(e) if e.is_closed())
    }
}

/// What the modem printed after a send, when verification is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendAck {
    /// `+CMGS: <mr>` seen; carries the message reference when it parsed.
    Accepted(Option<u32>),
    /// `ERROR` or `+CMS ERROR` seen.
    Rejected(String),
    /// Neither; the modem may still be working on it.
    Unknown,
}

/// Classify modem output read back after the completion wait.
pub fn classify_send_response(output: &str) -> SendAck {
    if let Some(pos) = output.find("+CMGS:") {
        let reference = output[pos + "+CMGS:".len()..]
            .trim_start()
            .split(|c: char| !c.is_ascii_digit())
            .next()
            .and_then(|digits| digits.parse().ok());
        return SendAck::Accepted(reference);
    }
    if let Some(line) = output.lines().find(|l| l.contains("ERROR")) {
        return SendAck::Rejected(line.trim().to_string());
    }
    SendAck::Unknown
}

struct SendSequence<'t, T: Transport + ?Sized> {
    transport: &'t mut T,
    state: SendState,
}

impl<'t, T: Transport + ?Sized> SendSequence<'t, T> {
    fn new(transport: &'t mut T) -> Self {
        Self {
            transport,
            state: SendState::Idle,
        }
    }

    fn step(&mut self, bytes: &[u8], next: SendState) -> Result<(), SendError> {
        match self.transport.write_command(bytes) {
            Ok(()) => {
                self.state = next;
                Ok(())
            }
            Err(source) => {
                let state = self.state;
                if state.is_composing() {
                    self.abort();
                }
                Err(SendError::Transport { state, source })
            }
        }
    }

    fn abort(&mut self) {
        match self.transport.write_command(&[ESC]) {
            Ok(()) => debug!("Aborted SMS compose in state {:?}", self.state),
            Err(e) => warn!("Failed to abort SMS compose in state {:?}: {}", self.state, e),
        }
    }
}

/// Send `text` to `recipient`: compose, settle, body, settle, SUB, wait.
///
/// Success means every step was written; delivery is not confirmed unless
/// `verify` is set, and even then the result is only logged.
pub async fn send_sms<T: Transport + ?Sized>(
    transport: &mut T,
    timing: &TimingConfig,
    recipient: &str,
    text: &str,
    verify: bool,
) -> Result<(), SendError> {
    validate_recipient(recipient).map_err(|source| SendError::InvalidRecipient {
        recipient: mask_number(recipient),
        source,
    })?;

    let mut seq = SendSequence::new(transport);
    seq.step(&AtCommand::Compose { recipient }.encode(), SendState::AwaitingPrompt)?;
    sleep(timing.send_settle()).await;
    seq.step(&encode_body(text), SendState::BodySent)?;
    sleep(timing.send_settle()).await;
    seq.step(&[SUB], SendState::Terminated)?;
    sleep(timing.send_complete()).await;

    if verify {
        match seq.transport.read_all() {
            Ok(bytes) => {
                let output = String::from_utf8_lossy(&bytes);
                match classify_send_response(&output) {
                    SendAck::Accepted(reference) => {
                        info!("Modem accepted SMS to {} (ref {:?})", mask_number(recipient), reference)
                    }
                    SendAck::Rejected(line) => {
                        warn!("Modem rejected SMS to {}: {}", mask_number(recipient), line)
                    }
                    SendAck::Unknown => {
                        debug!("No send confirmation yet: {}", escape_bytes(&bytes))
                    }
                }
            }
            Err(e) => warn!("Could not read send confirmation: {}", e),
        }
    }
    Ok(())
}

/// Delete the message stored at `id`. No confirmation is read.
pub fn delete_sms<T: Transport + ?Sized>(transport: &mut T, id: &str) -> Result<(), DeleteError> {
    validate_message_id(id)?;
    transport.write_command(&AtCommand::Delete { id }.encode())?;
    debug!("Deleted message {}", id);
    Ok(())
}
