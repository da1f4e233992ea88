//! # Modem Module
//!
//! Text-mode SMS over an AT-command cellular modem.
//!
//! - [`transport`] - the [`Transport`] seam and the serial implementation
//! - [`commands`] - byte-exact AT command lines
//! - [`listing`] - `AT+CMGL` response parsing into [`MessageRecord`]s
//! - [`sequencer`] - compose/body/terminate send sequence and delete
//!
//! [`Modem`] ties these together around a single owned transport.
//!
//! ```rust,no_run
//! # #[cfg(feature = "serial")]
//! # {
//! use smsweather::config::TimingConfig;
//! use smsweather::modem::{listing, Modem};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut modem = Modem::open_serial("/dev/ttyS0", 115200, Duration::from_secs(1), TimingConfig::default())?;
//!     let raw = modem.list_unread()?;
//!     for record in listing::parse_listing(&raw) {
//!         modem.send(&record.sender, "Thanks!").await?;
//!         modem.delete(&record.id)?;
//!     }
//!     modem.close();
//!     Ok(())
//! }
//! # }
//! ```

pub mod commands;
pub mod listing;
pub mod sequencer;
pub mod transport;

pub use listing::{MessageRecord, SkipReason};
pub use sequencer::{DeleteError, SendAck, SendError, SendState};
pub use transport::{SerialTransport, Transport, TransportError};

use log::{debug, info, warn};
use std::time::Duration;

use crate::config::TimingConfig;
use crate::logutil::escape_bytes;
use commands::{AtCommand, ESC};

/// The single connection to the modem. Owns its transport; closing is
/// idempotent and also happens on drop.
pub struct Modem<T: Transport> {
    transport: T,
    timing: TimingConfig,
    verify_send: bool,
    compose_open: bool,
}

impl<T: Transport> Modem<T> {
    pub fn new(transport: T, timing: TimingConfig) -> Self {
        Self {
            transport,
            timing,
            verify_send: false,
            compose_open: false,
        }
    }

    /// Read back and log the modem's answer after every send.
    pub fn with_verify_send(mut self, verify: bool) -> Self {
        self.verify_send = verify;
        self
    }

    /// Reset the modem and switch it to text mode. Failures are logged only.
    pub fn initialize(&mut self) {
        for command in [AtCommand::Reset, AtCommand::TextMode] {
            match self.command(command) {
                Ok(response) => info!("{} -> {}", command, escape_bytes(&response)),
                Err(e) => warn!("Modem setup command {} failed: {}", command, e),
            }
        }
    }

    /// Write one command line and return everything read back.
    fn command(&mut self, command: AtCommand<'_>) -> Result<Vec<u8>, TransportError> {
        self.transport.write_command(&command.encode())?;
        self.transport.read_all()
    }

    /// Issue `AT+CMGL="REC UNREAD"` and return the raw listing.
    pub fn list_unread(&mut self) -> Result<String, TransportError> {
        let bytes = self.command(AtCommand::ListUnread)?;
        debug!("Listing: {}", escape_bytes(&bytes));
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send one SMS. See [`sequencer::send_sms`].
    pub async fn send(&mut self, recipient: &str, text: &str) -> Result<(), SendError> {
        // Stays set if this future is dropped mid-sequence; close() then aborts.
        self.compose_open = true;
        let result = sequencer::send_sms(
            &mut self.transport,
            &self.timing,
            recipient,
            text,
            self.verify_send,
        )
        .await;
        self.compose_open = false;
        result
    }

    /// Delete the message stored at `id`. Deleting an id twice is harmless.
    pub fn delete(&mut self, id: &str) -> Result<(), DeleteError> {
        sequencer::delete_sms(&mut self.transport, id)
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Release the connection, first cancelling an interrupted compose.
    pub fn close(&mut self) {
        if self.compose_open {
            self.compose_open = false;
            if let Err(e) = self.transport.write_command(&[ESC]) {
                warn!("Failed to abort interrupted SMS compose: {}", e);
            }
        }
        if self.transport.is_open() {
            info!("Closing modem connection");
        }
        self.transport.close();
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }
}

impl Modem<SerialTransport> {
    /// Open the serial device and run the setup commands.
    ///
    /// Only failing to open the device is an error.
    pub fn open_serial(
        port: &str,
        baud_rate: u32,
        read_timeout: Duration,
        timing: TimingConfig,
    ) -> Result<Self, TransportError> {
        let transport = SerialTransport::open(port, baud_rate, read_timeout)?;
        let mut modem = Modem::new(transport, timing);
        modem.initialize();
        Ok(modem)
    }
}

impl<T: Transport> Drop for Modem<T> {
    fn drop(&mut self) {
        self.close();
    }
}
