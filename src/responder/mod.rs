//! # Poll Loop
//!
//! [`Responder`] owns the modem connection and a forecast provider and runs
//! the poll/process cycle:
//!
//! ```text
//!          +---------- idle_poll (nothing unread) ----------+
//!          v                                                |
//!      Polling --records--> Processing --all handled--> Polling
//!          ^                    |
//!          +--error_cooldown----+  (any listing, send or delete failure)
//! ```
//!
//! Each record is replied to, given `per_message` time, and deleted. Deletion
//! happens whether or not the reply went out, so a reply that failed to send
//! is lost.

use log::{debug, error, info, warn};
use tokio::time::sleep;

use crate::logutil::{escape_log, mask_number};
use crate::metrics;
use crate::modem::{listing, MessageRecord, Modem, Transport, TransportError};
use crate::reply::{self, ReplyDecision, HELP_TEXT};
use crate::validation::{validate_message_id, validate_recipient};
use crate::weather::{ForecastProvider, FORMAT_FAILURE};

/// What happened to one pass over the unread listing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    /// Records parsed from the listing.
    pub listed: usize,
    /// Listing segments dropped as malformed.
    pub skipped: usize,
    pub replied: usize,
    /// Records deliberately not answered (unusable sender or id).
    pub ignored: usize,
    pub send_failures: usize,
    pub delete_failures: usize,
}

impl PassReport {
    pub fn has_failures(&self) -> bool {
        self.send_failures > 0 || self.delete_failures > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Sent,
    Failed,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    Deleted,
    Failed,
    /// The listing id cannot be used in a delete command.
    NotAttempted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageOutcome {
    pub reply: ReplyStatus,
    pub delete: DeleteStatus,
}

pub struct Responder<T: Transport, F: ForecastProvider> {
    modem: Modem<T>,
    forecast: F,
}

impl<T: Transport, F: ForecastProvider> Responder<T, F> {
    pub fn new(modem: Modem<T>, forecast: F) -> Self {
        Self { modem, forecast }
    }

    pub fn modem(&self) -> &Modem<T> {
        &self.modem
    }

    pub fn modem_mut(&mut self) -> &mut Modem<T> {
        &mut self.modem
    }

    pub fn forecast(&self) -> &F {
        &self.forecast
    }

    /// Poll until the connection closes. Every other failure is logged and
    /// followed by the error cooldown.
    pub async fn run(&mut self) {
        info!("Polling for unread SMS");
        loop {
            match self.poll_once().await {
                Ok(report) if report.has_failures() => {
                    metrics::inc_failed_passes();
                    warn!(
                        "Pass finished with {} send and {} delete failure(s); cooling down {:?}",
                        report.send_failures,
                        report.delete_failures,
                        self.modem.timing().error_cooldown()
                    );
                    sleep(self.modem.timing().error_cooldown()).await;
                }
                Ok(report) if report.listed == 0 => {
                    sleep(self.modem.timing().idle_poll()).await;
                }
                Ok(report) => {
                    debug!("Pass complete: {:?}", report);
                }
                Err(TransportError::Closed) => {
                    info!("Modem connection closed; poll loop stopping");
                    return;
                }
                Err(e) => {
                    metrics::inc_failed_passes();
                    error!(
                        "Poll pass failed: {}; cooling down {:?}",
                        e,
                        self.modem.timing().error_cooldown()
                    );
                    sleep(self.modem.timing().error_cooldown()).await;
                }
            }
        }
    }

    /// List unread messages and handle each in order.
    ///
    /// Per-message failures are counted in the report; only a listing failure
    /// or a closed connection is returned as an error.
    pub async fn poll_once(&mut self) -> Result<PassReport, TransportError> {
        debug!("Checking for SMS");
        metrics::inc_polls();
        let raw = self.modem.list_unread()?;

        let mut report = PassReport::default();
        let mut records = Vec::new();
        for entry in listing::parse_listing_entries(&raw) {
            match entry {
                Ok(record) => records.push(record),
                Err(reason) => {
                    report.skipped += 1;
                    debug!("Dropped listing segment: {}", reason);
                }
            }
        }
        report.listed = records.len();
        metrics::add_messages_received(report.listed as u64);
        metrics::add_segments_skipped(report.skipped as u64);

        for record in &records {
            let outcome = self.handle_message(record).await?;
            match outcome.reply {
                ReplyStatus::Sent => report.replied += 1,
                ReplyStatus::Failed => report.send_failures += 1,
                ReplyStatus::Ignored => report.ignored += 1,
            }
            if outcome.delete == DeleteStatus::Failed {
                report.delete_failures += 1;
            }
        }
        Ok(report)
    }

    /// Reply to one message, wait `per_message`, then delete it.
    ///
    /// Returns an error only when the connection is closed.
    pub async fn handle_message(
        &mut self,
        record: &MessageRecord,
    ) -> Result<MessageOutcome, TransportError> {
        info!(
            "Received unread message {} from {}",
            record.id,
            mask_number(&record.sender)
        );
        debug!("Message content: {}", escape_log(&record.body));

        if let Err(e) = validate_message_id(&record.id) {
            warn!("Skipping message from {}: {}", mask_number(&record.sender), e);
            return Ok(MessageOutcome {
                reply: ReplyStatus::Ignored,
                delete: DeleteStatus::NotAttempted,
            });
        }

        let reply = match validate_recipient(&record.sender) {
            Err(e) => {
                warn!(
                    "Not replying to message {} from {}: {}",
                    record.id,
                    escape_log(&record.sender),
                    e
                );
                ReplyStatus::Ignored
            }
            Ok(()) => {
                let text = self.compose_reply(&record.body).await;
                let status = match self.modem.send(&record.sender, &text).await {
                    Ok(()) => {
                        metrics::inc_replies_sent();
                        info!("Response sent to {}", mask_number(&record.sender));
                        ReplyStatus::Sent
                    }
                    Err(e) if e.is_closed() => return Err(TransportError::Closed),
                    Err(e) => {
                        metrics::inc_send_failures();
                        error!(
                            "Reply to message {} from {} failed: {}",
                            record.id,
                            mask_number(&record.sender),
                            e
                        );
                        ReplyStatus::Failed
                    }
                };
                sleep(self.modem.timing().per_message()).await;
                status
            }
        };

        let delete = match self.modem.delete(&record.id) {
            Ok(()) => {
                metrics::inc_deletes();
                DeleteStatus::Deleted
            }
            Err(e) if e.is_closed() => return Err(TransportError::Closed),
            Err(e) => {
                metrics::inc_delete_failures();
                error!(
                    "Delete of message {} from {} failed: {}",
                    record.id,
                    mask_number(&record.sender),
                    e
                );
                DeleteStatus::Failed
            }
        };

        Ok(MessageOutcome { reply, delete })
    }

    /// Reply text for a message body.
    pub async fn compose_reply(&mut self, body: &str) -> String {
        match reply::decide(body) {
            ReplyDecision::WeatherReport { lat, lon } => {
                let text = self.forecast.format_forecast(&lat, &lon).await;
                if text == FORMAT_FAILURE {
                    metrics::inc_weather_failures();
                }
                text
            }
            ReplyDecision::HelpText => HELP_TEXT.to_string(),
        }
    }
}
