//! Test utilities & fixtures.
//! A scripted modem transport and a canned forecast provider.

#![allow(dead_code)] // each test binary uses a different subset

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use smsweather::modem::{Transport, TransportError};
use smsweather::weather::ForecastProvider;

/// Everything that crossed the fake serial line, plus the script for replies.
#[derive(Default)]
pub struct Wire {
    /// Bytes written, with the (tokio) time of the write.
    pub writes: Vec<(Instant, Vec<u8>)>,
    /// Responses handed out by `read_all`, in order. Empty script reads as no data.
    pub reads: VecDeque<Result<String, io::ErrorKind>>,
    /// Writes starting with this prefix fail (`BrokenPipe`) while `fail_count > 0`.
    pub fail_prefix: Option<Vec<u8>>,
    pub fail_count: usize,
    /// The connection closes itself when this many listings have been requested.
    pub close_after_listings: Option<usize>,
    pub listings: usize,
    pub closed: bool,
    pub close_calls: usize,
}

impl Wire {
    pub fn written(&self) -> Vec<String> {
        self.writes
            .iter()
            .map(|(_, b)| String::from_utf8_lossy(b).into_owned())
            .collect()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.writes
            .iter()
            .filter(|(_, b)| b.starts_with(prefix.as_bytes()))
            .count()
    }

    pub fn times_of(&self, prefix: &str) -> Vec<Instant> {
        self.writes
            .iter()
            .filter(|(_, b)| b.starts_with(prefix.as_bytes()))
            .map(|(t, _)| *t)
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct ScriptedTransport {
    pub wire: Arc<Mutex<Wire>>,
}

pub const LIST_UNREAD: &str = "AT+CMGL=\"REC UNREAD\"";

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue listing responses and close once they have all been served.
    pub fn with_listings<S: AsRef<str>>(listings: &[S]) -> Self {
        let transport = Self::new();
        {
            let mut wire = transport.wire.lock().unwrap();
            for l in listings {
                wire.reads.push_back(Ok(l.as_ref().to_string()));
            }
            wire.close_after_listings = Some(listings.len());
        }
        transport
    }

    pub fn fail_writes(&self, prefix: &str, count: usize) {
        let mut wire = self.wire.lock().unwrap();
        wire.fail_prefix = Some(prefix.as_bytes().to_vec());
        wire.fail_count = count;
    }

    pub fn push_read(&self, read: Result<&str, io::ErrorKind>) {
        self.wire
            .lock()
            .unwrap()
            .reads
            .push_back(read.map(str::to_string));
    }
}

impl Transport for ScriptedTransport {
    fn write_command(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut wire = self.wire.lock().unwrap();
        if wire.closed {
            return Err(TransportError::Closed);
        }
        if bytes.starts_with(LIST_UNREAD.as_bytes()) {
            if Some(wire.listings) == wire.close_after_listings {
                wire.closed = true;
                return Err(TransportError::Closed);
            }
            wire.listings += 1;
        }
        let failing = wire.fail_count > 0
            && wire
                .fail_prefix
                .as_ref()
                .map(|p| bytes.starts_with(p))
                .unwrap_or(false);
        if failing {
            wire.fail_count -= 1;
            return Err(TransportError::Io(io::ErrorKind::BrokenPipe.into()));
        }
        wire.writes.push((Instant::now(), bytes.to_vec()));
        Ok(())
    }

    fn read_all(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut wire = self.wire.lock().unwrap();
        if wire.closed {
            return Err(TransportError::Closed);
        }
        match wire.reads.pop_front() {
            Some(Ok(text)) => Ok(text.into_bytes()),
            Some(Err(kind)) => Err(TransportError::Io(kind.into())),
            None => Ok(Vec::new()),
        }
    }

    fn close(&mut self) {
        let mut wire = self.wire.lock().unwrap();
        wire.closed = true;
        wire.close_calls += 1;
    }

    fn is_open(&self) -> bool {
        !self.wire.lock().unwrap().closed
    }
}

/// Forecast provider returning fixed text and remembering what it was asked.
#[derive(Default)]
pub struct CannedForecast {
    pub text: String,
    pub requests: Vec<(String, String)>,
}

impl CannedForecast {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            requests: Vec::new(),
        }
    }
}

impl ForecastProvider for CannedForecast {
    async fn format_forecast(&mut self, lat: &str, lon: &str) -> String {
        self.requests.push((lat.to_string(), lon.to_string()));
        self.text.clone()
    }
}

/// A `+CMGL:` entry as a SIM800-class modem prints it.
pub fn entry(id: u32, sender: &str, body: &str) -> String {
    format!(
        "+CMGL: {},\"REC UNREAD\",\"{}\",\"\",\"24/05/01,09:12:44+48\"\r\n{}\r\n",
        id, sender, body
    )
}

/// Full listing response: echo, entries, trailing OK.
pub fn listing(entries: &[String]) -> String {
    let mut out = String::from("AT+CMGL=\"REC UNREAD\"\r\r\n");
    for e in entries {
        out.push_str(e);
    }
    out.push_str("\r\nOK\r\n");
    out
}
