//! Process-wide counters for the poll loop.
//! Read with [`snapshot`]; the binary logs a summary line on shutdown.
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static POLLS: AtomicU64 = AtomicU64::new(0);
static MESSAGES_RECEIVED: AtomicU64 = AtomicU64::new(0);
static SEGMENTS_SKIPPED: AtomicU64 = AtomicU64::new(0);
static REPLIES_SENT: AtomicU64 = AtomicU64::new(0);
static SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
static DELETES: AtomicU64 = AtomicU64::new(0);
static DELETE_FAILURES: AtomicU64 = AtomicU64::new(0);
static WEATHER_FAILURES: AtomicU64 = AtomicU64::new(0);
static FAILED_PASSES: AtomicU64 = AtomicU64::new(0);

pub fn inc_polls() {
    POLLS.fetch_add(1, Ordering::Relaxed);
}
pub fn add_messages_received(n: u64) {
    MESSAGES_RECEIVED.fetch_add(n, Ordering::Relaxed);
}
pub fn add_segments_skipped(n: u64) {
    SEGMENTS_SKIPPED.fetch_add(n, Ordering::Relaxed);
}
pub fn inc_replies_sent() {
    REPLIES_SENT.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_send_failures() {
    SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_deletes() {
    DELETES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_delete_failures() {
    DELETE_FAILURES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_weather_failures() {
    WEATHER_FAILURES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_failed_passes() {
    FAILED_PASSES.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub polls: u64,
    pub messages_received: u64,
    pub segments_skipped: u64,
    pub replies_sent: u64,
    pub send_failures: u64,
    pub deletes: u64,
    pub delete_failures: u64,
    pub weather_failures: u64,
    pub failed_passes: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        polls: POLLS.load(Ordering::Relaxed),
        messages_received: MESSAGES_RECEIVED.load(Ordering::Relaxed),
        segments_skipped: SEGMENTS_SKIPPED.load(Ordering::Relaxed),
        replies_sent: REPLIES_SENT.load(Ordering::Relaxed),
        send_failures: SEND_FAILURES.load(Ordering::Relaxed),
        deletes: DELETES.load(Ordering::Relaxed),
        delete_failures: DELETE_FAILURES.load(Ordering::Relaxed),
        weather_failures: WEATHER_FAILURES.load(Ordering::Relaxed),
        failed_passes: FAILED_PASSES.load(Ordering::Relaxed),
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "polls={} received={} skipped={} replied={} send_failures={} deleted={} delete_failures={} weather_failures={} failed_passes={}",
            self.polls,
            self.messages_received,
            self.segments_skipped,
            self.replies_sent,
            self.send_failures,
            self.deletes,
            self.delete_failures,
            self.weather_failures,
            self.failed_passes
        )
    }
}
