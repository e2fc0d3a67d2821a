//! Time source abstraction.
//!
//! Every expiry decision in the engine (token `exp`, key-set TTL, detail
//! snapshot TTL) reads "now" through a [`TimeSource`], so production code uses
//! the wall clock while tests move time explicitly.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Abstraction over the current instant.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real time source backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `now + ttl_seconds`, saturating at the latest representable instant.
pub fn expires_after(now: DateTime<Utc>, ttl_seconds: u64) -> DateTime<Utc> {
    i64::try_from(ttl_seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Manually driven time source for deterministic tests.
///
/// Resolution is whole seconds, matching the `exp` claim granularity.
/// Interior mutability is atomic so the source can be shared through an
/// `Arc` between the verifier and the session.
#[derive(Debug)]
pub struct ManualTimeSource {
    unix_seconds: AtomicI64,
}

impl ManualTimeSource {
    pub fn new(unix_seconds: i64) -> Self {
        Self {
            unix_seconds: AtomicI64::new(unix_seconds),
        }
    }

    /// Start at a fixed instant in late 2023.
    pub fn default_start() -> Self {
        Self::new(1_700_000_000)
    }

    pub fn advance(&self, by: Duration) {
        self.unix_seconds.fetch_add(by.num_seconds(), Ordering::SeqCst);
    }

    pub fn set(&self, unix_seconds: i64) {
        self.unix_seconds.store(unix_seconds, Ordering::SeqCst);
    }

    pub fn unix_seconds(&self) -> i64 {
        self.unix_seconds.load(Ordering::SeqCst)
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        // Out-of-range values collapse to the epoch rather than panicking.
        Utc.timestamp_opt(self.unix_seconds(), 0)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}
