use std::sync::Mutex;
use std::time::{Duration, Instant};

use models::LedgerRow;

use crate::{FetchError, LedgerSource};

pub const MIN_TTL: Duration = Duration::from_secs(60);
pub const MAX_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct Snapshot {
    fetched_at: Instant,
    rows: Vec<LedgerRow>,
}

/// Time-boxed cache in front of another source.
///
/// A snapshot is served until `ttl` has elapsed, after which the inner source is
/// asked again. Failed fetches are not cached. Callers always receive their own
/// copy of the rows, so nothing downstream can alias the cached snapshot.
pub struct CachedLedgerSource<S> {
    inner: S,
    ttl: Duration,
    snapshot: Mutex<Option<Snapshot>>,
}

impl<S: LedgerSource> CachedLedgerSource<S> {
    /// `ttl` is clamped to the 60–300 second freshness window.
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl: ttl.clamp(MIN_TTL, MAX_TTL),
            snapshot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn invalidate(&self) {
        let mut guard = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    fn fetch_at(&self, now: Instant) -> Result<Vec<LedgerRow>, FetchError> {
        let mut guard = self.snapshot.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(snap) = guard.as_ref() {
            if now.saturating_duration_since(snap.fetched_at) < self.ttl {
                tracing::debug!(source = self.inner.name(), "serving cached ledger snapshot");
                return Ok(snap.rows.clone());
            }
        }

        let rows = self.inner.fetch()?;
        *guard = Some(Snapshot {
            fetched_at: now,
            rows: rows.clone(),
        });
        Ok(rows)
    }
}

impl<S: LedgerSource> LedgerSource for CachedLedgerSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self) -> Result<Vec<LedgerRow>, FetchError> {
        self.fetch_at(Instant::now())
    }
}
