//! Ephemeral media store for pull-based audio delivery.
//!
//! WhatsApp fetches voice replies by URL, so synthesized audio is parked here
//! under a random token and served from `GET /media/{id}` until it expires.
//! Expired entries are swept on every `put` and `get`; the gateway may also
//! run `sweep` on a timer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use rand::Rng;
use tracing::debug;

/// Default lifetime of a cached media entry.
pub const MEDIA_TTL: Duration = Duration::from_secs(300);

/// Time source for expiry decisions. Swapped for a manual clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct MediaEntry {
    pub id: String,
    pub buffer: Vec<u8>,
    pub content_type: String,
    pub expires_at: DateTime<Utc>,
}

pub struct MediaCache {
    entries: DashMap<String, MediaEntry>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl Default for MediaCache {
    fn default() -> Self {
        Self::new(MEDIA_TTL)
    }
}

impl MediaCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(300)),
            clock,
        }
    }

    /// Store `buffer` and return the unguessable id it can be fetched by.
    pub fn put(&self, buffer: Vec<u8>, content_type: impl Into<String>) -> String {
        let now = self.clock.now();
        self.sweep_at(now);

        let content_type = content_type.into();
        let expires_at = now + self.ttl;
        loop {
            let id = new_token();
            if let Entry::Vacant(slot) = self.entries.entry(id.clone()) {
                debug!(id = %id, bytes = buffer.len(), "media cached");
                slot.insert(MediaEntry {
                    id: id.clone(),
                    buffer,
                    content_type,
                    expires_at,
                });
                return id;
            }
        }
    }

    /// Live entry for `id`, or `None` when absent or expired.
    pub fn get(&self, id: &str) -> Option<MediaEntry> {
        let now = self.clock.now();
        self.sweep_at(now);
        self.entries
            .get(id)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value().clone())
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(self.clock.now())
    }

    fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "expired media swept");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 128-bit random token, hex encoded.
fn new_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}
