//! Stored Entries
//!
//! A value paired with the instant after which it is logically absent.

use std::time::{Duration, Instant};

/// When an entry stops being visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Expires once the clock reaches this instant
    At(Instant),
    /// Never expires
    Never,
}

impl Expiration {
    /// Build an expiration from a TTL measured from `now`.
    ///
    /// A zero TTL means "no expiration". A TTL too large for the platform
    /// clock saturates to `Never` as well.
    pub fn from_ttl(ttl: Duration, now: Instant) -> Self {
        if ttl.is_zero() {
            return Self::Never;
        }
        now.checked_add(ttl).map(Self::At).unwrap_or(Self::Never)
    }

    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self {
            Self::At(deadline) => now >= *deadline,
            Self::Never => false,
        }
    }

    /// Remaining lifetime at `now`, `None` if the entry never expires
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        match self {
            Self::At(deadline) => Some(deadline.saturating_duration_since(now)),
            Self::Never => None,
        }
    }
}

/// Entry in the store with value and expiration
#[derive(Debug, Clone)]
pub(crate) struct Entry<V> {
    pub value: V,
    pub expiration: Expiration,
}

impl<V> Entry<V> {
    pub fn new_at(value: V, ttl: Duration, now: Instant) -> Self {
        Self {
            value,
            expiration: Expiration::from_ttl(ttl, now),
        }
    }

    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expiration.is_expired_at(now)
    }
}
