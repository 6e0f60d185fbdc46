//! Single-use login nonces
//!
//! Nonces live in two generations. New nonces go into `active`; every
//! `rotate_after` seconds the whole `active` map is demoted to `aging` and
//! the previous `aging` map is dropped. Expiry therefore costs O(1) no
//! matter how many nonces are outstanding, and a nonce never survives more
//! than `expire_after + rotate_after` seconds.
//!
//! The two maps sit in fixed slots and an epoch counter says which slot is
//! active, so issuing and consuming only touch the concurrent maps. The
//! rotation mutex is taken solely to demote a generation.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::SecondsFormat;
use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;

use super::clock::{Clock, SystemClock};
use super::crypto::keccak256;
use super::error::AuthError;

/// Default validity window of a fresh nonce, in seconds
pub const DEFAULT_EXPIRE_SECONDS: i64 = 30;

/// Default interval between generation rotations, in seconds
pub const DEFAULT_ROTATE_SECONDS: i64 = 60;

/// Nonce value -> absolute expiry (unix seconds)
type Generation = DashMap<String, i64>;

/// Issues and consumes single-use nonces
pub struct NonceStore {
    /// `generations[epoch % 2]` is active, the other slot is aging
    generations: [Generation; 2],
    epoch: AtomicUsize,
    rotated_at: AtomicI64,
    rotation: Mutex<()>,
    expire_after: i64,
    rotate_after: i64,
    clock: Arc<dyn Clock>,
}

impl NonceStore {
    /// Create a store backed by the wall clock
    pub fn new(expire_after: i64, rotate_after: i64) -> Self {
        Self::with_clock(expire_after, rotate_after, Arc::new(SystemClock))
    }

    pub fn with_clock(expire_after: i64, rotate_after: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            generations: [DashMap::new(), DashMap::new()],
            epoch: AtomicUsize::new(0),
            rotated_at: AtomicI64::new(clock.unix()),
            rotation: Mutex::new(()),
            expire_after,
            rotate_after,
            clock,
        }
    }

    /// Generate a new nonce valid for `expire_after` seconds
    ///
    /// # Returns
    /// * `Ok(nonce)` - 64 lowercase hex characters
    /// * `Err(AuthError::RandomnessFailure)` if the OS RNG is unavailable
    pub fn generate(&self) -> Result<String, AuthError> {
        self.rotate_if_due();

        let mut random = [0u8; 16];
        OsRng.try_fill_bytes(&mut random).map_err(|e| {
            tracing::error!(error = %e, "OS randomness unavailable, cannot issue nonce");
            AuthError::RandomnessFailure
        })?;

        let now = self.clock.now();
        let mut seed = random.to_vec();
        seed.extend_from_slice(now.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
        let nonce = hex::encode(keccak256(&seed));

        let expires_at = now.timestamp().saturating_add(self.expire_after);
        self.active().insert(nonce.clone(), expires_at);

        Ok(nonce)
    }

    /// Consume `nonce`, returning whether it was issued here, unused and unexpired.
    ///
    /// A nonce is removed on first presentation even when it turns out to be
    /// expired, so any second presentation fails.
    pub fn verify(&self, nonce: &str) -> bool {
        if nonce.is_empty() {
            return false;
        }

        self.rotate_if_due();
        let now = self.clock.unix();

        // A nonce sits in exactly one slot, and `remove` hands it to one caller
        let removed = self
            .active()
            .remove(nonce)
            .or_else(|| self.aging().remove(nonce));

        match removed {
            Some((_, expires_at)) => now < expires_at,
            None => false,
        }
    }

    /// Outstanding nonce counts as (active, aging)
    pub fn len(&self) -> (usize, usize) {
        (self.active().len(), self.aging().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == (0, 0)
    }

    fn active(&self) -> &Generation {
        &self.generations[self.epoch.load(Ordering::Acquire) % 2]
    }

    fn aging(&self) -> &Generation {
        &self.generations[(self.epoch.load(Ordering::Acquire) + 1) % 2]
    }

    fn rotate_if_due(&self) {
        let now = self.clock.unix();
        if now - self.rotated_at.load(Ordering::Acquire) < self.rotate_after {
            return;
        }

        let _guard = self.rotation.lock().unwrap_or_else(PoisonError::into_inner);

        // Another caller may have rotated while we waited for the lock
        if now - self.rotated_at.load(Ordering::Acquire) < self.rotate_after {
            return;
        }

        // The aging slot is emptied and becomes the next active generation
        let epoch = self.epoch.load(Ordering::Acquire);
        let next = &self.generations[(epoch + 1) % 2];
        let discarded = next.len();
        next.clear();

        self.epoch.store(epoch.wrapping_add(1), Ordering::Release);
        self.rotated_at.store(now, Ordering::Release);

        tracing::debug!(discarded, "Rotated nonce generations");
    }
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRE_SECONDS, DEFAULT_ROTATE_SECONDS)
    }
}
