//! Rate Limiter Module
//!
//! Token-bucket limit on new supply. The buffer starts full, drains as the
//! engine mints and refills linearly with elapsed time up to its cap.
//!
//! ```text
//! buffer(now) = min(cap, stored + rate * (now - last_used))
//! ```
//!
//! Replenishment is closed-form, so reading or syncing the buffer is O(1)
//! regardless of how much time has passed. A clock reading earlier than the
//! last update counts as zero elapsed time.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{PegError, PegResult};
use crate::types::ParamUpdate;

// ============================================================================
// Types
// ============================================================================

/// Rate-limited minting buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RateLimitedBuffer {
    /// Upper bound on the rate, fixed at construction
    max_rate_limit_per_second: u128,
    /// Replenishment per second
    rate_limit_per_second: u128,
    /// Maximum buffer
    buffer_cap: u128,
    /// Buffer as of `last_buffer_used_time`
    buffer_stored: u128,
    /// Timestamp of the last sync
    last_buffer_used_time: u64,
    /// Consume whatever is left instead of failing on a short buffer
    allow_partial: bool,
}

impl RateLimitedBuffer {
    /// Create a full buffer
    ///
    /// # Errors
    /// * `InvalidParameter` if `rate_limit_per_second > max_rate_limit_per_second`
    pub fn new(
        max_rate_limit_per_second: u128,
        rate_limit_per_second: u128,
        buffer_cap: u128,
        now: u64,
        allow_partial: bool,
    ) -> PegResult<Self> {
        if rate_limit_per_second > max_rate_limit_per_second {
            return Err(PegError::InvalidParameter {
                param: "rate_limit_per_second",
                reason: "exceeds max rate limit",
            });
        }

        Ok(Self {
            max_rate_limit_per_second,
            rate_limit_per_second,
            buffer_cap,
            buffer_stored: buffer_cap,
            last_buffer_used_time: now,
            allow_partial,
        })
    }

    pub fn buffer_cap(&self) -> u128 {
        self.buffer_cap
    }

    pub fn rate_limit_per_second(&self) -> u128 {
        self.rate_limit_per_second
    }

    pub fn max_rate_limit_per_second(&self) -> u128 {
        self.max_rate_limit_per_second
    }

    pub fn last_buffer_used_time(&self) -> u64 {
        self.last_buffer_used_time
    }

    pub fn allow_partial(&self) -> bool {
        self.allow_partial
    }

    /// Amount that can be consumed at `now`
    pub fn buffer(&self, now: u64) -> u128 {
        let elapsed = now.saturating_sub(self.last_buffer_used_time) as u128;
        let refill = self.rate_limit_per_second.saturating_mul(elapsed);
        self.buffer_stored.saturating_add(refill).min(self.buffer_cap)
    }

    /// Persist the replenished buffer and move the clock forward
    pub fn sync(&mut self, now: u64) {
        let buffer = self.buffer(now);
        self.buffer_stored = buffer;
        self.last_buffer_used_time = self.last_buffer_used_time.max(now);
        debug!(buffer, now, "rate limit buffer synced");
    }

    /// Draw `amount` from the buffer
    ///
    /// Returns the amount actually consumed. In partial mode a short buffer
    /// is drained instead of failing.
    ///
    /// # Errors
    /// * `RateLimitExceeded` if `amount` exceeds the buffer and partial mode
    ///   is off; nothing is consumed
    pub fn consume(&mut self, amount: u128, now: u64) -> PegResult<u128> {
        self.sync(now);
        let available = self.buffer_stored;

        let used = if amount <= available {
            amount
        } else if self.allow_partial {
            available
        } else {
            warn!(requested = amount, available, "rate limit exceeded");
            return Err(PegError::RateLimitExceeded {
                requested: amount,
                available,
            });
        };

        self.buffer_stored = available - used;
        Ok(used)
    }

    /// Return `amount` of capacity, capped at `buffer_cap`
    ///
    /// Returns the new buffer.
    pub fn replenish(&mut self, amount: u128, now: u64) -> u128 {
        self.sync(now);
        self.buffer_stored = self.buffer_stored.saturating_add(amount).min(self.buffer_cap);
        self.buffer_stored
    }

    /// Change the cap; an existing buffer above the new cap is clamped
    pub fn set_buffer_cap(&mut self, new_cap: u128, now: u64) -> ParamUpdate<u128> {
        self.sync(now);
        let old = self.buffer_cap;
        self.buffer_cap = new_cap;
        self.buffer_stored = self.buffer_stored.min(new_cap);
        ParamUpdate::new(old, new_cap)
    }

    /// Change the replenishment rate
    ///
    /// Time elapsed so far is credited at the old rate.
    ///
    /// # Errors
    /// * `InvalidParameter` if `new_rate > max_rate_limit_per_second`
    pub fn set_rate_limit_per_second(&mut self, new_rate: u128, now: u64) -> PegResult<ParamUpdate<u128>> {
        if new_rate > self.max_rate_limit_per_second {
            return Err(PegError::InvalidParameter {
                param: "rate_limit_per_second",
                reason: "exceeds max rate limit",
            });
        }
        self.sync(now);
        let old = self.rate_limit_per_second;
        self.rate_limit_per_second = new_rate;
        Ok(ParamUpdate::new(old, new_rate))
    }
}

// ============================================================================
// Tests
// ============================================================================
