//! Response classification and randomized backoff
//!
//! [`classify`] is the single decision table the export loop branches on.
//! [`Backoff`] computes binary exponential backoff with jitter: after `a`
//! attempts the delay is a uniformly random number of slots in
//! `[0, 2^a - 1]`, with `a` optionally capped.

use crate::config::ExportConfig;
use crate::domain::{LappsError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// How the export loop should react to a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// 200: parse the page
    Success,
    /// 401: drop the token and retry at once
    AuthExpired,
    /// 429 or 5xx: back off, then retry the same request
    Retryable,
    /// Anything else: abort the run
    Fatal,
}

/// Map an HTTP status code of the export endpoint to a [`Classification`]
///
/// ```
/// use lapps_export::core::retry::{classify, Classification};
///
/// assert_eq!(classify(200), Classification::Success);
/// assert_eq!(classify(401), Classification::AuthExpired);
/// assert_eq!(classify(429), Classification::Retryable);
/// assert_eq!(classify(503), Classification::Retryable);
/// assert_eq!(classify(404), Classification::Fatal);
/// ```
pub fn classify(status: u16) -> Classification {
    match status {
        200 => Classification::Success,
        401 => Classification::AuthExpired,
        429 => Classification::Retryable,
        s if s >= 500 => Classification::Retryable,
        _ => Classification::Fatal,
    }
}

/// Limits of the retry loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Consecutive non-progressing attempts before giving up
    pub max_attempts: u32,

    /// Length of one backoff slot
    pub slot_time: Duration,

    /// Cap on the backoff exponent (0 = uncapped)
    pub max_slots: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            slot_time: Duration::from_millis(1420),
            max_slots: 5,
        }
    }
}

impl RetryPolicy {
    /// Build the policy from the `[export]` section
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `slot_time_secs` is not a
    /// representable duration.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        let slot_time = Duration::try_from_secs_f64(config.slot_time_secs).map_err(|e| {
            LappsError::Configuration(format!(
                "Invalid export.slot_time_secs {}: {e}",
                config.slot_time_secs
            ))
        })?;

        Ok(Self {
            max_attempts: config.max_attempts,
            slot_time,
            max_slots: config.max_slots,
        })
    }

    /// Largest delay [`Backoff::delay`] can ever return under this policy
    ///
    /// Uncapped policies are bounded by the attempt ceiling instead.
    pub fn max_delay(&self) -> Duration {
        let exponent = if self.max_slots > 0 {
            self.max_slots
        } else {
            self.max_attempts
        };
        slots_to_duration(self.slot_time, max_slot_index(exponent))
    }
}

/// Randomized exponential backoff with an injectable random source
#[derive(Debug)]
pub struct Backoff<R: Rng = StdRng> {
    slot_time: Duration,
    max_slots: u32,
    rng: R,
}

impl Backoff<StdRng> {
    /// Backoff seeded from OS entropy
    pub fn from_entropy(policy: &RetryPolicy) -> Self {
        Self::with_rng(policy, StdRng::from_entropy())
    }

    /// Deterministic backoff for tests and reproducible runs
    pub fn seeded(policy: &RetryPolicy, seed: u64) -> Self {
        Self::with_rng(policy, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Backoff<R> {
    /// Backoff drawing from the given random source
    pub fn with_rng(policy: &RetryPolicy, rng: R) -> Self {
        Self {
            slot_time: policy.slot_time,
            max_slots: policy.max_slots,
            rng,
        }
    }

    /// Delay to sleep after `attempts_so_far` failed attempts
    pub fn delay(&mut self, attempts_so_far: u32) -> Duration {
        let exponent = if self.max_slots > 0 {
            attempts_so_far.min(self.max_slots)
        } else {
            attempts_so_far
        };
        let slots = self.rng.gen_range(0..=max_slot_index(exponent));
        slots_to_duration(self.slot_time, slots)
    }
}

fn slots_to_duration(slot_time: Duration, slots: u64) -> Duration {
    u32::try_from(slots)
        .ok()
        .and_then(|s| slot_time.checked_mul(s))
        .unwrap_or(Duration::MAX)
}

/// `2^exponent - 1`, saturating for absurd exponents
fn max_slot_index(exponent: u32) -> u64 {
    1u64.checked_shl(exponent.min(63))
        .map(|v| v - 1)
        .unwrap_or(u64::MAX)
}
