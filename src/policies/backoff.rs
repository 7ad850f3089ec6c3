//! # Restart back-off.
//!
//! [`BackoffPolicy`] computes the pause between a failed `start()` and the next one.
//! The base pause after `n` consecutive failures (0-indexed) is `first × factor^n`,
//! clamped to `max`, then jittered. The base is derived from the failure count alone,
//! so jitter never compounds across attempts.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use panelvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(250),
//!     max: Duration::from_secs(2),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(250));
//! assert_eq!(backoff.next(2), Duration::from_secs(1));
//! assert_eq!(backoff.next(9), Duration::from_secs(2));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::millis;
use crate::policies::jitter::JitterPolicy;

/// Restart back-off policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Pause after the first failure.
    #[serde(rename = "first_ms", with = "millis")]
    pub first: Duration,
    /// Upper bound of the pause.
    #[serde(rename = "max_ms", with = "millis")]
    pub max: Duration,
    /// Growth per consecutive failure (`1.0` = constant).
    pub factor: f64,
    /// Randomization applied to the clamped pause.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// A constant one-second pause: enough to keep a crashing component
    /// from spinning, short enough that its display slot recovers quickly.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Constant pause of `delay`, no jitter.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Computes the pause after `failures + 1` consecutive failures.
    ///
    /// Overflowing or non-finite intermediate values clamp to [`BackoffPolicy::max`].
    pub fn next(&self, failures: u32) -> Duration {
        let exp = i32::try_from(failures).unwrap_or(i32::MAX);
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if secs.is_finite() && secs >= 0.0 && secs <= self.max.as_secs_f64() {
            Duration::from_secs_f64(secs)
        } else {
            self.max
        };
        self.jitter.apply(base)
    }
}
