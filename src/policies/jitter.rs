//! # Jitter for restart pauses.
//!
//! Several components often crash together (a shared driver goes away, the network drops).
//! [`JitterPolicy`] spreads their restarts out.
//!
//! - [`JitterPolicy::None`]  exact pause
//! - [`JitterPolicy::Full`]  random in `[0, pause]`
//! - [`JitterPolicy::Equal`] `pause/2 + random[0, pause/2]`

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Randomization applied to a computed restart pause.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterPolicy {
    /// Use the pause as computed.
    #[default]
    None,
    /// Anywhere between zero and the pause.
    Full,
    /// Never less than half of the pause.
    Equal,
}

impl JitterPolicy {
    /// Applies the jitter to `delay`.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        if ms == 0 {
            return delay;
        }
        let mut rng = rand::rng();
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => Duration::from_millis(rng.random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                Duration::from_millis(half + rng.random_range(0..=ms - half))
            }
        }
    }
}
