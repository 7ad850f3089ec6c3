//! # Process-wide configuration.
//!
//! [`Config`] is built once at boot, handed to [`Registry::new`](crate::Registry::new)
//! and read by components through [`Registry::config`](crate::Registry::config).
//!
//! ## JSON layout
//! ```json
//! {
//!   "supervisor": { "grace_ms": 5000, "handle_signals": true,
//!                   "backoff": { "first_ms": 1000, "max_ms": 30000, "factor": 1.0, "jitter": "none" } },
//!   "switcher":   { "services": ["clock", "weather"], "time_ms": 10000, "pause_ms": 3600000 },
//!   "weather":    { "city": "Oslo" }
//! }
//! ```
//! Every key is optional. Top-level keys other than `supervisor` and `switcher` are kept
//! verbatim as *sections* for hosted components, see [`Config::section`].

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::policies::BackoffPolicy;

/// Global configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Supervision loop settings.
    pub supervisor: SupervisorConfig,
    /// Display scheduler settings.
    pub switcher: SwitcherConfig,
    /// Remaining top-level sections, owned by hosted components.
    #[serde(flatten)]
    pub sections: Map<String, Value>,
}

/// Settings of the per-component supervision loop.
///
/// ## Field semantics
/// - `backoff`: pause before restarting a component whose `start()` failed
/// - `grace`: how long shutdown waits for components to unwind (`0` = don't wait)
/// - `handle_signals`: whether [`Supervisor::run`](crate::Supervisor::run) reacts to OS termination signals
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Restart delay after failed attempts.
    pub backoff: BackoffPolicy,
    /// Maximum time to wait for components during shutdown.
    #[serde(rename = "grace_ms", with = "millis")]
    pub grace: Duration,
    /// Listen for SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere).
    pub handle_signals: bool,
}

impl Default for SupervisorConfig {
    /// - `backoff = BackoffPolicy::default()` (constant 1s)
    /// - `grace = 5s`
    /// - `handle_signals = true`
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            grace: Duration::from_secs(5),
            handle_signals: true,
        }
    }
}

/// Settings of the display scheduler.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitcherConfig {
    /// Registry names of the displays, in round-robin order.
    pub services: Vec<String>,
    /// Dwell time per display; also the default focus hold.
    #[serde(rename = "time_ms", with = "millis")]
    pub time: Duration,
    /// Pause length used by the HTTP pause route.
    #[serde(rename = "pause_ms", with = "millis")]
    pub pause: Duration,
    /// How long a replaced display may take to unwind before it is aborted.
    #[serde(rename = "unwind_ms", with = "millis")]
    pub unwind: Duration,
}

impl Default for SwitcherConfig {
    fn default() -> Self {
        Self {
            services: Vec::new(),
            time: Duration::from_secs(10),
            pause: Duration::from_secs(3600),
            unwind: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Parses and validates a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Rejects values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.switcher.time.is_zero() {
            return Err(ConfigError::Invalid {
                reason: "switcher.time_ms must be greater than zero".into(),
            });
        }
        let factor = self.supervisor.backoff.factor;
        if !factor.is_finite() || factor < 1.0 {
            return Err(ConfigError::Invalid {
                reason: format!("supervisor.backoff.factor must be >= 1.0, got {factor}"),
            });
        }
        if self.supervisor.backoff.first > self.supervisor.backoff.max {
            return Err(ConfigError::Invalid {
                reason: "supervisor.backoff.first_ms exceeds max_ms".into(),
            });
        }
        Ok(())
    }

    /// Deserializes the top-level section `name` for a hosted component.
    ///
    /// Returns `Ok(None)` when the section is absent.
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ConfigError> {
        match self.sections.get(name) {
            None => Ok(None),
            Some(v) => Ok(Some(T::deserialize(v)?)),
        }
    }
}

/// `Duration` as integer milliseconds.
pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
