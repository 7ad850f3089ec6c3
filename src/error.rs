//! Error types used by the panelvisor runtime, its components and helpers.
//!
//! - [`RuntimeError`]: failures of the runtime itself (boot, shutdown).
//! - [`ComponentError`]: failures of a single `start()`/`stop()`/`activate()` call.
//! - [`RaceError`]: outcome of [`WaitFirst`](crate::WaitFirst) and [`timeout`](crate::race::timeout)
//!   when no racer produced a value.
//! - [`ConfigError`]: configuration loading/validation failures.
//!
//! Every enum provides `as_label()` returning a short stable snake_case label for logs.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the panelvisor runtime.
///
/// Boot errors are fatal: a broken dependency graph cannot heal itself, so
/// [`SupervisorBuilder::build`](crate::SupervisorBuilder::build) returns them and
/// nothing is started.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A component asked the registry for an entry that does not exist (yet).
    #[error("component '{component}' requires '{dependency}', which is not registered")]
    MissingDependency {
        /// The component being created.
        component: String,
        /// The registry name it asked for.
        dependency: String,
    },

    /// A registry entry exists but has a different concrete type than requested.
    #[error("registry entry '{name}' is not a {expected}")]
    DependencyType {
        /// Registry name.
        name: String,
        /// Requested type name.
        expected: &'static str,
    },

    /// Two components tried to register under the same name.
    #[error("registry name '{name}' is already taken")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// A factory failed for a reason other than a missing dependency.
    #[error("component '{component}' failed to create: {reason}")]
    CreateFailed {
        /// The component being created.
        component: String,
        /// Failure message.
        reason: String,
    },

    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Shutdown grace period was exceeded; some components did not stop in time.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Components still running when the grace period ended.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use panelvisor::RuntimeError;
    ///
    /// let err = RuntimeError::DuplicateName { name: "bus".into() };
    /// assert_eq!(err.as_label(), "runtime_duplicate_name");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::MissingDependency { .. } => "runtime_missing_dependency",
            RuntimeError::DependencyType { .. } => "runtime_dependency_type",
            RuntimeError::DuplicateName { .. } => "runtime_duplicate_name",
            RuntimeError::CreateFailed { .. } => "runtime_create_failed",
            RuntimeError::Config(_) => "runtime_config",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// True for errors raised while building the registry.
    pub fn is_boot_error(&self) -> bool {
        !matches!(self, RuntimeError::GraceExceeded { .. })
    }
}

/// # Errors produced by a single component call.
///
/// Any error escaping `start()` makes the supervisor report it and restart the
/// component after a back-off; errors from `stop()` are reported and otherwise ignored.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// The call failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The call panicked; the panic was caught at the supervision boundary.
    #[error("panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text (when it was a string).
        message: String,
    },

    /// The attempt exceeded its configured timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The call observed cancellation of its context and unwound.
    #[error("context cancelled")]
    Canceled,
}

impl ComponentError {
    /// Shorthand for [`ComponentError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ComponentError::Fail {
            error: error.into(),
        }
    }

    /// Builds a [`ComponentError::Panicked`] from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        ComponentError::Panicked { message }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ComponentError::Fail { .. } => "component_failed",
            ComponentError::Panicked { .. } => "component_panicked",
            ComponentError::Timeout { .. } => "component_timeout",
            ComponentError::Canceled => "component_canceled",
        }
    }

    /// True when the error only reports that the caller cancelled the call.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ComponentError::Canceled)
    }
}

impl From<anyhow::Error> for ComponentError {
    fn from(err: anyhow::Error) -> Self {
        ComponentError::Fail {
            error: format!("{err:#}"),
        }
    }
}

/// # Outcome of a race that produced no value.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RaceError<E> {
    /// `wait()` was called with nothing to wait for.
    #[error("nothing to race")]
    Empty,

    /// The timer won the race.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The elapsed duration.
        timeout: Duration,
    },

    /// The winning racer completed with an error.
    #[error("racer {index} failed: {error}")]
    Failed {
        /// Position of the winner in insertion order.
        index: usize,
        /// The winner's error.
        error: E,
    },
}

impl<E> RaceError<E> {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RaceError::Empty => "race_empty",
            RaceError::Timeout { .. } => "race_timeout",
            RaceError::Failed { .. } => "race_failed",
        }
    }

    /// Returns the winner's error, if the race ended with one.
    pub fn into_inner(self) -> Option<E> {
        match self {
            RaceError::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// # Configuration errors.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON for [`Config`](crate::Config).
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document parsed but carries unusable values.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io(_) => "config_io",
            ConfigError::Parse(_) => "config_parse",
            ConfigError::Invalid { .. } => "config_invalid",
        }
    }
}
