//! Catcher configuration.

use std::str::FromStr;

use crate::error::Error;

/// Environment variable toggling statement logging.
pub const ENV_LOGGING: &str = "SQLMOCK_LOGGING";

/// Environment variable selecting the [`UnmatchedPolicy`].
pub const ENV_UNMATCHED: &str = "SQLMOCK_UNMATCHED";

/// What the catcher does when no registered mock matches a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum UnmatchedPolicy {
    /// Return an empty, error-free response.
    #[default]
    Fallback,
    /// Return [`Error::NoMockMatched`] naming the statement.
    Fail,
    /// Abort the calling thread with a message naming the statement.
    Panic,
}

impl UnmatchedPolicy {
    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Fail => "fail",
            Self::Panic => "panic",
        }
    }
}

impl FromStr for UnmatchedPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fallback" | "empty" => Ok(Self::Fallback),
            "fail" | "error" => Ok(Self::Fail),
            "panic" | "abort" => Ok(Self::Panic),
            other => Err(Error::Config(format!(
                "invalid unmatched policy {other:?}, expected fallback, fail or panic"
            ))),
        }
    }
}

impl std::fmt::Display for UnmatchedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a [`MockCatcher`](crate::MockCatcher).
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future minor versions without breaking changes. Use the builder
/// pattern methods or [`Default::default()`] to construct instances.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct CatcherConfig {
    /// Trace every statement considered for matching.
    pub logging: bool,

    /// Behavior when nothing matches.
    pub unmatched: UnmatchedPolicy,
}

impl CatcherConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable statement logging.
    #[must_use]
    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Set the unmatched-statement policy.
    #[must_use]
    pub fn unmatched(mut self, policy: UnmatchedPolicy) -> Self {
        self.unmatched = policy;
        self
    }

    /// Build a configuration from `SQLMOCK_LOGGING` and `SQLMOCK_UNMATCHED`.
    ///
    /// Unset variables keep their defaults. An unparseable policy is logged
    /// and ignored rather than failing process start-up.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_LOGGING) {
            config.logging = parse_flag(&value);
        }

        if let Some(value) = lookup(ENV_UNMATCHED) {
            match value.parse() {
                Ok(policy) => config.unmatched = policy,
                Err(e) => tracing::warn!(variable = ENV_UNMATCHED, error = %e, "ignoring"),
            }
        }

        config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
