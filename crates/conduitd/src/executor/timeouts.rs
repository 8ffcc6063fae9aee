//! Advisory durations for long-running methods.
//!
//! The values are hints surfaced to clients; nothing here enforces a
//! deadline.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Methods whose expected duration clients may query and adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LongRunningMethod {
    /// `debug`
    Debug,
    /// `build`
    Build,
    /// `runProject`
    RunProject,
    /// `loadSession`
    LoadSession,
    /// `cleanProject`
    CleanProject,
}

impl LongRunningMethod {
    /// Every long-running method, in allow-list order.
    pub const ALL: [Self; 5] = [
        Self::Debug,
        Self::Build,
        Self::RunProject,
        Self::LoadSession,
        Self::CleanProject,
    ];

    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Build => "build",
            Self::RunProject => "runProject",
            Self::LoadSession => "loadSession",
            Self::CleanProject => "cleanProject",
        }
    }

    /// Looks up a method by its exact wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == name)
    }

    /// Expected duration, in seconds, before any client override.
    #[must_use]
    pub const fn default_timeout_secs(self) -> u64 {
        match self {
            Self::Debug | Self::RunProject => 60,
            Self::Build => 1_200,
            Self::LoadSession => 30,
            Self::CleanProject => 300,
        }
    }

    /// Comma-separated allow-list, as shown in error reports.
    #[must_use]
    pub fn allow_list() -> String {
        Self::ALL
            .iter()
            .map(|method| method.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for LongRunningMethod {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Reasons a timeout update is refused. The table is left unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeoutUpdateError {
    /// No method name was given.
    #[error("Method name cannot be empty")]
    EmptyName,
    /// The requested duration was below zero.
    #[error("Timeout cannot be negative")]
    Negative,
    /// The method is not in the long-running allow-list.
    #[error("Method '{method}' does not support timeout configuration")]
    Unsupported {
        /// Name supplied by the client.
        method: String,
    },
}

/// An applied timeout change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutUpdate {
    /// Method that changed.
    pub method: LongRunningMethod,
    /// Value before the change, if one was set.
    pub previous: Option<u64>,
    /// Value now in effect.
    pub current: u64,
}

/// Expected durations, in seconds, per long-running method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodTimeoutTable {
    entries: BTreeMap<LongRunningMethod, u64>,
}

impl Default for MethodTimeoutTable {
    fn default() -> Self {
        Self {
            entries: LongRunningMethod::ALL
                .into_iter()
                .map(|method| (method, method.default_timeout_secs()))
                .collect(),
        }
    }
}

impl MethodTimeoutTable {
    /// Current value for `method`.
    #[must_use]
    pub fn get(&self, method: LongRunningMethod) -> Option<u64> {
        self.entries.get(&method).copied()
    }

    /// Validates and applies a client update.
    ///
    /// Checks run in order: empty name, negative value, allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`TimeoutUpdateError`] without touching the table when any
    /// check fails.
    pub fn update(
        &mut self,
        method: &str,
        timeout_seconds: i64,
    ) -> Result<TimeoutUpdate, TimeoutUpdateError> {
        if method.is_empty() {
            return Err(TimeoutUpdateError::EmptyName);
        }
        let current = u64::try_from(timeout_seconds).map_err(|_| TimeoutUpdateError::Negative)?;
        let method = LongRunningMethod::parse(method).ok_or_else(|| {
            TimeoutUpdateError::Unsupported {
                method: method.to_owned(),
            }
        })?;
        let previous = self.entries.insert(method, current);
        Ok(TimeoutUpdate {
            method,
            previous,
            current,
        })
    }

    /// Map from wire name to seconds, as reported by `getMethodMetadata`.
    #[must_use]
    pub fn expected_durations(&self) -> BTreeMap<&'static str, u64> {
        self.entries
            .iter()
            .map(|(method, seconds)| (method.as_str(), *seconds))
            .collect()
    }
}
