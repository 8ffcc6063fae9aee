//! Hand-off between the network thread and the host's privileged context.
//!
//! The host application owns a single execution context that may touch
//! projects, sessions and builds. Everything the server needs from the host
//! is expressed by the [`Host`] trait, and the network thread never calls it
//! directly: it submits a typed [`HostCommand`] through a [`HostHandle`], and
//! whichever thread drains the matching [`HostInbox`] executes the command
//! and answers on the reply channel the command carries.
//!
//! Queries return value snapshots ([`ProjectSnapshot`], [`TargetSnapshot`])
//! so no host state escapes the privileged context.

mod command;
mod context;
mod errors;
mod manifest;
mod memory;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub use self::command::HostCommand;
pub use self::context::{
    HostHandle, HostInbox, PrivilegedContext, privileged_channel, spawn_privileged_context,
};
pub use self::errors::HostError;
pub use self::manifest::{ManifestError, WorkspaceManifest};
pub use self::memory::{HostJournal, InMemoryHost, ProjectSpec, TargetSpec};

pub(crate) const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

/// Capabilities of the host application reachable from the server.
///
/// Implementations run on the privileged context only. Trigger methods start
/// work and return immediately; none of them wait for a build, run or debug
/// session to finish.
pub trait Host: Send {
    /// Version string reported by `getVersion`.
    fn version(&self) -> String;

    /// Snapshot of the startup project, if one is set.
    fn startup_project(&self) -> Option<ProjectSnapshot>;

    /// Display names of every open project.
    fn projects(&self) -> Vec<String>;

    /// Makes `name` the active build configuration of the startup project's
    /// active target. Returns `false` when no such configuration exists.
    fn select_build_config(&mut self, name: &str) -> bool;

    /// Whether a build is currently running.
    fn is_building(&self) -> bool;

    /// Starts building the startup project without its dependencies.
    fn build_startup_project(&mut self);

    /// Starts cleaning the startup project.
    fn clean_startup_project(&mut self);

    /// Triggers a registered action. Returns `false` when `action_id` does
    /// not resolve to an action.
    fn trigger_action(&mut self, action_id: &str) -> bool;

    /// Starts the active run configuration directly, bypassing actions.
    fn start_run_control(&mut self) -> bool;

    /// Opens `path` in an editor.
    fn open_editor(&mut self, path: &Path) -> bool;

    /// Paths of the documents currently open.
    fn open_documents(&self) -> Vec<String>;

    /// Names of the known sessions.
    fn sessions(&self) -> Vec<String>;

    /// Name of the active session.
    fn active_session(&self) -> String;

    /// Loads a session, replacing the open projects.
    fn load_session(&mut self, name: &str) -> bool;

    /// Persists the active session.
    fn save_session(&mut self) -> bool;

    /// Diagnostics currently reported by the host.
    fn diagnostics(&self) -> Vec<Issue>;

    /// Asks the host application to exit.
    fn request_quit(&mut self);
}

/// Value copy of a project as seen by the privileged context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSnapshot {
    /// Display name.
    pub name: String,
    /// Number of configured targets.
    pub target_count: usize,
    /// The active target, when one is selected.
    pub active_target: Option<TargetSnapshot>,
}

impl ProjectSnapshot {
    /// Active target together with its active build configuration.
    #[must_use]
    pub fn buildable(&self) -> Option<(&TargetSnapshot, &str)> {
        let target = self.active_target.as_ref()?;
        let config = target.active_build_config.as_deref()?;
        Some((target, config))
    }

    /// Active target together with its active run configuration.
    #[must_use]
    pub fn runnable(&self) -> Option<(&TargetSnapshot, &str)> {
        let target = self.active_target.as_ref()?;
        let config = target.active_run_config.as_deref()?;
        Some((target, config))
    }
}

/// Value copy of a project's target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSnapshot {
    /// Display name.
    pub name: String,
    /// Display names of the build configurations, in host order.
    pub build_configs: Vec<String>,
    /// Active build configuration.
    pub active_build_config: Option<String>,
    /// Active run configuration.
    pub active_run_config: Option<String>,
    /// Build directory of the active build configuration.
    pub build_directory: Option<PathBuf>,
}

/// Severity of a host diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// A compile or configuration error.
    Error,
    /// A warning.
    Warning,
    /// Informational output.
    Info,
}

impl IssueKind {
    /// Upper-case label used in issue lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

/// A diagnostic reported by the host.
///
/// Renders as `KIND:description`, followed by ` [file]` or ` [file:line]`
/// when a location is known.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    /// Severity.
    pub kind: IssueKind,
    /// Message text.
    pub description: String,
    /// Source file, when known.
    #[serde(default)]
    pub file: Option<String>,
    /// One-based line, when known.
    #[serde(default)]
    pub line: Option<u32>,
}

impl fmt::Display for Issue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.kind.label(), self.description)?;
        if let Some(file) = self.file.as_deref().filter(|file| !file.is_empty()) {
            write!(formatter, " [{file}")?;
            if let Some(line) = self.line.filter(|line| *line > 0) {
                write!(formatter, ":{line}")?;
            }
            formatter.write_str("]")?;
        }
        Ok(())
    }
}
