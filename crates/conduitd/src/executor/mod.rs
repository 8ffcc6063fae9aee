//! Uniform command interface over the privileged context.
//!
//! [`CommandExecutor`] runs on the network thread. Each operation checks its
//! preconditions with value snapshots fetched from the host, then submits the
//! trigger through the [`HostHandle`]. Precondition failures and an
//! unavailable host are negative results for the command, never protocol
//! errors. Only [`CommandExecutor::load_session`] blocks beyond a single
//! round trip, bounded by its [`SessionPollPolicy`].

mod actions;
mod issues;
mod session;
mod timeouts;

use std::path::Path;
use std::thread;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::host::{HostError, HostHandle, ProjectSnapshot};

pub use self::actions::{DEBUG_ACTION_IDS, RUN_ACTION_IDS, STOP_DEBUG_ACTION_IDS};
use self::session::PendingSessionLoad;
pub use self::session::SessionPollPolicy;
pub use self::timeouts::{
    LongRunningMethod, MethodTimeoutTable, TimeoutUpdate, TimeoutUpdateError,
};

pub(crate) const EXECUTOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::executor");

/// Why a trigger command did not start.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No startup project is set.
    #[error("no startup project")]
    NoStartupProject,
    /// The startup project has no active target.
    #[error("no active target")]
    NoActiveTarget,
    /// The active target has no active build configuration.
    #[error("no active build configuration")]
    NoBuildConfiguration,
    /// The active target has no active run configuration.
    #[error("no active run configuration")]
    NoRunConfiguration,
    /// Neither a run action nor the run control could be started.
    #[error("no run action resolved and the run control did not start")]
    RunUnavailable,
    /// The session name was empty.
    #[error("session name is empty")]
    EmptySessionName,
    /// The session is not known to the host.
    #[error("session '{name}' does not exist")]
    UnknownSession {
        /// Requested session.
        name: String,
    },
    /// The session did not become ready before the polling ceiling.
    #[error("session '{name}' not ready after {checks} checks")]
    SessionNotReady {
        /// Requested session.
        name: String,
        /// Readiness checks performed.
        checks: u32,
    },
    /// The privileged context could not be reached.
    #[error(transparent)]
    Host(#[from] HostError),
}

#[derive(Debug, Clone, Copy)]
enum Requirement {
    Build,
    Run,
}

/// Executes commands against the host on behalf of the dispatcher.
#[derive(Debug)]
pub struct CommandExecutor {
    host: HostHandle,
    session_poll: SessionPollPolicy,
    timeouts: MethodTimeoutTable,
}

impl CommandExecutor {
    /// Creates an executor with a freshly seeded timeout table.
    #[must_use]
    pub fn new(host: HostHandle, session_poll: SessionPollPolicy) -> Self {
        Self {
            host,
            session_poll,
            timeouts: MethodTimeoutTable::default(),
        }
    }

    /// Advisory durations for long-running methods.
    #[must_use]
    pub const fn timeouts(&self) -> &MethodTimeoutTable {
        &self.timeouts
    }

    /// Host version, or `"unknown"` when the host does not answer.
    #[must_use]
    pub fn version(&self) -> String {
        self.host.version().unwrap_or_else(|error| {
            log_query_failure("version", &error);
            String::from("unknown")
        })
    }

    /// Starts a build of the startup project without its dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when a precondition fails or the host is
    /// unavailable. The build is not triggered in that case.
    pub fn build(&self) -> Result<(), CommandError> {
        let project = self.require(Requirement::Build)?;
        self.host.build()?;
        info!(target: EXECUTOR_TARGET, project = %project.name, "build triggered");
        Ok(())
    }

    /// Starts a clean of the startup project.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`CommandExecutor::build`].
    pub fn clean_project(&self) -> Result<(), CommandError> {
        let project = self.require(Requirement::Build)?;
        self.host.clean()?;
        info!(target: EXECUTOR_TARGET, project = %project.name, "clean triggered");
        Ok(())
    }

    /// Runs the startup project through the first resolvable run action,
    /// falling back to starting the run control directly.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when a precondition fails, the host is
    /// unavailable, or nothing could be started.
    pub fn run_project(&self) -> Result<(), CommandError> {
        let project = self.require(Requirement::Run)?;
        if let Some(action_id) = self.trigger_first(&RUN_ACTION_IDS)? {
            info!(
                target: EXECUTOR_TARGET,
                project = %project.name,
                action = action_id,
                "run triggered"
            );
            return Ok(());
        }
        debug!(target: EXECUTOR_TARGET, "no run action resolved; starting run control");
        if self.host.start_run_control()? {
            info!(target: EXECUTOR_TARGET, project = %project.name, "run control started");
            Ok(())
        } else {
            Err(CommandError::RunUnavailable)
        }
    }

    /// Starts debugging the startup project and returns a multi-line report.
    #[must_use]
    pub fn debug(&self) -> String {
        let mut report = vec![String::from("=== DEBUG ATTEMPT ===")];
        let project = match self.require(Requirement::Run) {
            Ok(project) => project,
            Err(error) => {
                report.push(format!("ERROR: {}", debug_refusal(&error)));
                return report.join("\n");
            }
        };
        if let Some((_, run_config)) = project.runnable() {
            report.push(format!("Project: {}", project.name));
            report.push(format!("Run configuration: {run_config}"));
            report.push(String::new());
        }
        report.push(String::from("=== STARTING DEBUG SESSION ==="));
        match self.trace_actions(&DEBUG_ACTION_IDS, "debug", &mut report) {
            Ok(true) => {}
            Ok(false) => {
                report.push(String::from("ERROR: No debug action found among tried IDs"));
                return report.join("\n");
            }
            Err(error) => {
                report.push(format!("ERROR: {error}"));
                return report.join("\n");
            }
        }
        report.extend(
            [
                "Debug session initiated successfully!",
                "The debugger is now starting in the background.",
                "NOTE: The debug session will continue running asynchronously.",
                "",
                "=== DEBUG RESULT ===",
                "Debug command completed.",
            ]
            .map(String::from),
        );
        report.join("\n")
    }

    /// Stops the active debug session and returns a multi-line report.
    #[must_use]
    pub fn stop_debug(&self) -> String {
        let mut report = vec![String::from("=== STOP DEBUGGING ===")];
        match self.trace_actions(&STOP_DEBUG_ACTION_IDS, "stop debug", &mut report) {
            Ok(true) => {}
            Ok(false) => {
                report.push(String::from(
                    "WARNING: No stop debug action found among tried IDs",
                ));
                report.push(String::from(
                    "You may need to stop debugging manually from the host's debugger interface",
                ));
            }
            Err(error) => {
                report.push(format!("ERROR: {error}"));
                return report.join("\n");
            }
        }
        report.extend(
            ["", "=== STOP DEBUG RESULT ===", "Stop debug command completed."].map(String::from),
        );
        report.join("\n")
    }

    /// Opens an existing file in an editor.
    #[must_use]
    pub fn open_file(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        let file = Path::new(path);
        if !file.exists() {
            debug!(target: EXECUTOR_TARGET, path, "file does not exist");
            return false;
        }
        query_or_default("open_editor", self.host.open_editor(file.to_path_buf()))
    }

    /// Names of the open projects.
    #[must_use]
    pub fn list_projects(&self) -> Vec<String> {
        query_or_default("projects", self.host.projects())
    }

    /// Build configurations of the startup project's active target.
    #[must_use]
    pub fn list_build_configs(&self) -> Vec<String> {
        self.startup_snapshot()
            .and_then(|project| project.active_target)
            .map(|target| target.build_configs)
            .unwrap_or_default()
    }

    /// Switches the active build configuration by name.
    #[must_use]
    pub fn switch_to_build_config(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        query_or_default("select_build_config", self.host.select_build_config(name))
    }

    /// Startup project name, or empty.
    #[must_use]
    pub fn current_project(&self) -> String {
        self.startup_snapshot()
            .map(|project| project.name)
            .unwrap_or_default()
    }

    /// Active build configuration name, or empty.
    #[must_use]
    pub fn current_build_config(&self) -> String {
        self.startup_snapshot()
            .and_then(|project| project.active_target)
            .and_then(|target| target.active_build_config)
            .unwrap_or_default()
    }

    /// Paths of the open documents.
    #[must_use]
    pub fn list_open_files(&self) -> Vec<String> {
        query_or_default("open_documents", self.host.open_documents())
    }

    /// Known session names.
    #[must_use]
    pub fn list_sessions(&self) -> Vec<String> {
        query_or_default("sessions", self.host.sessions())
    }

    /// Active session name.
    #[must_use]
    pub fn current_session(&self) -> String {
        query_or_default("active_session", self.host.active_session())
    }

    /// Loads a session and waits, best effort, until a startup project is
    /// visible.
    ///
    /// Unknown sessions fail without polling. Otherwise the load is queued on
    /// the privileged context and readiness is checked up to
    /// `attempts` times, sleeping `interval` before each check. The load is
    /// never cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] for an empty or unknown name, an unavailable
    /// host, or when readiness was not observed before the ceiling.
    pub fn load_session(&self, name: &str) -> Result<(), CommandError> {
        if name.is_empty() {
            return Err(CommandError::EmptySessionName);
        }
        let sessions = self.host.sessions()?;
        if !sessions.iter().any(|session| session == name) {
            debug!(
                target: EXECUTOR_TARGET,
                session = name,
                available = ?sessions,
                "session does not exist"
            );
            return Err(CommandError::UnknownSession {
                name: name.to_owned(),
            });
        }

        let recorded = self.host.begin_session_load(name)?;
        let mut pending = PendingSessionLoad::new(name, recorded);
        info!(target: EXECUTOR_TARGET, session = name, "session load queued");

        let probe = self.host.with_reply_timeout(self.session_poll.interval);
        for check in 1..=self.session_poll.attempts {
            thread::sleep(self.session_poll.interval);
            pending.observe();
            if session_ready(&probe) {
                pending.finish(true, check);
                return Ok(());
            }
            debug!(target: EXECUTOR_TARGET, session = name, check, "session not ready yet");
        }
        pending.finish(false, self.session_poll.attempts);
        Err(CommandError::SessionNotReady {
            name: name.to_owned(),
            checks: self.session_poll.attempts,
        })
    }

    /// Saves the active session.
    #[must_use]
    pub fn save_session(&self) -> bool {
        query_or_default("save_session", self.host.save_session())
    }

    /// Build state, project status warnings and host diagnostics.
    #[must_use]
    pub fn list_issues(&self) -> Vec<String> {
        let building = query_or_default("is_building", self.host.is_building());
        let project = self.startup_snapshot();
        let diagnostics = query_or_default("diagnostics", self.host.diagnostics());
        issues::collect(building, project.as_ref(), &diagnostics)
    }

    /// Asks the host to exit. Returns whether the request was delivered.
    #[must_use]
    pub fn quit(&self) -> bool {
        match self.host.quit() {
            Ok(()) => true,
            Err(error) => {
                log_query_failure("quit", &error);
                false
            }
        }
    }

    /// Updates an advisory timeout and returns the textual report.
    ///
    /// Rejected updates produce a report whose first detail line starts
    /// with `ERROR:` and leave the table unchanged.
    pub fn set_method_metadata(&mut self, method: &str, timeout_seconds: i64) -> String {
        let mut report = vec![String::from("=== SET METHOD METADATA ===")];
        match self.timeouts.update(method, timeout_seconds) {
            Ok(update) => {
                let previous = update
                    .previous
                    .map_or_else(|| String::from("not set"), |secs| format!("{secs} seconds"));
                report.push(format!("Method: {}", update.method));
                report.push(format!("Previous timeout: {previous}"));
                report.push(format!("New timeout: {} seconds", update.current));
                report.push(String::new());
                report.push(String::from("Timeout updated successfully!"));
                report.push(String::from(
                    "Note: This change affects the timeout hints shown in method responses.",
                ));
                report.push(String::new());
                report.push(String::from("=== SET METHOD METADATA RESULT ==="));
                report.push(String::from("Method metadata update completed."));
                info!(
                    target: EXECUTOR_TARGET,
                    method = %update.method,
                    previous = ?update.previous,
                    current = update.current,
                    "advisory timeout updated"
                );
            }
            Err(error) => {
                report.push(format!("ERROR: {error}"));
                if matches!(error, TimeoutUpdateError::Unsupported { .. }) {
                    report.push(format!(
                        "Valid methods: {}",
                        LongRunningMethod::allow_list()
                    ));
                }
            }
        }
        report.join("\n")
    }

    fn startup_snapshot(&self) -> Option<ProjectSnapshot> {
        query_or_default("startup_project", self.host.startup_project())
    }

    fn require(&self, requirement: Requirement) -> Result<ProjectSnapshot, CommandError> {
        let project = self
            .host
            .startup_project()?
            .ok_or(CommandError::NoStartupProject)?;
        if project.active_target.is_none() {
            return Err(CommandError::NoActiveTarget);
        }
        let ready = match requirement {
            Requirement::Build => project.buildable().is_some(),
            Requirement::Run => project.runnable().is_some(),
        };
        match requirement {
            _ if ready => Ok(project),
            Requirement::Build => Err(CommandError::NoBuildConfiguration),
            Requirement::Run => Err(CommandError::NoRunConfiguration),
        }
    }

    fn trigger_first(&self, action_ids: &[&'static str]) -> Result<Option<&'static str>, HostError> {
        for action_id in action_ids {
            if self.host.trigger_action(action_id)? {
                return Ok(Some(*action_id));
            }
        }
        Ok(None)
    }

    fn trace_actions(
        &self,
        action_ids: &[&str],
        label: &str,
        report: &mut Vec<String>,
    ) -> Result<bool, HostError> {
        for action_id in action_ids {
            report.push(format!("Trying {label} action: {action_id}"));
            if self.host.trigger_action(action_id)? {
                report.push(format!("Found {label} action, triggering..."));
                report.push(format!("{} action triggered successfully", capitalise(label)));
                info!(target: EXECUTOR_TARGET, action = action_id, "{label} triggered");
                return Ok(true);
            }
            report.push(format!("{} action not found: {action_id}", capitalise(label)));
        }
        Ok(false)
    }
}

fn session_ready(probe: &HostHandle) -> bool {
    match probe.startup_project() {
        Ok(project) => project.is_some_and(|project| !project.name.is_empty()),
        Err(error) => {
            debug!(target: EXECUTOR_TARGET, error = %error, "readiness check unanswered");
            false
        }
    }
}

fn debug_refusal(error: &CommandError) -> String {
    match error {
        CommandError::NoStartupProject => String::from("No current project"),
        CommandError::NoActiveTarget => String::from("No active target"),
        CommandError::NoRunConfiguration => {
            String::from("No active run configuration available for debugging")
        }
        other => other.to_string(),
    }
}

fn capitalise(label: &str) -> String {
    let mut chars = label.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn query_or_default<T: Default>(query: &'static str, result: Result<T, HostError>) -> T {
    result.unwrap_or_else(|error| {
        log_query_failure(query, &error);
        T::default()
    })
}

fn log_query_failure(query: &'static str, error: &HostError) {
    warn!(target: EXECUTOR_TARGET, query, error = %error, "host query failed");
}
