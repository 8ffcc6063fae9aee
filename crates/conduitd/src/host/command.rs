//! Typed commands carried to the privileged context.

use std::path::PathBuf;
use std::sync::mpsc::Sender;

use tracing::debug;

use super::{HOST_TARGET, Host, Issue, ProjectSnapshot};

/// One unit of work for the privileged context.
///
/// Every variant carries the sender on which its answer is delivered. The
/// issuer may have stopped waiting by the time the command runs; such
/// replies are dropped.
#[derive(Debug)]
pub enum HostCommand {
    /// Reads the host version.
    Version(Sender<String>),
    /// Snapshots the startup project.
    StartupProject(Sender<Option<ProjectSnapshot>>),
    /// Lists open projects.
    Projects(Sender<Vec<String>>),
    /// Switches the active build configuration.
    SelectBuildConfig {
        /// Configuration display name.
        name: String,
        /// Whether the switch happened.
        reply: Sender<bool>,
    },
    /// Reports whether a build is running.
    IsBuilding(Sender<bool>),
    /// Starts a build of the startup project.
    Build(Sender<()>),
    /// Starts a clean of the startup project.
    Clean(Sender<()>),
    /// Triggers a registered action by id.
    TriggerAction {
        /// Action identifier, e.g. `ProjectExplorer.Run`.
        action_id: String,
        /// Whether the id resolved and was triggered.
        reply: Sender<bool>,
    },
    /// Starts the active run configuration directly.
    StartRunControl(Sender<bool>),
    /// Opens a file in an editor.
    OpenEditor {
        /// File to open.
        path: PathBuf,
        /// Whether an editor opened.
        reply: Sender<bool>,
    },
    /// Lists open documents.
    OpenDocuments(Sender<Vec<String>>),
    /// Lists known sessions.
    Sessions(Sender<Vec<String>>),
    /// Reads the active session name.
    ActiveSession(Sender<String>),
    /// Loads a session and records its outcome.
    LoadSession {
        /// Session to load.
        name: String,
        /// Outcome recorded once loading returns.
        outcome: Sender<bool>,
    },
    /// Saves the active session.
    SaveSession(Sender<bool>),
    /// Collects host diagnostics.
    Diagnostics(Sender<Vec<Issue>>),
    /// Asks the host to exit.
    Quit(Sender<()>),
}

impl HostCommand {
    /// Short name used in logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Version(_) => "version",
            Self::StartupProject(_) => "startup_project",
            Self::Projects(_) => "projects",
            Self::SelectBuildConfig { .. } => "select_build_config",
            Self::IsBuilding(_) => "is_building",
            Self::Build(_) => "build",
            Self::Clean(_) => "clean",
            Self::TriggerAction { .. } => "trigger_action",
            Self::StartRunControl(_) => "start_run_control",
            Self::OpenEditor { .. } => "open_editor",
            Self::OpenDocuments(_) => "open_documents",
            Self::Sessions(_) => "sessions",
            Self::ActiveSession(_) => "active_session",
            Self::LoadSession { .. } => "load_session",
            Self::SaveSession(_) => "save_session",
            Self::Diagnostics(_) => "diagnostics",
            Self::Quit(_) => "quit",
        }
    }

    /// Runs the command against `host` and delivers the answer.
    pub fn execute<H>(self, host: &mut H)
    where
        H: Host + ?Sized,
    {
        let name = self.name();
        match self {
            Self::Version(reply) => deliver(name, &reply, host.version()),
            Self::StartupProject(reply) => deliver(name, &reply, host.startup_project()),
            Self::Projects(reply) => deliver(name, &reply, host.projects()),
            Self::SelectBuildConfig { name: config, reply } => {
                deliver(name, &reply, host.select_build_config(&config));
            }
            Self::IsBuilding(reply) => deliver(name, &reply, host.is_building()),
            Self::Build(reply) => {
                host.build_startup_project();
                deliver(name, &reply, ());
            }
            Self::Clean(reply) => {
                host.clean_startup_project();
                deliver(name, &reply, ());
            }
            Self::TriggerAction { action_id, reply } => {
                deliver(name, &reply, host.trigger_action(&action_id));
            }
            Self::StartRunControl(reply) => deliver(name, &reply, host.start_run_control()),
            Self::OpenEditor { path, reply } => deliver(name, &reply, host.open_editor(&path)),
            Self::OpenDocuments(reply) => deliver(name, &reply, host.open_documents()),
            Self::Sessions(reply) => deliver(name, &reply, host.sessions()),
            Self::ActiveSession(reply) => deliver(name, &reply, host.active_session()),
            Self::LoadSession {
                name: session,
                outcome,
            } => deliver(name, &outcome, host.load_session(&session)),
            Self::SaveSession(reply) => deliver(name, &reply, host.save_session()),
            Self::Diagnostics(reply) => deliver(name, &reply, host.diagnostics()),
            Self::Quit(reply) => {
                host.request_quit();
                deliver(name, &reply, ());
            }
        }
    }
}

fn deliver<T>(command: &'static str, reply: &Sender<T>, value: T) {
    if reply.send(value).is_err() {
        debug!(
            target: HOST_TARGET,
            command,
            "issuer stopped waiting; reply dropped"
        );
    }
}
