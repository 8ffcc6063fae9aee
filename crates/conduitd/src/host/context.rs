//! Channel endpoints linking the network thread to the privileged context.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use super::{HOST_TARGET, Host, HostCommand, HostError, Issue, ProjectSnapshot};

const PRIVILEGED_THREAD_NAME: &str = "conduit-privileged";

/// Creates a connected handle and inbox.
///
/// Hosts with their own event loop keep the inbox and call
/// [`HostInbox::drain`] from that loop; otherwise use
/// [`spawn_privileged_context`].
#[must_use]
pub fn privileged_channel(reply_timeout: Duration) -> (HostHandle, HostInbox) {
    let (sender, receiver) = mpsc::channel();
    (
        HostHandle {
            sender,
            reply_timeout,
        },
        HostInbox { receiver },
    )
}

/// Runs `host` on a dedicated privileged thread.
///
/// The thread exits once every [`HostHandle`] clone has been dropped, and
/// hands the host back through [`PrivilegedContext::join`].
///
/// # Errors
///
/// Returns [`HostError::Spawn`] when the thread cannot be created.
pub fn spawn_privileged_context<H>(
    host: H,
    reply_timeout: Duration,
) -> Result<(HostHandle, PrivilegedContext<H>), HostError>
where
    H: Host + 'static,
{
    let (handle, inbox) = privileged_channel(reply_timeout);
    let thread = thread::Builder::new()
        .name(PRIVILEGED_THREAD_NAME.to_owned())
        .spawn(move || {
            let mut host = host;
            inbox.run(&mut host);
            host
        })
        .map_err(|source| HostError::Spawn { source })?;
    Ok((handle, PrivilegedContext { thread }))
}

/// Join handle for a privileged thread started by
/// [`spawn_privileged_context`].
#[derive(Debug)]
pub struct PrivilegedContext<H> {
    thread: JoinHandle<H>,
}

impl<H> PrivilegedContext<H> {
    /// Waits for the privileged thread to finish and returns its host.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Panicked`] if the thread panicked.
    pub fn join(self) -> Result<H, HostError> {
        self.thread.join().map_err(|_| HostError::Panicked)
    }
}

/// Consumer side of the hand-off queue, owned by the privileged context.
#[derive(Debug)]
pub struct HostInbox {
    receiver: Receiver<HostCommand>,
}

impl HostInbox {
    /// Executes every queued command without blocking and returns how many
    /// ran.
    pub fn drain<H>(&self, host: &mut H) -> usize
    where
        H: Host + ?Sized,
    {
        let mut handled = 0;
        while let Ok(command) = self.receiver.try_recv() {
            command.execute(host);
            handled += 1;
        }
        handled
    }

    /// Executes commands until every handle has been dropped.
    pub fn run<H>(&self, host: &mut H)
    where
        H: Host + ?Sized,
    {
        while let Ok(command) = self.receiver.recv() {
            command.execute(host);
        }
        debug!(target: HOST_TARGET, "all host handles dropped; privileged loop finished");
    }
}

/// Producer side of the hand-off queue, used from the network thread.
#[derive(Debug, Clone)]
pub struct HostHandle {
    sender: Sender<HostCommand>,
    reply_timeout: Duration,
}

impl HostHandle {
    /// Longest wait for a single reply.
    #[must_use]
    pub const fn reply_timeout(&self) -> Duration {
        self.reply_timeout
    }

    /// Returns a handle to the same queue with a different reply timeout.
    #[must_use]
    pub fn with_reply_timeout(&self, reply_timeout: Duration) -> Self {
        Self {
            sender: self.sender.clone(),
            reply_timeout,
        }
    }

    /// Queues a command without waiting for its answer.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Unavailable`] once the inbox has been dropped.
    pub fn submit(&self, command: HostCommand) -> Result<(), HostError> {
        let name = command.name();
        self.sender
            .send(command)
            .map_err(|_| HostError::Unavailable { command: name })
    }

    /// Queues a command and waits up to the reply timeout for its answer.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the command cannot be queued, is dropped
    /// unanswered, or the answer does not arrive in time.
    pub fn request<T, F>(&self, build: F) -> Result<T, HostError>
    where
        F: FnOnce(Sender<T>) -> HostCommand,
    {
        let (reply, answer) = mpsc::channel();
        let command = build(reply);
        let name = command.name();
        self.submit(command)?;
        answer
            .recv_timeout(self.reply_timeout)
            .map_err(|error| match error {
                RecvTimeoutError::Timeout => HostError::Timeout {
                    command: name,
                    waited: self.reply_timeout,
                },
                RecvTimeoutError::Disconnected => HostError::Dropped { command: name },
            })
    }

    /// Host version string.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn version(&self) -> Result<String, HostError> {
        self.request(HostCommand::Version)
    }

    /// Snapshot of the startup project.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn startup_project(&self) -> Result<Option<ProjectSnapshot>, HostError> {
        self.request(HostCommand::StartupProject)
    }

    /// Names of the open projects.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn projects(&self) -> Result<Vec<String>, HostError> {
        self.request(HostCommand::Projects)
    }

    /// Switches the active build configuration.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn select_build_config(&self, name: &str) -> Result<bool, HostError> {
        self.request(|reply| HostCommand::SelectBuildConfig {
            name: name.to_owned(),
            reply,
        })
    }

    /// Whether a build is running.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn is_building(&self) -> Result<bool, HostError> {
        self.request(HostCommand::IsBuilding)
    }

    /// Starts building the startup project.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn build(&self) -> Result<(), HostError> {
        self.request(HostCommand::Build)
    }

    /// Starts cleaning the startup project.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn clean(&self) -> Result<(), HostError> {
        self.request(HostCommand::Clean)
    }

    /// Triggers an action by id.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn trigger_action(&self, action_id: &str) -> Result<bool, HostError> {
        self.request(|reply| HostCommand::TriggerAction {
            action_id: action_id.to_owned(),
            reply,
        })
    }

    /// Starts the active run configuration directly.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn start_run_control(&self) -> Result<bool, HostError> {
        self.request(HostCommand::StartRunControl)
    }

    /// Opens a file in an editor.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn open_editor(&self, path: PathBuf) -> Result<bool, HostError> {
        self.request(|reply| HostCommand::OpenEditor { path, reply })
    }

    /// Paths of the open documents.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn open_documents(&self) -> Result<Vec<String>, HostError> {
        self.request(HostCommand::OpenDocuments)
    }

    /// Known session names.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn sessions(&self) -> Result<Vec<String>, HostError> {
        self.request(HostCommand::Sessions)
    }

    /// Active session name.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn active_session(&self) -> Result<String, HostError> {
        self.request(HostCommand::ActiveSession)
    }

    /// Queues a session load and returns the receiver its outcome is
    /// recorded on. Does not wait for the load.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Unavailable`] once the inbox has been dropped.
    pub fn begin_session_load(&self, name: &str) -> Result<Receiver<bool>, HostError> {
        let (outcome, recorded) = mpsc::channel();
        self.submit(HostCommand::LoadSession {
            name: name.to_owned(),
            outcome,
        })?;
        Ok(recorded)
    }

    /// Saves the active session.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn save_session(&self) -> Result<bool, HostError> {
        self.request(HostCommand::SaveSession)
    }

    /// Host diagnostics.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn diagnostics(&self) -> Result<Vec<Issue>, HostError> {
        self.request(HostCommand::Diagnostics)
    }

    /// Asks the host to exit.
    ///
    /// # Errors
    ///
    /// See [`HostHandle::request`].
    pub fn quit(&self) -> Result<(), HostError> {
        self.request(HostCommand::Quit)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::host::InMemoryHost;

    #[test]
    fn drain_runs_queued_commands_on_the_caller() {
        let (handle, inbox) = privileged_channel(Duration::from_millis(50));
        let mut host = InMemoryHost::new().with_version("9.9.9");

        let (reply, answer) = mpsc::channel();
        handle
            .submit(HostCommand::Version(reply))
            .expect("queue command");
        assert_eq!(inbox.drain(&mut host), 1);
        assert_eq!(answer.recv().expect("reply"), "9.9.9");
        assert_eq!(inbox.drain(&mut host), 0);
    }

    #[test]
    fn dropped_inbox_makes_host_unavailable() {
        let (handle, inbox) = privileged_channel(Duration::from_millis(50));
        drop(inbox);
        let error = handle.version().expect_err("host should be unavailable");
        assert!(matches!(error, HostError::Unavailable { command: "version" }));
    }

    #[test]
    fn undrained_inbox_times_out() {
        let (handle, _inbox) = privileged_channel(Duration::from_millis(30));
        let started = Instant::now();
        let error = handle.projects().expect_err("request should time out");
        assert!(matches!(error, HostError::Timeout { command: "projects", .. }));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn spawned_context_answers_and_returns_host() {
        let host = InMemoryHost::new().with_version("1.2.3");
        let (handle, context) =
            spawn_privileged_context(host, Duration::from_secs(2)).expect("spawn context");
        assert_eq!(handle.version().expect("version"), "1.2.3");
        drop(handle);
        let host = context.join().expect("join context");
        assert_eq!(host.version(), "1.2.3");
    }

    #[test]
    fn session_load_outcome_is_recorded() {
        let host = InMemoryHost::new().with_session("demo", Vec::new());
        let (handle, context) =
            spawn_privileged_context(host, Duration::from_secs(2)).expect("spawn context");
        let recorded = handle.begin_session_load("demo").expect("queue load");
        assert!(recorded.recv().expect("outcome"));
        drop(handle);
        context.join().expect("join context");
    }
}
