//! Self-contained [`Host`] used by the standalone binary and the tests.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use super::{HOST_TARGET, Host, Issue, ProjectSnapshot, TargetSnapshot};

const DEFAULT_SESSION: &str = "default";

/// Declarative description of a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSpec {
    /// Display name.
    pub name: String,
    /// Build configuration names.
    #[serde(default)]
    pub build_configs: Vec<String>,
    /// Active build configuration; defaults to the first one.
    #[serde(default)]
    pub active_build_config: Option<String>,
    /// Active run configuration.
    #[serde(default)]
    pub run_config: Option<String>,
    /// Build directory of the active build configuration.
    #[serde(default)]
    pub build_directory: Option<PathBuf>,
}

impl TargetSpec {
    /// Creates a target with no configurations.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds build configurations.
    #[must_use]
    pub fn with_build_configs(mut self, configs: &[&str]) -> Self {
        self.build_configs
            .extend(configs.iter().map(|config| (*config).to_owned()));
        self
    }

    /// Sets the active run configuration.
    #[must_use]
    pub fn with_run_config(mut self, name: impl Into<String>) -> Self {
        self.run_config = Some(name.into());
        self
    }

    /// Sets the build directory.
    #[must_use]
    pub fn with_build_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_directory = Some(path.into());
        self
    }

    fn active_build_config(&self) -> Option<&str> {
        self.active_build_config
            .as_deref()
            .or_else(|| self.build_configs.first().map(String::as_str))
    }

    fn snapshot(&self) -> TargetSnapshot {
        TargetSnapshot {
            name: self.name.clone(),
            build_configs: self.build_configs.clone(),
            active_build_config: self.active_build_config().map(str::to_owned),
            active_run_config: self.run_config.clone(),
            build_directory: self.build_directory.clone(),
        }
    }
}

/// Declarative description of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    /// Display name.
    pub name: String,
    /// Configured targets.
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
    /// Active target name; defaults to the first target.
    #[serde(default)]
    pub active_target: Option<String>,
}

impl ProjectSpec {
    /// Creates a project with no targets.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a target.
    #[must_use]
    pub fn with_target(mut self, target: TargetSpec) -> Self {
        self.targets.push(target);
        self
    }

    fn active_index(&self) -> Option<usize> {
        match &self.active_target {
            Some(name) => self.targets.iter().position(|target| &target.name == name),
            None if self.targets.is_empty() => None,
            None => Some(0),
        }
    }

    fn active_target_mut(&mut self) -> Option<&mut TargetSpec> {
        let index = self.active_index()?;
        self.targets.get_mut(index)
    }

    fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            name: self.name.clone(),
            target_count: self.targets.len(),
            active_target: self
                .active_index()
                .and_then(|index| self.targets.get(index))
                .map(TargetSpec::snapshot),
        }
    }
}

/// Shared record of the operations an [`InMemoryHost`] performed.
#[derive(Debug, Clone, Default)]
pub struct HostJournal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl HostJournal {
    fn record(&self, entry: String) {
        info!(target: HOST_TARGET, operation = %entry, "host operation");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Every operation recorded so far, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether `entry` has been recorded.
    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|recorded| recorded == entry)
    }
}

/// In-process host holding projects, sessions and actions in memory.
///
/// Triggered operations complete immediately and are appended to a
/// [`HostJournal`]. A quit request raises the flag returned by
/// [`InMemoryHost::quit_flag`].
#[derive(Debug, Clone)]
pub struct InMemoryHost {
    version: String,
    projects: Vec<ProjectSpec>,
    startup_project: Option<String>,
    sessions: BTreeMap<String, Vec<ProjectSpec>>,
    active_session: String,
    open_documents: Vec<String>,
    actions: BTreeSet<String>,
    building: bool,
    diagnostics: Vec<Issue>,
    session_load_delay: Duration,
    journal: HostJournal,
    quit_requested: Arc<AtomicBool>,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHost {
    /// Creates an empty host with only the default session.
    #[must_use]
    pub fn new() -> Self {
        let mut sessions = BTreeMap::new();
        sessions.insert(DEFAULT_SESSION.to_owned(), Vec::new());
        Self {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            projects: Vec::new(),
            startup_project: None,
            sessions,
            active_session: DEFAULT_SESSION.to_owned(),
            open_documents: Vec::new(),
            actions: BTreeSet::new(),
            building: false,
            diagnostics: Vec::new(),
            session_load_delay: Duration::ZERO,
            journal: HostJournal::default(),
            quit_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Overrides the reported version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Opens a project. The first project becomes the startup project.
    #[must_use]
    pub fn with_project(mut self, project: ProjectSpec) -> Self {
        if self.startup_project.is_none() {
            self.startup_project = Some(project.name.clone());
        }
        self.projects.push(project);
        self
    }

    /// Selects the startup project by name.
    #[must_use]
    pub fn with_startup_project(mut self, name: impl Into<String>) -> Self {
        self.startup_project = Some(name.into());
        self
    }

    /// Registers a session and the projects it opens.
    #[must_use]
    pub fn with_session(mut self, name: impl Into<String>, projects: Vec<ProjectSpec>) -> Self {
        self.sessions.insert(name.into(), projects);
        self
    }

    /// Marks a session as active.
    #[must_use]
    pub fn with_active_session(mut self, name: impl Into<String>) -> Self {
        self.active_session = name.into();
        self
    }

    /// Registers an action id that [`Host::trigger_action`] resolves.
    #[must_use]
    pub fn with_action(mut self, action_id: impl Into<String>) -> Self {
        self.actions.insert(action_id.into());
        self
    }

    /// Records a document as already open.
    #[must_use]
    pub fn with_open_document(mut self, path: impl Into<String>) -> Self {
        self.open_documents.push(path.into());
        self
    }

    /// Adds a diagnostic.
    #[must_use]
    pub fn with_diagnostic(mut self, issue: Issue) -> Self {
        self.diagnostics.push(issue);
        self
    }

    /// Reports a build as running.
    #[must_use]
    pub const fn with_building(mut self, building: bool) -> Self {
        self.building = building;
        self
    }

    /// Delays every session load, as a slow host would.
    #[must_use]
    pub const fn with_session_load_delay(mut self, delay: Duration) -> Self {
        self.session_load_delay = delay;
        self
    }

    /// Journal shared with every clone of this host.
    #[must_use]
    pub fn journal(&self) -> HostJournal {
        self.journal.clone()
    }

    /// Flag raised when a client asks the host to quit.
    #[must_use]
    pub fn quit_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.quit_requested)
    }

    fn startup(&self) -> Option<&ProjectSpec> {
        let name = self.startup_project.as_deref()?;
        self.projects.iter().find(|project| project.name == name)
    }

    fn startup_mut(&mut self) -> Option<&mut ProjectSpec> {
        let name = self.startup_project.as_deref()?;
        self.projects.iter_mut().find(|project| project.name == name)
    }
}

impl Host for InMemoryHost {
    fn version(&self) -> String {
        self.version.clone()
    }

    fn startup_project(&self) -> Option<ProjectSnapshot> {
        self.startup().map(ProjectSpec::snapshot)
    }

    fn projects(&self) -> Vec<String> {
        self.projects
            .iter()
            .map(|project| project.name.clone())
            .collect()
    }

    fn select_build_config(&mut self, name: &str) -> bool {
        let Some(target) = self.startup_mut().and_then(ProjectSpec::active_target_mut) else {
            return false;
        };
        if !target.build_configs.iter().any(|config| config == name) {
            return false;
        }
        target.active_build_config = Some(name.to_owned());
        self.journal.record(format!("select-build-config:{name}"));
        true
    }

    fn is_building(&self) -> bool {
        self.building
    }

    fn build_startup_project(&mut self) {
        self.journal.record(String::from("build"));
    }

    fn clean_startup_project(&mut self) {
        self.journal.record(String::from("clean"));
    }

    fn trigger_action(&mut self, action_id: &str) -> bool {
        if !self.actions.contains(action_id) {
            return false;
        }
        self.journal.record(format!("action:{action_id}"));
        true
    }

    fn start_run_control(&mut self) -> bool {
        let runnable = self
            .startup()
            .map(ProjectSpec::snapshot)
            .is_some_and(|project| project.runnable().is_some());
        if runnable {
            self.journal.record(String::from("run-control"));
        }
        runnable
    }

    fn open_editor(&mut self, path: &Path) -> bool {
        let display = path.display().to_string();
        if !self.open_documents.contains(&display) {
            self.open_documents.push(display.clone());
        }
        self.journal.record(format!("open:{display}"));
        true
    }

    fn open_documents(&self) -> Vec<String> {
        self.open_documents.clone()
    }

    fn sessions(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    fn active_session(&self) -> String {
        self.active_session.clone()
    }

    fn load_session(&mut self, name: &str) -> bool {
        if !self.session_load_delay.is_zero() {
            thread::sleep(self.session_load_delay);
        }
        let Some(projects) = self.sessions.get(name).cloned() else {
            return false;
        };
        self.startup_project = projects.first().map(|project| project.name.clone());
        self.projects = projects;
        name.clone_into(&mut self.active_session);
        self.journal.record(format!("load-session:{name}"));
        true
    }

    fn save_session(&mut self) -> bool {
        self.sessions
            .insert(self.active_session.clone(), self.projects.clone());
        self.journal
            .record(format!("save-session:{}", self.active_session));
        true
    }

    fn diagnostics(&self) -> Vec<Issue> {
        self.diagnostics.clone()
    }

    fn request_quit(&mut self) {
        self.quit_requested.store(true, Ordering::SeqCst);
        self.journal.record(String::from("quit"));
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn host() -> InMemoryHost {
        InMemoryHost::new()
            .with_project(
                ProjectSpec::new("app").with_target(
                    TargetSpec::new("Desktop")
                        .with_build_configs(&["Debug", "Release"])
                        .with_run_config("app"),
                ),
            )
            .with_project(ProjectSpec::new("lib"))
            .with_session("other", vec![ProjectSpec::new("tool")])
    }

    #[rstest]
    fn first_project_is_startup(host: InMemoryHost) {
        let project = host.startup_project().expect("startup project");
        assert_eq!(project.name, "app");
        assert_eq!(project.target_count, 1);
        assert_eq!(project.buildable().map(|(_, config)| config), Some("Debug"));
        assert_eq!(host.projects(), vec!["app", "lib"]);
    }

    #[rstest]
    fn selects_known_build_config_only(mut host: InMemoryHost) {
        assert!(host.select_build_config("Release"));
        assert!(!host.select_build_config("Profile"));
        let project = host.startup_project().expect("startup project");
        assert_eq!(project.buildable().map(|(_, config)| config), Some("Release"));
        assert!(host.journal().contains("select-build-config:Release"));
    }

    #[rstest]
    fn unregistered_actions_do_not_resolve(host: InMemoryHost) {
        let mut host = host.with_action("ProjectExplorer.Run");
        assert!(!host.trigger_action("Debugger.Stop"));
        assert!(host.trigger_action("ProjectExplorer.Run"));
        assert_eq!(host.journal().entries(), vec!["action:ProjectExplorer.Run"]);
    }

    #[rstest]
    fn loading_a_session_replaces_projects(mut host: InMemoryHost) {
        assert!(host.load_session("other"));
        assert_eq!(host.projects(), vec!["tool"]);
        assert_eq!(host.active_session(), "other");
        assert_eq!(
            host.startup_project().map(|project| project.name),
            Some(String::from("tool"))
        );
        assert!(!host.load_session("missing"));
    }

    #[rstest]
    fn saving_captures_current_projects(mut host: InMemoryHost) {
        assert!(host.save_session());
        assert!(host.load_session("default"));
        assert_eq!(host.projects(), vec!["app", "lib"]);
    }

    #[rstest]
    fn quit_raises_flag(mut host: InMemoryHost) {
        let flag = host.quit_flag();
        host.request_quit();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[rstest]
    fn open_editor_tracks_documents_once(mut host: InMemoryHost) {
        assert!(host.open_editor(Path::new("/tmp/a.rs")));
        assert!(host.open_editor(Path::new("/tmp/a.rs")));
        assert_eq!(host.open_documents(), vec!["/tmp/a.rs"]);
    }
}
