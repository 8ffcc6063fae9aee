//! JSON workspace manifests used to seed the standalone host.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::{InMemoryHost, Issue, ProjectSpec};

/// Errors raised while loading a workspace manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read workspace manifest {}: {source}", path.display())]
    Read {
        /// Manifest location.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The manifest was not valid JSON or had the wrong shape.
    #[error("invalid workspace manifest {}: {source}", path.display())]
    Parse {
        /// Manifest location.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Projects, sessions and actions exposed by the standalone host.
///
/// ```json
/// {
///   "projects": [{"name": "app", "targets": [{"name": "Desktop",
///     "buildConfigs": ["Debug"], "runConfig": "app"}]}],
///   "sessions": {"release": []},
///   "actions": ["ProjectExplorer.Run"]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkspaceManifest {
    /// Version reported by `getVersion`.
    #[serde(default)]
    pub version: Option<String>,
    /// Open projects; the first is the startup project unless overridden.
    #[serde(default)]
    pub projects: Vec<ProjectSpec>,
    /// Startup project name.
    #[serde(default)]
    pub startup_project: Option<String>,
    /// Sessions and the projects each one opens.
    #[serde(default)]
    pub sessions: BTreeMap<String, Vec<ProjectSpec>>,
    /// Active session name.
    #[serde(default)]
    pub active_session: Option<String>,
    /// Documents open at startup.
    #[serde(default)]
    pub open_documents: Vec<String>,
    /// Action ids that resolve.
    #[serde(default)]
    pub actions: Vec<String>,
    /// Diagnostics reported by `listIssues`.
    #[serde(default)]
    pub diagnostics: Vec<Issue>,
}

impl WorkspaceManifest {
    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the file is unreadable or malformed.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the host described by the manifest.
    #[must_use]
    pub fn into_host(self) -> InMemoryHost {
        let mut host = InMemoryHost::new();
        if let Some(version) = self.version {
            host = host.with_version(version);
        }
        for project in self.projects {
            host = host.with_project(project);
        }
        if let Some(name) = self.startup_project {
            host = host.with_startup_project(name);
        }
        for (name, projects) in self.sessions {
            host = host.with_session(name, projects);
        }
        if let Some(name) = self.active_session {
            host = host.with_active_session(name);
        }
        for path in self.open_documents {
            host = host.with_open_document(path);
        }
        for action in self.actions {
            host = host.with_action(action);
        }
        for issue in self.diagnostics {
            host = host.with_diagnostic(issue);
        }
        host
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::host::{Host, IssueKind};

    const MANIFEST: &str = r#"{
        "version": "4.2.0",
        "projects": [
            {"name": "app", "targets": [{"name": "Desktop", "buildConfigs": ["Debug", "Release"],
              "activeBuildConfig": "Release", "runConfig": "app"}]},
            {"name": "lib"}
        ],
        "startupProject": "lib",
        "sessions": {"nightly": [{"name": "app"}]},
        "actions": ["ProjectExplorer.Run"],
        "diagnostics": [{"kind": "warning", "description": "unused", "file": "a.rs", "line": 3}]
    }"#;

    #[test]
    fn builds_host_from_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("workspace.json");
        fs::write(&path, MANIFEST).expect("write manifest");

        let mut host = WorkspaceManifest::load(&path).expect("load manifest").into_host();
        assert_eq!(host.version(), "4.2.0");
        assert_eq!(host.projects(), vec!["app", "lib"]);
        assert_eq!(
            host.startup_project().map(|project| project.name),
            Some(String::from("lib"))
        );
        assert_eq!(host.sessions(), vec!["default", "nightly"]);
        assert!(host.trigger_action("ProjectExplorer.Run"));
        let diagnostics = host.diagnostics();
        assert_eq!(diagnostics.first().map(|issue| issue.kind), Some(IssueKind::Warning));
    }

    #[test]
    fn reports_missing_file() {
        let dir = TempDir::new().expect("temp dir");
        let error = WorkspaceManifest::load(&dir.path().join("absent.json"))
            .expect_err("missing manifest should fail");
        assert!(matches!(error, ManifestError::Read { .. }));
    }

    #[test]
    fn rejects_unknown_fields() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("workspace.json");
        fs::write(&path, r#"{"projets": []}"#).expect("write manifest");
        let error = WorkspaceManifest::load(&path).expect_err("typo should fail");
        assert!(matches!(error, ManifestError::Parse { .. }));
    }
}
