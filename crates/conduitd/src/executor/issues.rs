//! Assembly of the `listIssues` report.

use crate::host::{Issue, ProjectSnapshot};

const BUILD_IN_PROGRESS: &str = "INFO:Build in progress - issues may not be current";
const NO_ISSUES: &str = "INFO:No issues reported";

/// Builds the issue lines: build state, then the first project status
/// warning, then host diagnostics. Never returns an empty list.
pub(super) fn collect(
    building: bool,
    project: Option<&ProjectSnapshot>,
    diagnostics: &[Issue],
) -> Vec<String> {
    let mut issues = Vec::new();
    if building {
        issues.push(BUILD_IN_PROGRESS.to_owned());
    }
    if let Some(warning) = status_warning(project) {
        issues.push(warning);
    }
    issues.extend(diagnostics.iter().map(ToString::to_string));
    if issues.is_empty() {
        issues.push(NO_ISSUES.to_owned());
    }
    issues
}

fn status_warning(project: Option<&ProjectSnapshot>) -> Option<String> {
    let Some(project) = project else {
        return Some(String::from("WARNING:No active project found"));
    };
    if project.target_count == 0 {
        return Some(String::from("WARNING:Project has no build targets configured"));
    }
    let Some(target) = project.active_target.as_ref() else {
        return Some(String::from("WARNING:No active build target"));
    };
    if target.build_configs.is_empty() {
        return Some(String::from("WARNING:No build configurations found"));
    }
    if target.active_build_config.is_none() {
        return Some(String::from("WARNING:No active build configuration"));
    }
    match target.build_directory.as_deref() {
        Some(directory) if !directory.exists() => Some(format!(
            "WARNING:Build directory does not exist:{}",
            directory.display()
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;
    use crate::host::{IssueKind, TargetSnapshot};

    #[fixture]
    fn healthy() -> ProjectSnapshot {
        ProjectSnapshot {
            name: String::from("app"),
            target_count: 1,
            active_target: Some(TargetSnapshot {
                name: String::from("Desktop"),
                build_configs: vec![String::from("Debug")],
                active_build_config: Some(String::from("Debug")),
                active_run_config: None,
                build_directory: None,
            }),
        }
    }

    #[rstest]
    fn healthy_project_without_diagnostics_reports_nothing(healthy: ProjectSnapshot) {
        assert_eq!(collect(false, Some(&healthy), &[]), vec![NO_ISSUES]);
    }

    #[test]
    fn missing_project_is_a_warning() {
        assert_eq!(
            collect(false, None, &[]),
            vec!["WARNING:No active project found"]
        );
    }

    #[rstest]
    fn build_in_progress_comes_first(healthy: ProjectSnapshot) {
        let issue = Issue {
            kind: IssueKind::Error,
            description: String::from("expected `;`"),
            file: Some(String::from("src/main.rs")),
            line: Some(4),
        };
        assert_eq!(
            collect(true, Some(&healthy), &[issue]),
            vec![
                BUILD_IN_PROGRESS,
                "ERROR:expected `;` [src/main.rs:4]",
            ]
        );
    }

    #[rstest]
    fn reports_only_the_first_status_problem(mut healthy: ProjectSnapshot) {
        healthy.target_count = 0;
        healthy.active_target = None;
        assert_eq!(
            collect(false, Some(&healthy), &[]),
            vec!["WARNING:Project has no build targets configured"]
        );
    }

    #[rstest]
    fn missing_build_directory_is_reported(mut healthy: ProjectSnapshot) {
        let dir = TempDir::new().expect("temp dir");
        let missing = dir.path().join("build-debug");
        if let Some(target) = healthy.active_target.as_mut() {
            target.build_directory = Some(missing.clone());
        }
        assert_eq!(
            collect(false, Some(&healthy), &[]),
            vec![format!(
                "WARNING:Build directory does not exist:{}",
                missing.display()
            )]
        );
    }

    #[rstest]
    fn existing_build_directory_is_fine(mut healthy: ProjectSnapshot) {
        let dir = TempDir::new().expect("temp dir");
        if let Some(target) = healthy.active_target.as_mut() {
            target.build_directory = Some(dir.path().to_path_buf());
        }
        assert_eq!(collect(false, Some(&healthy), &[]), vec![NO_ISSUES]);
    }
}
