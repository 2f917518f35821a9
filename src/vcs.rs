//! Version-control collaborator.
//!
//! Each operation reports `Ok(false)` when git ran but did not succeed (the
//! stderr is logged) and `Err` only when git could not be spawned at all.
//! Nothing here retries or rolls back.

use crate::exceptions::PatchError;
use crate::models::ShipReport;
use std::path::PathBuf;
use std::process::{Command, Output};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageSpec {
    All,
    Paths(Vec<PathBuf>),
}

impl StageSpec {
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        if paths.is_empty() {
            StageSpec::All
        } else {
            StageSpec::Paths(paths)
        }
    }
}

pub trait VersionControl {
    fn stage(&self, spec: &StageSpec) -> Result<bool, PatchError>;
    fn commit(&self, message: &str) -> Result<bool, PatchError>;
    fn push(&self, remote: &str, branch: &str) -> Result<bool, PatchError>;
}

/// What `ship` should do after the working tree has been patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipPlan {
    pub stage: StageSpec,
    pub message: String,
    /// `(remote, branch)` to push to, if pushing at all.
    pub push: Option<(String, String)>,
}

/// Stage, commit, and optionally push. A failed step skips the ones after it.
pub fn ship(vcs: &dyn VersionControl, plan: &ShipPlan) -> Result<ShipReport, PatchError> {
    let mut report = ShipReport {
        staged: vcs.stage(&plan.stage)?,
        ..Default::default()
    };
    if !report.staged {
        warn!("staging failed, skipping commit and push");
        return Ok(report);
    }

    let committed = vcs.commit(&plan.message)?;
    report.committed = Some(committed);
    if !committed {
        return Ok(report);
    }

    if let Some((remote, branch)) = &plan.push {
        report.pushed = Some(vcs.push(remote, branch)?);
    }

    Ok(report)
}

/// `git` subprocess adapter rooted at a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// True if there is anything staged for commit.
    pub fn has_staged_changes(&self) -> Result<bool, PatchError> {
        let out = self.run(&["diff", "--cached", "--name-only"])?;
        Ok(!String::from_utf8_lossy(&out.stdout).trim().is_empty())
    }

    fn run_status(&self, args: &[&str]) -> Result<bool, PatchError> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                command = %args.join(" "),
                code = output.status.code().unwrap_or(-1),
                stderr = %stderr.trim(),
                "git command failed"
            );
            return Ok(false);
        }
        Ok(true)
    }

    fn run(&self, args: &[&str]) -> Result<Output, PatchError> {
        debug!(command = %args.join(" "), "running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| PatchError::Vcs(format!("failed to spawn git {}: {}", args.join(" "), e)))
    }
}

impl VersionControl for Git {
    #[instrument(skip_all)]
    fn stage(&self, spec: &StageSpec) -> Result<bool, PatchError> {
        match spec {
            StageSpec::All => self.run_status(&["add", "-A"]),
            StageSpec::Paths(paths) => {
                let path_strs: Vec<String> = paths
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect();
                let mut args = vec!["add", "--"];
                args.extend(path_strs.iter().map(String::as_str));
                self.run_status(&args)
            }
        }
    }

    /// Returns `Ok(false)` without committing when nothing is staged.
    #[instrument(skip_all)]
    fn commit(&self, message: &str) -> Result<bool, PatchError> {
        if !self.has_staged_changes()? {
            info!("nothing staged, skipping commit");
            return Ok(false);
        }
        self.run_status(&["commit", "-m", message])
    }

    #[instrument(skip_all, fields(%remote, %branch))]
    fn push(&self, remote: &str, branch: &str) -> Result<bool, PatchError> {
        self.run_status(&["push", remote, branch])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeVcs {
        stage_ok: bool,
        commit_ok: bool,
        push_ok: bool,
        calls: RefCell<Vec<String>>,
    }

    impl VersionControl for FakeVcs {
        fn stage(&self, spec: &StageSpec) -> Result<bool, PatchError> {
            self.calls.borrow_mut().push(format!("stage {:?}", spec));
            Ok(self.stage_ok)
        }

        fn commit(&self, message: &str) -> Result<bool, PatchError> {
            self.calls.borrow_mut().push(format!("commit {}", message));
            Ok(self.commit_ok)
        }

        fn push(&self, remote: &str, branch: &str) -> Result<bool, PatchError> {
            self.calls
                .borrow_mut()
                .push(format!("push {} {}", remote, branch));
            Ok(self.push_ok)
        }
    }

    fn plan(push: bool) -> ShipPlan {
        ShipPlan {
            stage: StageSpec::All,
            message: "msg".into(),
            push: push.then(|| ("origin".to_string(), "main".to_string())),
        }
    }

    #[test]
    fn test_ship_runs_all_steps_in_order() {
        let vcs = FakeVcs {
            stage_ok: true,
            commit_ok: true,
            push_ok: true,
            ..Default::default()
        };
        let report = ship(&vcs, &plan(true)).unwrap();
        assert!(report.succeeded());
        assert_eq!(
            *vcs.calls.borrow(),
            vec!["stage All", "commit msg", "push origin main"]
        );
    }

    #[test]
    fn test_ship_stops_after_failed_stage() {
        let vcs = FakeVcs::default();
        let report = ship(&vcs, &plan(true)).unwrap();
        assert!(!report.staged);
        assert_eq!(report.committed, None);
        assert_eq!(report.pushed, None);
        assert!(!report.succeeded());
        assert_eq!(vcs.calls.borrow().len(), 1);
    }

    #[test]
    fn test_ship_reports_failed_push_without_retry() {
        let vcs = FakeVcs {
            stage_ok: true,
            commit_ok: true,
            push_ok: false,
            ..Default::default()
        };
        let report = ship(&vcs, &plan(true)).unwrap();
        assert_eq!(report.pushed, Some(false));
        assert!(!report.succeeded());
        assert_eq!(vcs.calls.borrow().len(), 3);
    }

    #[test]
    fn test_ship_without_push_leaves_push_unset() {
        let vcs = FakeVcs {
            stage_ok: true,
            commit_ok: true,
            ..Default::default()
        };
        let report = ship(&vcs, &plan(false)).unwrap();
        assert_eq!(report.pushed, None);
        assert!(report.succeeded());
    }

    #[test]
    fn test_stage_spec_from_empty_paths_is_all() {
        assert_eq!(StageSpec::from_paths(vec![]), StageSpec::All);
        assert_eq!(
            StageSpec::from_paths(vec![PathBuf::from("src")]),
            StageSpec::Paths(vec![PathBuf::from("src")])
        );
    }
}
