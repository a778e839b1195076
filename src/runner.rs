//! Git command runner
//!
//! Runs git, captures stdout and stderr as one string, and repairs exactly
//! one failure: a plain `git push` on a branch without an upstream is
//! retried once as `git push --set-upstream origin <branch>`.

use crate::process::ProcessLauncher;
use tracing::{debug, info, warn};

/// Marker git prints when a branch has no upstream configured
pub const NO_UPSTREAM_MARKER: &str = "has no upstream branch";

/// Remote used for upstream repair
pub const DEFAULT_REMOTE: &str = "origin";

/// Outcome of one git invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub succeeded: bool,
    /// stdout then stderr, invalid UTF-8 replaced
    pub output: String,
}

impl CommandResult {
    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            output: output.into(),
        }
    }
}

/// Runs git through a [`ProcessLauncher`]
pub struct GitRunner<L: ProcessLauncher> {
    launcher: L,
    git: String,
}

impl<L: ProcessLauncher> GitRunner<L> {
    pub fn new(launcher: L) -> Self {
        Self::with_program(launcher, "git")
    }

    /// Runner using a specific git executable
    pub fn with_program(launcher: L, git: impl Into<String>) -> Self {
        Self {
            launcher,
            git: git.into(),
        }
    }

    /// Run `git <args>`, repairing a missing upstream on plain `push`
    pub fn run<S: AsRef<str>>(&self, args: &[S]) -> CommandResult {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        let result = self.run_once(&args);

        if result.succeeded || !needs_upstream_repair(&args, &result.output) {
            return result;
        }

        let Some(branch) = self.current_branch() else {
            warn!("push has no upstream and the current branch could not be determined");
            return result;
        };

        info!(%branch, remote = DEFAULT_REMOTE, "setting upstream and retrying push");
        self.run_once(&upstream_push_args(&branch))
    }

    /// Name of the checked-out branch, `None` when detached or not a repo
    pub fn current_branch(&self) -> Option<String> {
        let args = ["rev-parse", "--abbrev-ref", "HEAD"].map(String::from);
        let result = self.run_once(&args);
        if !result.succeeded {
            return None;
        }
        Some(result.output.trim().to_string()).filter(|s| !s.is_empty() && s != "HEAD")
    }

    #[cfg(test)]
    pub(crate) fn launcher_for_tests(&self) -> &L {
        &self.launcher
    }

    fn run_once(&self, args: &[String]) -> CommandResult {
        match self.launcher.launch(&self.git, args, None) {
            Ok(output) => {
                debug!(?args, success = output.success, "git finished");
                CommandResult {
                    succeeded: output.success,
                    output: output.combined_lossy(),
                }
            }
            Err(e) => {
                warn!(git = %self.git, error = %e, "could not start git");
                CommandResult::failed(format!("githelp: could not run `{}`: {}", self.git, e))
            }
        }
    }
}

fn needs_upstream_repair(args: &[String], output: &str) -> bool {
    args.len() == 1 && args[0] == "push" && output.contains(NO_UPSTREAM_MARKER)
}

fn upstream_push_args(branch: &str) -> Vec<String> {
    vec![
        "push".to_string(),
        "--set-upstream".to_string(),
        DEFAULT_REMOTE.to_string(),
        branch.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::ScriptedLauncher;

    const NO_UPSTREAM: &str = "fatal: The current branch feature has no upstream branch.\n\
        To push the current branch and set the remote as upstream, use\n\n\
        \x20   git push --set-upstream origin feature\n";

    #[test]
    fn test_success_passes_through() {
        let runner = GitRunner::new(ScriptedLauncher::new().ok("On branch main\n"));
        let result = runner.run(&["status"]);
        assert!(result.succeeded);
        assert_eq!(result.output, "On branch main\n");
        assert_eq!(runner.launcher.calls.borrow()[0].program, "git");
    }

    #[test]
    fn test_failure_is_not_retried() {
        let runner = GitRunner::new(ScriptedLauncher::new().fail("error: pathspec 'x'\n"));
        let result = runner.run(&["add", "x"]);
        assert!(!result.succeeded);
        assert_eq!(result.output, "error: pathspec 'x'\n");
        assert_eq!(runner.launcher.calls.borrow().len(), 1);
    }

    #[test]
    fn test_push_without_upstream_retries_once() {
        let launcher = ScriptedLauncher::new()
            .fail(NO_UPSTREAM)
            .ok("feature\n")
            .ok("branch 'feature' set up to track 'origin/feature'.\n");
        let runner = GitRunner::new(launcher);

        let result = runner.run(&["push"]);
        assert!(result.succeeded);
        assert!(result.output.contains("set up to track"));
        assert_eq!(
            runner.launcher.arg_lists(),
            vec![
                vec!["push"],
                vec!["rev-parse", "--abbrev-ref", "HEAD"],
                vec!["push", "--set-upstream", "origin", "feature"],
            ]
        );
    }

    #[test]
    fn test_retry_failure_is_final_result() {
        let launcher = ScriptedLauncher::new()
            .fail(NO_UPSTREAM)
            .ok("feature\n")
            .fail("fatal: 'origin' does not appear to be a git repository\n");
        let runner = GitRunner::new(launcher);

        let result = runner.run(&["push"]);
        assert!(!result.succeeded);
        assert!(result.output.contains("does not appear to be a git repository"));
        assert_eq!(runner.launcher.calls.borrow().len(), 3);
    }

    #[test]
    fn test_branch_query_failure_reports_original_push_failure() {
        let launcher = ScriptedLauncher::new()
            .fail(NO_UPSTREAM)
            .fail("fatal: not a git repository\n");
        let runner = GitRunner::new(launcher);

        let result = runner.run(&["push"]);
        assert!(!result.succeeded);
        assert_eq!(result.output, NO_UPSTREAM);
        assert_eq!(runner.launcher.calls.borrow().len(), 2);
    }

    #[test]
    fn test_detached_head_gives_up() {
        let launcher = ScriptedLauncher::new().fail(NO_UPSTREAM).ok("HEAD\n");
        let runner = GitRunner::new(launcher);

        let result = runner.run(&["push"]);
        assert_eq!(result, CommandResult::failed(NO_UPSTREAM));
    }

    #[test]
    fn test_repair_only_for_plain_push() {
        let runner = GitRunner::new(ScriptedLauncher::new().fail(NO_UPSTREAM));
        let result = runner.run(&["push", "--tags"]);
        assert!(!result.succeeded);
        assert_eq!(runner.launcher.calls.borrow().len(), 1);
    }

    #[test]
    fn test_missing_git_is_a_failed_result() {
        let runner = GitRunner::with_program(ScriptedLauncher::new().not_found(), "git");
        let result = runner.run(&["status"]);
        assert!(!result.succeeded);
        assert!(result.output.starts_with("githelp: could not run `git`"));
    }

    #[test]
    fn test_current_branch() {
        let runner = GitRunner::new(ScriptedLauncher::new().ok("main\n"));
        assert_eq!(runner.current_branch(), Some("main".to_string()));
    }
}
