//! Request and result types for one external process run.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Everything needed to run one external tool.
///
/// Built per request and consumed by `CommandExecutor::run`; never shared.
#[derive(Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    /// Program name (looked up on `PATH`) or path to the tool.
    pub tool: String,
    /// Positional arguments, passed without a shell.
    pub args: Vec<String>,
    /// Variables layered over the ambient environment (these win).
    pub env_overlay: BTreeMap<String, String>,
    /// Wall-clock limit; `None` means the executor default.
    pub timeout: Option<Duration>,
    /// Working directory; `None` inherits the caller's.
    pub working_dir: Option<PathBuf>,
}

impl ProcessInvocation {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            args: Vec::new(),
            env_overlay: BTreeMap::new(),
            timeout: None,
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overlay.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, overlay: BTreeMap<String, String>) -> Self {
        self.env_overlay.extend(overlay);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

// The overlay usually carries tokens, so only its keys are printed.
impl std::fmt::Debug for ProcessInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessInvocation")
            .field("tool", &self.tool)
            .field("args", &self.args)
            .field("env_overlay", &self.env_overlay.keys().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .field("working_dir", &self.working_dir)
            .finish()
    }
}

/// How a run ended. Exactly one of these holds per outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The process exited on its own. `code` is `None` when it was
    /// killed by a signal.
    Exited { code: Option<i32> },
    /// The timeout elapsed first and the process was killed.
    TimedOut { after: Duration },
    /// The process could not be started at all.
    LaunchFailed { reason: String },
}

/// Raw result of running a `ProcessInvocation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub termination: Termination,
    /// Everything read from stdout, including partial output on timeout.
    pub stdout: Vec<u8>,
    /// Everything read from stderr, including partial output on timeout.
    pub stderr: Vec<u8>,
    pub elapsed: Duration,
}

impl ProcessOutcome {
    /// Exit code of a normally exited process.
    pub fn exit_code(&self) -> Option<i32> {
        match self.termination {
            Termination::Exited { code } => code,
            _ => None,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.termination, Termination::TimedOut { .. })
    }

    pub fn launch_error(&self) -> Option<&str> {
        match &self.termination {
            Termination::LaunchFailed { reason } => Some(reason),
            _ => None,
        }
    }

    /// `true` only for a normal exit with code 0.
    pub fn success(&self) -> bool {
        self.exit_code() == Some(0)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// stdout followed by stderr, for diagnostics. `None` if both are empty.
    pub fn combined_output(&self) -> Option<String> {
        let stdout = self.stdout_text();
        let stderr = self.stderr_text();
        match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
            (true, true) => None,
            (false, true) => Some(stdout),
            (true, false) => Some(stderr),
            (false, false) => {
                let mut combined = stdout;
                if !combined.ends_with('\n') {
                    combined.push('\n');
                }
                combined.push_str(&stderr);
                Some(combined)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(termination: Termination, stdout: &str, stderr: &str) -> ProcessOutcome {
        ProcessOutcome {
            termination,
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn builder_collects_args_and_env() {
        let inv = ProcessInvocation::new("tam-rfe")
            .arg("check")
            .args(["acme", "--verbose"])
            .env("JIRA_TOKEN", "t0k")
            .timeout(Duration::from_secs(2));
        assert_eq!(inv.args, vec!["check", "acme", "--verbose"]);
        assert_eq!(inv.env_overlay["JIRA_TOKEN"], "t0k");
        assert_eq!(inv.timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn debug_hides_env_values() {
        let inv = ProcessInvocation::new("tool").env("PORTAL_TOKEN", "hunter2");
        let printed = format!("{inv:?}");
        assert!(printed.contains("PORTAL_TOKEN"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn accessors_follow_termination() {
        let exited = outcome(Termination::Exited { code: Some(0) }, "", "");
        assert!(exited.success());
        assert!(!exited.timed_out());
        assert!(exited.launch_error().is_none());

        let timed_out = outcome(
            Termination::TimedOut {
                after: Duration::from_secs(1),
            },
            "",
            "",
        );
        assert!(timed_out.timed_out());
        assert_eq!(timed_out.exit_code(), None);

        let failed = outcome(
            Termination::LaunchFailed {
                reason: "not found".into(),
            },
            "",
            "",
        );
        assert_eq!(failed.launch_error(), Some("not found"));
        assert!(!failed.success());
    }

    #[test]
    fn combined_output_joins_streams() {
        let o = outcome(Termination::Exited { code: Some(1) }, "out", "err\n");
        assert_eq!(o.combined_output().unwrap(), "out\nerr\n");

        let empty = outcome(Termination::Exited { code: Some(1) }, "", "  ");
        assert!(empty.combined_output().is_none());
    }
}
