//! Runs one external tool with a timeout and collects its output.
//!
//! The child gets a null stdin and piped stdout/stderr. Both pipes are read
//! incrementally while waiting for exit, so a tool that writes more than a
//! pipe buffer never deadlocks. On Unix the child leads its own process
//! group; a timeout kills the whole group so grandchildren cannot keep the
//! pipes open.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::invocation::{ProcessInvocation, ProcessOutcome, Termination};

/// Limit applied when the caller does not give one (or gives zero).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for any requested timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(600);

/// How long to keep reading after exit or kill for output still in flight.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

const READ_CHUNK: usize = 8 * 1024;

/// Spawns external tools. Cheap to clone and safe to share across tasks;
/// each `run` call owns its child process exclusively.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    default_timeout: Duration,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the default limit. Zero falls back to `DEFAULT_TIMEOUT`.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = if timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            timeout.min(MAX_TIMEOUT)
        };
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// The limit actually applied for a requested timeout.
    pub fn effective_timeout(&self, requested: Option<Duration>) -> Duration {
        match requested {
            Some(timeout) if !timeout.is_zero() => timeout.min(MAX_TIMEOUT),
            _ => self.default_timeout,
        }
    }

    /// Run `invocation` to completion, timeout or launch failure.
    ///
    /// Never returns an error: every way a run can end is described by the
    /// returned outcome's `termination`.
    pub async fn run(&self, invocation: ProcessInvocation) -> ProcessOutcome {
        let timeout = self.effective_timeout(invocation.timeout);
        let started = Instant::now();

        let mut command = Command::new(&invocation.tool);
        command
            .args(&invocation.args)
            .envs(&invocation.env_overlay)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(tool = %invocation.tool, error = %e, "failed to launch tool");
                return ProcessOutcome {
                    termination: Termination::LaunchFailed {
                        reason: format!("failed to launch '{}': {e}", invocation.tool),
                    },
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                    elapsed: started.elapsed(),
                };
            }
        };

        let pid = child.id();
        debug!(
            tool = %invocation.tool,
            args = invocation.args.len(),
            pid,
            timeout_ms = timeout.as_millis() as u64,
            "tool started"
        );

        let mut streams = Streams::new(&mut child);
        let hard_deadline = tokio::time::Instant::now() + timeout;
        let deadline = tokio::time::sleep_until(hard_deadline);
        tokio::pin!(deadline);

        // `Some(code)` once the child has been reaped.
        let mut exited: Option<Option<i32>> = None;

        loop {
            if exited.is_some() && streams.closed() {
                break;
            }
            tokio::select! {
                biased;
                read = read_chunk(&mut streams.stdout_pipe, &mut streams.stdout_chunk) => {
                    absorb(read, &mut streams.stdout_pipe, &mut streams.stdout, &streams.stdout_chunk);
                }
                read = read_chunk(&mut streams.stderr_pipe, &mut streams.stderr_chunk) => {
                    absorb(read, &mut streams.stderr_pipe, &mut streams.stderr, &streams.stderr_chunk);
                }
                status = child.wait(), if exited.is_none() => {
                    let code = match status {
                        Ok(status) => status.code(),
                        Err(e) => {
                            warn!(tool = %invocation.tool, error = %e, "waiting on tool failed");
                            None
                        }
                    };
                    exited = Some(code);
                    let drain_until = (tokio::time::Instant::now() + DRAIN_GRACE).min(hard_deadline);
                    deadline.as_mut().reset(drain_until);
                }
                () = &mut deadline => break,
            }
        }

        let termination = match exited {
            Some(code) => {
                if !streams.closed() {
                    // The tool exited but something it spawned still holds a pipe.
                    debug!(tool = %invocation.tool, "descendants outlived tool, terminating group");
                    kill_group(pid);
                }
                Termination::Exited { code }
            }
            None => {
                warn!(
                    tool = %invocation.tool,
                    timeout_ms = timeout.as_millis() as u64,
                    "tool timed out, terminating"
                );
                terminate(&mut child, pid).await;
                streams.drain(DRAIN_GRACE).await;
                Termination::TimedOut { after: timeout }
            }
        };

        let outcome = ProcessOutcome {
            termination,
            stdout: streams.stdout,
            stderr: streams.stderr,
            elapsed: started.elapsed(),
        };
        debug!(
            tool = %invocation.tool,
            exit_code = outcome.exit_code(),
            timed_out = outcome.timed_out(),
            stdout_bytes = outcome.stdout.len(),
            stderr_bytes = outcome.stderr.len(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "tool finished"
        );
        outcome
    }
}

/// Output pipes of one child and what has been read from them so far.
struct Streams<O, E> {
    stdout_pipe: Option<O>,
    stderr_pipe: Option<E>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    stdout_chunk: Vec<u8>,
    stderr_chunk: Vec<u8>,
}

impl Streams<tokio::process::ChildStdout, tokio::process::ChildStderr> {
    fn new(child: &mut Child) -> Self {
        Self {
            stdout_pipe: child.stdout.take(),
            stderr_pipe: child.stderr.take(),
            stdout: Vec::new(),
            stderr: Vec::new(),
            stdout_chunk: vec![0u8; READ_CHUNK],
            stderr_chunk: vec![0u8; READ_CHUNK],
        }
    }
}

impl<O, E> Streams<O, E>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    fn closed(&self) -> bool {
        self.stdout_pipe.is_none() && self.stderr_pipe.is_none()
    }

    /// Keep reading until both pipes hit EOF or `grace` runs out.
    async fn drain(&mut self, grace: Duration) {
        let drained = tokio::time::timeout(grace, async {
            while !self.closed() {
                tokio::select! {
                    read = read_chunk(&mut self.stdout_pipe, &mut self.stdout_chunk) => {
                        absorb(read, &mut self.stdout_pipe, &mut self.stdout, &self.stdout_chunk);
                    }
                    read = read_chunk(&mut self.stderr_pipe, &mut self.stderr_chunk) => {
                        absorb(read, &mut self.stderr_pipe, &mut self.stderr, &self.stderr_chunk);
                    }
                }
            }
        })
        .await;
        if drained.is_err() {
            debug!("output pipes still open after grace period");
        }
    }
}

/// Read one chunk, or wait forever once the pipe is closed so the branch
/// never wins a `select!` again.
async fn read_chunk<R>(pipe: &mut Option<R>, chunk: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match pipe.as_mut() {
        Some(reader) => reader.read(chunk).await,
        None => std::future::pending().await,
    }
}

fn absorb<R>(read: std::io::Result<usize>, pipe: &mut Option<R>, out: &mut Vec<u8>, chunk: &[u8]) {
    match read {
        Ok(0) => *pipe = None,
        Ok(n) => out.extend_from_slice(&chunk[..n]),
        Err(e) => {
            debug!(error = %e, "reading tool output failed, closing pipe");
            *pipe = None;
        }
    }
}

/// Kill the child and its process group, then reap it.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    kill_group(pid);
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "direct kill failed (child probably gone)");
    }
    if tokio::time::timeout(DRAIN_GRACE, child.wait()).await.is_err() {
        warn!(pid, "killed tool did not exit within grace period");
    }
}

#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    let Some(pgid) = pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
        return;
    };
    // SAFETY: kill(2) takes no pointers. The negative id addresses only the
    // process group created for this child at spawn.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "process group kill failed");
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}
