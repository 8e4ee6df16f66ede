//! Integration tests for the command executor.
//!
//! These run real child processes through `/bin/sh`, so they are Unix-only.
#![cfg(unix)]

use std::time::{Duration, Instant};

use toolvault::executor::{CommandExecutor, ProcessInvocation, Termination};

fn sh(script: &str) -> ProcessInvocation {
    ProcessInvocation::new("sh").args(["-c", script])
}

#[tokio::test]
async fn captures_stdout_and_zero_exit() {
    let outcome = CommandExecutor::new().run(sh("printf 'hello world'")).await;
    assert_eq!(outcome.termination, Termination::Exited { code: Some(0) });
    assert_eq!(outcome.stdout, b"hello world");
    assert!(outcome.stderr.is_empty());
}

#[tokio::test]
async fn keeps_streams_separate() {
    let outcome = CommandExecutor::new()
        .run(sh("echo to-out; echo to-err >&2; exit 1"))
        .await;
    assert_eq!(outcome.exit_code(), Some(1));
    assert_eq!(outcome.stdout_text(), "to-out\n");
    assert_eq!(outcome.stderr_text(), "to-err\n");
}

#[tokio::test]
async fn passes_arguments_without_a_shell() {
    let outcome = CommandExecutor::new()
        .run(
            ProcessInvocation::new("sh")
                .args(["-c", "printf '%s|' \"$@\"", "sh"])
                .args(["two words", "$HOME", "; rm -rf /"]),
        )
        .await;
    assert_eq!(outcome.stdout_text(), "two words|$HOME|; rm -rf /|");
}

#[tokio::test]
async fn env_overlay_beats_ambient_environment() {
    // PATH is always present in the ambient environment.
    let outcome = CommandExecutor::new()
        .run(
            ProcessInvocation::new("/bin/sh")
                .args(["-c", "printf '%s/%s' \"$PATH\" \"$TOOLVAULT_TEST_TOKEN\""])
                .env("PATH", "/overlay/bin:/usr/bin:/bin")
                .env("TOOLVAULT_TEST_TOKEN", "s3cret"),
        )
        .await;
    assert_eq!(outcome.stdout_text(), "/overlay/bin:/usr/bin:/bin/s3cret");
}

#[tokio::test]
async fn ambient_environment_is_inherited() {
    let outcome = CommandExecutor::new().run(sh("printf '%s' \"$HOME\"")).await;
    let home = std::env::var("HOME").unwrap_or_default();
    assert_eq!(outcome.stdout_text(), home);
}

#[tokio::test]
async fn captures_output_larger_than_pipe_buffer() {
    // ~1 MiB on stdout and ~256 KiB on stderr, far beyond a 64 KiB pipe.
    let script = "head -c 1048576 /dev/zero | tr '\\0' 'a'; head -c 262144 /dev/zero | tr '\\0' 'b' >&2";
    let outcome = CommandExecutor::new().run(sh(script)).await;

    assert_eq!(outcome.exit_code(), Some(0));
    assert_eq!(outcome.stdout.len(), 1_048_576);
    assert!(outcome.stdout.iter().all(|&b| b == b'a'));
    assert_eq!(outcome.stderr.len(), 262_144);
}

#[tokio::test]
async fn timeout_kills_and_keeps_partial_output() {
    let started = Instant::now();
    let outcome = CommandExecutor::new()
        .run(sh("echo started; echo warming-up >&2; sleep 30; echo never").timeout(Duration::from_millis(500)))
        .await;

    assert!(outcome.timed_out());
    assert_eq!(outcome.exit_code(), None);
    assert_eq!(outcome.stdout_text(), "started\n");
    assert_eq!(outcome.stderr_text(), "warming-up\n");
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn timeout_also_stops_grandchildren_holding_the_pipe() {
    let started = Instant::now();
    let outcome = CommandExecutor::new()
        .run(sh("sleep 30 & sleep 30").timeout(Duration::from_millis(300)))
        .await;
    assert!(outcome.timed_out());
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn background_child_does_not_hang_a_finished_tool() {
    // The tool exits at once but leaves a child holding stdout open.
    let started = Instant::now();
    let outcome = CommandExecutor::new()
        .run(sh("echo done; sleep 30 &").timeout(Duration::from_secs(10)))
        .await;
    assert_eq!(outcome.exit_code(), Some(0));
    assert_eq!(outcome.stdout_text(), "done\n");
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn signal_exit_has_no_code() {
    let outcome = CommandExecutor::new().run(sh("kill -9 $$")).await;
    assert_eq!(outcome.termination, Termination::Exited { code: None });
    assert!(!outcome.timed_out());
}

#[tokio::test]
async fn missing_tool_is_launch_failure() {
    let outcome = CommandExecutor::new()
        .run(ProcessInvocation::new("/nonexistent/toolvault-test-tool"))
        .await;
    let reason = outcome.launch_error().expect("launch error");
    assert!(reason.contains("/nonexistent/toolvault-test-tool"));
    assert!(!outcome.timed_out());
    assert!(outcome.elapsed < Duration::from_secs(1));
}

#[tokio::test]
async fn working_dir_is_applied() {
    let dir = tempfile::TempDir::new().unwrap();
    let outcome = CommandExecutor::new()
        .run(sh("pwd").working_dir(dir.path()))
        .await;
    let printed = std::fs::canonicalize(outcome.stdout_text().trim()).unwrap();
    assert_eq!(printed, std::fs::canonicalize(dir.path()).unwrap());
}

#[tokio::test]
async fn stdin_is_closed() {
    // `cat` on a null stdin sees EOF immediately instead of blocking.
    let outcome = CommandExecutor::new()
        .run(ProcessInvocation::new("cat").timeout(Duration::from_secs(5)))
        .await;
    assert_eq!(outcome.exit_code(), Some(0));
    assert!(outcome.stdout.is_empty());
}

#[tokio::test]
async fn concurrent_runs_do_not_interfere() {
    let executor = CommandExecutor::new();
    let runs = (0..8).map(|i| {
        let executor = executor.clone();
        tokio::spawn(async move {
            let outcome = executor
                .run(
                    sh("sleep 0.1; printf '%s' \"$RUN_ID\"; exit \"$RUN_ID\"")
                        .env("RUN_ID", i.to_string()),
                )
                .await;
            (i, outcome)
        })
    });

    for handle in runs.collect::<Vec<_>>() {
        let (i, outcome) = handle.await.unwrap();
        assert_eq!(outcome.stdout_text(), i.to_string());
        assert_eq!(outcome.exit_code(), Some(i));
    }
}
