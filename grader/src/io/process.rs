//! Child processes with a wall-clock deadline and bounded output capture.

use std::io::{ErrorKind, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Limits applied to one child process.
#[derive(Debug, Clone, Copy)]
pub struct ProcessLimits {
    /// Maximum time before killing the child.
    pub timeout: Duration,
    /// Maximum bytes kept from each of stdout/stderr.
    pub output_limit_bytes: usize,
}

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Bytes discarded beyond the output limit.
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Run `cmd`, feeding `stdin`, and kill it once `limits.timeout` elapses.
///
/// Pipes are drained on reader threads while the child runs, so a chatty child
/// cannot block on a full pipe. The child is always reaped before returning.
#[instrument(skip_all, fields(timeout_secs = limits.timeout.as_secs(), output_limit_bytes = limits.output_limit_bytes))]
pub fn run_with_deadline(
    mut cmd: Command,
    stdin: &[u8],
    limits: ProcessLimits,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let started = Instant::now();
    let mut child = cmd.spawn().context("spawn command")?;

    let mut child_stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("stdin was not piped"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let payload = stdin.to_vec();
    let stdin_handle = thread::spawn(move || match child_stdin.write_all(&payload) {
        Err(err) if err.kind() != ErrorKind::BrokenPipe => Err(err),
        _ => Ok(()),
    });
    let limit = limits.output_limit_bytes;
    let stdout_handle = thread::spawn(move || read_limited(stdout, limit));
    let stderr_handle = thread::spawn(move || read_limited(stderr, limit));

    let mut timed_out = false;
    let status = match child.wait_timeout(limits.timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = limits.timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };
    let elapsed = started.elapsed();

    match stdin_handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(err = %err, "failed to write child stdin"),
        Err(_) => warn!("stdin writer thread panicked"),
    }
    let (stdout, stdout_truncated) = join_reader(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_reader(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, elapsed_ms = elapsed.as_millis() as u64, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
        elapsed,
    })
}

fn join_reader(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let keep = n.min(limit.saturating_sub(buf.len()));
        buf.extend_from_slice(&chunk[..keep]);
        truncated += n - keep;
    }

    Ok((buf, truncated))
}
