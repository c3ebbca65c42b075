//! Subprocess execution with captured output and cooperative cancellation
//!
//! Every external tool call goes through [`exec`]. Output is captured three
//! ways (stdout, stderr, and both interleaved in arrival order) so callers
//! can pick the stream that makes the best diagnostic.

use crate::error::{LensError, LensResult};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How long an interrupted process gets before it is killed outright.
pub const KILL_GRACE_PERIOD: Duration = Duration::from_secs(5);

const READ_CHUNK: usize = 8192;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    /// stdout and stderr interleaved in the order they were read
    pub combined: String,
    /// Exit code, -1 when the process was terminated by a signal
    pub exit_code: i32,
}

impl ExecOutput {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Options for a single process invocation
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Program followed by its arguments
    pub args: Vec<String>,
    /// Working directory (inherits ours when unset)
    pub cwd: Option<PathBuf>,
    /// Text written to the process' stdin, which is then closed
    pub stdin: Option<String>,
    /// Interrupts the process when cancelled
    pub cancel: Option<CancellationToken>,
}

impl ExecOptions {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

/// Raw bytes collected from the child's pipes
#[derive(Default)]
struct Capture {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    combined: Vec<u8>,
}

impl Capture {
    fn push_stdout(&mut self, chunk: &[u8]) {
        self.stdout.extend_from_slice(chunk);
        self.combined.extend_from_slice(chunk);
    }

    fn push_stderr(&mut self, chunk: &[u8]) {
        self.stderr.extend_from_slice(chunk);
        self.combined.extend_from_slice(chunk);
    }

    fn into_output(self, exit_code: i32) -> ExecOutput {
        ExecOutput {
            stdout: String::from_utf8_lossy(&self.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
            combined: String::from_utf8_lossy(&self.combined).into_owned(),
            exit_code,
        }
    }
}

/// Run a process to completion and capture its output.
///
/// A non-zero exit is not an error here: the caller decides what a failure
/// means for its command. Errors are reserved for processes that could not be
/// spawned or whose pipes failed, and carry whatever output was read so far.
///
/// When `cancel` fires, the process is sent SIGINT and given
/// [`KILL_GRACE_PERIOD`] to exit before it is killed.
pub async fn exec(opts: ExecOptions) -> LensResult<ExecOutput> {
    let command_line = opts.command_line();
    let (program, args) = opts
        .args
        .split_first()
        .ok_or_else(|| LensError::Internal("empty command line".to_string()))?;

    debug!("Running: {}", command_line);

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if opts.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(ref cwd) = opts.cwd {
        command.current_dir(cwd);
    }

    let mut child = command
        .spawn()
        .map_err(|e| LensError::process(command_line.clone(), ExecOutput::default(), e))?;

    let stdin_pipe = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let feed = async {
        if let (Some(mut pipe), Some(text)) = (stdin_pipe, opts.stdin.as_deref()) {
            pipe.write_all(text.as_bytes()).await?;
            pipe.shutdown().await?;
        }
        Ok::<(), std::io::Error>(())
    };

    let (fed, (capture, drained), status) = tokio::join!(
        feed,
        drain(stdout, stderr),
        wait_for_exit(&mut child, opts.cancel.as_ref()),
    );

    let status = match status {
        Ok(status) => status,
        Err(e) => return Err(LensError::process(command_line, capture.into_output(-1), e)),
    };
    let exit_code = status.code().unwrap_or(-1);

    // A process may exit without reading all of its input; its exit code still stands
    let fed = match fed {
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            debug!("{} closed stdin early", command_line);
            Ok(())
        }
        other => other,
    };

    if let Err(e) = fed.and(drained) {
        return Err(LensError::process(
            command_line,
            capture.into_output(exit_code),
            e,
        ));
    }

    debug!("{} exited with {}", command_line, exit_code);
    Ok(capture.into_output(exit_code))
}

/// Read both pipes until they close, recording chunks in arrival order.
async fn drain(
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
) -> (Capture, std::io::Result<()>) {
    let mut capture = Capture::default();
    let mut stdout = stdout;
    let mut stderr = stderr;
    let mut out_buf = vec![0u8; READ_CHUNK];
    let mut err_buf = vec![0u8; READ_CHUNK];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => match read {
                Ok(0) => stdout = None,
                Ok(n) => capture.push_stdout(&out_buf[..n]),
                Err(e) => return (capture, Err(e)),
            },
            read = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => match read {
                Ok(0) => stderr = None,
                Ok(n) => capture.push_stderr(&err_buf[..n]),
                Err(e) => return (capture, Err(e)),
            },
        }
    }

    (capture, Ok(()))
}

async fn read_chunk<R: AsyncRead + Unpin>(
    reader: &mut Option<R>,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    match reader {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Wait for the child, escalating SIGINT -> SIGKILL once `cancel` fires.
async fn wait_for_exit(
    child: &mut Child,
    cancel: Option<&CancellationToken>,
) -> std::io::Result<ExitStatus> {
    let Some(token) = cancel else {
        return child.wait().await;
    };

    tokio::select! {
        status = child.wait() => return status,
        _ = token.cancelled() => {}
    }

    debug!("Cancellation requested, interrupting pid {:?}", child.id());
    interrupt(child);

    // The kill timer only lives as long as this select: an exit first drops it.
    tokio::select! {
        status = child.wait() => status,
        _ = tokio::time::sleep(KILL_GRACE_PERIOD) => {
            warn!(
                "Process {:?} still running {:?} after interrupt, killing",
                child.id(),
                KILL_GRACE_PERIOD
            );
            if let Err(e) = child.start_kill() {
                debug!("Kill failed (process likely exited): {}", e);
            }
            child.wait().await
        }
    }
}

#[cfg(unix)]
fn interrupt(child: &mut Child) {
    if let Some(pid) = child.id() {
        // SAFETY: pid belongs to a child we have not reaped yet
        let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
        if rc != 0 {
            debug!(
                "SIGINT to {} failed: {}",
                pid,
                std::io::Error::last_os_error()
            );
        }
    }
}

#[cfg(not(unix))]
fn interrupt(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!("Kill failed (process likely exited): {}", e);
    }
}
