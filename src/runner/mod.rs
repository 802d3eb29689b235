// ============================================================================
// File: scriptpad/src/runner/mod.rs
// ----------------------------------------------------------------------------
// Process runner: launches an interpreter, feeds it stdin, collects stdout and
// stderr into one buffer and enforces a wall-clock deadline.
//
// Provides:
// - Concurrent draining of both output pipes in arrival order
// - Deadline enforcement with forced teardown of the process (group)
// - Guaranteed reaping of the child before a result is returned
// ============================================================================

mod state;


pub use state::{Lifecycle, RunState};

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;

use crate::config::DEFAULT_TIMEOUT_MS;
use crate::error::ExecError;

/// How long to wait for a killed process to be reaped
const KILL_GRACE: Duration = Duration::from_secs(2);

const READ_CHUNK: usize = 8 * 1024;

/// Terminal result of one run
#[derive(Debug)]
pub enum RunOutcome {
    /// The process exited on its own; `output` is stdout and stderr merged
    Completed {
        output: String,
        exit_code: Option<i32>,
        elapsed: Duration,
    },
    /// The deadline fired and the process was killed
    TimedOut { elapsed: Duration },
    /// No process was created
    LaunchFailed { error: ExecError },
}

impl RunOutcome {
    pub fn state(&self) -> RunState {
        match self {
            RunOutcome::Completed { .. } => RunState::Completed,
            RunOutcome::TimedOut { .. } => RunState::TimedOut,
            RunOutcome::LaunchFailed { .. } => RunState::LaunchFailed,
        }
    }
}

/// Runs interpreter processes under a fixed deadline
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `program` with `args`, writing `stdin` to it
    ///
    /// Never hangs past the deadline: on expiry the process is killed and
    /// [`RunOutcome::TimedOut`] is returned without any partial output.
    pub async fn run(&self, program: &Path, args: &[OsString], stdin: &str) -> RunOutcome {
        let label = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.display().to_string());
        let mut lifecycle = Lifecycle::new(label);

        let mut process = match RunningProcess::launch(program, args, stdin, self.timeout) {
            Ok(process) => process,
            Err(error) => {
                error!("{}", error);
                lifecycle.advance(RunState::LaunchFailed);
                return RunOutcome::LaunchFailed { error };
            }
        };
        lifecycle.advance(RunState::Running);

        match process.wait_until_deadline().await {
            Some(Ok(status)) => {
                lifecycle.advance(RunState::Completed);
                let elapsed = process.elapsed();
                info!(
                    "{} exited with {} after {:?}",
                    program.display(),
                    status,
                    elapsed
                );
                RunOutcome::Completed {
                    output: process.take_output(),
                    exit_code: status.code(),
                    elapsed,
                }
            }
            Some(Err(e)) => {
                // The OS lost track of the child; treat it like a finished run
                // with whatever was captured.
                warn!("Waiting on {} failed: {}", program.display(), e);
                process.terminate().await;
                lifecycle.advance(RunState::Completed);
                RunOutcome::Completed {
                    output: process.take_output(),
                    exit_code: None,
                    elapsed: process.elapsed(),
                }
            }
            None => {
                warn!(
                    "{} exceeded the {:?} deadline, terminating",
                    program.display(),
                    self.timeout
                );
                process.terminate().await;
                lifecycle.advance(RunState::TimedOut);
                RunOutcome::TimedOut {
                    elapsed: process.elapsed(),
                }
            }
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }
}

type SharedBuffer = Arc<Mutex<String>>;

/// A live child process with its pipe tasks and deadline
struct RunningProcess {
    program: PathBuf,
    child: Child,
    /// Process group of the child (its pid), kept after the child is reaped
    pgid: Option<u32>,
    stdin_writer: Option<JoinHandle<()>>,
    readers: Vec<JoinHandle<()>>,
    buffer: SharedBuffer,
    started: Instant,
    deadline: tokio::time::Instant,
}

impl RunningProcess {
    fn launch(
        program: &Path,
        args: &[OsString],
        stdin: &str,
        timeout: Duration,
    ) -> Result<Self, ExecError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so teardown reaches anything the script forks.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.to_path_buf(),
            source,
        })?;
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + timeout;
        debug!("Spawned {} (pid {:?})", program.display(), child.id());

        let stdin_writer = child
            .stdin
            .take()
            .map(|pipe| tokio::spawn(feed_stdin(pipe, stdin.as_bytes().to_vec())));

        let buffer: SharedBuffer = Arc::new(Mutex::new(String::new()));
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(drain(stdout, Arc::clone(&buffer))));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(drain(stderr, Arc::clone(&buffer))));
        }

        let pgid = child.id();

        Ok(Self {
            program: program.to_path_buf(),
            child,
            pgid,
            stdin_writer,
            readers,
            buffer,
            started,
            deadline,
        })
    }

    /// Wait for exit and for both pipes to reach EOF
    ///
    /// `None` means the deadline passed first.
    async fn wait_until_deadline(&mut self) -> Option<std::io::Result<ExitStatus>> {
        let child = &mut self.child;
        let readers = &mut self.readers;

        let finished = async move {
            let status = child.wait().await?;
            for reader in readers.iter_mut() {
                if let Err(e) = reader.await {
                    debug!("Output reader ended abnormally: {}", e);
                }
            }
            Ok::<_, std::io::Error>(status)
        };

        tokio::time::timeout_at(self.deadline, finished).await.ok()
    }

    /// Close stdin, kill the process (group) and reap it
    async fn terminate(&mut self) {
        if let Some(writer) = self.stdin_writer.take() {
            writer.abort();
        }

        // A group id is not reused while any member is alive, so this only
        // reaches what the script left behind.
        #[cfg(unix)]
        if let Some(pgid) = self.pgid {
            use nix::sys::signal::{Signal, killpg};
            use nix::unistd::Pid;
            if let Err(e) = killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
                debug!("killpg({}) failed: {}", pgid, e);
            }
        }

        if let Err(e) = self.child.start_kill() {
            debug!("Kill of {} not delivered: {}", self.program.display(), e);
        }

        match tokio::time::timeout(KILL_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => debug!("{} reaped with {}", self.program.display(), status),
            Ok(Err(e)) => warn!("Failed to reap {}: {}", self.program.display(), e),
            Err(_) => warn!(
                "{} still running {:?} after kill",
                self.program.display(),
                KILL_GRACE
            ),
        }

        for reader in &self.readers {
            reader.abort();
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn take_output(&self) -> String {
        std::mem::take(&mut *self.buffer.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Drop for RunningProcess {
    fn drop(&mut self) {
        if let Some(writer) = self.stdin_writer.take() {
            writer.abort();
        }
        for reader in &self.readers {
            reader.abort();
        }
    }
}

async fn feed_stdin(mut pipe: ChildStdin, input: Vec<u8>) {
    if !input.is_empty() {
        if let Err(e) = pipe.write_all(&input).await {
            // Scripts that never read stdin close the pipe early.
            debug!("stdin not fully delivered: {}", e);
        }
    }
    if let Err(e) = pipe.shutdown().await {
        debug!("stdin shutdown: {}", e);
    }
}

async fn drain<R: AsyncRead + Unpin>(mut pipe: R, buffer: SharedBuffer) {
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut decoder = Utf8Decoder::default();
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let text = decoder.push(&chunk[..n]);
                if !text.is_empty() {
                    buffer
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push_str(&text);
                }
            }
            Err(e) => {
                debug!("Output pipe read failed: {}", e);
                break;
            }
        }
    }
    let rest = decoder.finish();
    if !rest.is_empty() {
        buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(&rest);
    }
}

/// Incremental UTF-8 decoding of one stream
///
/// A character split across reads is held back until its remaining bytes
/// arrive, so the other stream can never land in the middle of it.
/// Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Decode `bytes`, returning only complete characters
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        let mut start = 0;

        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    // Prefix is valid per `valid_up_to`.
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + bad;
                        }
                        None => {
                            // Incomplete tail: wait for more bytes.
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        out
    }

    /// Flush whatever is left at end of stream
    fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}
