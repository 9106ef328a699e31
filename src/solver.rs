//! Solver invocation: executable lookup, argv construction, environment
//! shaping, and the deadline-bounded subprocess run.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::{MIN_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
use crate::error::SolveError;

/// Solving strategy of the external program. Wire values 0-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMode {
    BruteForce = 0,
    ForwardChecking = 1,
    ParallelForwardChecking = 2,
    Dlx = 3,
    ParallelDlx = 4,
}

impl SolveMode {
    /// Modes that fan out across worker threads take a thread count.
    pub fn needs_threads(self) -> bool {
        matches!(
            self,
            SolveMode::ParallelForwardChecking | SolveMode::ParallelDlx
        )
    }

    /// DLX modes handle large grids; the others get a tip in the output.
    pub fn is_dlx(self) -> bool {
        matches!(self, SolveMode::Dlx | SolveMode::ParallelDlx)
    }

    pub fn as_arg(self) -> String {
        (self as u8).to_string()
    }
}

impl Default for SolveMode {
    fn default() -> Self {
        SolveMode::Dlx
    }
}

impl TryFrom<u8> for SolveMode {
    type Error = SolveError;

    fn try_from(value: u8) -> Result<Self, SolveError> {
        match value {
            0 => Ok(SolveMode::BruteForce),
            1 => Ok(SolveMode::ForwardChecking),
            2 => Ok(SolveMode::ParallelForwardChecking),
            3 => Ok(SolveMode::Dlx),
            4 => Ok(SolveMode::ParallelDlx),
            other => Err(SolveError::InvalidMode(other)),
        }
    }
}

/// Thread count used when a threaded mode is requested without one.
pub const DEFAULT_THREADS: u32 = 2;

/// Everything needed to start the solver, derived once per request.
#[derive(Debug)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub work_dir: PathBuf,
    /// Replacement search path for the child, when library directories need
    /// prepending. `None` leaves the inherited environment untouched.
    pub path_override: Option<OsString>,
}

/// Candidate executable names under the project root, checked in order.
const SOLVER_CANDIDATES: &[&str] = &["sudoku_main.exe", "sudoku_main"];

/// Directories that hold the solver's runtime libraries on Windows (MSYS2).
/// Only directories that exist on disk are prepended to the search path.
const LIBRARY_DIR_CANDIDATES: &[&str] = &[
    "C:/msys64/ucrt64/bin",
    "C:/msys64/mingw64/bin",
    "C:/msys64/usr/bin",
];

/// Locate the solver executable under the project root.
pub fn resolve_solver_path(root: &Path) -> Result<PathBuf, SolveError> {
    for name in SOLVER_CANDIDATES {
        let candidate = root.join(name);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(SolveError::Resolution(root.to_path_buf()))
}

/// Build the solver's argument vector.
///
/// Contract: `[inputPath, mode]`, then the thread count for threaded modes
/// (defaulted when absent), then the write-to-file flag as `0`/`1` when the
/// request supplied one.
pub fn build_args(
    input_path: &Path,
    mode: SolveMode,
    num_threads: Option<u32>,
    write_to_file: Option<bool>,
) -> Vec<String> {
    let mut args = vec![
        input_path.to_string_lossy().into_owned(),
        mode.as_arg(),
    ];
    if mode.needs_threads() {
        args.push(num_threads.unwrap_or(DEFAULT_THREADS).to_string());
    }
    if let Some(write) = write_to_file {
        args.push(if write { "1" } else { "0" }.to_string());
    }
    args
}

/// Compute the child's search path: existing library directories prepended
/// to the inherited value. Request-scoped; the host environment is never
/// mutated.
pub fn shaped_search_path() -> Option<OsString> {
    let found: Vec<PathBuf> = LIBRARY_DIR_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .filter(|p| p.exists())
        .collect();
    if found.is_empty() {
        return None;
    }

    let inherited = std::env::var_os("PATH").unwrap_or_default();
    let entries = found
        .into_iter()
        .chain(std::env::split_paths(&inherited));
    match std::env::join_paths(entries) {
        Ok(joined) => Some(joined),
        Err(e) => {
            warn!("Could not shape solver search path: {}", e);
            None
        }
    }
}

/// Effective deadline: requested value (floored at 5s) or 30s.
pub fn effective_timeout(timeout_seconds: Option<u64>) -> Duration {
    Duration::from_secs(timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS).max(MIN_TIMEOUT_SECS))
}

/// Raw facts about one solver run, before output analysis.
#[derive(Debug, Default)]
pub struct RawRun {
    pub exit_code: Option<i32>,
    pub signal: Option<String>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub spawn_error: Option<String>,
}

impl RawRun {
    /// Run record for a process that never started.
    pub fn spawn_failure(err: &std::io::Error) -> Self {
        Self {
            spawn_error: Some(err.to_string()),
            ..Self::default()
        }
    }
}

/// Start the solver and race its natural exit against the deadline.
///
/// stdout and stderr are drained by two concurrent tasks while the process
/// runs; both buffers are kept even when the deadline wins. On expiry the
/// process is killed (non-catchable) and the run is tagged
/// `signal = "killed"`. No retry.
pub async fn run_solver(invocation: &Invocation, deadline: Duration) -> Result<RawRun, SolveError> {
    debug!(
        "Spawning solver {:?} with args {:?} (deadline {:?})",
        invocation.program, invocation.args, deadline
    );

    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .current_dir(&invocation.work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(path) = &invocation.path_override {
        cmd.env("PATH", path);
    }

    let mut child = cmd.spawn().map_err(SolveError::Spawn)?;

    let stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| SolveError::Spawn(std::io::Error::other("stdout pipe missing")))?;
    let stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| SolveError::Spawn(std::io::Error::other("stderr pipe missing")))?;

    // Drain both streams concurrently into shared buffers so that whatever
    // the process printed is available even when the deadline kills it
    // mid-output.
    let stdout_buf = Arc::new(Mutex::new(Vec::new()));
    let stderr_buf = Arc::new(Mutex::new(Vec::new()));
    let stdout_task = tokio::spawn(drain(stdout_pipe, Arc::clone(&stdout_buf)));
    let stderr_task = tokio::spawn(drain(stderr_pipe, Arc::clone(&stderr_buf)));

    let (exit_code, signal, timed_out) = tokio::select! {
        status = child.wait() => {
            let status = status.map_err(SolveError::Spawn)?;
            (status.code(), natural_signal(&status), false)
        }
        _ = tokio::time::sleep(deadline) => {
            let _ = child.kill().await;
            let _ = child.wait().await;
            (None, Some("killed".to_string()), true)
        }
    };

    if timed_out {
        // Grandchildren the kill missed may still hold the pipe write ends;
        // give the drains a moment, then settle for what was captured.
        let settle = tokio::time::timeout(Duration::from_millis(200), async {
            let _ = stdout_task.await;
            let _ = stderr_task.await;
        });
        let _ = settle.await;
    } else {
        let _ = stdout_task.await;
        let _ = stderr_task.await;
    }

    let stdout = String::from_utf8_lossy(&stdout_buf.lock().await).into_owned();
    let stderr = String::from_utf8_lossy(&stderr_buf.lock().await).into_owned();

    Ok(RawRun {
        exit_code,
        signal,
        stdout,
        stderr,
        timed_out,
        spawn_error: None,
    })
}

/// Append everything readable from `pipe` into `buf`, chunk by chunk.
async fn drain<R: AsyncRead + Unpin>(mut pipe: R, buf: Arc<Mutex<Vec<u8>>>) {
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.lock().await.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Name the signal that terminated the process, if any.
#[cfg(unix)]
fn natural_signal(status: &std::process::ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|sig| match sig {
        2 => "SIGINT".to_string(),
        6 => "SIGABRT".to_string(),
        9 => "SIGKILL".to_string(),
        11 => "SIGSEGV".to_string(),
        15 => "SIGTERM".to_string(),
        other => format!("SIG{}", other),
    })
}

#[cfg(not(unix))]
fn natural_signal(_status: &std::process::ExitStatus) -> Option<String> {
    None
}
