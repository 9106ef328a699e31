//! Per-request orchestration: input resolution, solver invocation under a
//! deadline, output analysis, and final assembly.
//!
//! Input and solver-resolution errors reject the request before any process
//! is started. A timed-out or failing solver run is not a request failure:
//! it still yields a structured [`SolveOutcome`] with `ok = false` and a
//! best-effort note. The inline temp file is owned by the request and
//! deleted on every exit path, including early `?` returns.

use tracing::info;

use crate::analyze::{analyze, RunContext};
use crate::config::ServiceConfig;
use crate::error::SolveError;
use crate::input::{resolve_input, InputSelection};
use crate::outcome::SolveOutcome;
use crate::solver::{
    build_args, effective_timeout, resolve_solver_path, run_solver, shaped_search_path,
    Invocation, RawRun, SolveMode,
};

/// One solve request, as handed over by the transport layer. Immutable.
#[derive(Debug)]
pub struct SolveRequest {
    pub mode: SolveMode,
    pub num_threads: Option<u32>,
    pub write_to_file: Option<bool>,
    pub timeout_seconds: Option<u64>,
    pub input: InputSelection,
}

/// Run one request through the pipeline.
pub async fn solve(config: &ServiceConfig, request: SolveRequest) -> Result<SolveOutcome, SolveError> {
    let program = resolve_solver_path(&config.project_root)?;
    let input = resolve_input(request.input, config).await?;

    let invocation = Invocation {
        program,
        args: build_args(
            &input.path,
            request.mode,
            request.num_threads,
            request.write_to_file,
        ),
        work_dir: config.project_root.clone(),
        path_override: shaped_search_path(),
    };

    let deadline = effective_timeout(request.timeout_seconds);
    let run = match run_solver(&invocation, deadline).await {
        Ok(run) => run,
        // The request itself is fine; report the failed start in the outcome.
        Err(SolveError::Spawn(e)) => RawRun::spawn_failure(&e),
        Err(other) => return Err(other),
    };

    let context = RunContext {
        mode: request.mode,
        grid_size: input.grid_size,
        timeout_secs: deadline.as_secs(),
    };
    let analysis = analyze(&run, &context);

    info!(
        "Solve finished: mode={:?}, code={:?}, signal={:?}, solved={}, time={:?}",
        request.mode, run.exit_code, run.signal, analysis.solved, analysis.time_seconds
    );

    Ok(SolveOutcome {
        ok: run.exit_code == Some(0),
        code: run.exit_code,
        signal: run.signal,
        solved: analysis.solved,
        time_seconds: analysis.time_seconds,
        stdout: analysis.stdout_clean,
        stderr: run.stderr,
        args: invocation.args,
        note: analysis.note,
    })
}
