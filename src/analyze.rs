//! Output analysis: progress scrubbing, solved/time extraction, and a
//! declarative diagnostics table over the raw streams.
//!
//! Scrubbing and detection are independent: detection always runs against
//! the unscrubbed text, while the caller receives the scrubbed stdout.

use std::sync::LazyLock;

use regex::Regex;

use crate::solver::{RawRun, SolveMode};

/// Inline progress blocks, possibly many concatenated on one line,
/// e.g. "[==> ] 5 %[===>] 12 %".
static PROGRESS_INLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s*\[[=>\s-]+\]\s*\d+\s*%)+").unwrap());

/// A line that is nothing but a progress block.
static PROGRESS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[[=>\s-]+\]\s*\d+\s*%\s*$").unwrap());

/// Three or more consecutive newlines.
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Elapsed-time marker printed by the solver.
static SOLVE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Solved in\s+([0-9.]+)\s+seconds\.?\]").unwrap());

/// Remove ephemeral progress updates from captured output.
///
/// Carriage returns go first (in-place terminal updates), then inline
/// progress blocks, then lines that were only a progress block, and finally
/// runs of 3+ blank lines collapse to one.
pub fn scrub_output(raw: &str) -> String {
    let no_cr = raw.replace('\r', "");
    let no_inline = PROGRESS_INLINE.replace_all(&no_cr, "");
    let lines: Vec<&str> = no_inline
        .split('\n')
        .filter(|line| !PROGRESS_LINE.is_match(line))
        .collect();
    let joined = lines.join("\n");
    BLANK_RUNS.replace_all(&joined, "\n\n").into_owned()
}

/// The solver prints `SOLVED!` on success, independent of its exit code.
pub fn detect_solved(stdout: &str) -> bool {
    stdout.to_ascii_lowercase().contains("solved!")
}

/// Extract the elapsed time from the `[Solved in <n> seconds.]` marker.
pub fn extract_time_seconds(stdout: &str) -> Option<f64> {
    SOLVE_TIME
        .captures(stdout)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Windows NT status for a missing shared runtime library
/// (decimal 3221225781).
const STATUS_DLL_NOT_FOUND: u32 = 0xC000_0135;

/// Known solver assertion markers on stderr, mapped to user-facing
/// explanations. Evaluated independently; every match is appended.
const STDERR_HINTS: &[(&str, &str)] = &[
    (
        "checkValidRows",
        "Invalid puzzle: a row has duplicate or illegal values. Fix the row conflicts and try again.",
    ),
    (
        "checkValidColumns",
        "Invalid puzzle: a column has duplicate or illegal values. Fix the column conflicts and try again.",
    ),
    (
        "checkValidBoxes",
        "Invalid puzzle: a subgrid/box has duplicate or illegal values. Fix the box conflicts and try again.",
    ),
];

/// Request facts the diagnostics need beyond the raw run.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    pub mode: SolveMode,
    pub grid_size: Option<u32>,
    pub timeout_secs: u64,
}

/// Everything the analyzer derives from one run.
#[derive(Debug)]
pub struct Analysis {
    pub solved: bool,
    pub time_seconds: Option<f64>,
    pub stdout_clean: String,
    pub note: Option<String>,
}

/// Classify a finished run.
pub fn analyze(run: &RawRun, ctx: &RunContext) -> Analysis {
    Analysis {
        solved: detect_solved(&run.stdout),
        time_seconds: extract_time_seconds(&run.stdout),
        stdout_clean: scrub_output(&run.stdout),
        note: compose_note(run, ctx),
    }
}

/// Build the human-readable note. Ordered: spawn failure first, then the
/// timeout explanation, signal termination, missing-runtime hint, stderr
/// assertion hints, and finally the large-puzzle mode tip.
fn compose_note(run: &RawRun, ctx: &RunContext) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    if let Some(err) = &run.spawn_error {
        parts.push(format!("Failed to spawn process: {}", err));
    }

    if run.timed_out {
        parts.push(format!(
            "Stopped after {}s timeout. Try a faster algorithm (DLX modes 3/4), reduce puzzle size, or increase timeout.",
            ctx.timeout_secs
        ));
    } else if run.exit_code.is_none() {
        if let Some(signal) = &run.signal {
            parts.push(format!("Process terminated by signal: {}", signal));
        }
    }

    if run.exit_code.map(|c| c as u32) == Some(STATUS_DLL_NOT_FOUND) {
        parts.push(
            "Process failed to start due to missing runtime DLLs. Ensure MSYS2 UCRT64 is installed and its bin folder is on PATH (e.g., C:/msys64/ucrt64/bin)."
                .to_string(),
        );
    }

    for (needle, message) in STDERR_HINTS {
        if run.stderr.contains(needle) {
            parts.push((*message).to_string());
        }
    }

    if let Some(size) = ctx.grid_size {
        if size >= 16 && !ctx.mode.is_dlx() {
            parts.push(format!(
                "Tip: For {size}x{size} puzzles, use DLX (mode 3 or 4). Brute force/backtracking can take a very long time."
            ));
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RunContext {
        RunContext {
            mode: SolveMode::Dlx,
            grid_size: Some(9),
            timeout_secs: 30,
        }
    }

    fn run_with(stdout: &str, stderr: &str) -> RawRun {
        RawRun {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            ..RawRun::default()
        }
    }

    #[test]
    fn pure_progress_output_scrubs_to_whitespace() {
        let scrubbed = scrub_output("[==> ] 5 %[===>] 12 %[====>] 40 %");
        assert!(scrubbed.trim().is_empty(), "{scrubbed:?}");
    }

    #[test]
    fn content_lines_survive_scrubbing_verbatim() {
        let scrubbed = scrub_output("[==> ] 5 %\nSOLVED! grid follows\n[====>] 99 %\n");
        assert!(scrubbed.contains("SOLVED! grid follows"));
        assert!(!scrubbed.contains('%'));
    }

    #[test]
    fn carriage_return_updates_are_dropped() {
        let scrubbed = scrub_output("[=> ] 1 %\r[==> ] 2 %\r[===>] 3 %\rdone");
        assert_eq!(scrubbed.trim(), "done");
    }

    #[test]
    fn blank_line_runs_collapse() {
        let scrubbed = scrub_output("a\n\n\n\n\nb");
        assert_eq!(scrubbed, "a\n\nb");
    }

    #[test]
    fn solved_detection_is_case_insensitive() {
        assert!(detect_solved("the puzzle was Solved!"));
        assert!(detect_solved("SOLVED!"));
        assert!(!detect_solved("solved?"));
        assert!(!detect_solved("no luck"));
    }

    #[test]
    fn time_marker_is_extracted() {
        assert_eq!(
            extract_time_seconds("blah\n[Solved in 1.25 seconds.]\n"),
            Some(1.25)
        );
        assert_eq!(extract_time_seconds("[Solved in 3 seconds]"), Some(3.0));
        assert_eq!(extract_time_seconds("no marker"), None);
    }

    #[test]
    fn detection_ignores_progress_noise() {
        // Progress markers interleaved with the tokens must not break
        // detection, which runs on the unscrubbed text.
        let stdout = "[==> ] 5 %SOLVED![===>] 12 %\n[Solved in 0.5 seconds.]";
        let analysis = analyze(&run_with(stdout, ""), &ctx());
        assert!(analysis.solved);
        assert_eq!(analysis.time_seconds, Some(0.5));
    }

    #[test]
    fn stderr_hints_are_deterministic() {
        let cases = [
            ("assert failed in checkValidRows()", "row"),
            ("assert failed in checkValidColumns()", "column"),
            ("assert failed in checkValidBoxes()", "box"),
        ];
        for (stderr, word) in cases {
            let note = compose_note(&run_with("", stderr), &ctx()).unwrap();
            assert!(note.contains(word), "{stderr} -> {note}");
        }
    }

    #[test]
    fn all_matching_hints_are_appended_in_order() {
        let stderr = "checkValidColumns\ncheckValidRows";
        let note = compose_note(&run_with("", stderr), &ctx()).unwrap();
        let row_at = note.find("row conflicts").unwrap();
        let col_at = note.find("column conflicts").unwrap();
        assert!(row_at < col_at, "{note}");
    }

    #[test]
    fn unknown_stderr_yields_no_note() {
        assert_eq!(compose_note(&run_with("", "mystery failure"), &ctx()), None);
    }

    #[test]
    fn timeout_note_names_the_deadline() {
        let run = RawRun {
            exit_code: None,
            signal: Some("killed".into()),
            timed_out: true,
            stdout: "[==> ] 40 %".into(),
            ..RawRun::default()
        };
        let context = RunContext {
            timeout_secs: 5,
            ..ctx()
        };
        let note = compose_note(&run, &context).unwrap();
        assert!(note.contains('5'), "{note}");
        assert!(note.contains("timeout"), "{note}");
    }

    #[test]
    fn signal_death_is_reported_when_not_a_timeout() {
        let run = RawRun {
            exit_code: None,
            signal: Some("SIGSEGV".into()),
            ..RawRun::default()
        };
        let note = compose_note(&run, &ctx()).unwrap();
        assert!(note.contains("SIGSEGV"), "{note}");
    }

    #[test]
    fn spawn_failure_note_comes_first() {
        let run = RawRun {
            spawn_error: Some("permission denied".into()),
            stderr: "checkValidRows".into(),
            ..RawRun::default()
        };
        let note = compose_note(&run, &ctx()).unwrap();
        assert!(note.starts_with("Failed to spawn process: permission denied"));
        assert!(note.contains("row conflicts"));
    }

    #[test]
    fn missing_dll_status_gets_a_hint() {
        let run = RawRun {
            exit_code: Some(0xC000_0135u32 as i32),
            ..RawRun::default()
        };
        let note = compose_note(&run, &ctx()).unwrap();
        assert!(note.contains("MSYS2"), "{note}");
    }

    #[test]
    fn large_non_dlx_puzzles_get_the_mode_tip() {
        let context = RunContext {
            mode: SolveMode::BruteForce,
            grid_size: Some(16),
            timeout_secs: 30,
        };
        let note = compose_note(&run_with("", ""), &context).unwrap();
        assert!(note.contains("16x16"), "{note}");
        assert!(note.contains("DLX"), "{note}");

        // DLX runs of the same size stay quiet.
        let quiet = RunContext {
            mode: SolveMode::ParallelDlx,
            ..context
        };
        assert_eq!(compose_note(&run_with("", ""), &quiet), None);
    }
}
