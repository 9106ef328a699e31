use std::path::PathBuf;

use thiserror::Error;

/// Grid parsing/validation failure, with row/column specificity where the
/// offending cell is known. Rows and columns are 1-based in messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid is empty")]
    Empty,
    #[error("first line must be a single integer N")]
    MissingHeader,
    #[error("grid size must be positive")]
    ZeroSize,
    #[error("grid must be square: got {rows} rows x {cols} columns")]
    NotSquare { rows: usize, cols: usize },
    #[error("expected {expected} rows, found {found}")]
    RowCount { expected: usize, found: usize },
    #[error("Row {row} has {found} values but N={expected}")]
    RowLength {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("non-numeric token at row {row}, col {col}: {token:?}")]
    BadToken {
        row: usize,
        col: usize,
        token: String,
    },
    #[error("value out of range 0..={max} at row {row}, col {col}: {value}")]
    OutOfRange {
        row: usize,
        col: usize,
        value: u64,
        max: u32,
    },
}

/// Request-level failure. Input and resolution errors reject the request
/// before any solver process is started; spawn failures are folded into the
/// structured outcome by the pipeline.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("invalid puzzle: {0}")]
    Input(#[from] GridError),
    #[error("No input provided. Upload a file, paste a grid, or choose a test case.")]
    NoInput,
    #[error("unknown solve mode: {0} (expected 0-4)")]
    InvalidMode(u8),
    #[error("invalid test case name: {0:?}")]
    BadCaseName(String),
    #[error("test case not found: {0:?}")]
    CaseNotFound(String),
    #[error("uploaded file is not valid UTF-8 text")]
    UploadNotText,
    #[error(
        "sudoku_main executable not found under {0:?}. Build it in the project root with `make`."
    )]
    Resolution(PathBuf),
    #[error("failed to spawn solver: {0}")]
    Spawn(#[source] std::io::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SolveError {
    /// True for errors caused by the request itself rather than the host.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SolveError::Input(_)
                | SolveError::NoInput
                | SolveError::InvalidMode(_)
                | SolveError::BadCaseName(_)
                | SolveError::CaseNotFound(_)
                | SolveError::UploadNotText
        )
    }
}
