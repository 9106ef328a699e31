use serde::Serialize;

/// Terminal result of one solve request. Assembled exactly once; `ok`
/// reflects the exit code while `solved` reflects the solver's own stdout
/// token, and the two are deliberately kept independent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveOutcome {
    pub ok: bool,
    pub code: Option<i32>,
    pub signal: Option<String>,
    pub solved: bool,
    pub time_seconds: Option<f64>,
    /// Scrubbed stdout (progress updates removed).
    pub stdout: String,
    /// Raw stderr, passed through verbatim for operator debugging.
    pub stderr: String,
    /// The argv the solver was started with.
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
