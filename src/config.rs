use std::path::PathBuf;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Root directory containing the solver executable; also the child
    /// process's working directory.
    pub project_root: PathBuf,
    /// Directory of pre-supplied puzzle files served by `/api/tests`.
    pub cases_dir: PathBuf,
    /// Directory where uploaded and inline grids are materialized.
    pub uploads_dir: PathBuf,
    /// TCP port for the HTTP API.
    pub port: u16,
}

impl ServiceConfig {
    /// Load configuration, falling back to the original tool's layout:
    /// solver and `Test_Cases/` in the project root, uploads next to them.
    pub fn from_env() -> Self {
        let project_root =
            PathBuf::from(std::env::var("SOLVER_ROOT").unwrap_or_else(|_| ".".into()));
        let cases_dir = std::env::var("TEST_CASES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| project_root.join("Test_Cases"));
        let uploads_dir = std::env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| project_root.join("uploads"));
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            project_root,
            cases_dir,
            uploads_dir,
            port,
        }
    }
}

/// Default solve deadline when the request does not specify one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Lower bound on the solve deadline; shorter requests are clamped up.
pub const MIN_TIMEOUT_SECS: u64 = 5;
