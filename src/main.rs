mod analyze;
mod config;
mod error;
mod grid;
mod input;
mod outcome;
mod pipeline;
mod routes;
mod solver;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sudoku_runner=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = ServiceConfig::from_env();
    info!(
        "Solver root: {:?}, test cases: {:?}",
        config.project_root, config.cases_dir
    );

    tokio::fs::create_dir_all(&config.uploads_dir).await?;

    // The executable is re-resolved per request; this is just an early
    // heads-up for the operator.
    match solver::resolve_solver_path(&config.project_root) {
        Ok(path) => info!("Found solver executable at {:?}", path),
        Err(e) => warn!("{}", e),
    }

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState { config });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Sudoku runner listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
