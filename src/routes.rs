//! HTTP surface: one solve endpoint and one test-case listing endpoint.
//!
//! Request and response field names mirror the browser client's wire format
//! (camelCase). Uploaded files travel as a base64 field inside the JSON body.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::config::ServiceConfig;
use crate::error::SolveError;
use crate::input::{InputSelection, UploadedFile};
use crate::pipeline::{solve, SolveRequest};
use crate::solver::SolveMode;

pub struct AppState {
    pub config: ServiceConfig,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/solve", post(solve_handler))
        .route("/api/tests", get(list_tests))
        .with_state(state)
}

/// Upload payload: file content as base64.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBody {
    #[serde(default)]
    pub filename: String,
    pub content_base64: String,
}

/// Wire form of a solve request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveBody {
    pub mode: Option<u8>,
    pub num_threads: Option<u32>,
    pub write_to_file: Option<bool>,
    pub timeout_seconds: Option<u64>,
    pub inline_text: Option<String>,
    pub test_case: Option<String>,
    pub upload: Option<UploadBody>,
}

impl SolveBody {
    fn into_request(self) -> Result<SolveRequest, SolveError> {
        let mode = match self.mode {
            Some(value) => SolveMode::try_from(value)?,
            None => SolveMode::default(),
        };

        let upload = match self.upload {
            Some(body) => Some(UploadedFile {
                bytes: BASE64
                    .decode(body.content_base64.as_bytes())
                    .map_err(|_| SolveError::UploadNotText)?,
                filename: body.filename,
            }),
            None => None,
        };

        Ok(SolveRequest {
            mode,
            num_threads: self.num_threads,
            write_to_file: self.write_to_file,
            timeout_seconds: self.timeout_seconds,
            input: InputSelection {
                upload,
                inline_text: self.inline_text,
                test_case: self.test_case,
            },
        })
    }
}

async fn solve_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SolveBody>,
) -> Response {
    let request = match body.into_request() {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    match solve(&state.config, request).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &SolveError) -> Response {
    let status = if e.is_client_error() {
        warn!("Rejected solve request: {}", e);
        StatusCode::BAD_REQUEST
    } else {
        error!("Solve request failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(json!({ "ok": false, "error": e.to_string() }))).into_response()
}

/// List the available named test cases.
async fn list_tests(State(state): State<Arc<AppState>>) -> Response {
    match read_case_names(&state.config).await {
        Ok(files) => Json(json!({ "ok": true, "files": files })).into_response(),
        Err(e) => {
            error!("Failed to list test cases: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn read_case_names(config: &ServiceConfig) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(&config.cases_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".txt") {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
