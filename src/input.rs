//! Input resolution: picks one input source and materializes it as a
//! readable file for the solver.
//!
//! Priority when several sources are present: uploaded file > pasted text >
//! named test case. Pasted text is normalized and written to a temp file
//! whose deletion is tied to the request (RAII via [`tempfile::TempPath`]);
//! uploads are persisted to the uploads directory and kept; named cases are
//! used in place with no cleanup owed.

use std::io::Write;
use std::path::PathBuf;

use tempfile::TempPath;
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::SolveError;
use crate::grid::PuzzleGrid;

/// File content supplied with the request.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// The request's input fields, at most one of which is used.
#[derive(Debug, Default)]
pub struct InputSelection {
    pub upload: Option<UploadedFile>,
    pub inline_text: Option<String>,
    pub test_case: Option<String>,
}

/// A ready-to-use input file for the solver.
#[derive(Debug)]
pub struct ResolvedInput {
    pub path: PathBuf,
    /// Puzzle size when known, for the large-puzzle diagnostic.
    pub grid_size: Option<u32>,
    /// Keeps the inline temp file alive for the request; the file is
    /// deleted when this drops, on every exit path.
    _temp: Option<TempPath>,
}

/// Resolve the request's input to a file path.
pub async fn resolve_input(
    selection: InputSelection,
    config: &ServiceConfig,
) -> Result<ResolvedInput, SolveError> {
    if let Some(upload) = selection.upload {
        return resolve_upload(upload, config).await;
    }

    if let Some(text) = selection
        .inline_text
        .filter(|t| !t.trim().is_empty())
    {
        return resolve_inline(&text, config).await;
    }

    if let Some(name) = selection.test_case.filter(|n| !n.is_empty()) {
        return resolve_named_case(&name, config).await;
    }

    Err(SolveError::NoInput)
}

/// Uploaded files must already conform to the solver's format: explicit `N`
/// header, whitespace-separated rows. The decoded bytes are persisted under
/// a unique name and the file is left in place after the run.
async fn resolve_upload(
    upload: UploadedFile,
    config: &ServiceConfig,
) -> Result<ResolvedInput, SolveError> {
    let text = std::str::from_utf8(&upload.bytes).map_err(|_| SolveError::UploadNotText)?;
    let grid = PuzzleGrid::parse_strict(text)?;

    tokio::fs::create_dir_all(&config.uploads_dir).await?;
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".txt")
        .tempfile_in(&config.uploads_dir)?;
    file.write_all(&upload.bytes)?;
    let (_, path) = file.keep().map_err(|e| SolveError::Io(e.error))?;

    debug!(
        "Stored upload {:?} ({} bytes) at {:?}",
        upload.filename,
        upload.bytes.len(),
        path
    );

    Ok(ResolvedInput {
        path,
        grid_size: Some(grid.size()),
        _temp: None,
    })
}

/// Pasted text is normalized to canonical form and written to a temp file
/// owned by the request.
async fn resolve_inline(text: &str, config: &ServiceConfig) -> Result<ResolvedInput, SolveError> {
    let grid = PuzzleGrid::parse_flexible(text)?;

    tokio::fs::create_dir_all(&config.uploads_dir).await?;
    let mut file = tempfile::Builder::new()
        .prefix("inline-")
        .suffix(".txt")
        .tempfile_in(&config.uploads_dir)?;
    file.write_all(grid.canonical_text().as_bytes())?;
    let temp = file.into_temp_path();
    let path = temp.to_path_buf();

    debug!("Wrote normalized inline grid (N={}) to {:?}", grid.size(), path);

    Ok(ResolvedInput {
        path,
        grid_size: Some(grid.size()),
        _temp: Some(temp),
    })
}

/// A named case resolves against the test-case directory. The name must be
/// a bare file name; the listing endpoint only ever hands out those.
async fn resolve_named_case(
    name: &str,
    config: &ServiceConfig,
) -> Result<ResolvedInput, SolveError> {
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(SolveError::BadCaseName(name.to_string()));
    }

    let path = config.cases_dir.join(name);
    if tokio::fs::metadata(&path).await.is_err() {
        return Err(SolveError::CaseNotFound(name.to_string()));
    }

    // Best-effort size probe from the header line, for diagnostics only.
    let grid_size = tokio::fs::read_to_string(&path)
        .await
        .ok()
        .and_then(|content| {
            content
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .and_then(|l| l.parse().ok())
        });

    Ok(ResolvedInput {
        path,
        grid_size,
        _temp: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(root: &std::path::Path) -> ServiceConfig {
        ServiceConfig {
            project_root: root.to_path_buf(),
            cases_dir: root.join("Test_Cases"),
            uploads_dir: root.join("uploads"),
            port: 0,
        }
    }

    #[tokio::test]
    async fn no_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_input(InputSelection::default(), &test_config(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, SolveError::NoInput));
        assert!(err.to_string().contains("No input provided"));
    }

    #[tokio::test]
    async fn blank_inline_text_counts_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let selection = InputSelection {
            inline_text: Some("  \n ".into()),
            ..Default::default()
        };
        let err = resolve_input(selection, &test_config(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, SolveError::NoInput));
    }

    #[tokio::test]
    async fn inline_text_is_normalized_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let selection = InputSelection {
            inline_text: Some("1234\n3412\n2143\n4321".into()),
            ..Default::default()
        };

        let resolved = resolve_input(selection, &config).await.unwrap();
        let written = std::fs::read_to_string(&resolved.path).unwrap();
        assert_eq!(written, "4\n1 2 3 4\n3 4 1 2\n2 1 4 3\n4 3 2 1");
        assert_eq!(resolved.grid_size, Some(4));

        let path = resolved.path.clone();
        drop(resolved);
        assert!(!path.exists(), "temp grid should be deleted with the request");
    }

    #[tokio::test]
    async fn upload_requires_strict_format() {
        let dir = tempfile::tempdir().unwrap();
        let selection = InputSelection {
            upload: Some(UploadedFile {
                filename: "grid.txt".into(),
                bytes: b"1 2\n2 1".to_vec(),
            }),
            ..Default::default()
        };
        let err = resolve_input(selection, &test_config(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, SolveError::Input(_)), "{err}");
    }

    #[tokio::test]
    async fn upload_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let selection = InputSelection {
            upload: Some(UploadedFile {
                filename: "grid.txt".into(),
                bytes: b"2\n1 0\n0 1".to_vec(),
            }),
            ..Default::default()
        };

        let resolved = resolve_input(selection, &config).await.unwrap();
        assert_eq!(resolved.grid_size, Some(2));
        let path = resolved.path.clone();
        drop(resolved);
        assert!(path.exists(), "uploads are kept after the request");
    }

    #[tokio::test]
    async fn upload_takes_priority_over_inline() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let selection = InputSelection {
            upload: Some(UploadedFile {
                filename: "grid.txt".into(),
                bytes: b"2\n1 0\n0 1".to_vec(),
            }),
            inline_text: Some("not a grid at all".into()),
            test_case: Some("missing.txt".into()),
        };

        // The bogus inline text must not be consulted at all.
        let resolved = resolve_input(selection, &config).await.unwrap();
        assert_eq!(resolved.grid_size, Some(2));
    }

    #[tokio::test]
    async fn named_case_resolves_against_cases_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(&config.cases_dir).unwrap();
        std::fs::write(config.cases_dir.join("easy.txt"), "9\n").unwrap();

        let selection = InputSelection {
            test_case: Some("easy.txt".into()),
            ..Default::default()
        };
        let resolved = resolve_input(selection, &config).await.unwrap();
        assert_eq!(resolved.path, config.cases_dir.join("easy.txt"));
        assert_eq!(resolved.grid_size, Some(9));
    }

    #[tokio::test]
    async fn traversal_in_case_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        for bad in ["../secret.txt", "a/b.txt", "..\\b.txt"] {
            let selection = InputSelection {
                test_case: Some(bad.into()),
                ..Default::default()
            };
            let err = resolve_input(selection, &config).await.unwrap_err();
            assert!(matches!(err, SolveError::BadCaseName(_)), "{bad}");
        }
    }

    #[tokio::test]
    async fn missing_case_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(&config.cases_dir).unwrap();
        let selection = InputSelection {
            test_case: Some("nope.txt".into()),
            ..Default::default()
        };
        let err = resolve_input(selection, &config).await.unwrap_err();
        assert!(matches!(err, SolveError::CaseNotFound(_)));
    }
}
