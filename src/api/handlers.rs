use super::{AppError, AppState};
use crate::domain::storage::has_pdf_extension;
use crate::domain::{sanitize_filename, RedactRequest, RedactionBox, RequestValidator};
use crate::error::RedactorError;
use crate::redaction::RedactionResult;
use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Response for the upload endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Sanitized name the file was stored under
    pub filename: String,
    pub message: String,
}

/// Response for the redact endpoint
#[derive(Debug, Serialize)]
pub struct RedactResponse {
    pub message: String,
    /// Output file name; download it with the *input* file name
    pub redacted_file: String,
    /// Manual boxes as applied, after clamping
    pub boxes: Vec<RedactionBox>,
    pub summary: RedactionResult,
}

/// Store an uploaded PDF under the uploads root
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let raw_name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| AppError::BadRequest("Uploaded file has no file name".to_string()))?;
        let filename = sanitize_filename(&raw_name)?;
        if !has_pdf_extension(&filename) {
            return Err(AppError::UnsupportedMediaType);
        }

        let data = field.bytes().await?;
        let uploads = state.layout.uploads_dir();
        tokio::fs::create_dir_all(uploads).await?;
        tokio::fs::write(uploads.join(&filename), &data).await?;

        info!(%filename, bytes = data.len(), "stored upload");
        return Ok(Json(UploadResponse {
            filename,
            message: "File uploaded successfully.".to_string(),
        }));
    }

    Err(AppError::BadRequest("No file provided in upload".to_string()))
}

/// Validate a redaction request and run it
pub async fn redact_file(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RedactRequest>, JsonRejection>,
) -> Result<Json<RedactResponse>, AppError> {
    let Json(request) = payload?;

    let job = RequestValidator::new(&state.layout, &state.placeholder).validate(&request)?;
    let boxes = job.manual_boxes.clone();

    let worker = Arc::clone(&state);
    let outcome = tokio::task::spawn_blocking(move || worker.service.execute(job)).await??;

    Ok(Json(RedactResponse {
        message: "Manual redaction complete".to_string(),
        redacted_file: outcome.output_name(),
        boxes,
        summary: outcome.result,
    }))
}

/// Return the redacted PDF produced for an input file name
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let path = state.layout.output_path(&filename)?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RedactorError::NotFound {
                what: "Redacted file".to_string(),
                path,
            }
            .into())
        }
        Err(e) => return Err(e.into()),
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', "_"))
        .unwrap_or_default();

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Health check endpoint for monitoring and load balancing
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "pdfredact API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
