use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use ragbot_knowledge::FileType;
use serde::Serialize;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub chunks: usize,
}

/// Accept a multipart `file` field, stage it under the upload directory and index it.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, state.max_upload_bytes))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(base_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::BadRequest("No filename provided".to_string()))?;

        let file_type = FileType::from_filename(&filename).ok_or_else(|| {
            ApiError::BadRequest("Only PDF and TXT files are supported".to_string())
        })?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, state.max_upload_bytes))?;

        tokio::fs::create_dir_all(&state.upload_dir)
            .await
            .map_err(ApiError::internal)?;
        let path = state.upload_dir.join(&filename);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(ApiError::internal)?;

        tracing::info!("Staged upload {} ({} bytes)", path.display(), bytes.len());

        let result = state.service.index_document(&path, file_type).await;

        return Ok(Json(UploadResponse {
            success: result.success,
            message: result.message,
            filename,
            chunks: result.chunks,
        }));
    }

    Err(ApiError::BadRequest("No file provided".to_string()))
}

/// Map a multipart read failure, keeping the body-limit status.
fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(format!("Upload exceeds the {} byte limit", limit))
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Final path component of a client-supplied file name, for either separator.
fn base_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    match last {
        "." | ".." => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("report.pdf"), "report.pdf");
        assert_eq!(base_name("../../etc/passwd.txt"), "passwd.txt");
        assert_eq!(base_name("C:\\Users\\me\\notes.txt"), "notes.txt");
        assert_eq!(base_name("dir/"), "");
        assert_eq!(base_name(".."), "");
    }
}
