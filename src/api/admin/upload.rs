//! Media upload
//!
//! POST /api/admin/upload accepts multipart/form-data with a `file` field and
//! an optional `folder` field. The file is stored under the media root with a
//! UUID file name; the response carries the relative path to save on a model
//! and its public URL.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState};

/// Response for successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Path relative to the media root
    pub path: String,
    pub url: Option<String>,
    pub size: u64,
    pub content_type: String,
}

/// Default folder for uploads that name none
const DEFAULT_FOLDER: &str = "uploads";

/// Room for multipart boundaries, headers and the `folder` field
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

pub fn router(max_file_size: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_file_size.saturating_add(MULTIPART_OVERHEAD))
        .unwrap_or(usize::MAX);
    Router::new()
        .route("/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(body_limit))
}

fn too_large(max_file_size: u64) -> ApiError {
    ApiError::payload_too_large(format!(
        "File too large. Maximum size: {} bytes ({} MB)",
        max_file_size,
        max_file_size / 1024 / 1024
    ))
}

/// Map a multipart read failure, keeping the body limit as 413
fn read_error(what: &str, e: MultipartError, max_file_size: u64) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_file_size)
    } else {
        ApiError::validation_error(format!("Failed to read {}: {}", what, e))
    }
}

/// POST /api/admin/upload
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let config = &state.media;
    let mut folder = DEFAULT_FOLDER.to_string();
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| read_error("multipart", e, config.max_file_size))?
    {
        match field.name().unwrap_or("") {
            "folder" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| read_error("folder", e, config.max_file_size))?;
                folder = sanitize_folder(&raw)
                    .ok_or_else(|| ApiError::validation_error("Invalid folder name"))?;
            }
            "file" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                if !config.is_type_allowed(&content_type) {
                    return Err(ApiError::validation_error(format!(
                        "Invalid file type: {}. Allowed types: {:?}",
                        content_type, config.allowed_types
                    )));
                }

                // stop at the limit instead of buffering the rest
                let mut data = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| read_error("file", e, config.max_file_size))?
                {
                    if (data.len() + chunk.len()) as u64 > config.max_file_size {
                        return Err(too_large(config.max_file_size));
                    }
                    data.extend_from_slice(&chunk);
                }
                file = Some((content_type, data));
            }
            _ => continue,
        }
    }

    let (content_type, data) = file.ok_or_else(|| ApiError::validation_error("No file provided"))?;

    let file_name = format!("{}.{}", Uuid::new_v4(), config.get_extension(&content_type));
    let dir = config.root.join(&folder);
    ensure_dir(&dir).await?;

    fs::write(dir.join(&file_name), &data)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to save file: {}", e)))?;

    let path = format!("{}/{}", folder, file_name);
    tracing::info!(path = %path, size = data.len(), "Media uploaded");

    Ok(Json(UploadResponse {
        url: config.url_for(&path),
        path,
        size: data.len() as u64,
        content_type,
    }))
}

/// Normalize a folder name: lowercase ASCII letters, digits, `-`, `_` and
/// nested segments; anything that could escape the media root is rejected.
fn sanitize_folder(raw: &str) -> Option<String> {
    let raw = raw.trim().trim_matches('/');
    if raw.is_empty() {
        return Some(DEFAULT_FOLDER.to_string());
    }

    let mut segments = Vec::new();
    for segment in raw.split('/') {
        let valid = !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return None;
        }
        segments.push(segment.to_ascii_lowercase());
    }
    Some(segments.join("/"))
}

/// Ensure upload directory exists
async fn ensure_dir(path: &Path) -> Result<(), ApiError> {
    if !path.exists() {
        fs::create_dir_all(path)
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to create media dir: {}", e)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_folder() {
        assert_eq!(sanitize_folder(""), Some("uploads".to_string()));
        assert_eq!(sanitize_folder(" /Camps/ "), Some("camps".to_string()));
        assert_eq!(sanitize_folder("blog/covers"), Some("blog/covers".to_string()));
        assert_eq!(sanitize_folder("../etc"), None);
        assert_eq!(sanitize_folder("a//b"), None);
        assert_eq!(sanitize_folder("фото"), None);
    }
}
