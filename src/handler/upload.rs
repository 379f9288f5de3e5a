//! Avatar upload handler
//!
//! POST endpoint accepting `{"image": "<base64>"}` and persisting the
//! decoded bytes to the artifact path. Each successful upload truncates and
//! fully overwrites the previous artifact; the decoded payload is stored
//! as-is, with no image format validation.

use crate::config::AppState;
use crate::error::UploadError;
use crate::http;
use crate::logger;
use base64::prelude::*;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response};
use serde::Deserialize;
use std::sync::Arc;
use tokio::fs;

/// Upload request body: one required field
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub image: String,
}

/// Handle an avatar upload request.
///
/// All failure kinds collapse into the same 500 JSON response; the variant
/// only shows through the free-text `message` field.
pub async fn handle_upload(
    req: Request<hyper::body::Incoming>,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    match process_upload(req, state).await {
        Ok(size) => {
            logger::log_upload_saved(&state.target_path, size);
            http::build_upload_success(&state.config.http)
        }
        Err(err) => {
            logger::log_error(&format!("Upload failed: {err}"));
            http::build_upload_error(&err.to_string(), &state.config.http)
        }
    }
}

/// Run the upload pipeline, returning the stored artifact size
async fn process_upload(
    req: Request<hyper::body::Incoming>,
    state: &Arc<AppState>,
) -> Result<usize, UploadError> {
    check_declared_length(&req, state.config.http.max_body_size)?;

    let body = collect_limited(req.into_body(), state.config.http.max_body_size).await?;

    let image = decode_image(&body)?;
    store_artifact(state, &image).await?;
    Ok(image.len())
}

/// Reject uploads whose declared size exceeds the configured limit before
/// reading anything. Hyper rejects garbled Content-Length values at the
/// protocol layer, so only the ceiling needs checking here.
fn check_declared_length(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Result<(), UploadError> {
    let declared = req
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    match declared {
        Some(size) if size > max_body_size => Err(UploadError::MalformedRequest(format!(
            "declared body size {size} exceeds limit {max_body_size}"
        ))),
        _ => Ok(()),
    }
}

/// Collect the request body, enforcing the size limit regardless of
/// framing. Chunked transfer encoding carries no Content-Length, so the
/// declared-length check alone cannot bound what gets buffered.
async fn collect_limited<B>(body: B, max_body_size: u64) -> Result<Bytes, UploadError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    Limited::new(body, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| UploadError::MalformedRequest(e.to_string()))
}

/// Decode the JSON body and its base64 `image` field into raw bytes
pub fn decode_image(body: &[u8]) -> Result<Vec<u8>, UploadError> {
    let request: UploadRequest =
        serde_json::from_slice(body).map_err(UploadError::from_json)?;
    Ok(BASE64_STANDARD.decode(request.image.as_bytes())?)
}

/// Write the decoded bytes to the artifact path, creating the assets
/// directory when missing. The write lock keeps concurrent uploads from
/// interleaving partial writes.
async fn store_artifact(state: &AppState, data: &[u8]) -> Result<(), UploadError> {
    let _guard = state.write_lock.lock().await;

    if let Some(assets_dir) = state.target_path.parent() {
        fs::create_dir_all(assets_dir).await?;
    }
    fs::write(&state.target_path, data).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_state(name: &str) -> AppState {
        let config = Config::load_from("/nonexistent/avatar-server-test-config").unwrap();
        let target = std::env::temp_dir()
            .join(format!("avatar-server-upload-{}-{name}", std::process::id()))
            .join("assets")
            .join("amy.png");
        AppState::new(config, target)
    }

    #[test]
    fn test_decode_valid_payload() {
        // base64 of "hello"
        let body = br#"{"image": "aGVsbG8="}"#;
        assert_eq!(decode_image(body).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let body = br#"{"image": "aGVsbG8=", "name": "amy"}"#;
        assert_eq!(decode_image(body).unwrap(), b"hello");
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        assert!(matches!(
            decode_image(b"not json"),
            Err(UploadError::Decode(_))
        ));
    }

    #[test]
    fn test_missing_image_field() {
        assert!(matches!(
            decode_image(b"{}"),
            Err(UploadError::MissingField(_))
        ));
    }

    #[test]
    fn test_invalid_base64() {
        let body = br#"{"image": "!!!not-base64!!!"}"#;
        assert!(matches!(
            decode_image(body),
            Err(UploadError::Base64(_))
        ));
    }

    #[tokio::test]
    async fn test_collect_within_limit() {
        let body = Full::new(Bytes::from_static(b"small payload"));
        let collected = collect_limited(body, 1024).await.unwrap();
        assert_eq!(collected, Bytes::from_static(b"small payload"));
    }

    #[tokio::test]
    async fn test_collect_rejects_oversized_body_without_content_length() {
        // Mimics a chunked upload: the limit must hold even when no
        // declared length is available up front
        let body = Full::new(Bytes::from(vec![b'x'; 64]));
        assert!(matches!(
            collect_limited(body, 16).await,
            Err(UploadError::MalformedRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_store_creates_assets_dir_and_writes() {
        let state = test_state("store");
        store_artifact(&state, b"hello").await.unwrap();
        assert_eq!(std::fs::read(&state.target_path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_store_overwrites_not_appends() {
        let state = test_state("overwrite");
        store_artifact(&state, b"first upload").await.unwrap();
        store_artifact(&state, b"second").await.unwrap();
        assert_eq!(std::fs::read(&state.target_path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_repeated_upload_is_idempotent() {
        let state = test_state("idempotent");
        let payload = decode_image(br#"{"image": "aGVsbG8="}"#).unwrap();
        store_artifact(&state, &payload).await.unwrap();
        store_artifact(&state, &payload).await.unwrap();
        assert_eq!(std::fs::read(&state.target_path).unwrap(), b"hello");
    }
}
