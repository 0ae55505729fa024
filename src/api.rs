use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{DownloadStatus, ProgressUpdate, StreamKind, VideoMetadata};

/// The two ways a server call can go wrong. `Backend` messages are shown to
/// the user verbatim; `Transport` renders as a generic network error with the
/// detail kept for the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Backend(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Body of `POST /download`.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub itag: String,
    pub download_type: StreamKind,
    /// Opaque to this client; the server decides what it means.
    pub download_location: String,
}

/// Seam between the controller and the download server. Workers only see
/// this trait, so tests can script responses without a live server.
pub trait DownloadBackend: Send + Sync {
    fn fetch_video_info(&self, url: &str) -> Result<VideoMetadata, ApiError>;
    fn submit_download(&self, request: &DownloadRequest) -> Result<String, ApiError>;
    fn poll_progress(&self, download_id: &str) -> Result<ProgressUpdate, ApiError>;
    /// Link to the finished artifact. Handed to the user, never fetched here.
    fn artifact_url(&self, download_id: &str) -> String;
}

pub struct HttpBackend {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpBackend {
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:5000";

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        let response = self.client.get(url).send().map_err(transport)?;
        response.json().map_err(transport)
    }

    fn post_json<B: Serialize>(&self, url: &str, body: &B) -> Result<Value, ApiError> {
        let response = self.client.post(url).json(body).send().map_err(transport)?;
        response.json().map_err(transport)
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

/// Checks the `{success, error, ...}` envelope, passing the full value
/// through on success and surfacing the server's own message otherwise.
fn unwrap_envelope(value: Value) -> Result<Value, ApiError> {
    if value.get("success").and_then(Value::as_bool).unwrap_or(false) {
        Ok(value)
    } else {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown server error")
            .to_string();
        Err(ApiError::Backend(message))
    }
}

fn decode_metadata(value: Value) -> Result<VideoMetadata, ApiError> {
    let value = unwrap_envelope(value)?;
    serde_json::from_value(value)
        .map_err(|e| ApiError::Transport(format!("malformed metadata: {}", e)))
}

fn decode_submission(value: Value) -> Result<String, ApiError> {
    let value = unwrap_envelope(value)?;
    value
        .get("download_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::Transport("response missing download_id".to_string()))
}

fn decode_progress(value: Value) -> Result<ProgressUpdate, ApiError> {
    let progress = value.get("progress").and_then(Value::as_f64).unwrap_or(0.0);
    let status = value
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Transport("response missing status".to_string()))?;
    Ok(ProgressUpdate {
        progress,
        status: DownloadStatus::from_wire(status),
    })
}

impl DownloadBackend for HttpBackend {
    fn fetch_video_info(&self, url: &str) -> Result<VideoMetadata, ApiError> {
        log::info!("fetching video info for {}", url);
        let body = serde_json::json!({ "url": url });
        let value = self.post_json(&self.endpoint("/fetch_video_info"), &body)?;
        decode_metadata(value)
    }

    fn submit_download(&self, request: &DownloadRequest) -> Result<String, ApiError> {
        log::info!("submitting download, itag {}", request.itag);
        let value = self.post_json(&self.endpoint("/download"), request)?;
        decode_submission(value)
    }

    fn poll_progress(&self, download_id: &str) -> Result<ProgressUpdate, ApiError> {
        let value = self.get_json(&self.endpoint(&format!("/progress/{}", download_id)))?;
        decode_progress(value)
    }

    fn artifact_url(&self, download_id: &str) -> String {
        self.endpoint(&format!("/download_file/{}", download_id))
    }
}
