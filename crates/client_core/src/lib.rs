use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use shared::{
    domain::{Direction, HistoryItem},
    error::ApiError,
    protocol::{resolve_path, GenerateResponse, HistoryRecord},
};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

pub mod compare;
pub mod config;
pub mod session;
pub mod upload;

pub use config::{load_settings_from, ClientSettings};
pub use upload::UploadFile;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid service address '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(
        "service returned HTTP {status}: {}",
        .api.as_ref().map(|api| api.message.as_str()).unwrap_or("no detail")
    )]
    Status { status: u16, api: Option<ApiError> },
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("cannot resolve result path '{path}': {source}")]
    ResultPath {
        path: String,
        source: url::ParseError,
    },
    #[error("failed to read upload '{}': {source}", .path.display())]
    ReadUpload {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Remote generation/history service as seen by the session controller.
#[async_trait]
pub trait StainService: Send + Sync {
    /// Submits an image and returns the absolute reference of the generated output.
    async fn generate(&self, upload: UploadFile, direction: Direction) -> Result<Url, ClientError>;
    /// Fetches the full history list, in service order.
    async fn history(&self) -> Result<Vec<HistoryItem>, ClientError>;
}

/// HTTP consumer of the `/generate` and `/history` endpoints.
#[derive(Debug, Clone)]
pub struct StainClient {
    http: Client,
    api_url: String,
}

impl StainClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_http(api_url.into(), Client::new())
    }

    pub fn with_timeout(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_http(api_url.into(), http)
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientError> {
        match settings.request_timeout() {
            Some(timeout) => Self::with_timeout(settings.api_url.clone(), timeout),
            None => Self::new(settings.api_url.clone()),
        }
    }

    fn with_http(api_url: String, http: Client) -> Result<Self, ClientError> {
        let api_url = config::normalize_api_url(&api_url);
        Url::parse(&api_url).map_err(|source| ClientError::InvalidBaseUrl {
            url: api_url.clone(),
            source,
        })?;
        Ok(Self { http, api_url })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub async fn generate(
        &self,
        upload: &UploadFile,
        direction: Direction,
    ) -> Result<Url, ClientError> {
        let file_part = Part::bytes(upload.bytes().to_vec())
            .file_name(upload.file_name().to_string())
            .mime_str(upload.mime_type())?;
        let form = Form::new()
            .part("file", file_part)
            .text("direction", direction.wire_token());

        info!(
            file = upload.file_name(),
            bytes = upload.len(),
            direction = direction.wire_token(),
            "submitting generation request"
        );
        let response = self
            .http
            .post(format!("{}/generate", self.api_url))
            .multipart(form)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)?;

        resolve_path(&self.api_url, &parsed.he_path).map_err(|source| ClientError::ResultPath {
            path: parsed.he_path,
            source,
        })
    }

    pub async fn history(&self) -> Result<Vec<HistoryItem>, ClientError> {
        let response = self
            .http
            .get(format!("{}/history", self.api_url))
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        let records: Vec<HistoryRecord> = serde_json::from_str(&body)?;

        let total = records.len();
        let items: Vec<HistoryItem> = records
            .into_iter()
            .filter_map(|record| match record.into_item(&self.api_url) {
                Ok(item) => Some(item),
                Err(err) => {
                    warn!("skipping history record: {err}");
                    None
                }
            })
            .collect();
        debug!(received = total, kept = items.len(), "history fetched");
        Ok(items)
    }

    /// Downloads a generated image so it can be saved locally.
    pub async fn fetch_result(&self, url: &Url) -> Result<Vec<u8>, ClientError> {
        let response = self.http.get(url.clone()).send().await?;
        let bytes = check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl StainService for StainClient {
    async fn generate(&self, upload: UploadFile, direction: Direction) -> Result<Url, ClientError> {
        StainClient::generate(self, &upload, direction).await
    }

    async fn history(&self) -> Result<Vec<HistoryItem>, ClientError> {
        StainClient::history(self).await
    }
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        api: ApiError::from_response_body(status.as_u16(), &body),
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
