//! HTTP implementation of [`DocumentService`] over the backend's REST API.
//!
//! Error mapping follows the product's rule exactly: a non-success response
//! whose body parses as `{detail}` surfaces that message verbatim
//! ([`WizardError::Backend`]); anything else — connect failure, timeout,
//! unparseable body — becomes a [`WizardError::Transport`] whose display is
//! the per-action generic fallback. The raw reason is kept on the error for
//! the logs, never shown inline.

use crate::api::types::{ErrorBody, OcrRequest, OcrResult, UploadResponse};
use crate::api::{DocumentService, DownloadFormat};
use crate::config::WizardConfig;
use crate::error::{ApiAction, WizardError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// A [`DocumentService`] talking to a real OCR backend.
#[derive(Debug, Clone)]
pub struct HttpDocumentService {
    http: Client,
    base_url: String,
}

impl HttpDocumentService {
    /// Build a service from the wizard config.
    pub fn new(config: &WizardConfig) -> Result<Self, WizardError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| WizardError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/documents{}", self.base_url, path)
    }

    /// Decode a response into `T`, or map a non-success status to the
    /// server's `detail` message / the action's generic fallback.
    async fn read_json<T: DeserializeOwned>(
        response: Response,
        action: ApiAction,
    ) -> Result<T, WizardError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(response, action).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| transport(action, e))
    }

    /// Read raw bytes, mapping non-success statuses the same way.
    async fn read_bytes(response: Response, action: ApiAction) -> Result<Vec<u8>, WizardError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(response, action).await);
        }
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| transport(action, e))
    }

    async fn error_from_response(response: Response, action: ApiAction) -> WizardError {
        let status = response.status();
        let body = response.bytes().await.unwrap_or_default();
        match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(parsed) => {
                warn!(
                    "{} failed: HTTP {} — {}",
                    action.as_str(),
                    status.as_u16(),
                    parsed.detail
                );
                WizardError::Backend {
                    status: status.as_u16(),
                    detail: parsed.detail,
                }
            }
            Err(_) => {
                warn!("{} failed: HTTP {} (no detail body)", action.as_str(), status);
                WizardError::Transport {
                    action,
                    reason: format!("HTTP {status}"),
                }
            }
        }
    }
}

fn transport(action: ApiAction, err: reqwest::Error) -> WizardError {
    WizardError::Transport {
        action,
        reason: err.to_string(),
    }
}

#[async_trait]
impl DocumentService for HttpDocumentService {
    async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, WizardError> {
        info!("Uploading '{}' ({} bytes)", filename, bytes.len());

        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport(ApiAction::Upload, e))?;

        let parsed: UploadResponse = Self::read_json(response, ApiAction::Upload).await?;
        debug!(
            "Upload accepted: doc_id={} total_pages={} is_image={}",
            parsed.doc_id, parsed.total_pages, parsed.is_image
        );
        Ok(parsed)
    }

    async fn run_ocr(
        &self,
        doc_id: &str,
        page_ranges: &[[u32; 2]],
    ) -> Result<OcrResult, WizardError> {
        info!("Running OCR on {} ({} ranges)", doc_id, page_ranges.len());

        let response = self
            .http
            .post(self.endpoint(&format!("/{doc_id}/ocr")))
            .json(&OcrRequest {
                page_ranges: page_ranges.to_vec(),
            })
            .send()
            .await
            .map_err(|e| transport(ApiAction::Ocr, e))?;

        let result: OcrResult = Self::read_json(response, ApiAction::Ocr).await?;
        debug!("OCR complete: {} pages processed", result.pages_processed);
        Ok(result)
    }

    async fn thumbnail(&self, doc_id: &str, page: u32) -> Result<Vec<u8>, WizardError> {
        let response = self
            .http
            .get(self.endpoint(&format!("/{doc_id}/thumbnail/{page}")))
            .send()
            .await
            .map_err(|e| transport(ApiAction::Thumbnail, e))?;
        Self::read_bytes(response, ApiAction::Thumbnail).await
    }

    async fn download(
        &self,
        doc_id: &str,
        format: DownloadFormat,
    ) -> Result<Vec<u8>, WizardError> {
        let response = self
            .http
            .get(self.download_url(doc_id, format))
            .send()
            .await
            .map_err(|e| transport(ApiAction::Download, e))?;
        Self::read_bytes(response, ApiAction::Download).await
    }

    fn download_url(&self, doc_id: &str, format: DownloadFormat) -> String {
        self.endpoint(&format!("/{doc_id}/download/{}", format.as_str()))
    }
}
