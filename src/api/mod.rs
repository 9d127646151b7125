//! The network seam between the wizard and the OCR backend.
//!
//! The backend is an opaque remote service; everything the wizard needs
//! from it fits in the four calls of [`DocumentService`]. Putting a trait
//! at this seam keeps the controller testable without a network — tests
//! drive it against an in-memory fake, the binary against
//! [`http::HttpDocumentService`].

pub mod http;
pub mod types;

use crate::error::WizardError;
use async_trait::async_trait;
use types::{OcrResult, UploadResponse};

/// Download format accepted by the backend's download endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFormat {
    Markdown,
    PlainText,
}

impl DownloadFormat {
    /// The path segment the backend expects (`md` | `txt`).
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadFormat::Markdown => "md",
            DownloadFormat::PlainText => "txt",
        }
    }
}

/// Backend operations the wizard consumes.
///
/// All calls are single-shot: no retry, no timeout policy beyond what the
/// implementation's HTTP client carries. A failure is reported to the user,
/// state stays unchanged, and the user retries manually.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Upload a document; the backend answers with its id and page count.
    async fn upload(&self, filename: &str, bytes: Vec<u8>)
        -> Result<UploadResponse, WizardError>;

    /// Run OCR over the given `[start, end]` page ranges (empty = whole
    /// input).
    async fn run_ocr(
        &self,
        doc_id: &str,
        page_ranges: &[[u32; 2]],
    ) -> Result<OcrResult, WizardError>;

    /// Fetch the thumbnail image bytes for one page (1-indexed).
    async fn thumbnail(&self, doc_id: &str, page: u32) -> Result<Vec<u8>, WizardError>;

    /// Fetch the OCR result rendered as a downloadable file.
    async fn download(
        &self,
        doc_id: &str,
        format: DownloadFormat,
    ) -> Result<Vec<u8>, WizardError>;

    /// The URL a browser-like host would navigate to for a download.
    fn download_url(&self, doc_id: &str, format: DownloadFormat) -> String;
}
