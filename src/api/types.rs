//! Wire types for the OCR backend's REST API.
//!
//! Field names match the backend JSON exactly (`doc_id`, `total_pages`,
//! `pages_processed`, …) so plain serde derives are enough — no rename
//! attributes, no hand parsing.

use serde::{Deserialize, Serialize};

/// Response body of `POST /api/documents/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub doc_id: String,
    pub filename: String,
    pub total_pages: u32,
    pub is_image: bool,
}

/// Request body of `POST /api/documents/{doc_id}/ocr`.
///
/// `page_ranges` is a list of 1-indexed inclusive `[start, end]` pairs.
/// An empty list signals "process the entire input" and is what the client
/// sends for single-image documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrRequest {
    pub page_ranges: Vec<[u32; 2]>,
}

/// Response body of a successful OCR run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrResult {
    pub markdown: String,
    pub txt: String,
    pub pages_processed: u32,
}

/// Error body the backend attaches to non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
