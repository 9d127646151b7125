//! # ocrflow
//!
//! A three-step document OCR wizard client for a remote OCR backend:
//! upload a PDF or image, pick page ranges, run server-side OCR, and view
//! or download the resulting Markdown / plain text.
//!
//! ## Why this crate?
//!
//! The OCR service itself lives behind a REST API; what a host application
//! needs is the *workflow* — local validation before anything touches the
//! network, the screen state machine, lazy thumbnail loading, range
//! editing with its submission-time validation, and error surfacing that
//! never wedges the session. This crate packages that workflow with no UI
//! toolkit attached: presentation is an observer trait, the backend is a
//! service trait, and the wizard logic is fully testable headless.
//!
//! ## Wizard Flow
//!
//! ```text
//! Upload ──────▶ Preview ──────▶ Results
//!   │ validate     │ thumbnails     │ rendered / raw / txt
//!   │ ext + size   │ (lazy, ≤60)    │ copy to clipboard
//!   │ multipart    │ page ranges    │ download md / txt
//!   │ POST         │ POST /ocr      │
//!   └──────────────┴───── reset ────┴──▶ back to Upload
//! ```
//!
//! Failures never advance a screen: the inline error is set, session state
//! stays put, and the user retries.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocrflow::{HttpDocumentService, WizardConfig, WizardController};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WizardConfig::builder()
//!         .base_url("http://127.0.0.1:8000")
//!         .build()?;
//!     let service = Arc::new(HttpDocumentService::new(&config)?);
//!
//!     let mut wizard = WizardController::new(config, service);
//!     wizard.upload_file("document.pdf".as_ref()).await?;
//!     wizard.run_ocr().await?;
//!
//!     if let Some(panels) = wizard.panels() {
//!         println!("{}", panels.raw_markdown());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocrflow` binary (clap + anyhow + indicatif + arboard) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! ocrflow = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod results;
pub mod session;
pub mod thumbs;
pub mod wizard;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::http::HttpDocumentService;
pub use api::types::{OcrRequest, OcrResult, UploadResponse};
pub use api::{DocumentService, DownloadFormat};
pub use config::{WizardConfig, WizardConfigBuilder, ALLOWED_EXTENSIONS};
pub use error::{ApiAction, WizardError};
pub use events::{ClipboardSink, ErrorSlot, MissingClipboard, NoopObserver, WizardObserver};
pub use results::{ResultPanels, ResultView};
pub use session::{DocumentInfo, PageRange, RangeField, Screen, Session};
pub use thumbs::ThumbnailGrid;
pub use wizard::WizardController;
