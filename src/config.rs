//! Configuration for the OCR wizard client.
//!
//! All client behaviour is controlled through [`WizardConfig`], built via
//! its [`WizardConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config between the controller and the HTTP service,
//! serialise it for logging, and diff two runs to understand why their
//! behaviour differs.

use crate::error::WizardError;
use serde::{Deserialize, Serialize};

/// File extensions accepted by the upload handler, lower-case, without the
/// leading dot. Mirrors the backend's own allow-list — rejecting locally
/// just saves the round trip.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "jpeg", "png"];

/// Client-side upload ceiling: 25 MB.
///
/// Deliberately below the backend's 50 MB hard limit so the common
/// oversized-file case fails instantly instead of after a long upload.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 25 * 1024 * 1024;

/// Placeholder-tile cap for the preview grid. Pages past this are covered
/// by a single summary note instead of individual tiles.
pub const DEFAULT_THUMBNAIL_TILE_CAP: usize = 60;

/// Configuration for a wizard session.
///
/// Built via [`WizardConfig::builder()`] or [`WizardConfig::default()`].
///
/// # Example
/// ```rust
/// use ocrflow::WizardConfig;
///
/// let config = WizardConfig::builder()
///     .base_url("http://127.0.0.1:8000")
///     .thumbnail_tile_cap(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Base URL of the OCR backend, without a trailing slash.
    /// Default: `http://127.0.0.1:8000`.
    pub base_url: String,

    /// Client-side upload size ceiling in bytes. Default: 25 MB.
    ///
    /// Checked locally before any network call; an oversized file never
    /// leaves the machine.
    pub max_file_bytes: u64,

    /// Maximum number of placeholder tiles in the preview grid. Default: 60.
    ///
    /// A 500-page scan would otherwise create 500 pending thumbnail fetches
    /// the moment the user scrolls; the cap bounds that to a screenful-ish
    /// worth of tiles plus one summary note stating the true total.
    pub thumbnail_tile_cap: usize,

    /// Per-request HTTP timeout in seconds. Default: `None` (no timeout).
    ///
    /// OCR runs on large documents can legitimately take minutes and the
    /// product never times them out — a failed request is reported and the
    /// user retries manually. Set this when embedding in a host that needs
    /// bounded waits.
    pub request_timeout_secs: Option<u64>,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            thumbnail_tile_cap: DEFAULT_THUMBNAIL_TILE_CAP,
            request_timeout_secs: None,
        }
    }
}

impl WizardConfig {
    /// Create a new builder for `WizardConfig`.
    pub fn builder() -> WizardConfigBuilder {
        WizardConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`WizardConfig`].
#[derive(Debug)]
pub struct WizardConfigBuilder {
    config: WizardConfig,
}

impl WizardConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.config.max_file_bytes = bytes.max(1);
        self
    }

    pub fn thumbnail_tile_cap(mut self, cap: usize) -> Self {
        self.config.thumbnail_tile_cap = cap.max(1);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<WizardConfig, WizardError> {
        let url = self.config.base_url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(WizardError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got '{url}'"
            )));
        }
        self.config.base_url = url.trim_end_matches('/').to_string();
        Ok(self.config)
    }
}
