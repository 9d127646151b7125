//! Error types for the ocrflow library.
//!
//! Three distinct families reflect three distinct failure modes:
//!
//! * **Local validation** — a bad extension, an oversized file, an invalid
//!   page range. Detected synchronously, before any network call is made.
//!
//! * **Remote** — the backend answered with a non-success status (the
//!   server-supplied `detail` is surfaced verbatim) or the request never
//!   completed (a per-action generic fallback is shown instead).
//!
//! * **Clipboard** — the copy operation is unavailable or failed; reported
//!   through the observer's alert channel rather than inline error text.
//!
//! Display strings for user-facing variants are the zh-TW strings the
//! product ships with; they are what the presentation layer renders inline
//! next to the triggering control. None of these errors alter session
//! state — the wizard stays interactive and the user retries manually.

use std::path::PathBuf;
use thiserror::Error;

/// Which backend interaction an error belongs to.
///
/// Carried by transport-level failures so the user sees the right generic
/// fallback (「上傳失敗」 for a dead upload, 「OCR 失敗」 for a dead OCR
/// run), and by the in-flight guard so logs can name the refused action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiAction {
    Upload,
    Ocr,
    Thumbnail,
    Download,
}

impl ApiAction {
    /// Generic user-facing fallback when the server supplied no message.
    pub fn fallback_message(self) -> &'static str {
        match self {
            ApiAction::Upload => "上傳失敗",
            ApiAction::Ocr => "OCR 失敗",
            ApiAction::Thumbnail => "縮圖載入失敗",
            ApiAction::Download => "下載失敗",
        }
    }

    /// Short English tag for log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            ApiAction::Upload => "upload",
            ApiAction::Ocr => "ocr",
            ApiAction::Thumbnail => "thumbnail",
            ApiAction::Download => "download",
        }
    }
}

/// All errors returned by the ocrflow library.
#[derive(Debug, Error)]
pub enum WizardError {
    // ── Local validation ──────────────────────────────────────────────────
    /// File extension is not in the allow-list {pdf, jpg, jpeg, png}.
    #[error("支援格式：PDF、JPG、PNG")]
    UnsupportedExtension { filename: String },

    /// File exceeds the client-side size ceiling (25 MB by default).
    #[error("檔案超過 25MB 限制")]
    FileTooLarge { size_bytes: u64, limit_bytes: u64 },

    /// A page range runs backwards (start > end).
    #[error("無效範圍：起始頁 ({start}) 不能大於結束頁 ({end})")]
    RangeOrder { start: u32, end: u32 },

    /// A page range reaches outside the document (start < 1 or end > total).
    #[error("頁碼超出範圍 (1–{total})")]
    RangeOutOfBounds { start: u32, end: u32, total: u32 },

    /// The local file could not be read before upload.
    #[error("無法讀取檔案：{path}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Remote ────────────────────────────────────────────────────────────
    /// The backend answered with a non-success status and a `detail` body.
    #[error("{detail}")]
    Backend { status: u16, detail: String },

    /// The request failed before a usable response arrived (connect,
    /// timeout, malformed body). The user sees the per-action generic
    /// fallback; `reason` goes to the logs.
    #[error("{}", .action.fallback_message())]
    Transport { action: ApiAction, reason: String },

    // ── Controller state ──────────────────────────────────────────────────
    /// An operation needs an uploaded document and there is none.
    #[error("尚未上傳文件")]
    NoDocument,

    /// An operation needs an OCR result and there is none.
    #[error("尚未取得辨識結果")]
    NoResult,

    /// The same action is already in flight; the attempt is refused and
    /// session state is untouched.
    #[error("另一個請求正在進行中")]
    RequestInFlight { action: ApiAction },

    // ── Clipboard ─────────────────────────────────────────────────────────
    /// Clipboard copy is unavailable or failed.
    #[error("複製失敗，請手動複製")]
    ClipboardUnavailable,

    // ── Config ────────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WizardError {
    /// True for errors detected locally, before any network call.
    pub fn is_local_validation(&self) -> bool {
        matches!(
            self,
            WizardError::UnsupportedExtension { .. }
                | WizardError::FileTooLarge { .. }
                | WizardError::RangeOrder { .. }
                | WizardError::RangeOutOfBounds { .. }
        )
    }
}
