//! Presentation-layer ports: the observer trait and the clipboard sink.
//!
//! Everything a UI would do in response to the wizard — showing and
//! hiding sections, greying out buttons, writing inline error text — is
//! dispatched through an explicit trait, so the wizard logic runs and
//! tests without any rendering environment: a host UI implements
//! [`WizardObserver`] and mirrors each callback into whatever toolkit it
//! uses; headless callers use [`NoopObserver`] and ignore the lot.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: hosts
//! can forward events to a channel, a terminal, or a widget tree without
//! the library knowing how the host communicates. The trait is
//! `Send + Sync` so a controller can be driven from spawned tasks. All
//! methods have default no-op implementations so hosts only override what
//! they care about.

use crate::error::{ApiAction, WizardError};
use crate::results::ResultView;
use crate::session::{PageRange, Screen};

/// Inline error slots, one per triggering control.
///
/// Errors render next to the control that caused them — the upload drop
/// zone or the OCR submit button — and are cleared when that action is
/// next attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSlot {
    Upload,
    Ocr,
}

/// Callbacks the controller fires as the wizard progresses.
pub trait WizardObserver: Send + Sync {
    /// A screen transition happened (including reset back to Upload).
    /// `screen.step()` gives the 1-based step for a step-indicator UI.
    fn on_screen_changed(&self, screen: Screen) {
        let _ = screen;
    }

    /// A request went in flight; the host should disable the triggering
    /// control (drop zone for uploads, submit button for OCR) to prevent
    /// duplicate submissions.
    fn on_action_started(&self, action: ApiAction) {
        let _ = action;
    }

    /// The in-flight request finished (success or failure); re-enable the
    /// control.
    fn on_action_finished(&self, action: ApiAction) {
        let _ = action;
    }

    /// Show `message` inline in the given slot.
    fn on_error(&self, slot: ErrorSlot, message: &str) {
        let _ = (slot, message);
    }

    /// Clear the given slot (fired when its action is re-attempted).
    fn on_error_cleared(&self, slot: ErrorSlot) {
        let _ = slot;
    }

    /// The preview's page-count label: 「共 N 頁」 for PDFs,
    /// 「圖片（單頁）」 for images.
    fn on_page_count_label(&self, label: &str) {
        let _ = label;
    }

    /// The range list changed; re-render it wholesale. Fired on every
    /// add / remove / field edit.
    fn on_ranges_changed(&self, ranges: &[PageRange]) {
        let _ = ranges;
    }

    /// A thumbnail finished loading for a visible tile (1-based page).
    fn on_thumbnail_loaded(&self, page: u32, image: &[u8]) {
        let _ = (page, image);
    }

    /// OCR finished; the results summary label 「已解析 N 頁」.
    fn on_result_summary(&self, label: &str) {
        let _ = label;
    }

    /// The active results view changed.
    fn on_view_changed(&self, view: ResultView) {
        let _ = view;
    }

    /// The raw Markdown was copied to the clipboard (host shows 「已複製」).
    fn on_copy_succeeded(&self) {}

    /// A blocking alert, for failures that must interrupt rather than
    /// annotate inline — currently only clipboard failure.
    fn on_alert(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for hosts that don't need UI events.
pub struct NoopObserver;

impl WizardObserver for NoopObserver {}

/// Clipboard access, provided by the host.
///
/// The library cannot assume a clipboard exists (headless runs, CI,
/// Wayland sessions without a portal); the controller reports any failure
/// through [`WizardObserver::on_alert`] with the product's fallback
/// message.
pub trait ClipboardSink: Send + Sync {
    fn copy_text(&self, text: &str) -> Result<(), WizardError>;
}

/// The default sink for hosts without clipboard access: every copy fails.
pub struct MissingClipboard;

impl ClipboardSink for MissingClipboard {
    fn copy_text(&self, _text: &str) -> Result<(), WizardError> {
        Err(WizardError::ClipboardUnavailable)
    }
}
