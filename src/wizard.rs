//! The wizard controller: three screens, one session, explicit transitions.
//!
//! The controller owns the [`Session`] and drives the
//! `Upload → Preview → Results` state machine. No screen is reachable
//! without its preceding success condition; failures report an inline
//! error and leave both screen and session untouched; reset returns to
//! Upload from anywhere.
//!
//! Presentation is fully delegated: every visible consequence of an
//! operation (screen change, control disabling, inline errors, list
//! re-renders, alerts) is delivered through [`WizardObserver`], so the
//! controller runs identically under a GUI, a terminal driver, or a test
//! harness with a fake backend.
//!
//! At most one upload and one OCR request are in flight at a time. The
//! observer is told to disable the triggering control for the duration;
//! because a non-DOM host has no intrinsic button to grey out, the
//! controller additionally refuses re-entry with
//! [`WizardError::RequestInFlight`] without touching any state.

use crate::api::{DocumentService, DownloadFormat};
use crate::config::{WizardConfig, ALLOWED_EXTENSIONS};
use crate::error::{ApiAction, WizardError};
use crate::events::{ClipboardSink, ErrorSlot, MissingClipboard, NoopObserver, WizardObserver};
use crate::results::{ResultPanels, ResultView};
use crate::session::{DocumentInfo, RangeField, Screen, Session};
use crate::thumbs::ThumbnailGrid;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Concurrent requests used when a host prefetches the whole grid at once.
const THUMBNAIL_PREFETCH_CONCURRENCY: usize = 8;

/// The wizard controller. See the module docs for the overall contract.
pub struct WizardController {
    config: WizardConfig,
    service: Arc<dyn DocumentService>,
    observer: Arc<dyn WizardObserver>,
    clipboard: Arc<dyn ClipboardSink>,
    session: Session,
    screen: Screen,
    thumbnails: Option<ThumbnailGrid>,
    panels: Option<ResultPanels>,
    upload_in_flight: bool,
    ocr_in_flight: bool,
}

impl WizardController {
    /// Create a controller on the Upload screen with an empty session.
    /// Observer and clipboard default to the no-op / missing
    /// implementations; attach real ones with [`Self::with_observer`] and
    /// [`Self::with_clipboard`].
    pub fn new(config: WizardConfig, service: Arc<dyn DocumentService>) -> Self {
        Self {
            config,
            service,
            observer: Arc::new(NoopObserver),
            clipboard: Arc::new(MissingClipboard),
            session: Session::new(),
            screen: Screen::Upload,
            thumbnails: None,
            panels: None,
            upload_in_flight: false,
            ocr_in_flight: false,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn WizardObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Arc<dyn ClipboardSink>) -> Self {
        self.clipboard = clipboard;
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// 1-based wizard step, for step-indicator UIs.
    pub fn step(&self) -> u8 {
        self.screen.step()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn thumbnails(&self) -> Option<&ThumbnailGrid> {
        self.thumbnails.as_ref()
    }

    pub fn panels(&self) -> Option<&ResultPanels> {
        self.panels.as_ref()
    }

    // ── Upload ────────────────────────────────────────────────────────────

    /// Validate a candidate file locally: extension allow-list first, then
    /// the size ceiling. A violation here means no request is made.
    pub fn validate_file(&self, filename: &str, size_bytes: u64) -> Result<(), WizardError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => {}
            _ => {
                return Err(WizardError::UnsupportedExtension {
                    filename: filename.to_string(),
                })
            }
        }
        if size_bytes > self.config.max_file_bytes {
            return Err(WizardError::FileTooLarge {
                size_bytes,
                limit_bytes: self.config.max_file_bytes,
            });
        }
        Ok(())
    }

    /// Upload a file from disk. The size check runs against the file
    /// metadata so an oversized file is rejected without being read.
    pub async fn upload_file(&mut self, path: &Path) -> Result<(), WizardError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let metadata = match tokio::fs::metadata(path).await {
            Ok(meta) => meta,
            Err(source) => {
                let err = WizardError::FileUnreadable {
                    path: path.to_path_buf(),
                    source,
                };
                self.report(ErrorSlot::Upload, &err);
                return Err(err);
            }
        };
        if let Err(err) = self.validate_file(&filename, metadata.len()) {
            self.report(ErrorSlot::Upload, &err);
            return Err(err);
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(source) => {
                let err = WizardError::FileUnreadable {
                    path: path.to_path_buf(),
                    source,
                };
                self.report(ErrorSlot::Upload, &err);
                return Err(err);
            }
        };

        self.upload(&filename, bytes).await
    }

    /// Upload in-memory file content.
    ///
    /// On success the session is populated, the thumbnail grid is built,
    /// the default page range is created (non-image documents), and the
    /// wizard transitions to Preview. On any failure the inline upload
    /// error is set and nothing else changes.
    pub async fn upload(&mut self, filename: &str, bytes: Vec<u8>) -> Result<(), WizardError> {
        if self.upload_in_flight {
            warn!("upload refused: request already in flight");
            return Err(WizardError::RequestInFlight {
                action: ApiAction::Upload,
            });
        }
        self.observer.on_error_cleared(ErrorSlot::Upload);

        // Local validation — a violation performs no request.
        if let Err(err) = self.validate_file(filename, bytes.len() as u64) {
            self.report(ErrorSlot::Upload, &err);
            return Err(err);
        }

        self.upload_in_flight = true;
        self.observer.on_action_started(ApiAction::Upload);
        let outcome = self.service.upload(filename, bytes).await;
        self.upload_in_flight = false;
        self.observer.on_action_finished(ApiAction::Upload);

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                self.report(ErrorSlot::Upload, &err);
                return Err(err);
            }
        };

        info!(
            "Upload accepted: doc_id={} '{}' total_pages={} is_image={}",
            response.doc_id, response.filename, response.total_pages, response.is_image
        );

        let document = DocumentInfo {
            doc_id: response.doc_id,
            filename: response.filename,
            total_pages: response.total_pages,
            is_image: response.is_image,
        };
        let is_image = document.is_image;
        let total_pages = document.total_pages;
        let doc_id = document.doc_id.clone();

        self.session.open_document(document);
        self.panels = None;
        self.thumbnails = Some(ThumbnailGrid::new(
            doc_id,
            total_pages,
            self.config.thumbnail_tile_cap,
        ));

        self.screen = Screen::Preview;
        self.observer.on_screen_changed(self.screen);

        if is_image {
            self.observer.on_page_count_label("圖片（單頁）");
        } else {
            self.observer
                .on_page_count_label(&format!("共 {total_pages} 頁"));
            // first range spans the whole document
            self.add_range();
        }

        Ok(())
    }

    // ── Range editor ──────────────────────────────────────────────────────

    /// Append a range (see [`Session::add_range`] for the defaulting rule)
    /// and re-render the list.
    pub fn add_range(&mut self) {
        self.session.add_range();
        self.observer.on_ranges_changed(&self.session.ranges);
    }

    /// Remove the range at `index` and re-render. Removing the last
    /// remaining range is allowed.
    pub fn remove_range(&mut self, index: usize) {
        self.session.remove_range(index);
        self.observer.on_ranges_changed(&self.session.ranges);
    }

    /// Apply a field edit from raw UI input and re-render. Non-numeric
    /// input falls back to 1; no consistency check happens until
    /// submission.
    pub fn set_range_field(&mut self, index: usize, field: RangeField, raw: &str) {
        self.session.set_range_field(index, field, raw);
        self.observer.on_ranges_changed(&self.session.ranges);
    }

    // ── OCR ───────────────────────────────────────────────────────────────

    /// Run OCR over the current selection.
    ///
    /// Multi-page documents validate every range first; the first
    /// violation is reported and nothing is submitted. Image documents
    /// skip validation and submit an empty range list ("process the whole
    /// input"). Success stores the result and transitions to Results;
    /// failure reports inline and keeps the current screen.
    pub async fn run_ocr(&mut self) -> Result<(), WizardError> {
        if self.ocr_in_flight {
            warn!("ocr refused: request already in flight");
            return Err(WizardError::RequestInFlight {
                action: ApiAction::Ocr,
            });
        }
        self.observer.on_error_cleared(ErrorSlot::Ocr);

        let Some(document) = self.session.document.clone() else {
            let err = WizardError::NoDocument;
            self.report(ErrorSlot::Ocr, &err);
            return Err(err);
        };

        if !document.is_image {
            if let Err(err) = self.session.validate_ranges() {
                self.report(ErrorSlot::Ocr, &err);
                return Err(err);
            }
        }

        let page_ranges = if document.is_image {
            Vec::new()
        } else {
            self.session.wire_ranges()
        };

        self.ocr_in_flight = true;
        self.observer.on_action_started(ApiAction::Ocr);
        let outcome = self.service.run_ocr(&document.doc_id, &page_ranges).await;
        self.ocr_in_flight = false;
        self.observer.on_action_finished(ApiAction::Ocr);

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                self.report(ErrorSlot::Ocr, &err);
                return Err(err);
            }
        };

        info!(
            "OCR complete: doc_id={} pages_processed={}",
            document.doc_id, result.pages_processed
        );

        let panels = ResultPanels::from_result(&result);
        self.observer.on_result_summary(&panels.summary_label());
        self.session.result = Some(result);
        self.panels = Some(panels);

        self.screen = Screen::Results;
        self.observer.on_screen_changed(self.screen);
        Ok(())
    }

    // ── Thumbnails ────────────────────────────────────────────────────────

    /// The presentation layer reports tile `index` scrolled near-into-view.
    /// Fetches the thumbnail on the first signal (fire-once) and hands the
    /// bytes to the observer; repeat signals and unknown indices are
    /// ignored.
    pub async fn tile_visible(&mut self, index: usize) -> Result<(), WizardError> {
        let Some(grid) = self.thumbnails.as_mut() else {
            return Ok(());
        };
        let Some(page) = grid.tiles().get(index).map(|t| t.page()) else {
            return Ok(());
        };
        match grid.tile_visible(index, self.service.as_ref()).await {
            Ok(Some(bytes)) => {
                debug!("thumbnail loaded: page={} ({} bytes)", page, bytes.len());
                self.observer.on_thumbnail_loaded(page, &bytes);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                // tile stays blank; thumbnails get no inline error slot
                warn!("thumbnail fetch failed for page {}: {}", page, err);
                Err(err)
            }
        }
    }

    /// Prefetch every remaining thumbnail — the stand-in for scrolling the
    /// whole grid into view in hosts without a viewport (the CLI). Each
    /// tile still fires at most once; bytes are delivered through the
    /// observer as usual. Returns the number of thumbnails fetched.
    pub async fn prefetch_thumbnails(&mut self) -> usize {
        let Some(grid) = self.thumbnails.as_mut() else {
            return 0;
        };
        let fetched = grid
            .prefetch_all(self.service.as_ref(), THUMBNAIL_PREFETCH_CONCURRENCY)
            .await;
        for (page, bytes) in &fetched {
            self.observer.on_thumbnail_loaded(*page, bytes);
        }
        fetched.len()
    }

    // ── Results ───────────────────────────────────────────────────────────

    /// Switch the visible results panel. Pure state change, no re-fetch.
    pub fn switch_view(&mut self, view: ResultView) -> Result<(), WizardError> {
        let panels = self.panels.as_mut().ok_or(WizardError::NoResult)?;
        panels.switch_to(view);
        self.observer.on_view_changed(view);
        Ok(())
    }

    /// Copy the raw Markdown to the clipboard. Failure raises the
    /// product's blocking alert through the observer instead of an inline
    /// error.
    pub fn copy_markdown(&self) -> Result<(), WizardError> {
        let Some(result) = self.session.result.as_ref() else {
            return Err(WizardError::NoResult);
        };
        match self.clipboard.copy_text(&result.markdown) {
            Ok(()) => {
                self.observer.on_copy_succeeded();
                Ok(())
            }
            Err(err) => {
                warn!("clipboard copy failed: {err:?}");
                self.observer.on_alert("複製失敗，請手動複製");
                Err(WizardError::ClipboardUnavailable)
            }
        }
    }

    /// The backend URL a browser-like host navigates to for a download.
    pub fn download_url(&self, format: DownloadFormat) -> Result<String, WizardError> {
        let document = self.session.document.as_ref().ok_or(WizardError::NoDocument)?;
        Ok(self.service.download_url(&document.doc_id, format))
    }

    /// Fetch the result file body for hosts that save to disk themselves.
    /// Whether a result exists is the backend's call — asking too early
    /// surfaces its own error.
    pub async fn download(&self, format: DownloadFormat) -> Result<Vec<u8>, WizardError> {
        let document = self.session.document.as_ref().ok_or(WizardError::NoDocument)?;
        self.service.download(&document.doc_id, format).await
    }

    // ── Reset ─────────────────────────────────────────────────────────────

    /// Clear the whole session and return to Upload — from any screen.
    pub fn reset(&mut self) {
        info!("Session reset");
        self.session.clear();
        self.thumbnails = None;
        self.panels = None;
        self.observer.on_ranges_changed(&[]);
        self.observer.on_error_cleared(ErrorSlot::Upload);
        self.observer.on_error_cleared(ErrorSlot::Ocr);
        self.screen = Screen::Upload;
        self.observer.on_screen_changed(self.screen);
    }

    fn report(&self, slot: ErrorSlot, err: &WizardError) {
        self.observer.on_error(slot, &err.to_string());
    }
}
