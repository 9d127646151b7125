//! Integration tests for the wizard controller against an in-memory
//! backend.
//!
//! These tests drive the full controller — validation, screen transitions,
//! observer callbacks, range editing, OCR submission — with no network and
//! no rendering environment. Live-backend coverage lives in `tests/e2e.rs`.

use async_trait::async_trait;
use ocrflow::{
    ApiAction, ClipboardSink, DocumentService, DownloadFormat, ErrorSlot, OcrResult, PageRange,
    RangeField, ResultView, Screen, UploadResponse, WizardConfig, WizardController, WizardError,
    WizardObserver,
};
use std::sync::{Arc, Mutex};

// ── Fake backend ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeState {
    upload_calls: usize,
    ocr_calls: Vec<(String, Vec<[u32; 2]>)>,
    thumbnail_calls: Vec<u32>,
    download_calls: Vec<&'static str>,
}

/// In-memory [`DocumentService`]: canned responses, recorded calls.
struct FakeBackend {
    total_pages: u32,
    is_image: bool,
    ocr_result: OcrResult,
    upload_error: Option<(u16, String)>,
    ocr_error: Option<(u16, String)>,
    state: Mutex<FakeState>,
}

impl FakeBackend {
    fn pdf(total_pages: u32) -> Self {
        Self {
            total_pages,
            is_image: false,
            ocr_result: OcrResult {
                markdown: "# Doc".into(),
                txt: "Doc".into(),
                pages_processed: total_pages,
            },
            upload_error: None,
            ocr_error: None,
            state: Mutex::new(FakeState::default()),
        }
    }

    fn image() -> Self {
        let mut backend = Self::pdf(1);
        backend.is_image = true;
        backend.ocr_result.pages_processed = 1;
        backend
    }

    fn failing_upload(detail: &str) -> Self {
        let mut backend = Self::pdf(10);
        backend.upload_error = Some((400, detail.to_string()));
        backend
    }

    fn with_ocr_error(mut self, status: u16, detail: &str) -> Self {
        self.ocr_error = Some((status, detail.to_string()));
        self
    }

    fn upload_calls(&self) -> usize {
        self.state.lock().unwrap().upload_calls
    }

    fn ocr_calls(&self) -> Vec<(String, Vec<[u32; 2]>)> {
        self.state.lock().unwrap().ocr_calls.clone()
    }

    fn thumbnail_calls(&self) -> Vec<u32> {
        self.state.lock().unwrap().thumbnail_calls.clone()
    }
}

#[async_trait]
impl DocumentService for FakeBackend {
    async fn upload(
        &self,
        filename: &str,
        _bytes: Vec<u8>,
    ) -> Result<UploadResponse, WizardError> {
        self.state.lock().unwrap().upload_calls += 1;
        if let Some((status, detail)) = &self.upload_error {
            return Err(WizardError::Backend {
                status: *status,
                detail: detail.clone(),
            });
        }
        Ok(UploadResponse {
            doc_id: "d1".into(),
            filename: filename.to_string(),
            total_pages: self.total_pages,
            is_image: self.is_image,
        })
    }

    async fn run_ocr(
        &self,
        doc_id: &str,
        page_ranges: &[[u32; 2]],
    ) -> Result<OcrResult, WizardError> {
        self.state
            .lock()
            .unwrap()
            .ocr_calls
            .push((doc_id.to_string(), page_ranges.to_vec()));
        if let Some((status, detail)) = &self.ocr_error {
            return Err(WizardError::Backend {
                status: *status,
                detail: detail.clone(),
            });
        }
        Ok(self.ocr_result.clone())
    }

    async fn thumbnail(&self, _doc_id: &str, page: u32) -> Result<Vec<u8>, WizardError> {
        self.state.lock().unwrap().thumbnail_calls.push(page);
        Ok(vec![page as u8; 4])
    }

    async fn download(
        &self,
        _doc_id: &str,
        format: DownloadFormat,
    ) -> Result<Vec<u8>, WizardError> {
        self.state.lock().unwrap().download_calls.push(format.as_str());
        let body = match format {
            DownloadFormat::Markdown => self.ocr_result.markdown.clone(),
            DownloadFormat::PlainText => self.ocr_result.txt.clone(),
        };
        Ok(body.into_bytes())
    }

    fn download_url(&self, doc_id: &str, format: DownloadFormat) -> String {
        format!("fake://documents/{doc_id}/download/{}", format.as_str())
    }
}

// ── Recording observer ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Screen(Screen),
    Started(ApiAction),
    Finished(ApiAction),
    Error(ErrorSlot, String),
    Cleared(ErrorSlot),
    Label(String),
    Ranges(Vec<PageRange>),
    Thumbnail(u32),
    Summary(String),
    View(ResultView),
    Copied,
    Alert(String),
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Error(_, message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl WizardObserver for Recorder {
    fn on_screen_changed(&self, screen: Screen) {
        self.push(Event::Screen(screen));
    }
    fn on_action_started(&self, action: ApiAction) {
        self.push(Event::Started(action));
    }
    fn on_action_finished(&self, action: ApiAction) {
        self.push(Event::Finished(action));
    }
    fn on_error(&self, slot: ErrorSlot, message: &str) {
        self.push(Event::Error(slot, message.to_string()));
    }
    fn on_error_cleared(&self, slot: ErrorSlot) {
        self.push(Event::Cleared(slot));
    }
    fn on_page_count_label(&self, label: &str) {
        self.push(Event::Label(label.to_string()));
    }
    fn on_ranges_changed(&self, ranges: &[PageRange]) {
        self.push(Event::Ranges(ranges.to_vec()));
    }
    fn on_thumbnail_loaded(&self, page: u32, _image: &[u8]) {
        self.push(Event::Thumbnail(page));
    }
    fn on_result_summary(&self, label: &str) {
        self.push(Event::Summary(label.to_string()));
    }
    fn on_view_changed(&self, view: ResultView) {
        self.push(Event::View(view));
    }
    fn on_copy_succeeded(&self) {
        self.push(Event::Copied);
    }
    fn on_alert(&self, message: &str) {
        self.push(Event::Alert(message.to_string()));
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

fn wizard_with(
    backend: FakeBackend,
) -> (WizardController, Arc<FakeBackend>, Arc<Recorder>) {
    let backend = Arc::new(backend);
    let recorder = Arc::new(Recorder::default());
    let config = WizardConfig::default();
    let controller = WizardController::new(config, Arc::clone(&backend) as Arc<dyn DocumentService>)
        .with_observer(Arc::clone(&recorder) as Arc<dyn WizardObserver>);
    (controller, backend, recorder)
}

async fn upload_pdf(wizard: &mut WizardController) {
    wizard
        .upload("report.pdf", b"%PDF-1.7".to_vec())
        .await
        .expect("upload succeeds");
}

// ── Upload validation ────────────────────────────────────────────────────────

#[tokio::test]
async fn disallowed_extension_is_rejected_without_a_request() {
    let (mut wizard, backend, recorder) = wizard_with(FakeBackend::pdf(10));

    let err = wizard
        .upload("notes.docx", vec![0u8; 16])
        .await
        .expect_err("should reject");

    assert!(matches!(err, WizardError::UnsupportedExtension { .. }));
    assert_eq!(backend.upload_calls(), 0, "no network call may happen");
    assert_eq!(wizard.screen(), Screen::Upload);
    assert_eq!(recorder.errors(), vec!["支援格式：PDF、JPG、PNG".to_string()]);
}

#[tokio::test]
async fn oversized_file_is_rejected_without_a_request() {
    let (mut wizard, backend, recorder) = wizard_with(FakeBackend::pdf(10));

    let err = wizard
        .upload("big.pdf", vec![0u8; 25 * 1024 * 1024 + 1])
        .await
        .expect_err("should reject");

    assert!(matches!(err, WizardError::FileTooLarge { .. }));
    assert_eq!(backend.upload_calls(), 0);
    assert_eq!(recorder.errors(), vec!["檔案超過 25MB 限制".to_string()]);
}

#[tokio::test]
async fn upload_file_rejects_bad_extension_from_disk() {
    let (mut wizard, backend, _recorder) = wizard_with(FakeBackend::pdf(10));

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("notes.docx");
    std::fs::write(&path, b"not a document").expect("write");

    let err = wizard.upload_file(&path).await.expect_err("should reject");
    assert!(matches!(err, WizardError::UnsupportedExtension { .. }));
    assert_eq!(backend.upload_calls(), 0);
}

#[tokio::test]
async fn upload_file_reads_and_submits_a_valid_file() {
    let (mut wizard, backend, _recorder) = wizard_with(FakeBackend::pdf(3));

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scan.pdf");
    std::fs::write(&path, b"%PDF-1.7 tiny").expect("write");

    wizard.upload_file(&path).await.expect("upload succeeds");
    assert_eq!(backend.upload_calls(), 1);
    assert_eq!(wizard.screen(), Screen::Preview);
}

#[tokio::test]
async fn upload_failure_surfaces_server_detail_and_keeps_upload_screen() {
    let (mut wizard, _backend, recorder) =
        wizard_with(FakeBackend::failing_upload("Unsupported PDF revision"));

    let err = wizard
        .upload("weird.pdf", b"%PDF".to_vec())
        .await
        .expect_err("backend rejects");

    assert!(matches!(err, WizardError::Backend { status: 400, .. }));
    assert_eq!(wizard.screen(), Screen::Upload);
    assert!(wizard.session().document.is_none(), "session stays empty");
    assert_eq!(recorder.errors(), vec!["Unsupported PDF revision".to_string()]);
}

// ── Preview: default range, labels, thumbnails ───────────────────────────────

#[tokio::test]
async fn successful_upload_creates_default_range_and_shows_preview() {
    let (mut wizard, _backend, recorder) = wizard_with(FakeBackend::pdf(10));

    upload_pdf(&mut wizard).await;

    assert_eq!(wizard.screen(), Screen::Preview);
    assert_eq!(wizard.step(), 2);
    let doc = wizard.session().document.as_ref().expect("document set");
    assert_eq!(doc.doc_id, "d1");
    assert_eq!(doc.total_pages, 10);
    assert!(!doc.is_image);
    assert_eq!(wizard.session().ranges, vec![PageRange::new(1, 10)]);

    let events = recorder.events();
    assert!(events.contains(&Event::Screen(Screen::Preview)));
    assert!(events.contains(&Event::Label("共 10 頁".to_string())));
    // the in-flight window disabled and re-enabled the drop target
    assert!(events.contains(&Event::Started(ApiAction::Upload)));
    assert!(events.contains(&Event::Finished(ApiAction::Upload)));
}

#[tokio::test]
async fn added_range_defaults_to_previous_end_plus_one_clamped() {
    let (mut wizard, _backend, _recorder) = wizard_with(FakeBackend::pdf(10));
    upload_pdf(&mut wizard).await;

    // previous end + 1 would be 11 on a 10-page doc — clamps to 10
    wizard.add_range();
    assert_eq!(
        wizard.session().ranges,
        vec![PageRange::new(1, 10), PageRange::new(10, 10)]
    );
}

#[tokio::test]
async fn thumbnail_grid_is_capped_with_a_summary_note() {
    let (mut wizard, _backend, _recorder) = wizard_with(FakeBackend::pdf(200));
    upload_pdf(&mut wizard).await;

    let grid = wizard.thumbnails().expect("grid built");
    assert_eq!(grid.tile_count(), 60);
    assert_eq!(grid.overflow_note(), Some("... 共 200 頁"));
}

#[tokio::test]
async fn tile_visibility_fetches_once_then_stops() {
    let (mut wizard, backend, recorder) = wizard_with(FakeBackend::pdf(10));
    upload_pdf(&mut wizard).await;

    wizard.tile_visible(2).await.expect("first signal fetches");
    wizard.tile_visible(2).await.expect("repeat is a no-op");

    assert_eq!(backend.thumbnail_calls(), vec![3], "one fetch for page 3");
    assert_eq!(
        recorder
            .events()
            .iter()
            .filter(|e| matches!(e, Event::Thumbnail(3)))
            .count(),
        1
    );
}

#[tokio::test]
async fn prefetch_loads_every_tile_exactly_once() {
    let (mut wizard, backend, _recorder) = wizard_with(FakeBackend::pdf(5));
    upload_pdf(&mut wizard).await;

    wizard.tile_visible(0).await.expect("one tile via visibility");
    let fetched = wizard.prefetch_thumbnails().await;

    assert_eq!(fetched, 4, "only the remaining tiles are fetched");
    let mut calls = backend.thumbnail_calls();
    calls.sort_unstable();
    assert_eq!(calls, vec![1, 2, 3, 4, 5]);
}

// ── OCR validation ───────────────────────────────────────────────────────────

#[tokio::test]
async fn backwards_range_blocks_submission() {
    let (mut wizard, backend, recorder) = wizard_with(FakeBackend::pdf(10));
    upload_pdf(&mut wizard).await;

    wizard.set_range_field(0, RangeField::Start, "8");
    wizard.set_range_field(0, RangeField::End, "3");

    let err = wizard.run_ocr().await.expect_err("range order");
    assert!(matches!(err, WizardError::RangeOrder { start: 8, end: 3 }));
    assert!(backend.ocr_calls().is_empty(), "no partial submission");
    assert_eq!(wizard.screen(), Screen::Preview, "failure keeps the screen");
    assert_eq!(
        recorder.errors(),
        vec!["無效範圍：起始頁 (8) 不能大於結束頁 (3)".to_string()]
    );
}

#[tokio::test]
async fn out_of_range_end_blocks_submission() {
    let (mut wizard, backend, recorder) = wizard_with(FakeBackend::pdf(10));
    upload_pdf(&mut wizard).await;

    wizard.set_range_field(0, RangeField::End, "99");

    let err = wizard.run_ocr().await.expect_err("out of range");
    assert!(matches!(err, WizardError::RangeOutOfBounds { total: 10, .. }));
    assert!(backend.ocr_calls().is_empty());
    assert_eq!(recorder.errors(), vec!["頁碼超出範圍 (1–10)".to_string()]);
}

#[tokio::test]
async fn non_numeric_edit_falls_back_to_one_and_validates_clean() {
    let (mut wizard, backend, _recorder) = wizard_with(FakeBackend::pdf(10));
    upload_pdf(&mut wizard).await;

    wizard.set_range_field(0, RangeField::Start, "oops");
    wizard.run_ocr().await.expect("1–10 is valid");
    assert_eq!(backend.ocr_calls(), vec![("d1".to_string(), vec![[1, 10]])]);
}

#[tokio::test]
async fn empty_range_list_is_submitted_and_backend_rejects_it() {
    // Removing the last range is allowed and submission is not guarded —
    // the backend's own 400 comes back through the normal error path.
    let (mut wizard, backend, recorder) = wizard_with(
        FakeBackend::pdf(10).with_ocr_error(400, "No page ranges specified"),
    );
    upload_pdf(&mut wizard).await;

    wizard.remove_range(0);
    assert!(wizard.session().ranges.is_empty());

    let err = wizard.run_ocr().await.expect_err("backend rejects");
    assert!(matches!(err, WizardError::Backend { status: 400, .. }));
    assert_eq!(backend.ocr_calls(), vec![("d1".to_string(), vec![])]);
    assert_eq!(recorder.errors(), vec!["No page ranges specified".to_string()]);
    assert_eq!(wizard.screen(), Screen::Preview);
}

// ── OCR submission and results ───────────────────────────────────────────────

#[tokio::test]
async fn two_ranges_reach_the_backend_as_ordered_pairs() {
    let (mut wizard, backend, recorder) = wizard_with(FakeBackend::pdf(10));
    upload_pdf(&mut wizard).await;

    wizard.set_range_field(0, RangeField::End, "5");
    wizard.add_range(); // defaults to 6–10
    assert_eq!(
        wizard.session().ranges,
        vec![PageRange::new(1, 5), PageRange::new(6, 10)]
    );

    wizard.run_ocr().await.expect("ocr succeeds");

    assert_eq!(
        backend.ocr_calls(),
        vec![("d1".to_string(), vec![[1, 5], [6, 10]])]
    );
    assert_eq!(wizard.screen(), Screen::Results);
    assert!(recorder
        .events()
        .contains(&Event::Summary("已解析 10 頁".to_string())));

    let panels = wizard.panels().expect("panels built");
    assert!(panels.rendered_html().contains("<h1>Doc</h1>"));
    assert_eq!(panels.raw_markdown(), "# Doc");
    assert_eq!(panels.plain_text(), "Doc");
    assert_eq!(panels.active(), ResultView::Rendered);
}

#[tokio::test]
async fn image_document_submits_empty_ranges_regardless_of_range_state() {
    let (mut wizard, backend, recorder) = wizard_with(FakeBackend::image());

    wizard
        .upload("receipt.jpg", vec![0xFF, 0xD8, 0xFF])
        .await
        .expect("upload succeeds");

    assert_eq!(wizard.screen(), Screen::Preview);
    assert!(wizard.session().ranges.is_empty(), "range list is bypassed");
    assert!(recorder
        .events()
        .contains(&Event::Label("圖片（單頁）".to_string())));

    // even deliberately broken range state is ignored for images
    wizard.add_range();
    wizard.set_range_field(0, RangeField::Start, "7");

    wizard.run_ocr().await.expect("ocr succeeds");
    assert_eq!(backend.ocr_calls(), vec![("d1".to_string(), vec![])]);
    assert_eq!(wizard.screen(), Screen::Results);
}

#[tokio::test]
async fn ocr_failure_reports_inline_and_keeps_preview() {
    let (mut wizard, _backend, recorder) =
        wizard_with(FakeBackend::pdf(10).with_ocr_error(500, "OCR engine unavailable"));
    upload_pdf(&mut wizard).await;

    let err = wizard.run_ocr().await.expect_err("backend fails");
    assert!(matches!(err, WizardError::Backend { status: 500, .. }));
    assert_eq!(wizard.screen(), Screen::Preview);
    assert!(wizard.session().result.is_none());
    assert!(wizard.panels().is_none());
    assert_eq!(recorder.errors(), vec!["OCR engine unavailable".to_string()]);
}

#[tokio::test]
async fn switching_views_needs_no_refetch() {
    let (mut wizard, backend, _recorder) = wizard_with(FakeBackend::pdf(10));
    upload_pdf(&mut wizard).await;
    wizard.run_ocr().await.expect("ocr succeeds");

    wizard.switch_view(ResultView::Raw).expect("switch");
    assert_eq!(wizard.panels().unwrap().active_content(), "# Doc");
    wizard.switch_view(ResultView::PlainText).expect("switch");
    assert_eq!(wizard.panels().unwrap().active_content(), "Doc");

    assert_eq!(backend.ocr_calls().len(), 1, "views never re-fetch");
}

#[tokio::test]
async fn switch_view_without_result_is_an_error() {
    let (mut wizard, _backend, _recorder) = wizard_with(FakeBackend::pdf(10));
    let err = wizard.switch_view(ResultView::Raw).expect_err("no result");
    assert!(matches!(err, WizardError::NoResult));
}

// ── Clipboard and download ───────────────────────────────────────────────────

struct MemoryClipboard {
    copied: Mutex<Option<String>>,
}

impl ClipboardSink for MemoryClipboard {
    fn copy_text(&self, text: &str) -> Result<(), WizardError> {
        *self.copied.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn copy_puts_raw_markdown_on_the_clipboard() {
    let backend = Arc::new(FakeBackend::pdf(10));
    let recorder = Arc::new(Recorder::default());
    let clipboard = Arc::new(MemoryClipboard {
        copied: Mutex::new(None),
    });

    let mut wizard = WizardController::new(
        WizardConfig::default(),
        Arc::clone(&backend) as Arc<dyn DocumentService>,
    )
    .with_observer(Arc::clone(&recorder) as Arc<dyn WizardObserver>)
    .with_clipboard(Arc::clone(&clipboard) as Arc<dyn ClipboardSink>);

    upload_pdf(&mut wizard).await;
    wizard.run_ocr().await.expect("ocr succeeds");

    wizard.copy_markdown().expect("copy succeeds");
    assert_eq!(clipboard.copied.lock().unwrap().as_deref(), Some("# Doc"));
    assert!(recorder.events().contains(&Event::Copied));
}

#[tokio::test]
async fn copy_without_clipboard_raises_the_alert() {
    // the default sink is MissingClipboard
    let (mut wizard, _backend, recorder) = wizard_with(FakeBackend::pdf(10));
    upload_pdf(&mut wizard).await;
    wizard.run_ocr().await.expect("ocr succeeds");

    let err = wizard.copy_markdown().expect_err("no clipboard");
    assert!(matches!(err, WizardError::ClipboardUnavailable));
    assert!(recorder
        .events()
        .contains(&Event::Alert("複製失敗，請手動複製".to_string())));
}

#[tokio::test]
async fn download_is_parameterised_by_format() {
    let (mut wizard, backend, _recorder) = wizard_with(FakeBackend::pdf(10));
    upload_pdf(&mut wizard).await;
    wizard.run_ocr().await.expect("ocr succeeds");

    assert_eq!(
        wizard.download_url(DownloadFormat::Markdown).unwrap(),
        "fake://documents/d1/download/md"
    );
    let body = wizard
        .download(DownloadFormat::PlainText)
        .await
        .expect("download succeeds");
    assert_eq!(body, b"Doc");
    assert_eq!(backend.state.lock().unwrap().download_calls, vec!["txt"]);
}

// ── Reset ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_from_results_clears_everything() {
    let (mut wizard, _backend, recorder) = wizard_with(FakeBackend::pdf(10));
    upload_pdf(&mut wizard).await;
    wizard.run_ocr().await.expect("ocr succeeds");
    assert_eq!(wizard.screen(), Screen::Results);

    wizard.reset();

    assert_eq!(wizard.screen(), Screen::Upload);
    assert_eq!(wizard.step(), 1);
    assert_eq!(wizard.session().total_pages(), 0);
    assert!(wizard.session().document.is_none());
    assert!(wizard.session().ranges.is_empty());
    assert!(wizard.session().result.is_none());
    assert!(wizard.thumbnails().is_none());
    assert!(wizard.panels().is_none());

    let events = recorder.events();
    assert!(events.contains(&Event::Ranges(vec![])), "lists are cleared");
    assert!(events.ends_with(&[Event::Screen(Screen::Upload)]));
}

#[tokio::test]
async fn reset_from_preview_also_returns_to_upload() {
    let (mut wizard, _backend, _recorder) = wizard_with(FakeBackend::pdf(10));
    upload_pdf(&mut wizard).await;

    wizard.reset();
    assert_eq!(wizard.screen(), Screen::Upload);
    assert_eq!(wizard.session().total_pages(), 0);
}

#[tokio::test]
async fn a_new_upload_replaces_the_previous_session() {
    let (mut wizard, _backend, _recorder) = wizard_with(FakeBackend::pdf(10));
    upload_pdf(&mut wizard).await;
    wizard.run_ocr().await.expect("first run");

    upload_pdf(&mut wizard).await;
    assert_eq!(wizard.screen(), Screen::Preview);
    assert!(wizard.session().result.is_none(), "old result is gone");
    assert_eq!(wizard.session().ranges, vec![PageRange::new(1, 10)]);
}
