//! Results viewer: three alternate views over one OCR result.
//!
//! The backend returns the recognised document once, as Markdown plus a
//! plain-text rendition. The viewer derives all three panels up front —
//! rendered HTML, raw Markdown source, plain text — so switching views is
//! a pure state change with no re-fetch. Exactly one view is active at a
//! time; the host shows that panel and hides the others.

use crate::api::types::OcrResult;
use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};

/// The three result views. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultView {
    /// Markdown rendered to HTML.
    Rendered,
    /// Raw Markdown source.
    Raw,
    /// Plain text.
    PlainText,
}

/// The populated result panels plus which one is showing.
#[derive(Debug, Clone)]
pub struct ResultPanels {
    rendered_html: String,
    raw_markdown: String,
    plain_text: String,
    pages_processed: u32,
    active: ResultView,
}

impl ResultPanels {
    /// Derive all three panels from an OCR result. The rendered view is
    /// active initially, as in the product.
    pub fn from_result(result: &OcrResult) -> Self {
        Self {
            rendered_html: render_markdown(&result.markdown),
            raw_markdown: result.markdown.clone(),
            plain_text: result.txt.clone(),
            pages_processed: result.pages_processed,
            active: ResultView::Rendered,
        }
    }

    /// The summary line above the panels: 「已解析 N 頁」.
    pub fn summary_label(&self) -> String {
        format!("已解析 {} 頁", self.pages_processed)
    }

    pub fn active(&self) -> ResultView {
        self.active
    }

    /// Switch the visible panel. Pure state change — nothing is re-fetched
    /// or re-rendered.
    pub fn switch_to(&mut self, view: ResultView) {
        self.active = view;
    }

    /// Content of the currently active panel.
    pub fn active_content(&self) -> &str {
        match self.active {
            ResultView::Rendered => &self.rendered_html,
            ResultView::Raw => &self.raw_markdown,
            ResultView::PlainText => &self.plain_text,
        }
    }

    pub fn rendered_html(&self) -> &str {
        &self.rendered_html
    }

    pub fn raw_markdown(&self) -> &str {
        &self.raw_markdown
    }

    pub fn plain_text(&self) -> &str {
        &self.plain_text
    }
}

/// Render Markdown to HTML with the GFM-ish extensions the backend's
/// output actually uses (tables, strikethrough, footnotes).
fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}
