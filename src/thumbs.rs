//! Preview thumbnail grid: capped placeholder tiles with lazy, fire-once
//! loading.
//!
//! The grid renders up to [`crate::config::WizardConfig::thumbnail_tile_cap`]
//! placeholder tiles; pages past the cap get no individual tile, only a
//! summary note stating the true total. A tile's image is fetched the
//! first time the presentation layer reports it visible: any
//! viewport-visibility primitive (an IntersectionObserver, a scroll
//! handler, a focus event) calls [`ThumbnailGrid::tile_visible`] and the
//! grid does the rest.
//!
//! Fetches are independent and idempotent; several may be pending at once
//! with no ordering guarantee. Each tile fires exactly once: the trigger is
//! consumed when it fires, not when the fetch succeeds, so a failed fetch
//! is reported and the tile stays blank — no retry.

use crate::api::DocumentService;
use crate::error::WizardError;
use futures::stream::{self, StreamExt};
use tracing::warn;

/// One placeholder tile in the grid.
#[derive(Debug, Clone)]
pub struct Tile {
    page: u32,
    fetched: bool,
}

impl Tile {
    /// 1-based page number this tile shows.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Whether the visibility trigger has already fired for this tile.
    pub fn is_fetched(&self) -> bool {
        self.fetched
    }
}

/// The preview grid for one document.
#[derive(Debug, Clone)]
pub struct ThumbnailGrid {
    doc_id: String,
    total_pages: u32,
    tiles: Vec<Tile>,
    overflow_note: Option<String>,
}

impl ThumbnailGrid {
    /// Build the grid: one tile per page up to `tile_cap`, plus the
    /// 「... 共 N 頁」 note when pages were cut off.
    pub fn new(doc_id: impl Into<String>, total_pages: u32, tile_cap: usize) -> Self {
        let shown = (total_pages as usize).min(tile_cap);
        let tiles = (1..=shown as u32)
            .map(|page| Tile {
                page,
                fetched: false,
            })
            .collect();
        let overflow_note =
            (total_pages as usize > shown).then(|| format!("... 共 {total_pages} 頁"));
        Self {
            doc_id: doc_id.into(),
            total_pages,
            tiles,
            overflow_note,
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// The summary note shown after the tiles, present only when the
    /// document has more pages than tiles.
    pub fn overflow_note(&self) -> Option<&str> {
        self.overflow_note.as_deref()
    }

    /// The presentation layer reports tile `index` scrolled near-into-view.
    ///
    /// Fetches the thumbnail on the first signal and returns its bytes;
    /// returns `Ok(None)` for repeat signals and out-of-range indices. The
    /// fire-once mark is set before the fetch, so a failed fetch surfaces
    /// its error exactly once and later signals stay quiet.
    pub async fn tile_visible(
        &mut self,
        index: usize,
        service: &dyn DocumentService,
    ) -> Result<Option<Vec<u8>>, WizardError> {
        let Some(tile) = self.tiles.get_mut(index) else {
            return Ok(None);
        };
        if tile.fetched {
            return Ok(None);
        }
        tile.fetched = true;
        let page = tile.page;
        let bytes = service.thumbnail(&self.doc_id, page).await?;
        Ok(Some(bytes))
    }

    /// Fetch every not-yet-fetched tile, up to `concurrency` requests in
    /// flight at once — the batch equivalent of scrolling the whole grid
    /// into view.
    ///
    /// Each tile still fires at most once. Tiles whose fetch fails are
    /// skipped with a warning and stay blank, exactly like a single failed
    /// visibility fetch. Returns `(page, bytes)` pairs in page order.
    pub async fn prefetch_all(
        &mut self,
        service: &dyn DocumentService,
        concurrency: usize,
    ) -> Vec<(u32, Vec<u8>)> {
        let pending: Vec<u32> = self
            .tiles
            .iter_mut()
            .filter(|t| !t.fetched)
            .map(|t| {
                t.fetched = true;
                t.page
            })
            .collect();

        let doc_id = &self.doc_id;
        let mut fetched: Vec<(u32, Vec<u8>)> = stream::iter(pending.into_iter().map(|page| {
            async move {
                match service.thumbnail(doc_id, page).await {
                    Ok(bytes) => Some((page, bytes)),
                    Err(err) => {
                        warn!("thumbnail prefetch failed for page {page}: {err}");
                        None
                    }
                }
            }
        }))
        .buffer_unordered(concurrency.max(1))
        .filter_map(|result| async move { result })
        .collect()
        .await;

        fetched.sort_by_key(|(page, _)| *page);
        fetched
    }
}
