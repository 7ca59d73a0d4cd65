//! src/view/snapshots.rs
//! ============================================================
//! Immutable data-transfer structs captured from the reader
//! session after every state change and handed to the renderer.
//!
//! Snapshots are `Clone + Send + Sync` and contain no interior
//! mutability, so the render task never touches live state.

use std::collections::HashMap;

use compact_str::{CompactString, format_compact};

use crate::{
    controller::session::ReaderSession,
    model::{reader_state::ReadingDirection, spread::PaginationMode},
    operators::prefetcher::FetchStatus,
};

/// One page as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// 1-based page number
    pub index: usize,

    pub url: String,

    /// `None` until the prefetcher reports on this page
    pub status: Option<FetchStatus>,
}

/// One spread of the render window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadView {
    pub index: usize,

    /// Pages in reading order
    pub pages: Vec<PageView>,

    pub is_current: bool,
}

impl SpreadView {
    /// Pages in on-screen order, right to left for `rtl` spreads.
    pub fn visual_pages(
        &self,
        direction: ReadingDirection,
    ) -> impl Iterator<Item = &PageView> + '_ {
        let reversed: bool = direction == ReadingDirection::Rtl;

        let mut ordered: Vec<&PageView> = self.pages.iter().collect();
        if reversed {
            ordered.reverse();
        }
        ordered.into_iter()
    }
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReaderSnapshot {
    /// `None` when no chapter is open
    pub chapter_label: Option<CompactString>,

    /// 1-based; 0 for an empty chapter
    pub current_page: usize,

    pub page_count: usize,

    pub current_spread: usize,

    pub spread_count: usize,

    pub direction: ReadingDirection,

    pub mode: PaginationMode,

    pub chrome_visible: bool,

    /// Spreads of the render window, ascending
    pub window: Vec<SpreadView>,

    /// Digits typed towards a page jump
    pub pending_jump: Option<CompactString>,
}

impl ReaderSnapshot {
    #[must_use]
    pub fn capture(
        session: &ReaderSession,
        statuses: &HashMap<usize, FetchStatus>,
    ) -> Self {
        let layout = session.layout();
        let state = session.state();
        let current: usize = state.current_spread();

        let window: Vec<SpreadView> = session
            .render_window()
            .iter()
            .map(|index: usize| -> SpreadView {
                SpreadView {
                    index,
                    pages: layout
                        .pages_of(index)
                        .map(|page| PageView {
                            index: page.index,
                            url: page.url.clone(),
                            status: statuses.get(&page.index).cloned(),
                        })
                        .collect(),
                    is_current: index == current,
                }
            })
            .collect();

        Self {
            chapter_label: session
                .chapter()
                .map(|meta| CompactString::from(meta.label.as_str())),
            current_page: session.current_page(),
            page_count: layout.page_count(),
            current_spread: current,
            spread_count: layout.spread_count(),
            direction: state.direction,
            mode: state.pagination,
            chrome_visible: state.chrome_visible,
            window,
            pending_jump: None,
        }
    }

    /// "Page X / Y" indicator text.
    #[must_use]
    pub fn page_indicator(&self) -> CompactString {
        format_compact!("Page {} / {}", self.current_page, self.page_count)
    }

    #[must_use]
    pub fn current(&self) -> Option<&SpreadView> {
        self.window.iter().find(|s: &&SpreadView| s.is_current)
    }
}
