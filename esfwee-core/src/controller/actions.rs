//! ``src/controller/actions.rs``
//! ============================================================================
//! # Actions: reader commands
//!
//! Every input the reader responds to, whether it comes from the terminal,
//! the presentation layer's visibility reports, or a caller driving the
//! session directly.

use crate::model::{page::ChapterId, reader_state::ReadingDirection, spread::PaginationMode};

/// What the session needs to know to open a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMeta {
    pub id: ChapterId,

    /// Display label, e.g. "Ch. 12"
    pub label: String,

    pub page_count: usize,
}

impl ChapterMeta {
    #[must_use]
    pub fn new(id: ChapterId, label: impl Into<String>, page_count: usize) -> Self {
        Self {
            id,
            label: label.into(),
            page_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReaderAction {
    /// Replace the current chapter and start at its first spread.
    OpenChapter(ChapterMeta),

    CloseChapter,

    /// Tap at a fraction of the screen width.
    Tap(f32),

    Advance,

    Retreat,

    /// 1-based page number.
    JumpToPage(usize),

    JumpToSpread(usize),

    /// Spread indices the presentation layer currently shows.
    VisibleIndicesChanged(Vec<usize>),

    SetPagination(PaginationMode),

    TogglePagination,

    SetDirection(ReadingDirection),

    CycleDirection,

    ToggleChrome,

    Quit,
}

impl ReaderAction {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenChapter(_) => "open_chapter",
            Self::CloseChapter => "close_chapter",
            Self::Tap(_) => "tap",
            Self::Advance => "advance",
            Self::Retreat => "retreat",
            Self::JumpToPage(_) => "jump_to_page",
            Self::JumpToSpread(_) => "jump_to_spread",
            Self::VisibleIndicesChanged(_) => "visible_indices_changed",
            Self::SetPagination(_) => "set_pagination",
            Self::TogglePagination => "toggle_pagination",
            Self::SetDirection(_) => "set_direction",
            Self::CycleDirection => "cycle_direction",
            Self::ToggleChrome => "toggle_chrome",
            Self::Quit => "quit",
        }
    }
}
