//! ``src/model/reader_state.rs``
//! ============================================================================
//! # `ReaderState`: position and mode of one reading session
//!
//! Owned by the session and mutated only through the navigation engine and
//! the position tracker. `anchor_page` remembers the page the reader actually
//! reached so that toggling pagination back and forth lands on the same page.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::spread::{PaginationMode, SpreadLayout};

/// Reading direction. Only `Rtl` flips the left/right tap mapping; spread
/// indices always grow towards the end of the chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingDirection {
    Ltr,

    #[default]
    Rtl,

    Vertical,
}

impl ReadingDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
            Self::Vertical => "vertical",
        }
    }

    /// Next direction in settings order: ltr, rtl, vertical.
    #[must_use]
    pub const fn cycled(self) -> Self {
        match self {
            Self::Ltr => Self::Rtl,
            Self::Rtl => Self::Vertical,
            Self::Vertical => Self::Ltr,
        }
    }

    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        !matches!(self, Self::Vertical)
    }
}

impl std::fmt::Display for ReadingDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReadingDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ltr" => Ok(Self::Ltr),
            "rtl" => Ok(Self::Rtl),
            "vertical" => Ok(Self::Vertical),
            other => Err(format!("unknown reading direction '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderState {
    current_spread: usize,

    /// Page the reader last settled on; survives pagination toggles.
    anchor_page: usize,

    pub direction: ReadingDirection,

    pub pagination: PaginationMode,

    /// Header and page indicator visibility.
    pub chrome_visible: bool,
}

impl ReaderState {
    #[must_use]
    pub const fn new(direction: ReadingDirection, pagination: PaginationMode) -> Self {
        Self {
            current_spread: 0,
            anchor_page: 1,
            direction,
            pagination,
            chrome_visible: true,
        }
    }

    #[must_use]
    pub const fn current_spread(&self) -> usize {
        self.current_spread
    }

    #[must_use]
    pub const fn anchor_page(&self) -> usize {
        self.anchor_page
    }

    /// Page shown in the "Page X / Y" indicator: the anchor when it lies in
    /// the current spread, otherwise the spread's first page. 0 for an empty
    /// chapter.
    #[must_use]
    pub fn current_page(&self, layout: &SpreadLayout) -> usize {
        match layout.spread(self.current_spread) {
            Some(spread) if spread.contains(self.anchor_page) => self.anchor_page,
            Some(spread) => spread.first_page(),
            None => 0,
        }
    }

    /// Move to `index` and re-anchor on its first page.
    pub(crate) fn settle_on(&mut self, index: usize, layout: &SpreadLayout) {
        self.current_spread = index;
        if let Some(page) = layout.first_page_of(index) {
            self.anchor_page = page;
        }
    }

    /// Move to `index` but anchor on `page`, which lies within that spread.
    pub(crate) const fn settle_on_page(&mut self, index: usize, page: usize) {
        self.current_spread = index;
        self.anchor_page = page;
    }

    /// Move to `index` keeping the anchor (pagination toggles).
    pub(crate) const fn reposition(&mut self, index: usize) {
        self.current_spread = index;
    }

    pub const fn toggle_chrome(&mut self) {
        self.chrome_visible = !self.chrome_visible;
    }
}

impl Default for ReaderState {
    fn default() -> Self {
        Self::new(ReadingDirection::default(), PaginationMode::default())
    }
}
