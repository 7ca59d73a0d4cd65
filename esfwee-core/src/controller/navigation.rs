//! ``src/controller/navigation.rs``
//! ============================================================================
//! # Navigation engine
//!
//! Maps taps and discrete commands onto spread-index transitions. Index
//! arithmetic is direction-free: advancing always moves towards the last
//! spread. Only the tap-zone interpretation depends on the reading direction
//! (a left tap advances in `rtl`, retreats otherwise).
//!
//! Moving past either end is a no-op reported as [`NavOutcome::AtBoundary`];
//! a zero-page chapter turns every request into [`NavOutcome::EmptyChapter`].

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    error::{ReaderError, ReaderResult},
    model::{reader_state::ReaderState, reader_state::ReadingDirection, spread::SpreadLayout},
};

/// Horizontal tap region, by fraction of the screen width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapZone {
    Left,
    Center,
    Right,
}

/// Zone boundaries: `[0, left)` is left, `(right, 1]` is right, the rest is
/// center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapZones {
    pub left: f32,
    pub right: f32,
}

impl TapZones {
    #[must_use]
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    #[must_use]
    pub fn classify(&self, x_fraction: f32) -> TapZone {
        if !x_fraction.is_finite() {
            return TapZone::Center;
        }

        let x: f32 = x_fraction.clamp(0.0, 1.0);
        if x < self.left {
            TapZone::Left
        } else if x > self.right {
            TapZone::Right
        } else {
            TapZone::Center
        }
    }
}

impl Default for TapZones {
    fn default() -> Self {
        Self::new(0.3, 0.7)
    }
}

/// What a tap zone asks for under a given direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIntent {
    Advance,
    Retreat,
    ToggleChrome,
}

impl NavIntent {
    #[must_use]
    pub const fn for_tap(zone: TapZone, direction: ReadingDirection) -> Self {
        match (zone, direction) {
            (TapZone::Center, _) => Self::ToggleChrome,
            (TapZone::Left, ReadingDirection::Rtl) | (TapZone::Right, ReadingDirection::Ltr | ReadingDirection::Vertical) => {
                Self::Advance
            }
            (TapZone::Right, ReadingDirection::Rtl) | (TapZone::Left, ReadingDirection::Ltr | ReadingDirection::Vertical) => {
                Self::Retreat
            }
        }
    }
}

/// Result of a navigation request that was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// Current spread changed.
    Moved { from: usize, to: usize },

    /// Already on the target spread.
    Stayed,

    /// Tried to move past the first or last spread.
    AtBoundary,

    /// Chapter has no pages; nothing to navigate.
    EmptyChapter,

    /// Center tap flipped chrome visibility.
    ChromeToggled { visible: bool },
}

impl NavOutcome {
    #[must_use]
    pub const fn moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Navigation over one fixed spread layout.
#[derive(Debug, Clone, Copy)]
pub struct NavigationEngine<'a> {
    layout: &'a SpreadLayout,
    zones: TapZones,
}

impl<'a> NavigationEngine<'a> {
    #[must_use]
    pub const fn new(layout: &'a SpreadLayout, zones: TapZones) -> Self {
        Self { layout, zones }
    }

    pub fn advance(&self, state: &mut ReaderState) -> NavOutcome {
        let count: usize = self.layout.spread_count();
        if count == 0 {
            return NavOutcome::EmptyChapter;
        }

        let from: usize = state.current_spread();
        if from + 1 >= count {
            trace!(from, count, "advance at last spread");
            return NavOutcome::AtBoundary;
        }

        self.settle(state, from, from + 1)
    }

    pub fn retreat(&self, state: &mut ReaderState) -> NavOutcome {
        if self.layout.spread_count() == 0 {
            return NavOutcome::EmptyChapter;
        }

        let from: usize = state.current_spread();
        if from == 0 {
            trace!("retreat at first spread");
            return NavOutcome::AtBoundary;
        }

        self.settle(state, from, from - 1)
    }

    /// Tap at `x_fraction` of the screen width.
    pub fn tap(&self, state: &mut ReaderState, x_fraction: f32) -> NavOutcome {
        let zone: TapZone = self.zones.classify(x_fraction);

        match NavIntent::for_tap(zone, state.direction) {
            NavIntent::Advance => self.advance(state),
            NavIntent::Retreat => self.retreat(state),
            NavIntent::ToggleChrome => {
                state.toggle_chrome();
                NavOutcome::ChromeToggled {
                    visible: state.chrome_visible,
                }
            }
        }
    }

    pub fn jump_to_spread_index(
        &self,
        state: &mut ReaderState,
        index: usize,
    ) -> ReaderResult<NavOutcome> {
        let count: usize = self.layout.spread_count();
        if count == 0 {
            return Ok(NavOutcome::EmptyChapter);
        }

        if index >= count {
            return Err(ReaderError::out_of_range(index, count));
        }

        let from: usize = state.current_spread();
        if from == index {
            return Ok(NavOutcome::Stayed);
        }

        Ok(self.settle(state, from, index))
    }

    /// Jump to the first spread covering or following `page`. The requested
    /// page becomes the anchor, so it is what the indicator shows even when
    /// it is the second page of a pair.
    pub fn jump_to_page_number(
        &self,
        state: &mut ReaderState,
        page: usize,
    ) -> ReaderResult<NavOutcome> {
        if self.layout.is_empty() {
            return Ok(NavOutcome::EmptyChapter);
        }

        let page_count: usize = self.layout.page_count();
        let index: usize = self
            .layout
            .page_to_spread_index(page)
            .ok_or_else(|| ReaderError::invalid_page(page, page_count))?;

        let from: usize = state.current_spread();
        state.settle_on_page(index, page);
        debug!(page, from, to = index, "jumped to page");

        if from == index {
            Ok(NavOutcome::Stayed)
        } else {
            Ok(NavOutcome::Moved { from, to: index })
        }
    }

    fn settle(&self, state: &mut ReaderState, from: usize, to: usize) -> NavOutcome {
        state.settle_on(to, self.layout);
        debug!(from, to, direction = %state.direction, "spread changed");
        NavOutcome::Moved { from, to }
    }
}
