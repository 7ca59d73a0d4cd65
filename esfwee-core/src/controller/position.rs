//! ``src/controller/position.rs``
//! ============================================================================
//! # Position tracking
//!
//! Follows the spreads the presentation layer reports as visible and keeps
//! the reading position stable when the spread layout is rebuilt for a new
//! pagination mode.

use tracing::{debug, trace};

use crate::{
    controller::navigation::NavOutcome,
    model::{reader_state::ReaderState, spread::SpreadLayout},
};

#[derive(Debug, Clone, Copy)]
pub struct PositionTracker<'a> {
    layout: &'a SpreadLayout,
}

impl<'a> PositionTracker<'a> {
    #[must_use]
    pub const fn new(layout: &'a SpreadLayout) -> Self {
        Self { layout }
    }

    /// Make the first visible spread current. Indices outside the layout are
    /// ignored; reporting the current spread again leaves the anchor alone.
    pub fn report_visible_indices(&self, state: &mut ReaderState, visible: &[usize]) -> NavOutcome {
        if self.layout.spread_count() == 0 {
            return NavOutcome::EmptyChapter;
        }

        let Some(first) = visible
            .iter()
            .copied()
            .filter(|&i: &usize| i < self.layout.spread_count())
            .min()
        else {
            trace!(?visible, "no visible spread in range");
            return NavOutcome::Stayed;
        };

        let from: usize = state.current_spread();
        if first == from {
            return NavOutcome::Stayed;
        }

        state.settle_on(first, self.layout);
        debug!(from, to = first, "visible spread changed");
        NavOutcome::Moved { from, to: first }
    }

    #[must_use]
    pub fn page_to_spread_index(&self, page: usize) -> Option<usize> {
        self.layout.page_to_spread_index(page)
    }

    #[must_use]
    pub fn current_page(&self, state: &ReaderState) -> usize {
        state.current_page(self.layout)
    }

    /// Reposition `state` onto this (freshly composed) layout by resolving
    /// the anchor page. An unresolvable anchor falls back to spread 0.
    pub fn relayout(&self, state: &mut ReaderState) -> NavOutcome {
        let from: usize = state.current_spread();
        let to: usize = self
            .page_to_spread_index(state.anchor_page())
            .unwrap_or(0);

        state.reposition(to);
        state.pagination = self.layout.mode();
        debug!(
            anchor = state.anchor_page(),
            from,
            to,
            mode = %self.layout.mode(),
            "repositioned after relayout"
        );

        if self.layout.spread_count() == 0 {
            NavOutcome::EmptyChapter
        } else if from == to {
            NavOutcome::Stayed
        } else {
            NavOutcome::Moved { from, to }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::controller::navigation::{NavigationEngine, TapZones};
    use crate::model::{page::Page, reader_state::ReadingDirection, spread::PaginationMode};

    fn pages(count: usize) -> Arc<[Page]> {
        (1..=count)
            .map(|index| Page {
                index,
                url: format!("p{index}"),
            })
            .collect()
    }

    #[test]
    fn first_visible_index_becomes_current() {
        let layout = SpreadLayout::new(pages(10), PaginationMode::Double);
        let tracker = PositionTracker::new(&layout);
        let mut state = ReaderState::new(ReadingDirection::Rtl, PaginationMode::Double);

        assert_eq!(
            tracker.report_visible_indices(&mut state, &[3, 2]),
            NavOutcome::Moved { from: 0, to: 2 }
        );
        assert_eq!(state.current_spread(), 2);
        assert_eq!(tracker.current_page(&state), 4);
    }

    #[test]
    fn empty_or_out_of_range_reports_are_ignored() {
        let layout = SpreadLayout::new(pages(4), PaginationMode::Single);
        let tracker = PositionTracker::new(&layout);
        let mut state = ReaderState::default();

        assert_eq!(tracker.report_visible_indices(&mut state, &[]), NavOutcome::Stayed);
        assert_eq!(tracker.report_visible_indices(&mut state, &[17]), NavOutcome::Stayed);
        assert_eq!(state.current_spread(), 0);
    }

    #[test]
    fn repeated_report_keeps_anchor() {
        let layout = SpreadLayout::new(pages(10), PaginationMode::Double);
        let engine = NavigationEngine::new(&layout, TapZones::default());
        let tracker = PositionTracker::new(&layout);
        let mut state = ReaderState::new(ReadingDirection::Ltr, PaginationMode::Double);

        engine.jump_to_page_number(&mut state, 5).unwrap();
        assert_eq!(state.current_spread(), 2);

        tracker.report_visible_indices(&mut state, &[2]);
        assert_eq!(state.anchor_page(), 5);
        assert_eq!(tracker.current_page(&state), 5);
    }

    #[test]
    fn mode_toggle_round_trip_returns_to_same_page() {
        let single = SpreadLayout::new(pages(10), PaginationMode::Single);
        let mut state = ReaderState::new(ReadingDirection::Rtl, PaginationMode::Single);
        NavigationEngine::new(&single, TapZones::default())
            .jump_to_page_number(&mut state, 5)
            .unwrap();
        assert_eq!(state.current_page(&single), 5);

        let double = single.with_mode(PaginationMode::Double);
        PositionTracker::new(&double).relayout(&mut state);
        assert_eq!(state.current_spread(), 2);
        assert_eq!(state.current_page(&double), 5);
        assert_eq!(state.pagination, PaginationMode::Double);

        let back = double.with_mode(PaginationMode::Single);
        PositionTracker::new(&back).relayout(&mut state);
        assert_eq!(state.current_spread(), 4);
        assert_eq!(state.current_page(&back), 5);
    }

    #[test]
    fn position_reached_by_advancing_survives_toggle() {
        let single = SpreadLayout::new(pages(10), PaginationMode::Single);
        let engine = NavigationEngine::new(&single, TapZones::default());
        let mut state = ReaderState::new(ReadingDirection::Ltr, PaginationMode::Single);
        for _ in 0..4 {
            engine.advance(&mut state);
        }
        assert_eq!(state.current_page(&single), 5);

        let double = single.with_mode(PaginationMode::Double);
        PositionTracker::new(&double).relayout(&mut state);
        let back = double.with_mode(PaginationMode::Single);
        PositionTracker::new(&back).relayout(&mut state);
        assert_eq!(state.current_page(&back), 5);
    }

    #[test]
    fn relayout_onto_empty_layout_falls_back_to_zero() {
        let empty = SpreadLayout::new(pages(0), PaginationMode::Double);
        let mut state = ReaderState::default();
        assert_eq!(
            PositionTracker::new(&empty).relayout(&mut state),
            NavOutcome::EmptyChapter
        );
        assert_eq!(state.current_spread(), 0);
    }
}
