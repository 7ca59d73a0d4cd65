//! ``src/model/render_window.rs``
//! ============================================================================
//! # Render window planning
//!
//! Only spreads within `radius` of the current one stay mounted and
//! prefetched; everything else may be recycled. Purely derived from its
//! inputs and recomputed on every position change.

use std::ops::Range;

pub const DEFAULT_WINDOW_RADIUS: usize = 1;

/// Contiguous set of spread indices to keep mounted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderWindow {
    active: Range<usize>,
}

impl RenderWindow {
    #[must_use]
    pub const fn empty() -> Self {
        Self { active: 0..0 }
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.active.clone()
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.active.contains(&index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    #[must_use]
    pub const fn range(&self) -> &Range<usize> {
        &self.active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderWindowPlanner {
    radius: usize,
}

impl RenderWindowPlanner {
    #[must_use]
    pub const fn new(radius: usize) -> Self {
        Self { radius }
    }

    #[must_use]
    pub const fn radius(&self) -> usize {
        self.radius
    }

    /// `[max(0, current - radius), min(spread_count - 1, current + radius)]`.
    #[must_use]
    pub fn plan(&self, current: usize, spread_count: usize) -> RenderWindow {
        plan(current, spread_count, self.radius)
    }
}

impl Default for RenderWindowPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_RADIUS)
    }
}

#[must_use]
pub fn plan(current: usize, spread_count: usize, radius: usize) -> RenderWindow {
    if spread_count == 0 {
        return RenderWindow::empty();
    }

    let start: usize = current.saturating_sub(radius);
    let end: usize = current.saturating_add(radius).min(spread_count - 1) + 1;

    RenderWindow {
        active: start.min(end)..end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(window: &RenderWindow) -> Vec<usize> {
        window.iter().collect()
    }

    #[test]
    fn window_is_clamped_at_both_edges() {
        assert_eq!(indices(&plan(0, 10, 1)), vec![0, 1]);
        assert_eq!(indices(&plan(5, 10, 1)), vec![4, 5, 6]);
        assert_eq!(indices(&plan(9, 10, 1)), vec![8, 9]);
    }

    #[test]
    fn empty_chapter_has_empty_window() {
        assert!(plan(0, 0, 1).is_empty());
    }

    #[test]
    fn single_spread_and_zero_radius() {
        assert_eq!(indices(&plan(0, 1, 3)), vec![0]);
        assert_eq!(indices(&plan(4, 10, 0)), vec![4]);
    }

    #[test]
    fn default_planner_keeps_at_most_three_spreads() {
        let planner = RenderWindowPlanner::default();
        for current in 0..50 {
            let window = planner.plan(current, 50);
            assert!(window.len() <= 3);
            assert!(window.contains(current));
        }
    }
}
