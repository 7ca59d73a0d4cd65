//! ``src/model/spread.rs``
//! ============================================================================
//! # Spreads: navigable one- or two-page units
//!
//! `SpreadComposer` groups a page sequence by pagination mode. In double mode
//! the cover stands alone and the rest pair up as `(2,3), (4,5), ...`, with an
//! odd trailing page left single. Flattening the spreads always reproduces the
//! page sequence exactly once, in order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::page::Page;

/// One page per spread, or cover-isolated page pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    #[default]
    Single,

    Double,
}

impl PaginationMode {
    #[must_use]
    pub const fn from_double_page(double_page: bool) -> Self {
        if double_page { Self::Double } else { Self::Single }
    }

    #[must_use]
    pub const fn is_double(self) -> bool {
        matches!(self, Self::Double)
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Single => Self::Double,
            Self::Double => Self::Single,
        }
    }
}

impl std::fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &'static str = match self {
            Self::Single => "single",
            Self::Double => "double",
        };

        write!(f, "{s}")
    }
}

/// One or two adjacent pages, referenced by page number. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spread {
    pages: SmallVec<[usize; 2]>,
}

impl Spread {
    fn from_pages(pages: &[Page]) -> Self {
        debug_assert!((1..=2).contains(&pages.len()));

        Self {
            pages: pages.iter().map(|p: &Page| -> usize { p.index }).collect(),
        }
    }

    /// Page numbers in reading order.
    #[must_use]
    pub fn pages(&self) -> &[usize] {
        &self.pages
    }

    #[must_use]
    pub fn is_double(&self) -> bool {
        self.pages.len() == 2
    }

    #[must_use]
    pub fn first_page(&self) -> usize {
        self.pages[0]
    }

    #[must_use]
    pub fn last_page(&self) -> usize {
        self.pages[self.pages.len() - 1]
    }

    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        self.pages.contains(&page)
    }
}

pub struct SpreadComposer;

impl SpreadComposer {
    #[must_use]
    pub fn compose(pages: &[Page], mode: PaginationMode) -> Vec<Spread> {
        match mode {
            PaginationMode::Single => pages
                .chunks(1)
                .map(Spread::from_pages)
                .collect(),

            PaginationMode::Double => {
                let Some((cover, rest)) = pages.split_first() else {
                    return Vec::new();
                };

                let mut spreads: Vec<Spread> = Vec::with_capacity(rest.len() / 2 + 2);
                spreads.push(Spread::from_pages(std::slice::from_ref(cover)));
                spreads.extend(rest.chunks(2).map(Spread::from_pages));
                spreads
            }
        }
    }
}

/// Pages of a chapter together with their spreads for one pagination mode.
///
/// Rebuilt whenever the chapter or the mode changes; never mutated in place.
#[derive(Debug, Clone)]
pub struct SpreadLayout {
    pages: Arc<[Page]>,
    spreads: Vec<Spread>,
    mode: PaginationMode,
}

impl SpreadLayout {
    #[must_use]
    pub fn new(pages: Arc<[Page]>, mode: PaginationMode) -> Self {
        let spreads: Vec<Spread> = SpreadComposer::compose(&pages, mode);

        Self {
            pages,
            spreads,
            mode,
        }
    }

    /// Same pages, recomposed for `mode`.
    #[must_use]
    pub fn with_mode(&self, mode: PaginationMode) -> Self {
        Self::new(Arc::clone(&self.pages), mode)
    }

    #[must_use]
    pub const fn mode(&self) -> PaginationMode {
        self.mode
    }

    #[must_use]
    pub fn spreads(&self) -> &[Spread] {
        &self.spreads
    }

    #[must_use]
    pub fn spread(&self, index: usize) -> Option<&Spread> {
        self.spreads.get(index)
    }

    #[must_use]
    pub fn spread_count(&self) -> usize {
        self.spreads.len()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[must_use]
    pub fn pages(&self) -> &Arc<[Page]> {
        &self.pages
    }

    /// Page by 1-based number.
    #[must_use]
    pub fn page(&self, number: usize) -> Option<&Page> {
        number.checked_sub(1).and_then(|i: usize| self.pages.get(i))
    }

    /// Pages of the spread at `index`, in reading order.
    pub fn pages_of(&self, index: usize) -> impl Iterator<Item = &Page> + '_ {
        self.spreads
            .get(index)
            .map(Spread::pages)
            .unwrap_or_default()
            .iter()
            .filter_map(|&number: &usize| self.page(number))
    }

    #[must_use]
    pub fn first_page_of(&self, index: usize) -> Option<usize> {
        self.spreads.get(index).map(Spread::first_page)
    }

    /// Smallest spread index holding a page `>= page`. `None` when `page` is
    /// outside `[1, page_count]`.
    #[must_use]
    pub fn page_to_spread_index(&self, page: usize) -> Option<usize> {
        if page == 0 || page > self.page_count() {
            return None;
        }

        let index: usize = self
            .spreads
            .partition_point(|s: &Spread| -> bool { s.last_page() < page });

        (index < self.spreads.len()).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(count: usize) -> Arc<[Page]> {
        (1..=count)
            .map(|index| Page {
                index,
                url: format!("p{index}"),
            })
            .collect()
    }

    fn groups(count: usize, mode: PaginationMode) -> Vec<Vec<usize>> {
        SpreadComposer::compose(&pages(count), mode)
            .iter()
            .map(|s| s.pages().to_vec())
            .collect()
    }

    #[test]
    fn coverage_holds_for_every_length_and_mode() {
        for count in 0..=500 {
            for mode in [PaginationMode::Single, PaginationMode::Double] {
                let flat: Vec<usize> = groups(count, mode).into_iter().flatten().collect();
                let expected: Vec<usize> = (1..=count).collect();
                assert_eq!(flat, expected, "count={count} mode={mode}");
            }
        }
    }

    #[test]
    fn single_mode_wraps_each_page() {
        assert_eq!(
            groups(3, PaginationMode::Single),
            vec![vec![1], vec![2], vec![3]]
        );
    }

    #[test]
    fn double_mode_isolates_cover_and_pairs_the_rest() {
        assert_eq!(
            groups(7, PaginationMode::Double),
            vec![vec![1], vec![2, 3], vec![4, 5], vec![6, 7]]
        );
        assert_eq!(
            groups(6, PaginationMode::Double),
            vec![vec![1], vec![2, 3], vec![4, 5], vec![6]]
        );
    }

    #[test]
    fn cover_is_always_alone() {
        for count in 2..=40 {
            let spreads = SpreadComposer::compose(&pages(count), PaginationMode::Double);
            assert_eq!(spreads[0].pages(), &[1]);
            assert!(!spreads[0].is_double());
        }
    }

    #[test]
    fn tiny_chapters() {
        assert!(groups(0, PaginationMode::Double).is_empty());
        assert!(groups(0, PaginationMode::Single).is_empty());
        assert_eq!(groups(1, PaginationMode::Double), vec![vec![1]]);
        assert_eq!(groups(1, PaginationMode::Single), vec![vec![1]]);
    }

    #[test]
    fn is_double_iff_two_pages() {
        for spread in SpreadComposer::compose(&pages(9), PaginationMode::Double) {
            assert_eq!(spread.is_double(), spread.pages().len() == 2);
        }
    }

    #[test]
    fn page_to_spread_index_resolves_covering_spread() {
        let layout = SpreadLayout::new(pages(7), PaginationMode::Double);
        assert_eq!(layout.page_to_spread_index(1), Some(0));
        assert_eq!(layout.page_to_spread_index(2), Some(1));
        assert_eq!(layout.page_to_spread_index(3), Some(1));
        assert_eq!(layout.page_to_spread_index(7), Some(3));
        assert_eq!(layout.page_to_spread_index(0), None);
        assert_eq!(layout.page_to_spread_index(8), None);
    }

    #[test]
    fn pages_of_returns_urls_in_order() {
        let layout = SpreadLayout::new(pages(5), PaginationMode::Double);
        let urls: Vec<&str> = layout.pages_of(2).map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["p4", "p5"]);
        assert_eq!(layout.pages_of(9).count(), 0);
    }

    #[test]
    fn with_mode_keeps_pages() {
        let single = SpreadLayout::new(pages(10), PaginationMode::Single);
        let double = single.with_mode(PaginationMode::Double);
        assert_eq!(double.page_count(), 10);
        assert_eq!(double.spread_count(), 6);
        assert!(Arc::ptr_eq(single.pages(), double.pages()));
    }
}
