//! ``src/model/page.rs``
//! ============================================================================
//! # Page catalog
//!
//! Turns chapter metadata into the ordered, 1-based page sequence the reader
//! navigates. URLs are resolved eagerly but nothing is fetched here.

use std::{fmt, sync::Arc};

use crate::api::urls::PageUrlResolver;

/// esfwee chapter identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChapterId(pub u64);

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single page of a chapter. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Page {
    /// 1-based position in the chapter.
    pub index: usize,

    /// Resolved fetch locator.
    pub url: String,
}

/// Builds page sequences for chapters.
pub struct PageCatalog;

impl PageCatalog {
    /// Pages `1..=page_count`, each with its resolved URL. An empty chapter
    /// yields an empty sequence.
    #[must_use]
    pub fn build(
        resolver: &dyn PageUrlResolver,
        chapter_id: ChapterId,
        page_count: usize,
    ) -> Arc<[Page]> {
        (1..=page_count)
            .map(|index: usize| -> Page {
                Page {
                    index,
                    url: resolver.page_url(chapter_id, index),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::urls::EsfweeUrls;

    #[test]
    fn pages_are_contiguous_and_one_based() {
        let urls = EsfweeUrls::new("http://esfwee");
        let pages = PageCatalog::build(&urls, ChapterId(5), 4);

        let indices: Vec<usize> = pages.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert_eq!(pages[3].url, "http://esfwee/manga/chapters/5/pages/4");
    }

    #[test]
    fn empty_chapter_builds_no_pages() {
        let urls = EsfweeUrls::new("http://esfwee");
        assert!(PageCatalog::build(&urls, ChapterId(5), 0).is_empty());
    }

    #[test]
    fn build_is_deterministic() {
        let urls = EsfweeUrls::new("http://esfwee/");
        let a = PageCatalog::build(&urls, ChapterId(9), 12);
        let b = PageCatalog::build(&urls, ChapterId(9), 12);
        assert_eq!(a, b);
    }
}
