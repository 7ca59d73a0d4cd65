//! ``src/api/urls.rs``
//! ============================================================================
//! # esfwee URL construction
//!
//! Page locators are pure functions of `(chapter_id, page)`: no round-trip is
//! needed to know a URL, only to fetch its bytes.

use std::fmt;

use crate::model::page::ChapterId;

/// Resolves the fetch locator of a single page.
pub trait PageUrlResolver: Send + Sync + fmt::Debug {
    fn page_url(&self, chapter_id: ChapterId, page: usize) -> String;
}

/// URL builder for an esfwee server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsfweeUrls {
    base: String,
}

impl EsfweeUrls {
    /// Strips one trailing `/` so paths join cleanly.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        let mut base: String = base.into();
        if base.ends_with('/') {
            base.pop();
        }

        Self { base }
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn manga_list_url(&self) -> String {
        format!("{}/manga", self.base)
    }

    #[must_use]
    pub fn manga_url(&self, anilist_id: u64) -> String {
        format!("{}/manga/{anilist_id}", self.base)
    }

    #[must_use]
    pub fn chapters_url(&self, anilist_id: u64) -> String {
        format!("{}/manga/{anilist_id}/chapters", self.base)
    }
}

impl PageUrlResolver for EsfweeUrls {
    fn page_url(&self, chapter_id: ChapterId, page: usize) -> String {
        format!("{}/manga/chapters/{chapter_id}/pages/{page}", self.base)
    }
}
