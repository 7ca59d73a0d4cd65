//! ``src/api/http.rs``
//! ============================================================================
//! # esfwee HTTP access
//!
//! [`HttpPageFetcher`] downloads page images for the prefetcher;
//! [`EsfweeClient`] reads manga and chapter metadata from the REST API.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    api::{
        types::{Chapter, Manga, sort_chapters},
        urls::EsfweeUrls,
    },
    error::{ReaderError, ReaderResult},
    operators::prefetcher::PageFetcher,
};

async fn get_ok(client: &reqwest::Client, url: &str) -> ReaderResult<reqwest::Response> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ReaderError::fetch_failed(url, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ReaderError::fetch_failed(url, format!("server returned {status}")));
    }

    Ok(response)
}

#[derive(Debug, Clone, Default)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> ReaderResult<Bytes> {
        let bytes: Bytes = get_ok(&self.client, url)
            .await?
            .bytes()
            .await
            .map_err(|e| ReaderError::fetch_failed(url, e.to_string()))?;

        debug!(url, len = bytes.len(), "fetched page");
        Ok(bytes)
    }
}

/// Metadata client for one esfwee server.
#[derive(Debug, Clone)]
pub struct EsfweeClient {
    client: reqwest::Client,
    urls: EsfweeUrls,
}

impl EsfweeClient {
    #[must_use]
    pub const fn new(client: reqwest::Client, urls: EsfweeUrls) -> Self {
        Self { client, urls }
    }

    #[must_use]
    pub const fn urls(&self) -> &EsfweeUrls {
        &self.urls
    }

    pub async fn manga(&self, anilist_id: u64) -> ReaderResult<Manga> {
        self.get_json(&self.urls.manga_url(anilist_id)).await
    }

    /// Chapters of a manga in reading order.
    pub async fn chapters(&self, anilist_id: u64) -> ReaderResult<Vec<Chapter>> {
        let mut chapters: Vec<Chapter> = self.get_json(&self.urls.chapters_url(anilist_id)).await?;
        sort_chapters(&mut chapters);
        debug!(anilist_id, count = chapters.len(), "listed chapters");
        Ok(chapters)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ReaderResult<T> {
        get_ok(&self.client, url)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ReaderError::fetch_failed(url, format!("bad response body: {e}")))
    }
}

/// Pick `number` from a sorted chapter list, or the first chapter.
#[must_use]
pub fn select_chapter(chapters: &[Chapter], number: Option<f64>) -> Option<&Chapter> {
    match number {
        Some(n) => chapters.iter().find(|c: &&Chapter| c.chapter_number == n),
        None => chapters.first(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(id: u64, number: f64) -> Chapter {
        Chapter {
            id,
            anilist_id: 7,
            chapter_number: number,
            title: None,
            page_count: 18,
            storage_path: format!("manga/7/{id}"),
            added_at: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn select_by_number_or_first() {
        let chapters = vec![chapter(3, 1.0), chapter(9, 1.5), chapter(4, 2.0)];

        assert_eq!(select_chapter(&chapters, Some(1.5)).map(|c| c.id), Some(9));
        assert_eq!(select_chapter(&chapters, None).map(|c| c.id), Some(3));
        assert!(select_chapter(&chapters, Some(8.0)).is_none());
        assert!(select_chapter(&[], None).is_none());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_fetch_error() {
        let fetcher = HttpPageFetcher::default();
        let err = fetcher
            .fetch("http://127.0.0.1:9/manga/chapters/1/pages/1")
            .await
            .unwrap_err();
        assert!(matches!(err, ReaderError::Fetch { .. }));
    }
}
