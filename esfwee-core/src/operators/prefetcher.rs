//! ``src/operators/prefetcher.rs``
//! ============================================================================
//! # Page prefetcher
//!
//! Keeps downloads aligned with the render window:
//! - pages entering the window are fetched (bounded by a semaphore)
//! - in-flight fetches for pages leaving the window are cancelled
//! - opening or closing a chapter cancels everything and bumps the
//!   generation, so late results from the previous chapter are dropped
//!
//! A failed fetch is reported for its page only. Navigation state never
//! sees fetch results.

use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    cache::page_cache::{PageCache, PageKey},
    config::PrefetchConfig,
    error::ReaderResult,
    model::page::Page,
};

/// Downloads the bytes behind a page URL.
#[async_trait]
pub trait PageFetcher: Send + Sync + Debug {
    async fn fetch(&self, url: &str) -> ReaderResult<Bytes>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Pending,

    Ready { bytes: usize },

    Failed(String),

    Cancelled,
}

impl FetchStatus {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchEvent {
    pub generation: u64,
    pub fetch_id: u64,
    pub page: usize,
    pub status: FetchStatus,
}

#[derive(Debug)]
struct InFlight {
    fetch_id: u64,
    token: CancellationToken,
}

pub struct PagePrefetcher {
    fetcher: Arc<dyn PageFetcher>,
    cache: PageCache,
    permits: Arc<Semaphore>,
    timeout: Duration,

    generation: u64,
    chapter_token: CancellationToken,
    next_fetch_id: u64,

    in_flight: HashMap<usize, InFlight>,
    ready: HashSet<usize>,

    events_tx: mpsc::UnboundedSender<FetchEvent>,
}

impl PagePrefetcher {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        cache: PageCache,
        config: &PrefetchConfig,
    ) -> (Self, mpsc::UnboundedReceiver<FetchEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel::<FetchEvent>();

        let prefetcher = Self {
            fetcher,
            cache,
            permits: Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1))),
            timeout: config.fetch_timeout,
            generation: 0,
            chapter_token: CancellationToken::new(),
            next_fetch_id: 0,
            in_flight: HashMap::new(),
            ready: HashSet::new(),
            events_tx,
        };

        (prefetcher, events_rx)
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Pages with a fetch in progress, ascending.
    #[must_use]
    pub fn in_flight(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = self.in_flight.keys().copied().collect();
        pages.sort_unstable();
        pages
    }

    /// Cancel everything tied to the current chapter.
    pub fn reset(&mut self) {
        self.chapter_token.cancel();
        self.chapter_token = CancellationToken::new();
        self.in_flight.clear();
        self.ready.clear();
        self.generation += 1;
        debug!(generation = self.generation, "prefetcher reset");
    }

    /// Align fetches with `pages`, the pages of the current render window.
    pub async fn sync(&mut self, pages: &[Page]) {
        let wanted: HashSet<usize> = pages.iter().map(|p: &Page| p.index).collect();

        self.in_flight.retain(|page: &usize, fetch: &mut InFlight| -> bool {
            if wanted.contains(page) {
                true
            } else {
                trace!(page, "cancelling fetch outside render window");
                fetch.token.cancel();
                false
            }
        });

        for page in pages {
            if self.in_flight.contains_key(&page.index) {
                continue;
            }

            if self.ready.contains(&page.index) && self.cache.contains(&page.url) {
                continue;
            }

            if let Some(bytes) = self.cache.get(&page.url).await {
                self.ready.insert(page.index);
                let fetch_id: u64 = self.next_id();
                self.emit(fetch_id, page.index, FetchStatus::Ready { bytes: bytes.len() });
                continue;
            }

            self.spawn_fetch(page);
        }
    }

    /// Record a fetch event. Returns `false` when the event is stale: from an
    /// older generation, or superseded by a newer fetch of the same page.
    pub fn complete(&mut self, event: &FetchEvent) -> bool {
        if event.generation != self.generation {
            trace!(page = event.page, "dropping event from previous chapter");
            return false;
        }

        match self.in_flight.get(&event.page) {
            Some(fetch) if fetch.fetch_id != event.fetch_id => return false,
            Some(_) if event.status.is_terminal() => {
                self.in_flight.remove(&event.page);
            }
            _ => {}
        }

        if matches!(event.status, FetchStatus::Ready { .. }) {
            self.ready.insert(event.page);
        }

        true
    }

    fn next_id(&mut self) -> u64 {
        self.next_fetch_id += 1;
        self.next_fetch_id
    }

    fn emit(&self, fetch_id: u64, page: usize, status: FetchStatus) {
        let event = FetchEvent {
            generation: self.generation,
            fetch_id,
            page,
            status,
        };

        if self.events_tx.send(event).is_err() {
            trace!(page, "fetch event receiver dropped");
        }
    }

    fn spawn_fetch(&mut self, page: &Page) {
        let fetch_id: u64 = self.next_id();
        let token: CancellationToken = self.chapter_token.child_token();

        self.in_flight.insert(
            page.index,
            InFlight {
                fetch_id,
                token: token.clone(),
            },
        );
        self.emit(fetch_id, page.index, FetchStatus::Pending);

        let fetcher: Arc<dyn PageFetcher> = Arc::clone(&self.fetcher);
        let cache: PageCache = self.cache.clone();
        let permits: Arc<Semaphore> = Arc::clone(&self.permits);
        let events_tx = self.events_tx.clone();
        let url: PageKey = Arc::from(page.url.as_str());
        let timeout: Duration = self.timeout;
        let generation: u64 = self.generation;
        let page_index: usize = page.index;

        tokio::spawn(async move {
            let status: FetchStatus = tokio::select! {
                biased;

                () = token.cancelled() => FetchStatus::Cancelled,

                status = fetch_page(fetcher.as_ref(), &cache, &permits, &url, timeout) => status,
            };

            let event = FetchEvent {
                generation,
                fetch_id,
                page: page_index,
                status,
            };

            if events_tx.send(event).is_err() {
                trace!(page = page_index, "fetch event receiver dropped");
            }
        });
    }
}

impl Drop for PagePrefetcher {
    fn drop(&mut self) {
        self.chapter_token.cancel();
    }
}

impl Debug for PagePrefetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagePrefetcher")
            .field("generation", &self.generation)
            .field("in_flight", &self.in_flight())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

async fn fetch_page(
    fetcher: &dyn PageFetcher,
    cache: &PageCache,
    permits: &Semaphore,
    url: &str,
    timeout: Duration,
) -> FetchStatus {
    let Ok(_permit) = permits.acquire().await else {
        return FetchStatus::Cancelled;
    };

    match tokio::time::timeout(timeout, fetcher.fetch(url)).await {
        Ok(Ok(bytes)) => {
            let len: usize = bytes.len();
            cache.insert(url, bytes).await;
            FetchStatus::Ready { bytes: len }
        }

        Ok(Err(e)) => {
            warn!(url, "page fetch failed: {e}");
            FetchStatus::Failed(e.to_string())
        }

        Err(_) => {
            warn!(url, ?timeout, "page fetch timed out");
            FetchStatus::Failed(format!("timed out after {}s", timeout.as_secs()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::ReaderError;

    #[derive(Debug, Default)]
    struct EchoFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for EchoFetcher {
        async fn fetch(&self, url: &str) -> ReaderResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.ends_with("/2") {
                return Err(ReaderError::fetch_failed(url, "404 Not Found"));
            }
            Ok(Bytes::from(url.to_string()))
        }
    }

    /// Never completes; only cancellation ends its fetches.
    #[derive(Debug, Default)]
    struct StalledFetcher;

    #[async_trait]
    impl PageFetcher for StalledFetcher {
        async fn fetch(&self, _url: &str) -> ReaderResult<Bytes> {
            std::future::pending::<()>().await;
            Ok(Bytes::new())
        }
    }

    fn pages(range: std::ops::RangeInclusive<usize>) -> Vec<Page> {
        range
            .map(|index| Page {
                index,
                url: format!("http://esfwee/manga/chapters/1/pages/{index}"),
            })
            .collect()
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<FetchEvent>) -> FetchEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for fetch event")
            .expect("event channel closed")
    }

    async fn drain_terminal(
        prefetcher: &mut PagePrefetcher,
        rx: &mut mpsc::UnboundedReceiver<FetchEvent>,
        expected: usize,
    ) -> Vec<FetchEvent> {
        let mut terminal = Vec::new();
        while terminal.len() < expected {
            let event = next_event(rx).await;
            prefetcher.complete(&event);
            if event.status.is_terminal() {
                terminal.push(event);
            }
        }
        terminal.sort_by_key(|e| e.page);
        terminal
    }

    #[tokio::test]
    async fn window_pages_are_fetched_and_cached() {
        let fetcher = Arc::new(EchoFetcher::default());
        let (mut prefetcher, mut rx) =
            PagePrefetcher::new(fetcher.clone(), PageCache::new(16), &PrefetchConfig::default());

        let window = pages(3..=5);
        prefetcher.sync(&window).await;
        let done = drain_terminal(&mut prefetcher, &mut rx, 3).await;

        assert!(done.iter().all(|e| matches!(e.status, FetchStatus::Ready { .. })));
        assert!(prefetcher.in_flight().is_empty());
        assert!(prefetcher.cache().contains(&window[0].url));

        prefetcher.sync(&window).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failure_is_reported_for_that_page_only() {
        let (mut prefetcher, mut rx) = PagePrefetcher::new(
            Arc::new(EchoFetcher::default()),
            PageCache::new(16),
            &PrefetchConfig::default(),
        );

        prefetcher.sync(&pages(1..=3)).await;
        let done = drain_terminal(&mut prefetcher, &mut rx, 3).await;

        assert!(matches!(done[0].status, FetchStatus::Ready { .. }));
        assert!(matches!(done[1].status, FetchStatus::Failed(_)));
        assert!(matches!(done[2].status, FetchStatus::Ready { .. }));
    }

    #[tokio::test]
    async fn leaving_the_window_cancels_fetches() {
        let (mut prefetcher, mut rx) = PagePrefetcher::new(
            Arc::new(StalledFetcher),
            PageCache::new(16),
            &PrefetchConfig::default(),
        );

        prefetcher.sync(&pages(1..=3)).await;
        assert_eq!(prefetcher.in_flight(), vec![1, 2, 3]);

        prefetcher.sync(&pages(5..=5)).await;
        assert_eq!(prefetcher.in_flight(), vec![5]);

        let cancelled = drain_terminal(&mut prefetcher, &mut rx, 3).await;
        let cancelled_pages: Vec<usize> = cancelled.iter().map(|e| e.page).collect();
        assert_eq!(cancelled_pages, vec![1, 2, 3]);
        assert!(cancelled.iter().all(|e| e.status == FetchStatus::Cancelled));
        assert_eq!(prefetcher.in_flight(), vec![5]);
    }

    #[tokio::test]
    async fn reset_discards_previous_chapter_results() {
        let (mut prefetcher, mut rx) = PagePrefetcher::new(
            Arc::new(StalledFetcher),
            PageCache::new(16),
            &PrefetchConfig::default(),
        );

        prefetcher.sync(&pages(1..=1)).await;
        let pending = next_event(&mut rx).await;
        assert_eq!(pending.status, FetchStatus::Pending);

        prefetcher.reset();
        assert_eq!(prefetcher.generation(), 1);
        assert!(prefetcher.in_flight().is_empty());

        let stale = next_event(&mut rx).await;
        assert_eq!(stale.status, FetchStatus::Cancelled);
        assert_eq!(stale.generation, 0);
        assert!(!prefetcher.complete(&stale));
    }

    #[tokio::test]
    async fn superseded_fetch_events_are_stale() {
        let (mut prefetcher, mut rx) = PagePrefetcher::new(
            Arc::new(StalledFetcher),
            PageCache::new(16),
            &PrefetchConfig::default(),
        );

        prefetcher.sync(&pages(1..=1)).await;
        prefetcher.sync(&[]).await;
        prefetcher.sync(&pages(1..=1)).await;

        let mut stale_seen = false;
        while !stale_seen {
            let event = next_event(&mut rx).await;
            if event.status == FetchStatus::Cancelled {
                assert!(!prefetcher.complete(&event));
                stale_seen = true;
            }
        }
        assert_eq!(prefetcher.in_flight(), vec![1]);
    }
}
