//! ``src/controller/event_loop.rs``
//! ============================================================================
//! # Reader event loop
//!
//! Serializes everything that touches the session:
//! - reader actions from the terminal (or any other producer)
//! - fetch events from the page prefetcher
//!
//! After each change the loop publishes a fresh [`ReaderSnapshot`] on a
//! watch channel for the renderer. Preference edits are written by a
//! separate task in the order they were made; a failed write is logged and
//! never rolls back the in-memory setting.

use std::{collections::HashMap, collections::HashSet, sync::Arc};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{
    controller::{actions::ReaderAction, session::{Dispatched, ReaderSession}},
    model::preferences::{PreferenceChange, PreferenceStore},
    operators::prefetcher::{FetchEvent, FetchStatus, PagePrefetcher},
    view::snapshots::ReaderSnapshot,
};

pub struct ReaderEventLoop {
    session: ReaderSession,
    prefetcher: PagePrefetcher,
    fetch_rx: mpsc::UnboundedReceiver<FetchEvent>,
    action_rx: mpsc::UnboundedReceiver<ReaderAction>,

    statuses: HashMap<usize, FetchStatus>,
    snapshot_tx: watch::Sender<ReaderSnapshot>,

    persist_tx: mpsc::UnboundedSender<PreferenceChange>,
    persist_task: JoinHandle<()>,

    cancel: CancellationToken,
}

impl ReaderEventLoop {
    /// Must be called inside a tokio runtime: spawns the preference writer.
    pub fn new(
        session: ReaderSession,
        prefetcher: (PagePrefetcher, mpsc::UnboundedReceiver<FetchEvent>),
        store: Arc<dyn PreferenceStore>,
        action_rx: mpsc::UnboundedReceiver<ReaderAction>,
    ) -> (Self, watch::Receiver<ReaderSnapshot>) {
        let (prefetcher, fetch_rx) = prefetcher;
        let statuses: HashMap<usize, FetchStatus> = HashMap::new();
        let (snapshot_tx, snapshot_rx) =
            watch::channel(ReaderSnapshot::capture(&session, &statuses));

        let (persist_tx, persist_rx) = mpsc::unbounded_channel::<PreferenceChange>();
        let persist_task: JoinHandle<()> = tokio::spawn(persist_preferences(store, persist_rx));

        info!("Reader event loop initialized");

        let event_loop = Self {
            session,
            prefetcher,
            fetch_rx,
            action_rx,
            statuses,
            snapshot_tx,
            persist_tx,
            persist_task,
            cancel: CancellationToken::new(),
        };

        (event_loop, snapshot_rx)
    }

    /// Cancelling the token stops [`Self::run`] after the current step.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub const fn session(&self) -> &ReaderSession {
        &self.session
    }

    /// Run until `Quit`, cancellation, or every action sender is dropped.
    /// Returns the session once pending preference writes have finished.
    pub async fn run(mut self) -> ReaderSession {
        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    info!("Reader event loop cancelled");
                    break;
                }

                action = self.action_rx.recv() => {
                    let Some(action) = action else {
                        debug!("All action senders dropped");
                        break;
                    };
                    if self.handle_action(action).await {
                        break;
                    }
                }

                Some(event) = self.fetch_rx.recv() => self.handle_fetch(&event),
            }
        }

        self.shutdown().await
    }

    /// Apply one action. Returns `true` when the reader should quit.
    pub async fn handle_action(&mut self, action: ReaderAction) -> bool {
        let dispatched: Dispatched = match self.session.dispatch(action) {
            Ok(dispatched) => dispatched,
            Err(e) => {
                if !e.is_navigation() {
                    warn!("Action failed: {e}");
                }
                return false;
            }
        };

        if dispatched.chapter_changed {
            self.prefetcher.reset();
            self.statuses.clear();
        }

        if let Some(change) = dispatched.preference_change {
            if self.persist_tx.send(change).is_err() {
                warn!(key = change.key(), "Preference writer stopped; change not persisted");
            }
        }

        if dispatched.window_changed {
            self.sync_window().await;
        }

        self.publish();
        dispatched.quit
    }

    /// Record a prefetcher event against the page statuses.
    pub fn handle_fetch(&mut self, event: &FetchEvent) {
        if !self.prefetcher.complete(event) {
            trace!(page = event.page, "stale fetch event");
            return;
        }

        match &event.status {
            FetchStatus::Cancelled => {
                self.statuses.remove(&event.page);
            }
            status => {
                self.statuses.insert(event.page, status.clone());
            }
        }

        self.publish();
    }

    async fn sync_window(&mut self) {
        let pages = self.session.window_pages();
        let wanted: HashSet<usize> = pages.iter().map(|p| p.index).collect();

        self.statuses
            .retain(|page: &usize, _: &mut FetchStatus| wanted.contains(page));
        self.prefetcher.sync(&pages).await;
    }

    fn publish(&self) {
        self.snapshot_tx
            .send_replace(ReaderSnapshot::capture(&self.session, &self.statuses));
    }

    async fn shutdown(mut self) -> ReaderSession {
        self.prefetcher.reset();
        drop(self.persist_tx);

        if let Err(e) = self.persist_task.await {
            warn!("Preference writer task failed: {e}");
        }

        let stats = self.prefetcher.cache().stats();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            evictions = stats.evictions,
            hit_rate = stats.hit_rate(),
            "Reader event loop stopped"
        );
        self.session
    }
}

async fn persist_preferences(
    store: Arc<dyn PreferenceStore>,
    mut changes: mpsc::UnboundedReceiver<PreferenceChange>,
) {
    while let Some(change) = changes.recv().await {
        match change.persist(store.as_ref()).await {
            Ok(()) => debug!(key = change.key(), value = change.value(), "Preference saved"),
            Err(e) => warn!(key = change.key(), "Failed to save preference: {e}"),
        }
    }
}
