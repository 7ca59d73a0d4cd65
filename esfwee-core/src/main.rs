//! src/main.rs
//! Terminal reader for a single esfwee chapter

use std::{
    io::{self, Stdout},
    panic::PanicHookInfo,
    sync::Arc,
    time::Instant,
};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use compact_str::CompactString;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event as TerminalEvent, EventStream, KeyEvent,
        MouseEvent,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Frame, Terminal, backend::CrosstermBackend, layout::Rect};
use tokio::{
    signal,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use esfwee_core::{
    Logger,
    api::{
        http::{EsfweeClient, HttpPageFetcher, select_chapter},
        types::format_chapter_label,
        urls::EsfweeUrls,
    },
    cache::page_cache::PageCache,
    config::Config,
    controller::{
        actions::{ChapterMeta, ReaderAction},
        event_loop::ReaderEventLoop,
        input::{InputMapper, column_fraction},
        session::ReaderSession,
    },
    model::{
        page::ChapterId,
        preferences::{MemoryPreferenceStore, PreferenceStore, ReaderPreferences, TomlPreferenceStore},
    },
    operators::prefetcher::PagePrefetcher,
    view::{snapshots::ReaderSnapshot, ui::UIRenderer},
};

type AppTerminal = Terminal<CrosstermBackend<Stdout>>;

#[derive(Debug, Parser)]
#[command(name = "esfwee-read")]
#[command(author, version, about = "Read an esfwee manga chapter in the terminal", long_about = None)]
struct Args {
    /// Server base URL; falls back to `esfwee_url` in the config file
    #[arg(long, env = "ESFWEE_URL")]
    base_url: Option<String>,

    /// AniList id of a manga; its chapter list is fetched from the server
    #[arg(long, conflicts_with = "chapter_id")]
    manga: Option<u64>,

    #[arg(long, required_unless_present = "manga")]
    chapter_id: Option<u64>,

    /// Number of pages in the chapter
    #[arg(long, required_unless_present = "manga")]
    pages: Option<usize>,

    /// Chapter number, e.g. 12 or 12.5; selects the chapter with --manga
    #[arg(long)]
    chapter_number: Option<f64>,

    /// 1-based page to open at
    #[arg(long)]
    start_page: Option<usize>,

    /// Mirror logs to stderr
    #[arg(long)]
    log_stderr: bool,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load().await.context("Failed to load configuration")?;
    config.logging.stderr |= args.log_stderr;

    let _log_guard = Logger::init_tracing(&config.logging)?;
    setup_panic_handler();
    info!(?args, "Starting esfwee-read");

    let app = App::new(&args, &config)
        .await
        .context("Failed to initialize reader")?;
    app.run().await.context("Reader runtime error")?;

    info!("Reader exited cleanly");
    Ok(())
}

struct App {
    terminal: AppTerminal,
    renderer: UIRenderer,
    input: InputMapper,
    events: EventStream,
    actions: mpsc::UnboundedSender<ReaderAction>,
    snapshots: watch::Receiver<ReaderSnapshot>,
    event_loop: JoinHandle<ReaderSession>,
}

impl App {
    async fn new(args: &Args, config: &Config) -> Result<Self> {
        let base_url: String = args
            .base_url
            .clone()
            .or_else(|| config.esfwee_url.clone())
            .ok_or_else(|| anyhow!("no server URL: pass --base-url or set esfwee_url in config"))?;

        let store: Arc<dyn PreferenceStore> = match TomlPreferenceStore::in_config_dir() {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!("Preferences will not persist: {e}");
                Arc::new(MemoryPreferenceStore::new())
            }
        };
        let prefs: ReaderPreferences = ReaderPreferences::load(store.as_ref())
            .await
            .context("Failed to load reader preferences")?;

        let urls = EsfweeUrls::new(base_url);
        let client = reqwest::Client::builder()
            .timeout(config.prefetch.fetch_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let chapter: ChapterMeta =
            resolve_chapter(args, &EsfweeClient::new(client.clone(), urls.clone())).await?;

        let session = ReaderSession::new(Arc::new(urls), prefs, &config.reader);
        let prefetcher = PagePrefetcher::new(
            Arc::new(HttpPageFetcher::new(client)),
            PageCache::with_config(&config.prefetch),
            &config.prefetch,
        );

        let (actions, action_rx) = mpsc::unbounded_channel::<ReaderAction>();
        let (event_loop, snapshots) = ReaderEventLoop::new(session, prefetcher, store, action_rx);
        let event_loop: JoinHandle<ReaderSession> = tokio::spawn(event_loop.run());

        actions.send(ReaderAction::OpenChapter(chapter))?;
        if let Some(page) = args.start_page {
            actions.send(ReaderAction::JumpToPage(page))?;
        }

        let terminal: AppTerminal = setup_terminal().context("Failed to initialize terminal")?;

        Ok(Self {
            terminal,
            renderer: UIRenderer::new(),
            input: InputMapper::new(),
            events: EventStream::new(),
            actions,
            snapshots,
            event_loop,
        })
    }

    async fn run(mut self) -> Result<()> {
        self.render()?;

        let result: Result<()> = self.event_cycle().await;

        drop(self.actions);
        match self.event_loop.await {
            Ok(session) => info!(
                page = session.current_page(),
                direction = %session.state().direction,
                mode = %session.state().pagination,
                "Closed reader"
            ),
            Err(e) => error!("Reader event loop failed: {e}"),
        }

        cleanup_terminal(&mut self.terminal)?;
        info!(
            frames = self.renderer.stats().frames,
            slow = self.renderer.stats().slow,
            fps = self.renderer.stats().fps(),
            "Render stats"
        );
        result
    }

    async fn event_cycle(&mut self) -> Result<()> {
        loop {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C");
                    return Ok(());
                }

                changed = self.snapshots.changed() => {
                    if changed.is_err() {
                        debug!("Event loop stopped publishing");
                        return Ok(());
                    }
                    self.render()?;
                }

                maybe_event = self.events.next() => match maybe_event {
                    Some(Ok(event)) => {
                        if !self.handle_terminal_event(event)? {
                            return Ok(());
                        }
                    }
                    Some(Err(e)) => warn!("Terminal event error: {e}"),
                    None => return Ok(()),
                },
            }
        }
    }

    /// Returns `false` once the reader should close.
    fn handle_terminal_event(&mut self, event: TerminalEvent) -> Result<bool> {
        let snapshot: ReaderSnapshot = self.snapshots.borrow().clone();

        let action: Option<ReaderAction> = match event {
            TerminalEvent::Key(key) => self.map_key(key, &snapshot),
            TerminalEvent::Mouse(mouse) => self.map_mouse(mouse, &snapshot),
            TerminalEvent::Resize(..) => {
                self.render()?;
                None
            }
            _ => None,
        };

        let Some(action) = action else {
            return Ok(true);
        };

        let quit: bool = action == ReaderAction::Quit;
        if self.actions.send(action).is_err() {
            return Ok(false);
        }
        Ok(!quit)
    }

    fn map_key(&mut self, key: KeyEvent, snapshot: &ReaderSnapshot) -> Option<ReaderAction> {
        let before: Option<CompactString> = self.input.pending_jump().map(CompactString::from);
        let action: Option<ReaderAction> = self.input.map_key(key, snapshot);

        if self.input.pending_jump().map(CompactString::from) != before {
            if let Err(e) = self.render() {
                warn!("Failed to redraw jump prompt: {e}");
            }
        }
        action
    }

    fn map_mouse(&self, mouse: MouseEvent, snapshot: &ReaderSnapshot) -> Option<ReaderAction> {
        let body: Rect = self.renderer.body_area();
        if !body.contains(ratatui::layout::Position::new(mouse.column, mouse.row)) {
            return None;
        }

        let relative = MouseEvent {
            column: mouse.column - body.x,
            ..mouse
        };
        self.input.map_mouse(relative, body.width, snapshot)
    }

    fn render(&mut self) -> Result<()> {
        let mut snapshot: ReaderSnapshot = self.snapshots.borrow().clone();
        snapshot.pending_jump = self.input.pending_jump().map(CompactString::from);

        let start: Instant = Instant::now();
        let renderer: &mut UIRenderer = &mut self.renderer;
        self.terminal
            .draw(|frame: &mut Frame<'_>| renderer.render(frame, &snapshot))
            .context("Failed to draw terminal")?;

        let duration = start.elapsed();
        if duration.as_millis() > 16 {
            warn!("Slow render: {}ms (target: <16ms)", duration.as_millis());
        }
        Ok(())
    }
}

async fn resolve_chapter(args: &Args, client: &EsfweeClient) -> Result<ChapterMeta> {
    if let Some(anilist_id) = args.manga {
        let chapters = client
            .chapters(anilist_id)
            .await
            .with_context(|| format!("Failed to list chapters of manga {anilist_id}"))?;
        let chapter = select_chapter(&chapters, args.chapter_number)
            .ok_or_else(|| anyhow!("manga {anilist_id} has no matching chapter"))?;

        info!(chapter = chapter.id, label = %chapter.label(), "Selected chapter");
        return Ok(ChapterMeta::new(
            chapter.chapter_id(),
            chapter.label(),
            chapter.page_count,
        ));
    }

    let (Some(chapter_id), Some(pages)) = (args.chapter_id, args.pages) else {
        bail!("pass --manga, or --chapter-id together with --pages");
    };
    let label: String = args
        .chapter_number
        .map_or_else(|| format!("Chapter {chapter_id}"), format_chapter_label);

    Ok(ChapterMeta::new(ChapterId(chapter_id), label, pages))
}

fn setup_terminal() -> Result<AppTerminal> {
    enable_raw_mode().context("Failed to enable raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;

    info!("Terminal setup complete");
    Ok(terminal)
}

fn cleanup_terminal(terminal: &mut AppTerminal) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    info!("Terminal cleanup complete");
    Ok(())
}

fn setup_panic_handler() {
    let original_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info: &PanicHookInfo<'_>| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen);

        error!("Reader panicked: {}", panic_info);
        original_hook(panic_info);
    }));
}
