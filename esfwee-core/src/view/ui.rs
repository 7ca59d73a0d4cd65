//! src/view/ui.rs
//! ============================================================
//! Frame renderer that draws the reader from an immutable
//! `ReaderSnapshot`. No session state is touched while painting.

use std::time::{Duration, Instant};

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use tracing::{instrument, trace};

use crate::{
    model::reader_state::ReadingDirection,
    view::{
        components::{spread_panel::SpreadPanel, status_bar::StatusBar},
        snapshots::{ReaderSnapshot, SpreadView},
        theme,
    },
};

/// ---------------------------------------------------------------------------
/// Renderer struct (contains only caches + stats)
/// ---------------------------------------------------------------------------
#[derive(Debug, Default)]
pub struct UIRenderer {
    cache: LayoutCache,
    stats: RenderStats,
}

#[derive(Debug, Default)]
struct LayoutCache {
    screen: Rect,
    chrome_visible: bool,
    /// header, body, status
    areas: Option<[Rect; 3]>,
    hit: u64,
    miss: u64,
}

#[derive(Debug, Default)]
pub struct RenderStats {
    pub frames: u64,
    pub slow: u64,
    pub total: Duration,
}

impl RenderStats {
    #[must_use]
    pub fn fps(&self) -> f64 {
        if self.frames > 0 {
            self.frames as f64 / self.total.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// ---------------------------------------------------------------------------
/// public API
/// ---------------------------------------------------------------------------
impl UIRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Body area of the last frame; mouse taps are measured against it.
    #[must_use]
    pub fn body_area(&self) -> Rect {
        self.cache.areas.map_or(self.cache.screen, |[_, body, _]| body)
    }

    #[instrument(level = "trace", skip(self, f, snap))]
    pub fn render(&mut self, f: &mut Frame<'_>, snap: &ReaderSnapshot) {
        let start: Instant = Instant::now();
        let [header, body, status] = self.layout(f.area(), snap.chrome_visible);

        f.render_widget(Block::default().style(theme::base_style()), f.area());

        if snap.chrome_visible {
            Self::draw_header(f, snap, header);
            StatusBar::render(f, snap, status);
        }
        Self::draw_body(f, snap, body);

        let elapsed: Duration = start.elapsed();
        self.stats.total += elapsed;
        if elapsed.as_millis() > 16 {
            self.stats.slow += 1;
        }
        self.stats.frames += 1;
        trace!(frame = self.stats.frames, ?elapsed, "rendered");
    }
}

/// ---------------------------------------------------------------------------
/// main components
/// ---------------------------------------------------------------------------
impl UIRenderer {
    fn draw_header(f: &mut Frame<'_>, snap: &ReaderSnapshot, area: Rect) {
        let title: &str = snap.chapter_label.as_deref().unwrap_or("No chapter");
        let text = format!(
            " {title}  ·  spread {}/{} ",
            (snap.current_spread + 1).min(snap.spread_count),
            snap.spread_count
        );

        f.render_widget(Paragraph::new(text).style(theme::header_style()), area);
    }

    fn draw_body(f: &mut Frame<'_>, snap: &ReaderSnapshot, area: Rect) {
        if snap.chapter_label.is_none() {
            Self::draw_message(f, "No chapter open", area);
            return;
        }

        if snap.window.is_empty() {
            Self::draw_message(f, "This chapter has no pages", area);
            return;
        }

        // Later spreads sit further along the reading direction.
        let mut ordered: Vec<&SpreadView> = snap.window.iter().collect();
        if snap.direction == ReadingDirection::Rtl {
            ordered.reverse();
        }

        let split = if snap.direction.is_horizontal() {
            Direction::Horizontal
        } else {
            Direction::Vertical
        };
        let constraints: Vec<Constraint> = ordered
            .iter()
            .map(|spread: &&SpreadView| {
                if spread.is_current {
                    Constraint::Fill(2)
                } else {
                    Constraint::Fill(1)
                }
            })
            .collect();

        let cells = Layout::default()
            .direction(split)
            .constraints(constraints)
            .split(area);

        for (spread, cell) in ordered.into_iter().zip(cells.iter()) {
            SpreadPanel::new(spread, snap.direction).render(f, *cell);
        }
    }

    fn draw_message(f: &mut Frame<'_>, msg: &str, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::spread_border_style());

        f.render_widget(
            Paragraph::new(msg)
                .block(block)
                .style(theme::hint_style())
                .alignment(Alignment::Center),
            area,
        );
    }
}

/// ---------------------------------------------------------------------------
/// util: layout
/// ---------------------------------------------------------------------------
impl UIRenderer {
    fn layout(&mut self, screen: Rect, chrome_visible: bool) -> [Rect; 3] {
        if let Some(areas) = self.cache.areas {
            if self.cache.screen == screen && self.cache.chrome_visible == chrome_visible {
                self.cache.hit += 1;
                return areas;
            }
        }

        self.cache.miss += 1;
        self.cache.screen = screen;
        self.cache.chrome_visible = chrome_visible;

        let chrome: u16 = u16::from(chrome_visible);
        let areas: [Rect; 3] = Layout::vertical([
            Constraint::Length(chrome),
            Constraint::Fill(1),
            Constraint::Length(chrome),
        ])
        .areas(screen);

        self.cache.areas = Some(areas);
        areas
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use ratatui::backend::TestBackend;

    use super::*;
    use crate::{
        api::urls::EsfweeUrls,
        config::ReaderConfig,
        controller::{
            actions::{ChapterMeta, ReaderAction},
            session::ReaderSession,
        },
        model::{page::ChapterId, preferences::ReaderPreferences},
    };

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn snapshot(pages: usize) -> ReaderSnapshot {
        let mut session = ReaderSession::new(
            Arc::new(EsfweeUrls::new("http://esfwee")),
            ReaderPreferences::default(),
            &ReaderConfig::default(),
        );
        session
            .dispatch(ReaderAction::OpenChapter(ChapterMeta::new(ChapterId(5), "Ch. 2", pages)))
            .unwrap();
        ReaderSnapshot::capture(&session, &HashMap::new())
    }

    #[test]
    fn draws_indicator_and_pages() {
        let mut terminal = Terminal::new(TestBackend::new(160, 30)).unwrap();
        let mut renderer = UIRenderer::new();
        let snap = snapshot(10);

        terminal.draw(|f| renderer.render(f, &snap)).unwrap();
        let text = screen_text(&terminal);

        assert!(text.contains("Page 1 / 10"));
        assert!(text.contains("Ch. 2"));
        assert!(text.contains("Spread 2"));
        assert_eq!(renderer.stats().frames, 1);
    }

    #[test]
    fn hidden_chrome_drops_indicator() {
        let mut terminal = Terminal::new(TestBackend::new(160, 30)).unwrap();
        let mut renderer = UIRenderer::new();
        let mut snap = snapshot(10);
        snap.chrome_visible = false;

        terminal.draw(|f| renderer.render(f, &snap)).unwrap();
        assert!(!screen_text(&terminal).contains("Page 1 / 10"));
        assert_eq!(renderer.body_area().height, 30);
    }

    #[test]
    fn empty_chapter_shows_message() {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        let mut renderer = UIRenderer::new();

        terminal.draw(|f| renderer.render(f, &snapshot(0))).unwrap();
        assert!(screen_text(&terminal).contains("no pages"));
    }

    #[test]
    fn layout_is_cached_per_screen() {
        let mut renderer = UIRenderer::new();
        let screen = Rect::new(0, 0, 100, 40);
        renderer.layout(screen, true);
        renderer.layout(screen, true);
        renderer.layout(screen, false);
        assert_eq!(renderer.cache.hit, 1);
        assert_eq!(renderer.cache.miss, 2);
    }
}
