//! src/view/components/spread_panel.rs
//!
//! One spread of the render window: a bordered panel holding one box per
//! page, laid out in on-screen order.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{
    model::reader_state::ReadingDirection,
    operators::prefetcher::FetchStatus,
    view::{
        snapshots::{PageView, SpreadView},
        theme,
    },
};

pub struct SpreadPanel<'a> {
    spread: &'a SpreadView,
    direction: ReadingDirection,
}

impl<'a> SpreadPanel<'a> {
    #[must_use]
    pub const fn new(spread: &'a SpreadView, direction: ReadingDirection) -> Self {
        Self { spread, direction }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let border_style: Style = if self.spread.is_current {
            theme::current_spread_border_style()
        } else {
            theme::spread_border_style()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Spread {} ", self.spread.index + 1))
            .border_style(border_style)
            .style(theme::base_style());
        let inner: Rect = block.inner(area);
        frame.render_widget(block, area);

        let pages: Vec<&PageView> = self.spread.visual_pages(self.direction).collect();
        if pages.is_empty() {
            return;
        }

        let split = if self.direction.is_horizontal() {
            Direction::Horizontal
        } else {
            Direction::Vertical
        };
        let constraints = vec![Constraint::Ratio(1, pages.len() as u32); pages.len()];
        let cells = Layout::default()
            .direction(split)
            .constraints(constraints)
            .split(inner);

        for (page, cell) in pages.into_iter().zip(cells.iter()) {
            Self::render_page(frame, page, *cell);
        }
    }

    fn render_page(frame: &mut Frame<'_>, page: &PageView, area: Rect) {
        let (status_style, status_label) = theme::fetch_status_style(page.status.as_ref());

        let mut lines: Vec<Line<'_>> = vec![
            Line::from(Span::styled(
                format!("Page {}", page.index),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(status_label, status_style)),
            Line::from(Span::styled(page.url.as_str(), theme::hint_style())),
        ];

        if let Some(FetchStatus::Ready { bytes }) = &page.status {
            lines.push(Line::from(Span::styled(
                format!("{bytes} bytes"),
                theme::hint_style(),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).border_style(status_style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}
