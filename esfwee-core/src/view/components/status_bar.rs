//! src/view/components/status_bar.rs
//!
//! Bottom line: page indicator and reading mode on the left, key hints or
//! the page-jump prompt on the right.

use ratatui::{
    prelude::*,
    widgets::{Paragraph, Widget},
};

use crate::view::{snapshots::ReaderSnapshot, theme};

const KEY_HINTS: &str = "←/→ tap  j/k step  d pages  r direction  c chrome  q quit";

pub struct StatusBar;

impl StatusBar {
    pub fn render(frame: &mut Frame<'_>, snap: &ReaderSnapshot, area: Rect) {
        let left_text = format!(
            "{} | {} | {}",
            snap.page_indicator(),
            snap.mode,
            snap.direction
        );

        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        Paragraph::new(left_text)
            .style(theme::base_style())
            .alignment(Alignment::Left)
            .render(layout[0], frame.buffer_mut());

        let right = match &snap.pending_jump {
            Some(digits) => Span::styled(format!("Go to page: {digits}_"), theme::jump_prompt_style()),
            None => Span::styled(KEY_HINTS, theme::hint_style()),
        };

        Paragraph::new(Line::from(right))
            .style(theme::base_style())
            .alignment(Alignment::Right)
            .render(layout[1], frame.buffer_mut());
    }
}
