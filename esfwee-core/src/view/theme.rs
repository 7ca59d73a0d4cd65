//! src/view/theme.rs
//! ============================================================================
//! # Catppuccin Mocha Theme Color Palette
//!
//! Colors are from the official Catppuccin theme specification:
//! https://github.com/catppuccin/catppuccin

use ratatui::style::{Color, Modifier, Style};

use crate::operators::prefetcher::FetchStatus;

pub const BACKGROUND: Color = Color::Rgb(30, 30, 46); // Base
pub const CURRENT_LINE: Color = Color::Rgb(69, 71, 90); // Surface1
pub const FOREGROUND: Color = Color::Rgb(205, 214, 244); // Text
pub const COMMENT: Color = Color::Rgb(127, 132, 156); // Overlay1
pub const CYAN: Color = Color::Rgb(137, 220, 235); // Sky
pub const GREEN: Color = Color::Rgb(166, 227, 161); // Green
pub const ORANGE: Color = Color::Rgb(250, 179, 135); // Peach
pub const PURPLE: Color = Color::Rgb(203, 166, 247); // Mauve
pub const RED: Color = Color::Rgb(243, 139, 168); // Red
pub const YELLOW: Color = Color::Rgb(249, 226, 175); // Yellow

pub fn base_style() -> Style {
    Style::default().bg(BACKGROUND).fg(FOREGROUND)
}

pub fn header_style() -> Style {
    Style::default()
        .bg(CURRENT_LINE)
        .fg(FOREGROUND)
        .add_modifier(Modifier::BOLD)
}

pub fn current_spread_border_style() -> Style {
    Style::default().fg(YELLOW).add_modifier(Modifier::BOLD)
}

pub fn spread_border_style() -> Style {
    Style::default().fg(PURPLE)
}

pub fn hint_style() -> Style {
    Style::default().fg(COMMENT)
}

pub fn jump_prompt_style() -> Style {
    Style::default().fg(CYAN).add_modifier(Modifier::BOLD)
}

/// Color and label for a page's fetch state.
pub fn fetch_status_style(status: Option<&FetchStatus>) -> (Style, &'static str) {
    match status {
        None => (hint_style(), "queued"),
        Some(FetchStatus::Pending) => (Style::default().fg(ORANGE), "loading"),
        Some(FetchStatus::Ready { .. }) => (Style::default().fg(GREEN), "ready"),
        Some(FetchStatus::Failed(_)) => (Style::default().fg(RED), "failed"),
        Some(FetchStatus::Cancelled) => (hint_style(), "cancelled"),
    }
}
