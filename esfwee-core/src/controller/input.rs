//! ``src/controller/input.rs``
//! ============================================================================
//! # Terminal input mapping
//!
//! Turns crossterm key and mouse events into [`ReaderAction`]s. Arrow keys
//! stand in for the tap zones, so `rtl` flips them exactly like a tap would.
//! Digits accumulate into a page number that `Enter` jumps to.

use std::collections::HashMap;

use compact_str::CompactString;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use tracing::trace;

use crate::{
    controller::actions::ReaderAction, model::reader_state::ReadingDirection,
    view::snapshots::ReaderSnapshot,
};

/// Tap positions used for keyboard stand-ins of the side zones.
const LEFT_EDGE: f32 = 0.0;
const RIGHT_EDGE: f32 = 1.0;

const fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

const fn plain(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[derive(Debug)]
pub struct InputMapper {
    bindings: HashMap<KeyEvent, ReaderAction>,
    jump_buffer: CompactString,
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl InputMapper {
    #[must_use]
    pub fn new() -> Self {
        let mut bindings: HashMap<KeyEvent, ReaderAction> = HashMap::with_capacity(16);

        // Tap zones
        bindings.insert(plain(KeyCode::Left), ReaderAction::Tap(LEFT_EDGE));
        bindings.insert(plain(KeyCode::Right), ReaderAction::Tap(RIGHT_EDGE));
        bindings.insert(key('h'), ReaderAction::Tap(LEFT_EDGE));
        bindings.insert(key('l'), ReaderAction::Tap(RIGHT_EDGE));

        // Direction-free stepping
        bindings.insert(key('j'), ReaderAction::Advance);
        bindings.insert(key('k'), ReaderAction::Retreat);
        bindings.insert(plain(KeyCode::Down), ReaderAction::Advance);
        bindings.insert(plain(KeyCode::Up), ReaderAction::Retreat);
        bindings.insert(key(' '), ReaderAction::Advance);
        bindings.insert(plain(KeyCode::PageDown), ReaderAction::Advance);
        bindings.insert(plain(KeyCode::PageUp), ReaderAction::Retreat);

        // Settings
        bindings.insert(key('d'), ReaderAction::TogglePagination);
        bindings.insert(key('r'), ReaderAction::CycleDirection);
        bindings.insert(key('c'), ReaderAction::ToggleChrome);

        bindings.insert(key('g'), ReaderAction::JumpToSpread(0));
        bindings.insert(key('q'), ReaderAction::Quit);

        Self {
            bindings,
            jump_buffer: CompactString::default(),
        }
    }

    /// Digits typed so far, if a page jump is being entered.
    #[must_use]
    pub fn pending_jump(&self) -> Option<&str> {
        (!self.jump_buffer.is_empty()).then_some(self.jump_buffer.as_str())
    }

    pub fn map_key(&mut self, event: KeyEvent, snapshot: &ReaderSnapshot) -> Option<ReaderAction> {
        if event.kind == KeyEventKind::Release {
            return None;
        }

        trace!(?event.code, ?event.modifiers, "key event");

        if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
            return Some(ReaderAction::Quit);
        }

        match event.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.jump_buffer.push(c);
                return None;
            }

            KeyCode::Enter if !self.jump_buffer.is_empty() => {
                let target: Option<usize> = self.jump_buffer.parse::<usize>().ok();
                self.jump_buffer.clear();
                return target.map(ReaderAction::JumpToPage);
            }

            KeyCode::Backspace if !self.jump_buffer.is_empty() => {
                self.jump_buffer.pop();
                return None;
            }

            KeyCode::Esc if !self.jump_buffer.is_empty() => {
                self.jump_buffer.clear();
                return None;
            }

            KeyCode::Esc => return Some(ReaderAction::Quit),
            KeyCode::Backspace => return Some(ReaderAction::Retreat),
            KeyCode::Char('G') => {
                return (snapshot.page_count > 0)
                    .then_some(ReaderAction::JumpToPage(snapshot.page_count));
            }
            _ => {}
        }

        self.bindings
            .get(&event)
            .or_else(|| self.bindings.get(&plain(event.code)))
            .cloned()
    }

    /// Left click taps at the clicked column; the wheel steps through
    /// vertical strips.
    #[must_use]
    pub fn map_mouse(
        &self,
        event: MouseEvent,
        width: u16,
        snapshot: &ReaderSnapshot,
    ) -> Option<ReaderAction> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                Some(ReaderAction::Tap(column_fraction(event.column, width)))
            }

            MouseEventKind::ScrollDown if snapshot.direction == ReadingDirection::Vertical => {
                Some(ReaderAction::Advance)
            }

            MouseEventKind::ScrollUp if snapshot.direction == ReadingDirection::Vertical => {
                Some(ReaderAction::Retreat)
            }

            _ => None,
        }
    }
}

/// Fraction of the width at the center of `column`.
#[must_use]
pub fn column_fraction(column: u16, width: u16) -> f32 {
    if width == 0 {
        return 0.5;
    }
    (f32::from(column) + 0.5) / f32::from(width)
}
