//! ``src/controller/session.rs``
//! ============================================================================
//! # Reader session
//!
//! Single owner of the reading state for one open chapter. All mutations
//! arrive as [`ReaderAction`]s and run to completion one at a time, so the
//! state never observes two navigation requests interleaved.
//!
//! A pagination change rebuilds the spread layout and re-resolves the
//! reading position from the anchor page. Opening a chapter always starts at
//! its first spread; preferences survive chapter changes untouched.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    api::urls::PageUrlResolver,
    config::ReaderConfig,
    controller::{
        actions::{ChapterMeta, ReaderAction},
        navigation::{NavOutcome, NavigationEngine, TapZones},
        position::PositionTracker,
    },
    error::{ReaderError, ReaderResult},
    model::{
        page::{Page, PageCatalog},
        preferences::{PreferenceChange, ReaderPreferences},
        reader_state::{ReaderState, ReadingDirection},
        render_window::{RenderWindow, RenderWindowPlanner},
        spread::{PaginationMode, SpreadLayout},
    },
};

/// Effects of one dispatched action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    pub outcome: NavOutcome,

    /// Preference edit to persist, if the action changed one.
    pub preference_change: Option<PreferenceChange>,

    /// Render window differs from before the action.
    pub window_changed: bool,

    /// A chapter was opened or closed.
    pub chapter_changed: bool,

    pub quit: bool,
}

impl Dispatched {
    const fn outcome(outcome: NavOutcome) -> Self {
        Self {
            outcome,
            preference_change: None,
            window_changed: false,
            chapter_changed: false,
            quit: false,
        }
    }
}

#[derive(Debug)]
pub struct ReaderSession {
    resolver: Arc<dyn PageUrlResolver>,
    chapter: Option<ChapterMeta>,
    layout: SpreadLayout,
    state: ReaderState,
    planner: RenderWindowPlanner,
    zones: TapZones,
    prefs: ReaderPreferences,
}

impl ReaderSession {
    #[must_use]
    pub fn new(
        resolver: Arc<dyn PageUrlResolver>,
        prefs: ReaderPreferences,
        config: &ReaderConfig,
    ) -> Self {
        let mode: PaginationMode = prefs.pagination();

        Self {
            resolver,
            chapter: None,
            layout: SpreadLayout::new(Arc::from(Vec::<Page>::new()), mode),
            state: ReaderState::new(prefs.direction, mode),
            planner: RenderWindowPlanner::new(config.window_radius),
            zones: config.tap_zones(),
            prefs,
        }
    }

    #[must_use]
    pub const fn chapter(&self) -> Option<&ChapterMeta> {
        self.chapter.as_ref()
    }

    #[must_use]
    pub const fn layout(&self) -> &SpreadLayout {
        &self.layout
    }

    #[must_use]
    pub const fn state(&self) -> &ReaderState {
        &self.state
    }

    #[must_use]
    pub const fn preferences(&self) -> ReaderPreferences {
        self.prefs
    }

    /// 1-based page for the indicator, 0 when nothing is shown.
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.state.current_page(&self.layout)
    }

    #[must_use]
    pub fn render_window(&self) -> RenderWindow {
        self.planner
            .plan(self.state.current_spread(), self.layout.spread_count())
    }

    /// Pages of every spread in the render window, in reading order.
    #[must_use]
    pub fn window_pages(&self) -> Vec<Page> {
        self.render_window()
            .iter()
            .flat_map(|index: usize| self.layout.pages_of(index))
            .cloned()
            .collect()
    }

    pub fn dispatch(&mut self, action: ReaderAction) -> ReaderResult<Dispatched> {
        let name: &'static str = action.name();
        let window_before: RenderWindow = self.render_window();

        let mut dispatched: Dispatched = match self.apply(action) {
            Ok(dispatched) => dispatched,
            Err(e) => {
                if e.is_navigation() {
                    warn!(action = name, "navigation request rejected: {e}");
                }
                return Err(e);
            }
        };

        dispatched.window_changed =
            dispatched.chapter_changed || self.render_window() != window_before;
        debug!(
            action = name,
            outcome = ?dispatched.outcome,
            spread = self.state.current_spread(),
            page = self.current_page(),
            "dispatched"
        );

        Ok(dispatched)
    }

    fn apply(&mut self, action: ReaderAction) -> ReaderResult<Dispatched> {
        let engine = NavigationEngine::new(&self.layout, self.zones);

        let outcome: NavOutcome = match action {
            ReaderAction::OpenChapter(meta) => return Ok(self.open_chapter(meta)),
            ReaderAction::CloseChapter => return Ok(self.close_chapter()),
            ReaderAction::Quit => {
                return Ok(Dispatched {
                    quit: true,
                    ..Dispatched::outcome(NavOutcome::Stayed)
                });
            }

            ReaderAction::SetPagination(mode) => return Ok(self.set_pagination(mode)),
            ReaderAction::TogglePagination => {
                return Ok(self.set_pagination(self.state.pagination.toggled()));
            }
            ReaderAction::SetDirection(direction) => return Ok(self.set_direction(direction)),
            ReaderAction::CycleDirection => {
                return Ok(self.set_direction(self.state.direction.cycled()));
            }

            ReaderAction::ToggleChrome => {
                self.state.toggle_chrome();
                NavOutcome::ChromeToggled {
                    visible: self.state.chrome_visible,
                }
            }

            ReaderAction::Tap(x) => {
                self.require_chapter()?;
                engine.tap(&mut self.state, x)
            }
            ReaderAction::Advance => {
                self.require_chapter()?;
                engine.advance(&mut self.state)
            }
            ReaderAction::Retreat => {
                self.require_chapter()?;
                engine.retreat(&mut self.state)
            }
            ReaderAction::JumpToPage(page) => {
                self.require_chapter()?;
                engine.jump_to_page_number(&mut self.state, page)?
            }
            ReaderAction::JumpToSpread(index) => {
                self.require_chapter()?;
                engine.jump_to_spread_index(&mut self.state, index)?
            }
            ReaderAction::VisibleIndicesChanged(visible) => {
                self.require_chapter()?;
                PositionTracker::new(&self.layout).report_visible_indices(&mut self.state, &visible)
            }
        };

        Ok(Dispatched::outcome(outcome))
    }

    const fn require_chapter(&self) -> ReaderResult<()> {
        if self.chapter.is_none() {
            return Err(ReaderError::NoChapter);
        }
        Ok(())
    }

    fn open_chapter(&mut self, meta: ChapterMeta) -> Dispatched {
        let pages = PageCatalog::build(self.resolver.as_ref(), meta.id, meta.page_count);
        info!(
            chapter = %meta.id,
            label = %meta.label,
            pages = meta.page_count,
            "opening chapter"
        );

        self.layout = SpreadLayout::new(pages, self.state.pagination);
        let chrome_visible: bool = self.state.chrome_visible;
        self.state = ReaderState::new(self.state.direction, self.state.pagination);
        self.state.chrome_visible = chrome_visible;
        self.chapter = Some(meta);

        let outcome: NavOutcome = if self.layout.is_empty() {
            NavOutcome::EmptyChapter
        } else {
            NavOutcome::Stayed
        };

        Dispatched {
            chapter_changed: true,
            ..Dispatched::outcome(outcome)
        }
    }

    fn close_chapter(&mut self) -> Dispatched {
        let Some(meta) = self.chapter.take() else {
            return Dispatched::outcome(NavOutcome::Stayed);
        };

        info!(chapter = %meta.id, "closing chapter");
        self.layout = SpreadLayout::new(Arc::from(Vec::<Page>::new()), self.state.pagination);
        self.state = ReaderState::new(self.state.direction, self.state.pagination);

        Dispatched {
            chapter_changed: true,
            ..Dispatched::outcome(NavOutcome::EmptyChapter)
        }
    }

    fn set_pagination(&mut self, mode: PaginationMode) -> Dispatched {
        if mode == self.state.pagination {
            return Dispatched::outcome(NavOutcome::Stayed);
        }

        self.layout = self.layout.with_mode(mode);
        let outcome: NavOutcome = PositionTracker::new(&self.layout).relayout(&mut self.state);

        let change = PreferenceChange::DoublePage(mode.is_double());
        self.prefs.apply(change);
        info!(%mode, page = self.current_page(), "pagination changed");

        Dispatched {
            preference_change: Some(change),
            ..Dispatched::outcome(outcome)
        }
    }

    fn set_direction(&mut self, direction: ReadingDirection) -> Dispatched {
        if direction == self.state.direction {
            return Dispatched::outcome(NavOutcome::Stayed);
        }

        self.state.direction = direction;
        let change = PreferenceChange::Direction(direction);
        self.prefs.apply(change);
        info!(%direction, "reading direction changed");

        Dispatched {
            preference_change: Some(change),
            ..Dispatched::outcome(NavOutcome::Stayed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::urls::EsfweeUrls, model::page::ChapterId};

    fn session(prefs: ReaderPreferences) -> ReaderSession {
        ReaderSession::new(
            Arc::new(EsfweeUrls::new("http://nas.local:3000/")),
            prefs,
            &ReaderConfig::default(),
        )
    }

    fn open(session: &mut ReaderSession, pages: usize) {
        session
            .dispatch(ReaderAction::OpenChapter(ChapterMeta::new(
                ChapterId(42),
                "Ch. 3",
                pages,
            )))
            .unwrap();
    }

    #[test]
    fn opening_a_chapter_starts_at_the_cover() {
        let mut s = session(ReaderPreferences::default());
        open(&mut s, 10);
        s.dispatch(ReaderAction::JumpToPage(7)).unwrap();

        let d = s
            .dispatch(ReaderAction::OpenChapter(ChapterMeta::new(ChapterId(43), "Ch. 4", 5)))
            .unwrap();
        assert!(d.chapter_changed);
        assert!(d.window_changed);
        assert_eq!(s.state().current_spread(), 0);
        assert_eq!(s.current_page(), 1);
        assert_eq!(s.layout().page_count(), 5);
    }

    #[test]
    fn window_pages_use_chapter_urls() {
        let mut s = session(ReaderPreferences::default());
        open(&mut s, 10);

        let urls: Vec<String> = s.window_pages().into_iter().map(|p| p.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://nas.local:3000/manga/chapters/42/pages/1",
                "http://nas.local:3000/manga/chapters/42/pages/2",
            ]
        );
    }

    #[test]
    fn navigation_without_chapter_is_rejected() {
        let mut s = session(ReaderPreferences::default());
        assert!(matches!(
            s.dispatch(ReaderAction::Advance),
            Err(ReaderError::NoChapter)
        ));
        assert!(s.dispatch(ReaderAction::ToggleChrome).is_ok());
    }

    #[test]
    fn empty_chapter_reports_empty_outcome() {
        let mut s = session(ReaderPreferences::default());
        open(&mut s, 0);

        assert!(s.render_window().is_empty());
        assert_eq!(s.current_page(), 0);
        let d = s.dispatch(ReaderAction::JumpToPage(1)).unwrap();
        assert_eq!(d.outcome, NavOutcome::EmptyChapter);
        assert_eq!(
            s.dispatch(ReaderAction::Tap(0.1)).unwrap().outcome,
            NavOutcome::EmptyChapter
        );
    }

    #[test]
    fn pagination_toggle_emits_preference_change() {
        let mut s = session(ReaderPreferences::default());
        open(&mut s, 10);
        s.dispatch(ReaderAction::JumpToPage(5)).unwrap();

        let d = s.dispatch(ReaderAction::TogglePagination).unwrap();
        assert_eq!(d.preference_change, Some(PreferenceChange::DoublePage(true)));
        assert_eq!(s.current_page(), 5);
        assert_eq!(s.state().current_spread(), 2);
        assert!(s.preferences().double_page);

        let again = s.dispatch(ReaderAction::SetPagination(PaginationMode::Double)).unwrap();
        assert_eq!(again.preference_change, None);
    }

    #[test]
    fn direction_survives_chapter_change() {
        let mut s = session(ReaderPreferences::default());
        open(&mut s, 4);

        let d = s.dispatch(ReaderAction::CycleDirection).unwrap();
        assert_eq!(
            d.preference_change,
            Some(PreferenceChange::Direction(ReadingDirection::Vertical))
        );

        open(&mut s, 6);
        assert_eq!(s.state().direction, ReadingDirection::Vertical);
        assert_eq!(s.preferences().direction, ReadingDirection::Vertical);
    }

    #[test]
    fn rejected_jump_leaves_state_untouched() {
        let mut s = session(ReaderPreferences::default());
        open(&mut s, 10);
        s.dispatch(ReaderAction::JumpToPage(4)).unwrap();
        let before = s.state().clone();

        assert!(matches!(
            s.dispatch(ReaderAction::JumpToSpread(10)),
            Err(ReaderError::OutOfRange { .. })
        ));
        assert!(matches!(
            s.dispatch(ReaderAction::JumpToPage(11)),
            Err(ReaderError::InvalidPage { .. })
        ));
        assert_eq!(s.state(), &before);
    }

    #[test]
    fn window_change_is_reported() {
        let mut s = session(ReaderPreferences::default());
        open(&mut s, 10);

        assert!(s.dispatch(ReaderAction::Advance).unwrap().window_changed);
        assert!(!s.dispatch(ReaderAction::ToggleChrome).unwrap().window_changed);
        assert!(s.dispatch(ReaderAction::Quit).unwrap().quit);
    }
}
