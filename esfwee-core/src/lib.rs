pub mod error;

pub mod config;

pub mod api {
    pub mod http;
    pub use http::{EsfweeClient, HttpPageFetcher};

    pub mod types;
    pub use types::{Chapter, Manga};

    pub mod urls;
    pub use urls::{EsfweeUrls, PageUrlResolver};
}

pub mod cache {
    pub mod page_cache;
    pub use page_cache::PageCache;
}

pub mod controller {
    pub mod actions;
    pub use actions::{ChapterMeta, ReaderAction};

    pub mod event_loop;
    pub use event_loop::ReaderEventLoop;

    pub mod input;

    pub mod navigation;
    pub use navigation::{NavOutcome, NavigationEngine, TapZone, TapZones};

    pub mod position;
    pub use position::PositionTracker;

    pub mod session;
    pub use session::{Dispatched, ReaderSession};
}

pub mod model {
    pub mod page;
    pub use page::{ChapterId, Page, PageCatalog};

    pub mod preferences;
    pub use preferences::{PreferenceChange, PreferenceStore, ReaderPreferences};

    pub mod reader_state;
    pub use reader_state::{ReaderState, ReadingDirection};

    pub mod render_window;
    pub use render_window::{RenderWindow, RenderWindowPlanner};

    pub mod spread;
    pub use spread::{PaginationMode, Spread, SpreadComposer, SpreadLayout};
}

pub mod operators {
    pub mod prefetcher;
    pub use prefetcher::{FetchEvent, FetchStatus, PageFetcher, PagePrefetcher};
}

pub mod view {
    pub mod theme;

    pub mod ui;

    pub mod snapshots;
    pub use snapshots::*;

    pub mod components {
        pub mod spread_panel;
        pub use spread_panel::SpreadPanel;
        pub mod status_bar;
        pub use status_bar::StatusBar;
    }
}

pub mod logging;
pub use logging::Logger;

pub use error::{ReaderError, ReaderResult};

pub use controller::session::ReaderSession;
