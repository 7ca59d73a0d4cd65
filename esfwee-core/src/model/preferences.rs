//! ``src/model/preferences.rs``
//! ============================================================================
//! # Reader preferences
//!
//! Reading direction and double-page mode, persisted across sessions in a
//! small key-value store. Loaded once at startup, changed only by explicit
//! user action, never reset implicitly.
//!
//! Stored keys:
//! - `reader_direction`: `"ltr" | "rtl" | "vertical"`
//! - `reader_double_page`: `"true" | "false"`

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::{fs as TokioFs, sync::RwLock};
use tracing::{debug, info, warn};

use crate::{
    error::{ReaderError, ReaderResult},
    model::{reader_state::ReadingDirection, spread::PaginationMode},
};

pub const DIRECTION_KEY: &str = "reader_direction";
pub const DOUBLE_PAGE_KEY: &str = "reader_double_page";

/// Minimal string key-value persistence.
#[async_trait]
pub trait PreferenceStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> ReaderResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> ReaderResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReaderPreferences {
    pub direction: ReadingDirection,
    pub double_page: bool,
}

impl ReaderPreferences {
    #[must_use]
    pub const fn pagination(&self) -> PaginationMode {
        PaginationMode::from_double_page(self.double_page)
    }

    /// Read both keys, keeping defaults for anything missing or unparseable.
    pub async fn load(store: &dyn PreferenceStore) -> ReaderResult<Self> {
        let mut prefs: Self = Self::default();

        if let Some(raw) = store.get(DIRECTION_KEY).await? {
            match raw.parse::<ReadingDirection>() {
                Ok(direction) => prefs.direction = direction,
                Err(e) => warn!("Ignoring stored {DIRECTION_KEY}: {e}"),
            }
        }

        if let Some(raw) = store.get(DOUBLE_PAGE_KEY).await? {
            prefs.double_page = raw == "true";
        }

        debug!(?prefs, "loaded reader preferences");
        Ok(prefs)
    }

    /// Write both keys.
    pub async fn save(&self, store: &dyn PreferenceStore) -> ReaderResult<()> {
        PreferenceChange::Direction(self.direction).persist(store).await?;
        PreferenceChange::DoublePage(self.double_page).persist(store).await
    }

    pub const fn apply(&mut self, change: PreferenceChange) {
        match change {
            PreferenceChange::Direction(direction) => self.direction = direction,
            PreferenceChange::DoublePage(double_page) => self.double_page = double_page,
        }
    }
}

/// A single user-initiated preference edit. Persisting it writes only its
/// own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceChange {
    Direction(ReadingDirection),
    DoublePage(bool),
}

impl PreferenceChange {
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Direction(_) => DIRECTION_KEY,
            Self::DoublePage(_) => DOUBLE_PAGE_KEY,
        }
    }

    #[must_use]
    pub const fn value(&self) -> &'static str {
        match self {
            Self::Direction(direction) => direction.as_str(),
            Self::DoublePage(true) => "true",
            Self::DoublePage(false) => "false",
        }
    }

    pub async fn persist(&self, store: &dyn PreferenceStore) -> ReaderResult<()> {
        store.set(self.key(), self.value()).await
    }
}

/// Process-local store, used by tests and as a fallback when no config
/// directory is available.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get(&self, key: &str) -> ReaderResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ReaderResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// TOML file of string keys, rewritten through a temporary file on every set.
#[derive(Debug)]
pub struct TomlPreferenceStore {
    path: PathBuf,
    temp_path: PathBuf,
    lock: RwLock<()>,
}

impl TomlPreferenceStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        let temp_path: PathBuf = path.with_extension("toml.tmp");

        Self {
            path,
            temp_path,
            lock: RwLock::new(()),
        }
    }

    /// `preferences.toml` next to the config file.
    pub fn in_config_dir() -> ReaderResult<Self> {
        Ok(Self::new(
            crate::config::Config::config_dir()?.join("preferences.toml"),
        ))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> ReaderResult<BTreeMap<String, String>> {
        if !TokioFs::try_exists(&self.path).await? {
            return Ok(BTreeMap::new());
        }

        let text: String = TokioFs::read_to_string(&self.path).await?;
        toml::from_str(&text).map_err(|e| {
            ReaderError::Preferences(format!("{}: {e}", self.path.display()))
        })
    }
}

#[async_trait]
impl PreferenceStore for TomlPreferenceStore {
    async fn get(&self, key: &str) -> ReaderResult<Option<String>> {
        let _guard = self.lock.read().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> ReaderResult<()> {
        let _guard = self.lock.write().await;

        let mut entries: BTreeMap<String, String> = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());

        let text: String = toml::to_string_pretty(&entries)
            .map_err(|e| ReaderError::Preferences(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            TokioFs::create_dir_all(parent).await?;
        }
        TokioFs::write(&self.temp_path, text).await?;
        TokioFs::rename(&self.temp_path, &self.path).await?;

        info!("Saved {key}={value} to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_are_rtl_single_page() {
        let store = MemoryPreferenceStore::new();
        let prefs = ReaderPreferences::load(&store).await.unwrap();

        assert_eq!(prefs.direction, ReadingDirection::Rtl);
        assert!(!prefs.double_page);
        assert_eq!(prefs.pagination(), PaginationMode::Single);
    }

    #[tokio::test]
    async fn unknown_values_keep_defaults() {
        let store = MemoryPreferenceStore::new();
        store.set(DIRECTION_KEY, "diagonal").await.unwrap();
        store.set(DOUBLE_PAGE_KEY, "yes").await.unwrap();

        let prefs = ReaderPreferences::load(&store).await.unwrap();
        assert_eq!(prefs, ReaderPreferences::default());
    }

    #[tokio::test]
    async fn change_persists_only_its_key() {
        let store = MemoryPreferenceStore::new();
        PreferenceChange::DoublePage(true).persist(&store).await.unwrap();

        assert_eq!(store.get(DOUBLE_PAGE_KEY).await.unwrap().as_deref(), Some("true"));
        assert_eq!(store.get(DIRECTION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn toml_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.toml");

        let prefs = ReaderPreferences {
            direction: ReadingDirection::Vertical,
            double_page: true,
        };
        prefs.save(&TomlPreferenceStore::new(path.clone())).await.unwrap();

        let reopened = TomlPreferenceStore::new(path);
        assert_eq!(ReaderPreferences::load(&reopened).await.unwrap(), prefs);
    }

    #[tokio::test]
    async fn missing_toml_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlPreferenceStore::new(dir.path().join("absent.toml"));

        assert_eq!(store.get(DIRECTION_KEY).await.unwrap(), None);
    }

    #[test]
    fn apply_updates_in_place() {
        let mut prefs = ReaderPreferences::default();
        prefs.apply(PreferenceChange::Direction(ReadingDirection::Ltr));
        prefs.apply(PreferenceChange::DoublePage(true));

        assert_eq!(prefs.direction, ReadingDirection::Ltr);
        assert_eq!(prefs.pagination(), PaginationMode::Double);
    }
}
