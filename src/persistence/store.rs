use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use ron::ser::PrettyConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::board_utils::board::{Board, Category, Link, Panel, PanelId};
use super::settings::AppSettings;

// The five stored keys. Collections are JSON arrays; the two scalars are
// plain strings, and an unset current panel means the key is absent.
pub const KEY_PANELS: &str = "dashboard_panels";
pub const KEY_CATEGORIES: &str = "dashboard_categories";
pub const KEY_LINKS: &str = "dashboard_links";
pub const KEY_CURRENT_PANEL: &str = "dashboard_current_panel";
pub const KEY_THEME: &str = "dashboard_theme";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Theme> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Opaque key-value blob store the repository persists into. Reads treat
/// missing or unreadable entries as absent; write failures surface to the
/// caller (the save action reports them, there is no retry).
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&mut self, key: &str) -> anyhow::Result<()>;
}

/// Directory-backed store: one file per key under the state directory,
/// written atomically (tmp then rename).
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: PathBuf) -> Self {
        DirStore { dir }
    }

    /// Store rooted at the effective state directory (settings override or
    /// OS default).
    pub fn open_default() -> Self {
        DirStore { dir: state_dir() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KvStore for DirStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.key_path(key);
        let mut f = File::open(path).ok()?;
        let mut buf = String::new();
        f.read_to_string(&mut buf).ok()?;
        Some(buf)
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)?;
        atomic_write(&self.key_path(key), value.as_bytes())?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for headless tests.
#[derive(Default, Debug, Clone)]
pub struct MemStore {
    entries: HashMap<String, String>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

pub struct LoadedState {
    pub board: Board,
    pub theme: Option<Theme>,
}

/// Load everything the store holds. Malformed blobs degrade to empty
/// collections (or None for the scalars) rather than failing the load.
pub fn load_state(store: &dyn KvStore) -> LoadedState {
    let panels: Vec<Panel> = read_collection(store, KEY_PANELS);
    let categories: Vec<Category> = read_collection(store, KEY_CATEGORIES);
    let links: Vec<Link> = read_collection(store, KEY_LINKS);
    let current_panel = store
        .get(KEY_CURRENT_PANEL)
        .and_then(|s| Uuid::parse_str(s.trim()).ok());
    let theme = store.get(KEY_THEME).and_then(|s| Theme::parse(s.trim()));
    LoadedState {
        board: Board { panels, categories, links, current_panel },
        theme,
    }
}

fn read_collection<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Vec<T> {
    match store.get(key) {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("discarding malformed {}: {}", key, e);
                Vec::new()
            }
        },
        None => Vec::new(),
    }
}

/// Full snapshot overwrite of the three collections. Runs after every
/// repository mutation; there is no partial or incremental save.
pub fn save_collections(store: &mut dyn KvStore, board: &Board) -> anyhow::Result<()> {
    store.set(KEY_PANELS, &serde_json::to_string(&board.panels)?)?;
    store.set(KEY_CATEGORIES, &serde_json::to_string(&board.categories)?)?;
    store.set(KEY_LINKS, &serde_json::to_string(&board.links)?)?;
    Ok(())
}

pub fn save_current_panel(store: &mut dyn KvStore, current: Option<PanelId>) -> anyhow::Result<()> {
    match current {
        Some(id) => store.set(KEY_CURRENT_PANEL, &id.to_string()),
        None => store.remove(KEY_CURRENT_PANEL),
    }
}

pub fn save_theme(store: &mut dyn KvStore, theme: Theme) -> anyhow::Result<()> {
    store.set(KEY_THEME, theme.as_str())
}

pub fn save_state(store: &mut dyn KvStore, board: &Board, theme: Option<Theme>) -> anyhow::Result<()> {
    save_collections(store, board)?;
    save_current_panel(store, board.current_panel)?;
    if let Some(t) = theme {
        save_theme(store, t)?;
    }
    Ok(())
}

// ---- Snapshot backups (whole dashboard state as pretty RON) ----

#[derive(Debug, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub panels: Vec<Panel>,
    pub categories: Vec<Category>,
    pub links: Vec<Link>,
    pub current_panel: Option<PanelId>,
    pub theme: Option<Theme>,
}

impl BoardSnapshot {
    pub fn from_runtime(board: &Board, theme: Option<Theme>) -> Self {
        Self {
            panels: board.panels.clone(),
            categories: board.categories.clone(),
            links: board.links.clone(),
            current_panel: board.current_panel,
            theme,
        }
    }

    /// Convert a persisted snapshot back into runtime structures.
    ///
    /// This intentionally consumes `self` to avoid cloning the collections.
    pub fn into_runtime(self) -> (Board, Option<Theme>) {
        let board = Board {
            panels: self.panels,
            categories: self.categories,
            links: self.links,
            current_panel: self.current_panel,
        };
        (board, self.theme)
    }
}

use std::sync::OnceLock;

static SETTINGS_OVERRIDE: OnceLock<AppSettings> = OnceLock::new();

pub fn set_settings_override(settings: AppSettings) {
    let _ = SETTINGS_OVERRIDE.set(settings);
}

fn effective_settings() -> AppSettings {
    // If an override is set (e.g. from main.rs), use it.
    if let Some(settings) = SETTINGS_OVERRIDE.get() {
        return settings.clone();
    }
    // Load settings if present; else use defaults
    AppSettings::load().unwrap_or_default()
}

pub fn state_dir() -> PathBuf {
    effective_settings().state_dir()
}

fn snapshot_dir() -> PathBuf {
    effective_settings().snapshot_dir()
}

pub fn snapshot_path_now() -> PathBuf {
    let now = OffsetDateTime::now_utc();
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    let stamp = now.format(fmt).unwrap_or_else(|_| "unknown".to_string());
    snapshot_dir().join(format!("snapshot_{}.ron", stamp))
}

pub fn save_snapshot(snap: &BoardSnapshot) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(snapshot_dir())?;
    let pretty = PrettyConfig::new()
        .separate_tuple_members(true)
        .enumerate_arrays(true);
    let s = ron::ser::to_string_pretty(snap, pretty)?;
    let path = snapshot_path_now();
    atomic_write(&path, s.as_bytes())?;
    Ok(path)
}

pub fn load_snapshot(path: &Path) -> anyhow::Result<BoardSnapshot> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let snap: BoardSnapshot = ron::from_str(&buf)?;
    Ok(snap)
}

pub fn list_snapshots() -> anyhow::Result<Vec<PathBuf>> {
    let dir = snapshot_dir();
    let mut entries: Vec<PathBuf> = Vec::new();
    if dir.exists() {
        for e in fs::read_dir(dir)? {
            let p = e?.path();
            if let Some(name) = p.file_name().and_then(|s| s.to_str())
                && name.starts_with("snapshot_") && name.ends_with(".ron")
            {
                entries.push(p);
            }
        }
    }
    // sort descending by filename (timestamp)
    entries.sort();
    entries.reverse();
    Ok(entries)
}
