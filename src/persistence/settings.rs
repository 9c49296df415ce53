use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    // If None, use OS default state directory
    pub state_override: Option<PathBuf>,
    // If None, snapshots live next to the state files
    #[serde(default)]
    pub snapshot_override: Option<PathBuf>,
    // If None, use OS temporary directory for exports
    #[serde(default)]
    pub export_override: Option<PathBuf>,
    // Clock format in the top bar
    #[serde(default)]
    pub clock_24h: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            state_override: None,
            snapshot_override: None,
            export_override: None,
            clock_24h: false,
        }
    }
}

impl AppSettings {
    fn config_dir() -> PathBuf {
        // Cross-platform user config dir
        #[cfg(target_os = "macos")]
        {
            // ~/Library/Application Support/LinkDeck
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("LinkDeck");
        }
        #[cfg(target_os = "windows")]
        {
            // %APPDATA%\LinkDeck
            if let Ok(appdata) = std::env::var("APPDATA") {
                return PathBuf::from(appdata).join("LinkDeck");
            }
            return PathBuf::from("LinkDeck");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_CONFIG_HOME/LinkDeck or ~/.config/LinkDeck
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg).join("LinkDeck");
            }
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join(".config").join("LinkDeck");
        }
    }

    fn state_default_dir() -> PathBuf {
        // Cross-platform user-writable state dir
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"));
            return home.join("Library").join("Application Support").join("LinkDeck").join("State");
        }
        #[cfg(target_os = "windows")]
        {
            // %LOCALAPPDATA%\LinkDeck\State else TEMP
            if let Ok(local) = std::env::var("LOCALAPPDATA") {
                return PathBuf::from(local).join("LinkDeck").join("State");
            }
            if let Ok(temp) = std::env::var("TEMP") {
                return PathBuf::from(temp).join("LinkDeck");
            }
            return PathBuf::from("LinkDeck");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            // $XDG_STATE_HOME/link-deck or ~/.local/state/link-deck, else /tmp/LinkDeck
            if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
                return PathBuf::from(xdg).join("link-deck");
            }
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home).join(".local").join("state").join("link-deck");
            }
            return PathBuf::from("/tmp").join("LinkDeck");
        }
    }

    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_dir().join("settings.json");
        if path.exists() {
            let mut f = std::fs::File::open(path)?;
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            let v: Self = serde_json::from_str(&s)?;
            return Ok(v);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join("settings.json");
        let s = serde_json::to_string_pretty(self)?;
        let mut f = std::fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    pub fn state_dir(&self) -> PathBuf {
        if let Some(p) = &self.state_override { return p.clone(); }
        Self::state_default_dir()
    }

    /// Effective snapshot directory: user override, else the state dir
    /// (snapshot files are distinguishable by name).
    pub fn snapshot_dir(&self) -> PathBuf {
        if let Some(p) = &self.snapshot_override { return p.clone(); }
        self.state_dir()
    }

    /// Return the directory where the settings file (settings.json) is stored.
    /// This is OS-specific and resolves to a per-user configuration directory.
    pub fn settings_dir() -> PathBuf {
        Self::config_dir()
    }

    /// Default export directory when no override is set: OS temporary directory.
    /// Example: {temp_dir}/LinkDeck/exports
    pub fn export_default_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push("LinkDeck");
        p.push("exports");
        p
    }

    /// Effective export directory honoring user override or falling back to OS temp.
    pub fn export_dir(&self) -> PathBuf {
        if let Some(p) = &self.export_override { return p.clone(); }
        Self::export_default_dir()
    }
}
