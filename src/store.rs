//! Persisted operating-mode flag
//!
//! The controller records whether the device is in kiosk mode as a single
//! boolean so that state survives process restarts and reboots. The store
//! is injected rather than ambient: production uses [`FileModeStore`],
//! tests substitute [`MemoryModeStore`].

use crate::constants::STATE_FILE_PERMISSIONS;
use anyhow::{Context, Result};
use log::warn;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Device operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Locked,
    Unlocked,
}

impl Mode {
    pub fn is_locked(self) -> bool {
        self == Mode::Locked
    }

    fn from_flag(locked: bool) -> Self {
        if locked {
            Mode::Locked
        } else {
            Mode::Unlocked
        }
    }
}

/// Durable storage for the mode flag.
///
/// `mode()` never fails: an unreadable or corrupt store reads as
/// `Unlocked`, the safe default for a device that cannot prove it was in
/// kiosk mode.
pub trait ModeStore: Send + Sync {
    fn mode(&self) -> Mode;
    fn set_mode(&self, mode: Mode) -> Result<()>;
}

/// In-memory store for tests and ephemeral runs.
pub struct MemoryModeStore {
    inner: Mutex<Mode>,
}

impl MemoryModeStore {
    pub fn new(initial: Mode) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }
}

impl Default for MemoryModeStore {
    fn default() -> Self {
        Self::new(Mode::Unlocked)
    }
}

impl ModeStore for MemoryModeStore {
    fn mode(&self) -> Mode {
        *self.inner.lock()
    }

    fn set_mode(&self, mode: Mode) -> Result<()> {
        *self.inner.lock() = mode;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedMode {
    locked: bool,
}

/// TOML-backed store at a fixed path.
pub struct FileModeStore {
    path: PathBuf,
}

impl FileModeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Standard state file location:
    ///
    /// - macOS: `~/Library/Application Support/cosu/state.toml`
    /// - Linux: `~/.config/cosu/state.toml`
    /// - Windows: `%APPDATA%\cosu\state.toml`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("cosu");
        Ok(dir.join("state.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModeStore for FileModeStore {
    fn mode(&self) -> Mode {
        if !self.path.exists() {
            return Mode::Unlocked;
        }

        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "Failed to read mode state from {}: {}. Treating as unlocked.",
                    self.path.display(),
                    e
                );
                return Mode::Unlocked;
            }
        };

        match toml::from_str::<PersistedMode>(&contents) {
            Ok(state) => Mode::from_flag(state.locked),
            Err(e) => {
                warn!(
                    "Corrupt mode state at {}: {}. Treating as unlocked.",
                    self.path.display(),
                    e
                );
                Mode::Unlocked
            }
        }
    }

    fn set_mode(&self, mode: Mode) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(&PersistedMode {
            locked: mode.is_locked(),
        })
        .context("Failed to serialize mode state")?;

        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        #[cfg(unix)]
        {
            let perms = fs::Permissions::from_mode(STATE_FILE_PERMISSIONS);
            fs::set_permissions(&self.path, perms)
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        Ok(())
    }
}
