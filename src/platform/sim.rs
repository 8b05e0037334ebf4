//! Simulated device backend
//!
//! Implements [`DevicePolicy`] and [`TaskLock`] against an in-memory device
//! model with the same capability semantics as the real platform:
//! lock-task permission is driven by the allowlist, policy mutation is
//! gated on device-owner privilege, and the pin taken by `start_lock_task`
//! is only fully locked when the caller was allowlisted at call time.
//!
//! The CLI points the simulator at a snapshot file so device state survives
//! across invocations, which is what makes the startup-resume path
//! observable from a terminal.

use crate::policy::{DevicePolicy, Restriction, TaskLock, UpdateWindow};
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

/// How strongly the foreground task is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinMode {
    /// Allowlisted lock: system UI affordances are unavailable.
    Locked,
    /// Best-effort pin: the user can still escape.
    BestEffort,
}

/// Snapshot of everything the device-policy authority knows.
///
/// Field order matters for TOML output: scalars and arrays before tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceState {
    /// Package provisioned as device owner, if any.
    pub device_owner: Option<String>,
    pub keyguard_disabled: bool,
    pub status_bar_disabled: bool,
    /// Current foreground pin, if any.
    pub pin: Option<PinMode>,
    /// Persistent preferred home-activity registration.
    pub persistent_home: Option<String>,
    /// Active user restrictions, by platform key.
    pub restrictions: BTreeSet<String>,
    /// Packages permitted to lock their task.
    pub lock_task_packages: Vec<String>,
    pub global_settings: BTreeMap<String, String>,
    pub update_window: Option<UpdateWindow>,
}

/// A fake device hosting a single application.
pub struct SimulatedDevice {
    package: String,
    inner: Mutex<DeviceState>,
    snapshot_path: Option<PathBuf>,
}

impl SimulatedDevice {
    /// Fresh in-memory device hosting `package`, with no privileges granted.
    pub fn in_memory(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            inner: Mutex::new(DeviceState::default()),
            snapshot_path: None,
        }
    }

    /// Device whose state is loaded from and saved to a TOML snapshot.
    ///
    /// A missing snapshot starts a fresh device; a corrupt one is an error
    /// so a broken demo state does not silently reset.
    pub fn with_snapshot(package: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read device snapshot {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Corrupt device snapshot {}", path.display()))?
        } else {
            debug!("No device snapshot at {}; starting fresh", path.display());
            DeviceState::default()
        };

        Ok(Self {
            package: package.into(),
            inner: Mutex::new(state),
            snapshot_path: Some(path),
        })
    }

    /// Package hosted by this device.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Provision the hosted package as device owner.
    pub fn provision_owner(&self) {
        self.inner.lock().device_owner = Some(self.package.clone());
        info!("{} provisioned as device owner", self.package);
        self.save();
    }

    /// Allowlist the hosted package for task locking, as an external
    /// device-policy manager would.
    pub fn permit_lock_task(&self) {
        let mut state = self.inner.lock();
        if !state.lock_task_packages.contains(&self.package) {
            state.lock_task_packages.push(self.package.clone());
        }
        drop(state);
        info!("{} allowlisted for lock task", self.package);
        self.save();
    }

    /// Current state, cloned for inspection.
    pub fn state(&self) -> DeviceState {
        self.inner.lock().clone()
    }

    pub fn pin_mode(&self) -> Option<PinMode> {
        self.inner.lock().pin
    }

    fn save(&self) {
        let Some(ref path) = self.snapshot_path else {
            return;
        };

        let state = self.inner.lock().clone();
        let result = (|| -> Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let contents = toml::to_string_pretty(&state)?;
            fs::write(path, contents)?;
            Ok(())
        })();

        if let Err(e) = result {
            warn!("Failed to save device snapshot {}: {}", path.display(), e);
        }
    }

    fn require_owner(&self, state: &DeviceState, what: &str) -> Result<()> {
        if state.device_owner.as_deref() != Some(self.package.as_str()) {
            bail!("{}: {} is not the device owner", what, self.package);
        }
        Ok(())
    }
}

impl DevicePolicy for SimulatedDevice {
    fn is_device_owner(&self, package: &str) -> bool {
        self.inner.lock().device_owner.as_deref() == Some(package)
    }

    fn is_lock_task_permitted(&self, package: &str) -> bool {
        self.inner
            .lock()
            .lock_task_packages
            .iter()
            .any(|p| p == package)
    }

    fn add_user_restriction(&self, restriction: Restriction) -> Result<()> {
        let mut state = self.inner.lock();
        self.require_owner(&state, "add_user_restriction")?;
        state.restrictions.insert(restriction.key().to_string());
        drop(state);
        debug!("restriction {} disallowed", restriction.key());
        self.save();
        Ok(())
    }

    fn clear_user_restriction(&self, restriction: Restriction) -> Result<()> {
        let mut state = self.inner.lock();
        self.require_owner(&state, "clear_user_restriction")?;
        state.restrictions.remove(restriction.key());
        drop(state);
        debug!("restriction {} cleared", restriction.key());
        self.save();
        Ok(())
    }

    fn set_keyguard_disabled(&self, disabled: bool) -> Result<()> {
        let mut state = self.inner.lock();
        self.require_owner(&state, "set_keyguard_disabled")?;
        state.keyguard_disabled = disabled;
        drop(state);
        self.save();
        Ok(())
    }

    fn set_status_bar_disabled(&self, disabled: bool) -> Result<()> {
        let mut state = self.inner.lock();
        self.require_owner(&state, "set_status_bar_disabled")?;
        state.status_bar_disabled = disabled;
        drop(state);
        self.save();
        Ok(())
    }

    fn set_global_setting(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.inner.lock();
        self.require_owner(&state, "set_global_setting")?;
        state.global_settings.insert(key.to_string(), value.to_string());
        drop(state);
        debug!("global setting {} = {}", key, value);
        self.save();
        Ok(())
    }

    fn set_system_update_policy(&self, window: Option<UpdateWindow>) -> Result<()> {
        let mut state = self.inner.lock();
        self.require_owner(&state, "set_system_update_policy")?;
        state.update_window = window;
        drop(state);
        self.save();
        Ok(())
    }

    fn set_lock_task_packages(&self, packages: &[String]) -> Result<()> {
        let mut state = self.inner.lock();
        self.require_owner(&state, "set_lock_task_packages")?;
        state.lock_task_packages = packages.to_vec();
        drop(state);
        debug!("lock-task allowlist: {:?}", packages);
        self.save();
        Ok(())
    }

    fn add_persistent_home_activity(&self, package: &str) -> Result<()> {
        let mut state = self.inner.lock();
        self.require_owner(&state, "add_persistent_home_activity")?;
        state.persistent_home = Some(package.to_string());
        drop(state);
        debug!("{} registered as persistent home", package);
        self.save();
        Ok(())
    }

    fn clear_persistent_home_activities(&self, package: &str) -> Result<()> {
        let mut state = self.inner.lock();
        self.require_owner(&state, "clear_persistent_home_activities")?;
        if state.persistent_home.as_deref() == Some(package) {
            state.persistent_home = None;
        }
        drop(state);
        self.save();
        Ok(())
    }
}

impl TaskLock for SimulatedDevice {
    fn start_lock_task(&self) -> Result<()> {
        let mut state = self.inner.lock();
        // Pin strength is decided by the allowlist at call time, exactly
        // like startLockTask on the platform.
        let mode = if state.lock_task_packages.contains(&self.package) {
            PinMode::Locked
        } else {
            PinMode::BestEffort
        };
        state.pin = Some(mode);
        drop(state);
        info!("task pinned ({:?})", mode);
        self.save();
        Ok(())
    }

    fn stop_lock_task(&self) -> Result<()> {
        let mut state = self.inner.lock();
        state.pin = None;
        drop(state);
        info!("task unpinned");
        self.save();
        Ok(())
    }
}
