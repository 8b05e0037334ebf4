//! Platform collaborator surface: the device-policy authority and the
//! task-locking primitive.
//!
//! The controller never talks to the platform directly; it goes through the
//! [`DevicePolicy`] and [`TaskLock`] traits so that tests and the CLI demo
//! can substitute the simulated backend in `platform::sim`.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Global setting key for keeping the screen on while on external power.
///
/// The value is the decimal string form of a `STAY_ON_PLUGGED_*` bitmask,
/// or `"0"` to disable.
pub const STAY_ON_WHILE_PLUGGED_IN: &str = "stay_on_while_plugged_in";

/// A named device-wide capability that can be disallowed for all users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Restriction {
    SafeBoot,
    FactoryReset,
    AddUser,
    MountPhysicalMedia,
    AdjustVolume,
}

impl Restriction {
    /// The full restriction set toggled as a unit with kiosk mode.
    pub const ALL: [Restriction; 5] = [
        Restriction::SafeBoot,
        Restriction::FactoryReset,
        Restriction::AddUser,
        Restriction::MountPhysicalMedia,
        Restriction::AdjustVolume,
    ];

    /// Stable platform key for this restriction.
    pub fn key(self) -> &'static str {
        match self {
            Restriction::SafeBoot => "no_safe_boot",
            Restriction::FactoryReset => "no_factory_reset",
            Restriction::AddUser => "no_add_user",
            Restriction::MountPhysicalMedia => "no_physical_media",
            Restriction::AdjustVolume => "no_adjust_volume",
        }
    }
}

/// Recurring daily installation window for system updates.
///
/// Times are in platform minute units: `start_minute` is minutes after
/// local midnight, `duration_minutes` is the window length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateWindow {
    pub start_minute: u32,
    pub duration_minutes: u32,
}

/// Query/set surface of the device-policy authority.
///
/// Capability queries are answered live on every call; callers must not
/// cache the results. Mutators are best-effort from the controller's point
/// of view: a failure is logged and the sequence continues.
pub trait DevicePolicy: Send + Sync {
    /// Whether `package` holds device-owner privilege.
    fn is_device_owner(&self, package: &str) -> bool;

    /// Whether `package` is currently allowlisted for task locking.
    fn is_lock_task_permitted(&self, package: &str) -> bool;

    fn add_user_restriction(&self, restriction: Restriction) -> Result<()>;
    fn clear_user_restriction(&self, restriction: Restriction) -> Result<()>;

    fn set_keyguard_disabled(&self, disabled: bool) -> Result<()>;
    fn set_status_bar_disabled(&self, disabled: bool) -> Result<()>;

    /// Write a device-wide global setting. Values are opaque strings.
    fn set_global_setting(&self, key: &str, value: &str) -> Result<()>;

    /// Install a windowed system-update policy, or revert to the platform
    /// default when `window` is `None`.
    fn set_system_update_policy(&self, window: Option<UpdateWindow>) -> Result<()>;

    /// Replace the set of packages permitted to lock their task.
    fn set_lock_task_packages(&self, packages: &[String]) -> Result<()>;

    /// Register `package` as the persistent preferred handler for the
    /// home/launcher intent, so it reappears as the default screen after
    /// reboot.
    fn add_persistent_home_activity(&self, package: &str) -> Result<()>;

    /// Clear all persistent preferred-activity registrations for `package`.
    fn clear_persistent_home_activities(&self, package: &str) -> Result<()>;
}

/// The foreground task-locking primitive.
pub trait TaskLock: Send + Sync {
    /// Request an exclusive foreground task lock. Without allowlisting this
    /// degrades to a best-effort pin the user can escape.
    fn start_lock_task(&self) -> Result<()>;

    /// Release the task lock (or pin). Safe to call when not locked.
    fn stop_lock_task(&self) -> Result<()>;
}
