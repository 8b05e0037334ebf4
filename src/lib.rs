// Library interface for the COSU kiosk controller
// This allows tests and the CLI binary to access the crate's functionality

pub mod config;
pub mod constants;
pub mod notices;
pub mod platform;
pub mod policy;
pub mod store;

use anyhow::{Context, Result};
use constants::{STAY_ON_PLUGGED_ANY, UPDATE_WINDOW_DURATION_DEFAULT, UPDATE_WINDOW_START_DEFAULT};
use log::{debug, info, warn};
use notices::Notifier;
use policy::{DevicePolicy, Restriction, TaskLock, UpdateWindow, STAY_ON_WHILE_PLUGGED_IN};
use std::sync::Arc;
use store::{Mode, ModeStore};

/// Kiosk policy controller shared between the CLI and embedding code.
///
/// Toggles the device between kiosk and normal operating mode by entering
/// or exiting the foreground task lock, and, when the hosted package holds
/// device-owner privilege, by applying or clearing the device-wide policy
/// bundle. One controller serves every privilege variant: the privileged
/// branch is selected by a live owner query, never by configuration.
pub struct KioskCore {
    package: String,
    policy: Arc<dyn DevicePolicy>,
    tasks: Arc<dyn TaskLock>,
    store: Arc<dyn ModeStore>,
    notifier: Arc<dyn Notifier>,
    update_window: UpdateWindow,
}

impl KioskCore {
    pub fn new(
        package: impl Into<String>,
        policy: Arc<dyn DevicePolicy>,
        tasks: Arc<dyn TaskLock>,
        store: Arc<dyn ModeStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            package: package.into(),
            policy,
            tasks,
            store,
            notifier,
            update_window: UpdateWindow {
                start_minute: UPDATE_WINDOW_START_DEFAULT,
                duration_minutes: UPDATE_WINDOW_DURATION_DEFAULT,
            },
        }
    }

    /// Override the daily system-update installation window.
    pub fn set_update_window(&mut self, window: UpdateWindow) {
        self.update_window = window;
        info!(
            "Update window set to {} min after midnight, {} min long",
            window.start_minute, window.duration_minutes
        );
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn mode(&self) -> Mode {
        self.store.mode()
    }

    pub fn is_locked(&self) -> bool {
        self.store.mode().is_locked()
    }

    /// Enter kiosk mode.
    ///
    /// Privilege is queried live on every attempt. Without device-owner
    /// privilege the policy bundle is skipped; without lock-task permission
    /// the pin degrades to best-effort. Neither is an error: the user gets
    /// one informational notice and the mode still transitions to Locked.
    ///
    /// Individual platform calls are not transactional. A failure mid-way
    /// is logged and the sequence continues; the next `activate()` re-applies
    /// everything idempotently.
    pub fn activate(&self) -> Result<()> {
        if self.policy.is_device_owner(&self.package) {
            debug!("Setting default COSU policies");
            self.apply_cosu_policies(true);
        } else {
            debug!("This app is not the device owner");
            self.notifier
                .notify("Kiosk mode", "This app is not the device owner");
        }

        if self.policy.is_lock_task_permitted(&self.package) {
            info!("Pinning and locking the task");
        } else {
            // Not allowlisted. The pin still goes up, but the user can
            // escape it, so say so.
            debug!("The app is not allowlisted for lock task");
            self.notifier.notify(
                "Kiosk mode",
                "The app is not allowlisted for lock task; pinning without full lock",
            );
            info!("Just pinning the task");
        }
        if let Err(e) = self.tasks.start_lock_task() {
            warn!("start_lock_task failed: {:#}", e);
        }

        self.store
            .set_mode(Mode::Locked)
            .context("Failed to persist locked mode")?;

        Ok(())
    }

    /// Leave kiosk mode.
    ///
    /// The task lock is released unconditionally and, when privileged,
    /// every policy item applied by `activate()` is reversed.
    pub fn deactivate(&self) -> Result<()> {
        info!("Unlocking and unpinning the task");
        if let Err(e) = self.tasks.stop_lock_task() {
            warn!("stop_lock_task failed: {:#}", e);
        }

        self.store
            .set_mode(Mode::Unlocked)
            .context("Failed to persist unlocked mode")?;

        if self.policy.is_device_owner(&self.package) {
            debug!("Resetting default COSU policies");
            self.apply_cosu_policies(false);
        }

        Ok(())
    }

    /// Startup resume: if the persisted mode is Locked, re-enter kiosk mode
    /// without user interaction. Returns whether a resume happened.
    pub fn resume(&self) -> Result<bool> {
        if self.store.mode().is_locked() {
            info!("Persisted mode is locked; restoring kiosk state");
            self.activate()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Apply (`active = true`) or clear (`active = false`) the full policy
    /// bundle and restriction set. Every call is independent; failures are
    /// logged and the rest of the bundle is still applied.
    fn apply_cosu_policies(&self, active: bool) {
        for restriction in Restriction::ALL {
            self.set_user_restriction(restriction, active);
        }

        best_effort(
            "set_keyguard_disabled",
            self.policy.set_keyguard_disabled(active),
        );
        best_effort(
            "set_status_bar_disabled",
            self.policy.set_status_bar_disabled(active),
        );

        self.set_stay_on_while_plugged_in(active);

        let window = if active {
            Some(self.update_window)
        } else {
            None
        };
        best_effort(
            "set_system_update_policy",
            self.policy.set_system_update_policy(window),
        );

        let packages: Vec<String> = if active {
            vec![self.package.clone()]
        } else {
            Vec::new()
        };
        best_effort(
            "set_lock_task_packages",
            self.policy.set_lock_task_packages(&packages),
        );

        // Registering as the home intent receiver is what brings the kiosk
        // back as the default screen after reboot.
        if active {
            best_effort(
                "add_persistent_home_activity",
                self.policy.add_persistent_home_activity(&self.package),
            );
        } else {
            best_effort(
                "clear_persistent_home_activities",
                self.policy.clear_persistent_home_activities(&self.package),
            );
        }
    }

    fn set_user_restriction(&self, restriction: Restriction, disallow: bool) {
        let result = if disallow {
            self.policy.add_user_restriction(restriction)
        } else {
            self.policy.clear_user_restriction(restriction)
        };
        best_effort(restriction.key(), result);
    }

    fn set_stay_on_while_plugged_in(&self, enabled: bool) {
        let value = if enabled {
            STAY_ON_PLUGGED_ANY.to_string()
        } else {
            "0".to_string()
        };
        best_effort(
            STAY_ON_WHILE_PLUGGED_IN,
            self.policy.set_global_setting(STAY_ON_WHILE_PLUGGED_IN, &value),
        );
    }
}

/// Log-and-continue handling for individual policy calls.
fn best_effort(what: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!("Policy call {} failed: {:#}", what, e);
    }
}
