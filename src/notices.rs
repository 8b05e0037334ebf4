//! User-visible informational notices
//!
//! The controller raises no errors for missing privileges; it degrades and
//! tells the user once. Where that message lands is injected: the CLI logs
//! by default, or shows a desktop notification with `--desktop-notify`.

use crate::constants::NOTIFICATION_TIMEOUT_MS;
use log::warn;

pub trait Notifier: Send + Sync {
    fn notify(&self, summary: &str, body: &str);
}

/// Log-backed notifier, the default for headless runs.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, summary: &str, body: &str) {
        warn!("{}: {}", summary, body);
    }
}

/// Desktop notification via the system notification center.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, summary: &str, body: &str) {
        let _ = notify_rust::Notification::new()
            .summary(summary)
            .body(body)
            .timeout(notify_rust::Timeout::Milliseconds(NOTIFICATION_TIMEOUT_MS))
            .show();
    }
}
