//! Centralized constants for the COSU kiosk controller
//!
//! This module contains all configurable numerical values used throughout
//! the crate. Each constant includes documentation on its purpose, unit,
//! and recommended value range.

// ============================================================================
// SELF IDENTITY
// ============================================================================

/// Package name this application presents to the device-policy authority.
/// Unit: reverse-DNS package identifier
pub const SELF_PACKAGE: &str = "com.cosu.kiosk";

// ============================================================================
// SYSTEM UPDATE WINDOW
// ============================================================================

/// Default start of the daily system-update installation window.
/// Unit: minutes after local midnight
/// Recommended range: outside business hours for unattended kiosks
pub const UPDATE_WINDOW_START_DEFAULT: u32 = 60;

/// Default length of the daily system-update installation window.
/// Unit: minutes
pub const UPDATE_WINDOW_DURATION_DEFAULT: u32 = 120;

/// Minimum window start accepted from configuration.
/// Unit: minutes after local midnight
pub const UPDATE_WINDOW_START_MIN: u32 = 0;

/// Maximum window start accepted from configuration (last minute of the day).
/// Unit: minutes after local midnight
pub const UPDATE_WINDOW_START_MAX: u32 = 1439;

/// Minimum window duration accepted from configuration.
/// Unit: minutes
/// Range: Fixed minimum, an update needs a usable amount of time
pub const UPDATE_WINDOW_DURATION_MIN: u32 = 30;

/// Maximum window duration accepted from configuration (a full day).
/// Unit: minutes
pub const UPDATE_WINDOW_DURATION_MAX: u32 = 1440;

// ============================================================================
// STAY-ON-WHILE-PLUGGED-IN BITMASK
// ============================================================================

/// Keep the screen on while on AC power.
/// Unit: platform battery-plugged bit
pub const STAY_ON_PLUGGED_AC: u32 = 1;

/// Keep the screen on while on USB power.
/// Unit: platform battery-plugged bit
pub const STAY_ON_PLUGGED_USB: u32 = 2;

/// Keep the screen on while on wireless charging.
/// Unit: platform battery-plugged bit
pub const STAY_ON_PLUGGED_WIRELESS: u32 = 4;

/// All charging sources combined, applied while kiosk mode is active.
pub const STAY_ON_PLUGGED_ANY: u32 =
    STAY_ON_PLUGGED_AC | STAY_ON_PLUGGED_USB | STAY_ON_PLUGGED_WIRELESS;

// ============================================================================
// NOTIFICATION TIMEOUTS
// ============================================================================

/// Informational notice display duration.
/// Unit: milliseconds
/// Recommended range: 2000-5000 (long enough to read, short enough to not annoy)
pub const NOTIFICATION_TIMEOUT_MS: u32 = 3000;

// ============================================================================
// FILE PERMISSIONS
// ============================================================================

/// State file permissions (user read/write only).
/// Unit: Unix permission bits (octal)
pub const STATE_FILE_PERMISSIONS: u32 = 0o600;
