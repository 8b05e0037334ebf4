//! Configuration parsing for the kiosk controller
//!
//! The update-window parameters are demonstration defaults, not protocol
//! requirements, so they are plain configuration: environment variables
//! can override them, and the CLI can override the environment.
//!
//! Environment variables (all optional):
//! - COSU_UPDATE_WINDOW_START: minutes after midnight the daily
//!   system-update window opens (0-1439)
//! - COSU_UPDATE_WINDOW_DURATION: window length in minutes (30-1440)

use crate::constants::{
    UPDATE_WINDOW_DURATION_DEFAULT, UPDATE_WINDOW_DURATION_MAX, UPDATE_WINDOW_DURATION_MIN,
    UPDATE_WINDOW_START_DEFAULT, UPDATE_WINDOW_START_MAX, UPDATE_WINDOW_START_MIN,
};
use crate::policy::UpdateWindow;
use log::{debug, info, warn};
use std::env;

/// Parse the COSU_UPDATE_WINDOW_START environment variable
///
/// Returns Some(minutes) if a valid start is configured (0-1439)
/// Returns None if not set or invalid
pub fn parse_update_window_start() -> Option<u32> {
    match env::var("COSU_UPDATE_WINDOW_START") {
        Ok(val) => match val.parse::<u32>() {
            Ok(minutes)
                if (UPDATE_WINDOW_START_MIN..=UPDATE_WINDOW_START_MAX).contains(&minutes) =>
            {
                info!(
                    "Update-window start set via environment variable: {} minutes",
                    minutes
                );
                Some(minutes)
            }
            Ok(minutes) => {
                warn!(
                    "Invalid update-window start: {} (must be {}-{}). Using default.",
                    minutes, UPDATE_WINDOW_START_MIN, UPDATE_WINDOW_START_MAX
                );
                None
            }
            Err(e) => {
                warn!(
                    "Failed to parse COSU_UPDATE_WINDOW_START: {}. Using default.",
                    e
                );
                None
            }
        },
        Err(_) => {
            debug!("COSU_UPDATE_WINDOW_START not set.");
            None
        }
    }
}

/// Parse the COSU_UPDATE_WINDOW_DURATION environment variable
///
/// Returns Some(minutes) if a valid duration is configured (30-1440)
/// Returns None if not set or invalid
pub fn parse_update_window_duration() -> Option<u32> {
    match env::var("COSU_UPDATE_WINDOW_DURATION") {
        Ok(val) => match val.parse::<u32>() {
            Ok(minutes)
                if (UPDATE_WINDOW_DURATION_MIN..=UPDATE_WINDOW_DURATION_MAX)
                    .contains(&minutes) =>
            {
                info!(
                    "Update-window duration set via environment variable: {} minutes",
                    minutes
                );
                Some(minutes)
            }
            Ok(minutes) => {
                warn!(
                    "Invalid update-window duration: {} (must be {}-{}). Using default.",
                    minutes, UPDATE_WINDOW_DURATION_MIN, UPDATE_WINDOW_DURATION_MAX
                );
                None
            }
            Err(e) => {
                warn!(
                    "Failed to parse COSU_UPDATE_WINDOW_DURATION: {}. Using default.",
                    e
                );
                None
            }
        },
        Err(_) => {
            debug!("COSU_UPDATE_WINDOW_DURATION not set.");
            None
        }
    }
}

/// The update window to apply, with environment overrides filled in over
/// the defaults.
pub fn update_window_from_env() -> UpdateWindow {
    UpdateWindow {
        start_minute: parse_update_window_start().unwrap_or(UPDATE_WINDOW_START_DEFAULT),
        duration_minutes: parse_update_window_duration().unwrap_or(UPDATE_WINDOW_DURATION_DEFAULT),
    }
}
