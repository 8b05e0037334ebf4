// COSU CLI - drives the kiosk policy controller over the simulated device
// backend, with device state persisted across invocations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cosu::constants::{
    SELF_PACKAGE, UPDATE_WINDOW_DURATION_MAX, UPDATE_WINDOW_DURATION_MIN, UPDATE_WINDOW_START_MAX,
    UPDATE_WINDOW_START_MIN,
};
use cosu::notices::{DesktopNotifier, LogNotifier, Notifier};
use cosu::platform::sim::PinMode;
use cosu::platform::SimulatedDevice;
use cosu::store::FileModeStore;
use cosu::{config, KioskCore};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// Corporate-owned single-use (kiosk) mode controller
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Corporate-owned single-use (kiosk) mode controller",
    long_about = "Toggles a device between kiosk and normal operating mode.

Locking pins the controller's app to the foreground and, when the app is
provisioned as device owner, additionally disallows safe boot, factory
reset, adding users, mounting external media and adjusting volume,
disables the keyguard and status bar, keeps the screen on while charging,
schedules a daily system-update window, and registers the app as the
persistent home screen.

This binary drives a simulated device whose state is persisted between
invocations, so `cosu lock` followed by a fresh `cosu status` behaves like
a kiosk surviving a reboot.

SETUP:
  Provision privileges on the simulated device before locking:
    cosu --device-owner --allow-lock-task lock

  Without --allow-lock-task the app is pinned best-effort only; without
  --device-owner no device-wide policy is touched. Neither is an error."
)]
struct Args {
    /// Simulated device snapshot file (default: <config>/cosu/device.toml)
    #[arg(long)]
    device_state: Option<PathBuf>,

    /// Provision the app as device owner on the simulated device
    #[arg(long)]
    device_owner: bool,

    /// Allowlist the app for task locking, as an external policy manager would
    #[arg(long)]
    allow_lock_task: bool,

    /// Show desktop notifications for degraded-mode notices instead of logging
    #[arg(long)]
    desktop_notify: bool,

    /// Daily system-update window start, minutes after midnight (0-1439, overrides env)
    /// NOTE: Keep range/default values in sync with UPDATE_WINDOW_* constants
    #[arg(long)]
    update_window_start: Option<u32>,

    /// Daily system-update window duration in minutes (30-1440, overrides env)
    #[arg(long)]
    update_window_duration: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enter kiosk mode: apply policies (if owner) and lock the task
    Lock,
    /// Leave kiosk mode: release the lock and clear policies (if owner)
    Unlock,
    /// Print the persisted mode and the simulated device state
    Status,
}

fn print_status(core: &KioskCore, device: &SimulatedDevice) {
    let state = device.state();

    println!("package: {}", core.package());
    println!("mode: {:?}", core.mode());
    println!(
        "pin: {}",
        match state.pin {
            Some(PinMode::Locked) => "locked",
            Some(PinMode::BestEffort) => "pinned (best effort)",
            None => "none",
        }
    );
    println!(
        "device owner: {}",
        state.device_owner.as_deref().unwrap_or("<none>")
    );
    println!("keyguard disabled: {}", state.keyguard_disabled);
    println!("status bar disabled: {}", state.status_bar_disabled);
    println!("restrictions: {:?}", state.restrictions);
    println!("lock-task packages: {:?}", state.lock_task_packages);
    println!(
        "persistent home: {}",
        state.persistent_home.as_deref().unwrap_or("<none>")
    );
    println!("global settings: {:?}", state.global_settings);
    match state.update_window {
        Some(w) => println!(
            "update window: {} min after midnight, {} min long",
            w.start_minute, w.duration_minutes
        ),
        None => println!("update window: platform default"),
    }
}

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting COSU kiosk controller");

    // Open the simulated device, persisted across invocations
    let device_state = match args.device_state {
        Some(path) => path,
        None => dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("cosu")
            .join("device.toml"),
    };
    let device = Arc::new(
        SimulatedDevice::with_snapshot(SELF_PACKAGE, &device_state)
            .context("Failed to open simulated device")?,
    );
    info!("Device state at {}", device_state.display());

    // Provisioning flags act like an external admin console
    if args.device_owner {
        device.provision_owner();
    }
    if args.allow_lock_task {
        device.permit_lock_task();
    }

    let store = Arc::new(FileModeStore::new(
        FileModeStore::default_path().context("Failed to resolve state path")?,
    ));
    info!("Mode state at {}", store.path().display());

    let notifier: Arc<dyn Notifier> = if args.desktop_notify {
        Arc::new(DesktopNotifier)
    } else {
        Arc::new(LogNotifier)
    };

    let mut core = KioskCore::new(
        SELF_PACKAGE,
        device.clone(),
        device.clone(),
        store,
        notifier,
    );

    // Update window precedence: CLI arg > env var > default
    let mut window = config::update_window_from_env();
    match args.update_window_start {
        Some(start) if (UPDATE_WINDOW_START_MIN..=UPDATE_WINDOW_START_MAX).contains(&start) => {
            window.start_minute = start;
        }
        Some(start) => {
            warn!(
                "Invalid --update-window-start value: {} (must be {}-{}). Using environment variable or default.",
                start, UPDATE_WINDOW_START_MIN, UPDATE_WINDOW_START_MAX
            );
        }
        None => {}
    }
    match args.update_window_duration {
        Some(duration)
            if (UPDATE_WINDOW_DURATION_MIN..=UPDATE_WINDOW_DURATION_MAX).contains(&duration) =>
        {
            window.duration_minutes = duration;
        }
        Some(duration) => {
            warn!(
                "Invalid --update-window-duration value: {} (must be {}-{}). Using environment variable or default.",
                duration, UPDATE_WINDOW_DURATION_MIN, UPDATE_WINDOW_DURATION_MAX
            );
        }
        None => {}
    }
    core.set_update_window(window);

    // Startup resume: a persisted locked mode re-enters kiosk state before
    // any command runs, the same way the app would after a reboot
    if core.resume().context("Failed to resume kiosk state")? {
        info!("Kiosk mode restored from persisted state");
    }

    match args.command {
        Command::Lock => {
            core.activate().context("Failed to enter kiosk mode")?;
            println!("Kiosk mode: LOCKED");
        }
        Command::Unlock => {
            core.deactivate().context("Failed to leave kiosk mode")?;
            println!("Kiosk mode: UNLOCKED");
        }
        Command::Status => print_status(&core, &device),
    }

    Ok(())
}
