//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fs;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Describe the host platform the executive is running on.
///
/// The kernel identity is read from procfs where available (the usual case
/// on the car's single-board computer); otherwise the compile-time target
/// is reported.
pub fn get_uname() -> String {
    let kernel = fs::read_to_string("/proc/sys/kernel/ostype")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| std::env::consts::OS.to_string());
    let release = fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    if release.is_empty() {
        format!("{} ({})", kernel, std::env::consts::ARCH)
    } else {
        format!("{} {} ({})", kernel, release, std::env::consts::ARCH)
    }
}

/// Root of the ArtCar software tree.
///
/// `ARTCAR_SW_ROOT` when set, otherwise the current directory. The
/// executive loads its parameter files from the current directory anyway,
/// so an unconfigured checkout keeps its sessions and preferences next to
/// its TOML files rather than refusing to start.
pub fn get_artcar_sw_root() -> PathBuf {
    match std::env::var("ARTCAR_SW_ROOT") {
        Ok(s) => s.into(),
        Err(_) => PathBuf::from("."),
    }
}
