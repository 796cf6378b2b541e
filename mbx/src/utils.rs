use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Conventional MobileSync backup root for the current user.
pub fn backup_root() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        Error::InputError("could not determine the home directory".to_string())
    })?;
    Ok(home
        .join("Library")
        .join("Application Support")
        .join("MobileSync")
        .join("Backup"))
}

/// Output folder on the desktop; created when absent, reused when present.
pub fn output_dir() -> Result<PathBuf> {
    let desktop = dirs::desktop_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
        .ok_or_else(|| {
            Error::InputError("could not determine the desktop directory".to_string())
        })?;
    let dir = desktop.join("iPhone_Backup_Decrypted");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

static IS_DEBUG: AtomicBool = AtomicBool::new(false);

pub fn initialize_debug_from_args(matches: &clap::ArgMatches) {
    IS_DEBUG.store(matches.is_present("debug"), Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    IS_DEBUG.load(Ordering::Relaxed)
}

#[macro_export]
macro_rules! debug_eprintln {
    ($($arg:tt)*) => {
        if $crate::utils::is_debug_enabled() {
            eprintln!($($arg)*);
        }
    };
}
