//! Herald Services Layer
//!
//! Host-side configuration: which channel the guest writes to, whether its
//! output is captured, and which guest globals are involved.

pub mod settings;

pub use settings::{OutputSettings, Settings, SettingsError};

use std::path::Path;

/// Load settings from `path`, or fall back to defaults when none is given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    match path {
        Some(path) => {
            let settings = Settings::load(path)?;
            tracing::debug!(path = %path.display(), "settings loaded");
            Ok(settings)
        }
        None => {
            tracing::debug!("no settings file, using defaults");
            Ok(Settings::default())
        }
    }
}
