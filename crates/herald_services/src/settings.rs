//! Settings management

use herald_core::{Bindings, ChannelKind, Emitter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub output: OutputSettings,
    pub script: Bindings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub channel: ChannelKind,
    /// Capture buffer size in bytes; output goes to the channel when unset.
    pub capture_capacity: Option<usize>,
}

impl OutputSettings {
    /// The emitter for the configured channel, bound to this process.
    pub fn emitter(&self) -> Box<dyn Emitter> {
        self.channel.emitter()
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.output.channel, ChannelKind::Posix);
        assert_eq!(settings.output.capture_capacity, None);
        assert_eq!(settings.script, Bindings::default());
        assert_eq!(Settings::from_json("{}").unwrap(), settings);
    }

    #[test]
    fn test_partial_file() {
        let settings = Settings::from_json(
            r#"{ "output": { "channel": "web", "capture_capacity": 1024 },
                 "script": { "trace_global": "TRACE_LINE" } }"#,
        )
        .unwrap();
        assert_eq!(settings.output.channel, ChannelKind::Web);
        assert_eq!(settings.output.capture_capacity, Some(1024));
        assert_eq!(settings.script.trace_global, "TRACE_LINE");
        assert_eq!(settings.script.conversion_hook, "String");
        assert_eq!(settings.output.emitter().kind(), ChannelKind::Web);
    }

    #[test]
    fn test_rejects_unknown_channel() {
        let result = Settings::from_json(r#"{ "output": { "channel": "serial" } }"#);
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "output": {{ "channel": "embedded" }} }}"#).unwrap();
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.output.channel, ChannelKind::Embedded);

        let missing = Settings::load(Path::new("/nonexistent/herald.json"));
        assert!(matches!(missing, Err(SettingsError::Read { .. })));
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = Settings::default();
        settings.output.capture_capacity = Some(64);
        let text = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&text).unwrap(), settings);
    }
}
