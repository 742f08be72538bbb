use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use doorwatch_core::detection::domain::detection_params::DetectionParams;
use doorwatch_core::presence::infrastructure::file_event_sink::LogFormat;
use doorwatch_core::shared::constants::{DEFAULT_EVENT_LOG, DEFAULT_PRESENCE_TIMEOUT};

/// Persisted watch configuration. Every field falls back to its default
/// when missing from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    /// Directory searched for cascade XML files before the user cache.
    pub cascade_dir: Option<PathBuf>,
    pub log_path: PathBuf,
    pub log_format: LogFormat,
    pub timeout_secs: u64,
    pub faces: DetectionParams,
    pub eyes: DetectionParams,
    pub snapshot: Option<PathBuf>,
    pub snapshot_every: usize,
    /// Never download missing cascades.
    pub offline: bool,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            cascade_dir: None,
            log_path: PathBuf::from(DEFAULT_EVENT_LOG),
            log_format: LogFormat::Text,
            timeout_secs: DEFAULT_PRESENCE_TIMEOUT.as_secs(),
            faces: DetectionParams::faces(),
            eyes: DetectionParams::eyes(),
            snapshot: None,
            snapshot_every: 30,
            offline: false,
        }
    }
}

impl WatchSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Doorwatch").join("settings.json"))
    }

    /// Missing or unreadable files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid settings in {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorwatch_core::detection::domain::detection_params::BoxSize;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_doorway_setup() {
        let s = WatchSettings::default();
        assert_eq!(s.timeout_secs, 30);
        assert_eq!(s.log_path, PathBuf::from("log.txt"));
        assert_eq!(s.faces.min_neighbors, 4);
        assert_eq!(s.eyes.max_size, Some(BoxSize::new(90, 70)));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let s = WatchSettings::load_from(&dir.path().join("absent.json"));
        assert_eq!(s, WatchSettings::default());
    }

    #[test]
    fn test_invalid_json_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(WatchSettings::load_from(&path), WatchSettings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"timeout_secs": 45, "log_format": "jsonl"}"#).unwrap();
        let s = WatchSettings::load_from(&path);
        assert_eq!(s.timeout_secs, 45);
        assert_eq!(s.log_format, LogFormat::Jsonl);
        assert_eq!(s.faces, DetectionParams::faces());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut s = WatchSettings::default();
        s.snapshot = Some(PathBuf::from("door.png"));
        s.eyes.min_neighbors = 9;
        s.save_to(&path).unwrap();
        assert_eq!(WatchSettings::load_from(&path), s);
    }
}
