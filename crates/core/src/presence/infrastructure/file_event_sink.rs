use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::presence::domain::event_sink::EventSink;
use crate::presence::domain::presence_tracker::PresenceEvent;
use crate::shared::clock::Timestamp;
use crate::shared::error::SinkError;

/// Line format of the event log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One human-readable sentence per event.
    #[default]
    Text,
    /// One JSON object per line.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "jsonl" => Ok(LogFormat::Jsonl),
            other => Err(format!("log format must be 'text' or 'jsonl', got '{other}'")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct EventRecord {
    event: String,
    wall_time: String,
    monotonic_ms: u64,
}

/// Appends one line per presence event to a file.
///
/// The file is opened in append mode for every record and closed right
/// after, so external rotation or deletion never wedges the sink.
pub struct FileEventSink {
    path: PathBuf,
    format: LogFormat,
    timeout: Duration,
}

impl FileEventSink {
    /// `timeout` is only used to phrase absence lines.
    pub fn new(path: impl Into<PathBuf>, format: LogFormat, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            format,
            timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format_line(
        &self,
        event: PresenceEvent,
        at: Timestamp,
        wall: DateTime<Local>,
    ) -> Result<String, SinkError> {
        match self.format {
            LogFormat::Text => {
                // Matches Go's time.Stamp layout: "Jan _2 15:04:05".
                let stamp = wall.format("%b %e %H:%M:%S");
                Ok(match event {
                    PresenceEvent::PresenceRegained => {
                        format!("Face Detected in Doorway; Time: {stamp}")
                    }
                    PresenceEvent::AbsenceConfirmed => format!(
                        "Face absent from Doorway for {}s; Time: {stamp}",
                        self.timeout.as_secs()
                    ),
                })
            }
            LogFormat::Jsonl => {
                let record = EventRecord {
                    event: event.name().to_string(),
                    wall_time: wall.to_rfc3339_opts(SecondsFormat::Millis, false),
                    monotonic_ms: at.as_duration().as_millis() as u64,
                };
                Ok(serde_json::to_string(&record)?)
            }
        }
    }

    fn append(&self, line: &str) -> Result<(), SinkError> {
        let io_err = |source: std::io::Error| SinkError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        writeln!(file, "{line}").map_err(io_err)?;
        Ok(())
    }
}

impl EventSink for FileEventSink {
    fn record(&mut self, event: PresenceEvent, at: Timestamp) -> Result<(), SinkError> {
        let line = self.format_line(event, at, Local::now())?;
        self.append(&line)?;
        log::debug!("Recorded {event} to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn wall() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap()
    }

    fn sink(dir: &TempDir, format: LogFormat) -> FileEventSink {
        FileEventSink::new(dir.path().join("log.txt"), format, Duration::from_secs(30))
    }

    #[test]
    fn test_text_line_for_regained() {
        let dir = TempDir::new().unwrap();
        let line = sink(&dir, LogFormat::Text)
            .format_line(PresenceEvent::PresenceRegained, Timestamp::ZERO, wall())
            .unwrap();
        assert_eq!(line, "Face Detected in Doorway; Time: Mar  7 09:05:02");
    }

    #[test]
    fn test_text_line_for_absence_mentions_timeout() {
        let dir = TempDir::new().unwrap();
        let line = sink(&dir, LogFormat::Text)
            .format_line(PresenceEvent::AbsenceConfirmed, Timestamp::ZERO, wall())
            .unwrap();
        assert!(line.starts_with("Face absent from Doorway for 30s; Time: "));
    }

    #[test]
    fn test_jsonl_line_fields() {
        let dir = TempDir::new().unwrap();
        let line = sink(&dir, LogFormat::Jsonl)
            .format_line(
                PresenceEvent::AbsenceConfirmed,
                Timestamp::from_millis(31_250),
                wall(),
            )
            .unwrap();
        let record: EventRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(record.event, "absence_confirmed");
        assert_eq!(record.monotonic_ms, 31_250);
        assert!(record.wall_time.starts_with("2024-03-07T09:05:02.000"));
    }

    #[test]
    fn test_record_appends_lines() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir, LogFormat::Text);
        s.record(PresenceEvent::AbsenceConfirmed, Timestamp::from_secs(30))
            .unwrap();
        s.record(PresenceEvent::PresenceRegained, Timestamp::from_secs(40))
            .unwrap();

        let contents = fs::read_to_string(s.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Face absent"));
        assert!(lines[1].starts_with("Face Detected in Doorway"));
    }

    #[test]
    fn test_record_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "earlier line\n").unwrap();
        let mut s = FileEventSink::new(&path, LogFormat::Text, Duration::from_secs(30));
        s.record(PresenceEvent::PresenceRegained, Timestamp::ZERO)
            .unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("earlier line\n"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_record_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("door").join("events.jsonl");
        let mut s = FileEventSink::new(&path, LogFormat::Jsonl, Duration::from_secs(30));
        s.record(PresenceEvent::PresenceRegained, Timestamp::ZERO)
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unwritable_path_is_sink_error() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        let mut s = FileEventSink::new(dir.path(), LogFormat::Text, Duration::from_secs(30));
        let err = s
            .record(PresenceEvent::PresenceRegained, Timestamp::ZERO)
            .unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert_eq!("jsonl".parse::<LogFormat>(), Ok(LogFormat::Jsonl));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
