use std::path::PathBuf;

use thiserror::Error;

/// Startup failure: a classifier or a parameter set could not be set up.
///
/// Fatal. The detection loop must not start when this is returned.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {class} parameters: {reason}")]
    InvalidParams { class: String, reason: String },
    #[error("presence timeout must be greater than zero")]
    ZeroTimeout,
    #[error("failed to load {class} classifier from {path}")]
    ClassifierLoad { class: String, path: PathBuf },
    #[error("classifier backend error for {class}: {message}")]
    Backend { class: String, message: String },
    #[error("cascade file {name} is unavailable: {source}")]
    Resolve {
        name: String,
        #[source]
        source: crate::detection::infrastructure::cascade_resolver::CascadeResolveError,
    },
    #[error("this build has no cascade detector; rebuild with the `opencv` feature")]
    DetectorUnavailable,
}

/// One frame's detection call failed. Recoverable: the frame is skipped.
#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("malformed frame {index}: {reason}")]
    MalformedFrame { index: usize, reason: String },
    #[error("{class} detector failed: {message}")]
    Backend { class: String, message: String },
}

/// An event could not be written to the log sink. Never retried.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to append to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode event record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("frame {index} has {channels} channels; overlay needs RGB")]
    UnsupportedFormat { index: usize, channels: u8 },
    #[error("failed to write snapshot to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to create snapshot directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("frame buffer does not match its dimensions")]
    Buffer,
}

/// Frame acquisition failure.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("frame source is not open")]
    NotOpen,
    #[error("no video stream in {0}")]
    NoVideoStream(String),
    #[error("capture device format {0} is not available")]
    DeviceFormat(String),
    #[error("ffmpeg error on {input}: {source}")]
    Ffmpeg {
        input: String,
        #[source]
        source: ffmpeg_next::Error,
    },
}
