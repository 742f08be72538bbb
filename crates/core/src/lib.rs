//! Face and eye detection on a doorway camera, with debounced presence
//! tracking.
//!
//! Each bounded context keeps its traits and pure logic under `domain/` and
//! its adapters (OpenCV, ffmpeg, files) under `infrastructure/`.

pub mod detection;
pub mod overlay;
pub mod pipeline;
pub mod presence;
pub mod shared;
pub mod video;
