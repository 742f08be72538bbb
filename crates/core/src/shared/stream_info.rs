/// Properties of an opened frame source.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    /// Nominal frame rate; 0.0 when the source does not report one.
    pub fps: f64,
    pub codec: String,
    /// Device path or file path the stream was opened from.
    pub source: String,
    /// Capture devices are live; files have a fixed length.
    pub live: bool,
}

impl StreamInfo {
    /// Duration of one frame at the nominal rate, if the rate is known.
    pub fn frame_interval(&self) -> Option<std::time::Duration> {
        (self.fps > 0.0).then(|| std::time::Duration::from_secs_f64(1.0 / self.fps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn info(fps: f64, live: bool) -> StreamInfo {
        StreamInfo {
            width: 640,
            height: 480,
            fps,
            codec: "rawvideo".to_string(),
            source: "/dev/video0".to_string(),
            live,
        }
    }

    #[test]
    fn test_frame_interval_from_fps() {
        let interval = info(25.0, true).frame_interval().unwrap();
        assert_relative_eq!(interval.as_secs_f64(), 0.04);
    }

    #[test]
    fn test_frame_interval_unknown_rate() {
        assert!(info(0.0, false).frame_interval().is_none());
    }
}
