use std::time::Duration;

pub const FRONTAL_FACE_CASCADE: &str = "haarcascade_frontalface_default.xml";
pub const PROFILE_FACE_CASCADE: &str = "haarcascade_profileface.xml";
pub const EYE_CASCADE: &str = "haarcascade_eye.xml";

/// Upstream location of the stock Haar cascades.
pub const CASCADE_BASE_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades";

pub const DEFAULT_CASCADE_DIR: &str = "data";
pub const DEFAULT_EVENT_LOG: &str = "log.txt";

/// How long faces must be missing before an absence is confirmed.
pub const DEFAULT_PRESENCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Overlay colors (RGB).
pub const FACE_COLOR: [u8; 3] = [0, 255, 0];
pub const EYE_COLOR: [u8; 3] = [255, 0, 0];
pub const OVERLAY_THICKNESS: u32 = 3;
