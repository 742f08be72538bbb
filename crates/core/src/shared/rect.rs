/// Axis-aligned bounding box in integer pixel coordinates.
///
/// Stored as inclusive-min / exclusive-max corners, the same convention the
/// detectors use. Rectangles carry no identity: two boxes from different
/// frames are unrelated even when their coordinates match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        debug_assert!(
            min_x <= max_x && min_y <= max_y,
            "rect corners must satisfy min <= max"
        );
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Builds a rect from a top-left corner and a size, as detectors report them.
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width.max(0), y + height.max(0))
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }

    /// True when `inner` lies entirely within `self`. Shared edges count.
    pub fn contains(&self, inner: &Rect) -> bool {
        self.min_x <= inner.min_x
            && self.min_y <= inner.min_y
            && self.max_x >= inner.max_x
            && self.max_y >= inner.max_y
    }
}

/// Free-function form of [`Rect::contains`].
pub fn contains(outer: &Rect, inner: &Rect) -> bool {
    outer.contains(inner)
}
