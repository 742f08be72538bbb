use ndarray::{aview1, s, ArrayViewMut3};

use crate::detection::domain::detection_set::DetectionSet;
use crate::shared::constants::{EYE_COLOR, FACE_COLOR, OVERLAY_THICKNESS};
use crate::shared::error::RenderError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Draws face outlines in green and valid-eye outlines in red.
///
/// Eyes are painted last so they stay visible where they overlap a face
/// edge. Boxes that run past the frame are clipped.
pub fn paint_detections(frame: &mut Frame, detections: &DetectionSet) -> Result<(), RenderError> {
    if frame.channels() != 3 {
        return Err(RenderError::UnsupportedFormat {
            index: frame.index(),
            channels: frame.channels(),
        });
    }
    let mut view = frame.as_ndarray_mut().ok_or(RenderError::Buffer)?;

    for face in detections.faces() {
        outline(&mut view, face, FACE_COLOR, OVERLAY_THICKNESS);
    }
    for eye in detections.valid_eyes() {
        outline(&mut view, eye, EYE_COLOR, OVERLAY_THICKNESS);
    }
    Ok(())
}

/// Returns an annotated copy, leaving `frame` untouched.
pub fn annotate(frame: &Frame, detections: &DetectionSet) -> Result<Frame, RenderError> {
    let mut copy = frame.clone();
    paint_detections(&mut copy, detections)?;
    Ok(copy)
}

fn outline(view: &mut ArrayViewMut3<'_, u8>, rect: &Rect, color: [u8; 3], thickness: u32) {
    let t = thickness as i32;
    let bands = [
        (rect.min_x, rect.min_y, rect.max_x, rect.min_y + t),
        (rect.min_x, rect.max_y - t, rect.max_x, rect.max_y),
        (rect.min_x, rect.min_y, rect.min_x + t, rect.max_y),
        (rect.max_x - t, rect.min_y, rect.max_x, rect.max_y),
    ];
    for (x0, y0, x1, y1) in bands {
        // Bands never extend outside the box itself.
        let band = Rect {
            min_x: x0.max(rect.min_x),
            min_y: y0.max(rect.min_y),
            max_x: x1.min(rect.max_x),
            max_y: y1.min(rect.max_y),
        };
        fill(view, &band, color);
    }
}

fn fill(view: &mut ArrayViewMut3<'_, u8>, rect: &Rect, color: [u8; 3]) {
    let (height, width, _) = view.dim();
    let clip = |v: i32, max: usize| v.clamp(0, max as i32) as usize;
    let (x0, x1) = (clip(rect.min_x, width), clip(rect.max_x, width));
    let (y0, y1) = (clip(rect.min_y, height), clip(rect.max_y, height));
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    let color = aview1(&color);
    for mut px in view.slice_mut(s![y0..y1, x0..x1, ..]).rows_mut() {
        px.assign(&color);
    }
}
