use crate::detection::domain::detection_set::DetectionSet;
use crate::shared::error::RenderError;
use crate::shared::frame::Frame;

/// Consumes each processed frame together with what was found in it.
///
/// Rendering is best-effort; the detection loop logs failures and keeps
/// going.
pub trait FrameRenderer: Send {
    fn render(&mut self, frame: &Frame, detections: &DetectionSet) -> Result<(), RenderError>;
}

/// Renderer that draws nothing.
pub struct NullFrameRenderer;

impl FrameRenderer for NullFrameRenderer {
    fn render(&mut self, _frame: &Frame, _detections: &DetectionSet) -> Result<(), RenderError> {
        Ok(())
    }
}
