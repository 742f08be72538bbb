use crate::shared::error::SourceError;
use crate::shared::frame::Frame;
use crate::shared::stream_info::StreamInfo;

/// Produces frames from a camera or a recording.
///
/// Implementations handle capture and decode details while the detection
/// loop works with the abstract `Frame` and `StreamInfo` types.
pub trait FrameSource: Send {
    /// Opens the source and returns its stream properties.
    fn open(&mut self) -> Result<StreamInfo, SourceError>;

    /// Returns an iterator over frames in capture order.
    ///
    /// Live sources never end on their own; the iterator yields an error
    /// if the device stops delivering.
    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_>;

    /// Releases the device or file handle.
    fn close(&mut self);
}
