use std::path::{Path, PathBuf};

use crate::detection::domain::detection_set::DetectionSet;
use crate::overlay::domain::box_painter::annotate;
use crate::overlay::domain::frame_renderer::FrameRenderer;
use crate::shared::error::RenderError;
use crate::shared::frame::Frame;

/// Writes the annotated frame to an image file every `every` frames.
///
/// The same path is overwritten each time, so the file always shows the
/// most recent view of the doorway. The format follows the extension.
pub struct SnapshotRenderer {
    path: PathBuf,
    every: usize,
    written: usize,
}

impl SnapshotRenderer {
    pub fn new(path: impl Into<PathBuf>, every: usize) -> Self {
        Self {
            path: path.into(),
            every: every.max(1),
            written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }

    fn write(&self, frame: &Frame) -> Result<(), RenderError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| RenderError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or(RenderError::Buffer)?;
        img.save(&self.path).map_err(|source| RenderError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl FrameRenderer for SnapshotRenderer {
    fn render(&mut self, frame: &Frame, detections: &DetectionSet) -> Result<(), RenderError> {
        if frame.index() % self.every != 0 {
            return Ok(());
        }
        let annotated = annotate(frame, detections)?;
        self.write(&annotated)?;
        self.written += 1;
        log::trace!("Snapshot of frame {} written to {}", frame.index(), self.path.display());
        Ok(())
    }
}
