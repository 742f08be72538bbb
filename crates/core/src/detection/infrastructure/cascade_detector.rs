use std::path::Path;

use opencv::core::{Mat, Rect as CvRect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;

use crate::detection::domain::detection_params::{BoxSize, DetectionParams};
use crate::detection::domain::feature_detector::{FeatureClass, FeatureDetector};
use crate::shared::error::{ConfigError, DetectorError};
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Viola-Jones detector backed by an OpenCV `CascadeClassifier`.
///
/// The classifier handle is released when this value is dropped, so a bank
/// that fails halfway through loading frees whatever it already loaded.
pub struct CascadeDetector {
    class: FeatureClass,
    classifier: CascadeClassifier,
    hits: Vector<CvRect>,
}

impl CascadeDetector {
    pub fn load(class: FeatureClass, path: &Path) -> Result<Self, ConfigError> {
        let load_err = || ConfigError::ClassifierLoad {
            class: class.name().to_string(),
            path: path.to_path_buf(),
        };
        let path_str = path.to_str().ok_or_else(load_err)?;
        let classifier = CascadeClassifier::new(path_str).map_err(|e| ConfigError::Backend {
            class: class.name().to_string(),
            message: e.to_string(),
        })?;
        // OpenCV reports a bad file as an empty classifier, not an error.
        if classifier.empty().unwrap_or(true) {
            return Err(load_err());
        }
        log::debug!("Loaded {class} cascade from {}", path.display());
        Ok(Self {
            class,
            classifier,
            hits: Vector::new(),
        })
    }

    fn backend_err(&self, e: opencv::Error) -> DetectorError {
        DetectorError::Backend {
            class: self.class.name().to_string(),
            message: e.to_string(),
        }
    }

    /// Grayscale, histogram-equalized copy of the frame.
    fn prepare(&self, frame: &Frame) -> Result<Mat, DetectorError> {
        let gray = frame.luma()?;
        let pixels = gray.as_slice().ok_or_else(|| DetectorError::MalformedFrame {
            index: frame.index(),
            reason: "grayscale buffer is not contiguous".to_string(),
        })?;
        let borrowed =
            Mat::new_rows_cols_with_data(frame.height() as i32, frame.width() as i32, pixels)
                .map_err(|e| self.backend_err(e))?;
        let mut equalized = Mat::default();
        opencv::imgproc::equalize_hist(&*borrowed, &mut equalized)
            .map_err(|e| self.backend_err(e))?;
        Ok(equalized)
    }
}

impl FeatureDetector for CascadeDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        params: &DetectionParams,
    ) -> Result<Vec<Rect>, DetectorError> {
        let image = self.prepare(frame)?;
        self.hits.clear();
        let result = self.classifier.detect_multi_scale(
            &image,
            &mut self.hits,
            params.scale_factor,
            params.min_neighbors as i32,
            params.flags,
            to_cv_size(Some(params.min_size)),
            to_cv_size(params.max_size),
        );
        result.map_err(|e| self.backend_err(e))?;

        Ok(self
            .hits
            .iter()
            .map(|r| Rect::from_xywh(r.x, r.y, r.width, r.height))
            .collect())
    }
}

/// OpenCV treats a zero size as "no limit".
fn to_cv_size(size: Option<BoxSize>) -> Size {
    size.map(|s| Size::new(s.width as i32, s.height as i32))
        .unwrap_or_default()
}
