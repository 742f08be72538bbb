use ndarray::{Array2, ArrayView3, ArrayViewMut3, Axis};

use crate::shared::error::DetectorError;

/// A single captured frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at the capture boundary; detectors and the
/// overlay read the pixels through the ndarray views.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Capture devices hand back empty frames while warming up.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Checks the buffer is something a detector can consume.
    pub fn validate(&self) -> Result<(), DetectorError> {
        if self.is_empty() {
            return Err(self.malformed("frame has no pixels"));
        }
        if self.channels != 1 && self.channels != 3 {
            return Err(self.malformed(&format!("unsupported channel count {}", self.channels)));
        }
        if self.data.len() != self.shape_len() {
            return Err(self.malformed(&format!(
                "buffer holds {} bytes, expected {}",
                self.data.len(),
                self.shape_len()
            )));
        }
        Ok(())
    }

    pub fn as_ndarray(&self) -> Option<ArrayView3<'_, u8>> {
        ArrayView3::from_shape(self.shape(), &self.data).ok()
    }

    pub fn as_ndarray_mut(&mut self) -> Option<ArrayViewMut3<'_, u8>> {
        let shape = self.shape();
        ArrayViewMut3::from_shape(shape, &mut self.data).ok()
    }

    /// Grayscale copy using BT.601 luma weights, shaped (height, width).
    ///
    /// Single-channel frames are copied through unchanged.
    pub fn luma(&self) -> Result<Array2<u8>, DetectorError> {
        self.validate()?;
        let view = self
            .as_ndarray()
            .ok_or_else(|| self.malformed("buffer does not match dimensions"))?;
        if self.channels == 1 {
            return Ok(view.index_axis(Axis(2), 0).to_owned());
        }
        Ok(view.map_axis(Axis(2), |px| {
            let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
            y.round().clamp(0.0, 255.0) as u8
        }))
    }

    fn malformed(&self, reason: &str) -> DetectorError {
        DetectorError::MalformedFrame {
            index: self.index,
            reason: reason.to_string(),
        }
    }

    fn shape_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * (self.channels as usize)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
