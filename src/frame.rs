use image::RgbImage;

use crate::detection::Detection;
use crate::error::{Error, Result};

/// One video frame together with everything the detector found in it.
pub struct Frame {
    pub image: RgbImage,
    pub detections: Vec<Detection>,
}

impl Frame {
    #[inline]
    pub fn new(image: RgbImage, detections: Vec<Detection>) -> Self {
        Self { image, detections }
    }

    #[inline]
    pub fn dims(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// A frame without pixels is an upstream contract violation.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.dims();
        if width == 0 || height == 0 {
            return Err(Error::InvalidFrame { width, height });
        }

        Ok(())
    }
}
