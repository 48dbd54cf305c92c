use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};

/// Detections at or below this confidence never reach the tracker.
pub const MIN_CONFIDENCE: f32 = 0.5;

/// A single detector output: corners of the bbox in pixels, class and confidence
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BBox<Ltrb>,
    #[serde(rename = "p")]
    pub confidence: f32,
    #[serde(rename = "c")]
    pub class: i32,
}

impl Detection {
    #[inline]
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, class: i32, confidence: f32) -> Self {
        Self {
            bbox: BBox::ltrb(x1, y1, x2, y2),
            confidence,
            class,
        }
    }

    #[inline(always)]
    pub fn center(&self) -> na::Point2<f32> {
        self.bbox.center()
    }

    /// Drops everything the upstream detector is not confident about.
    pub fn filter_confident(dets: impl IntoIterator<Item = Detection>) -> Vec<Detection> {
        dets.into_iter()
            .filter(|d| d.confidence > MIN_CONFIDENCE)
            .collect()
    }
}
