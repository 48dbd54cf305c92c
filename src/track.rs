use nalgebra as na;
use serde_derive::Serialize;

use crate::bbox::{BBox, Ltrb};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedObject {
    pub id: u32,

    // whole-pixel bbox midpoint
    pub center: na::Point2<f32>,
    pub bbox: BBox<Ltrb>,
    pub class: i32,
}
