use nalgebra as na;
use std::collections::HashMap;

use crate::math;
use crate::track::TrackedObject;

/// Last known state of one identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRecord {
    pub position: na::Point2<f32>,

    // px per frame, only known once the identity was seen twice
    pub speed: Option<f32>,
}

/// Per-identity motion cache, keyed by track id.
///
/// Records outlive their tracks: a lookup for an identity that has no record
/// simply yields nothing, and callers skip whatever depended on it.
#[derive(Debug, Default)]
pub struct MotionHistory {
    records: HashMap<u32, MotionRecord>,
}

impl MotionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&MotionRecord> {
        self.records.get(&id)
    }

    /// Distance travelled since the last recorded position.
    #[inline]
    pub fn displacement(&self, id: u32, pos: &na::Point2<f32>) -> Option<f32> {
        self.records
            .get(&id)
            .map(|rec| math::distance(&rec.position, pos))
    }

    /// Stores a new speed and returns the one it replaced.
    pub fn replace_speed(&mut self, id: u32, speed: f32) -> Option<f32> {
        let rec = self.records.get_mut(&id)?;

        rec.speed.replace(speed)
    }

    /// Records the current position of every object, keeping known speeds.
    pub fn observe(&mut self, objects: &[TrackedObject]) {
        for obj in objects {
            self.records
                .entry(obj.id)
                .and_modify(|rec| rec.position = obj.center)
                .or_insert(MotionRecord {
                    position: obj.center,
                    speed: None,
                });
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
