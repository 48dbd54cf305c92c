use ndarray::Array2;

use crate::assignment::{Assignment, GreedyAssignment};
use crate::config::TrackerConfig;
use crate::math;
use crate::store::TrackStore;
use crate::track::TrackedObject;
use crate::Detection;

/// Frame-to-frame centroid tracker.
///
/// Matching only looks at centroid distance; classes are carried along but
/// never compared. The pairing rule is pluggable through [`Assignment`].
#[derive(Debug)]
pub struct CentroidTracker {
    store: TrackStore,
    max_distance: f32,
    assignment: Box<dyn Assignment>,
}

impl CentroidTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self::with_assignment(config, Box::new(GreedyAssignment))
    }

    pub fn with_assignment(config: &TrackerConfig, assignment: Box<dyn Assignment>) -> Self {
        Self {
            store: TrackStore::new(config.max_disappeared),
            max_distance: config.max_distance,
            assignment,
        }
    }

    /// Feeds one frame worth of detections, returns every live track.
    pub fn update(&mut self, dets: &[Detection]) -> Vec<TrackedObject> {
        if dets.is_empty() {
            self.store.mark_all_missing();
            self.store.evict_expired();

            return self.store.objects();
        }

        let centers: Vec<_> = dets.iter().map(Detection::center).collect();

        if self.store.is_empty() {
            for (det, center) in dets.iter().zip(&centers) {
                self.store.register(*center, det.bbox, det.class);
            }

            return self.store.objects();
        }

        let tracked = self.store.centers();
        let cost = Array2::from_shape_fn((tracked.len(), centers.len()), |(r, c)| {
            math::distance(&tracked[r], &centers[c])
        });

        let mut used_rows = vec![false; tracked.len()];
        let mut used_cols = vec![false; centers.len()];

        for (row, col) in self.assignment.assign(cost.view(), self.max_distance) {
            self.store.refresh(row, centers[col], dets[col].bbox);
            used_rows[row] = true;
            used_cols[col] = true;
        }

        for (row, _) in used_rows.iter().enumerate().filter(|(_, used)| !**used) {
            self.store.mark_missing(row);
        }

        self.store.evict_expired();

        for (col, det) in dets.iter().enumerate() {
            if !used_cols[col] {
                self.store.register(centers[col], det.bbox, det.class);
            }
        }

        self.store.objects()
    }

    #[inline]
    pub fn tracks(&self) -> Vec<TrackedObject> {
        self.store.objects()
    }

    #[inline]
    pub fn store(&self) -> &TrackStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::MunkresAssignment;
    use nalgebra as na;

    fn det_at(cx: f32, cy: f32, class: i32) -> Detection {
        Detection::new(cx - 10.0, cy - 20.0, cx + 10.0, cy + 20.0, class, 0.9)
    }

    fn ids(tracks: &[TrackedObject]) -> Vec<u32> {
        tracks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn registers_every_detection_on_empty_store() {
        let mut tracker = CentroidTracker::new(&TrackerConfig::default());
        let tracks = tracker.update(&[det_at(100.0, 100.0, 0), det_at(150.0, 100.0, 0)]);

        assert_eq!(ids(&tracks), vec![1, 2]);
        assert_eq!(tracks[1].center, na::Point2::new(150.0, 100.0));
    }

    #[test]
    fn keeps_identity_while_moving_slowly() {
        let mut tracker = CentroidTracker::new(&TrackerConfig::default());
        tracker.update(&[det_at(100.0, 100.0, 0), det_at(400.0, 300.0, 2)]);

        for step in 1..10 {
            let x = step as f32 * 30.0;
            let tracks = tracker.update(&[det_at(400.0 - x, 300.0, 2), det_at(100.0 + x, 100.0, 0)]);
            assert_eq!(ids(&tracks), vec![1, 2]);
            assert_eq!(tracks[0].center.x, 100.0 + x);
        }
    }

    #[test]
    fn jump_over_threshold_registers_new_identity() {
        let mut tracker = CentroidTracker::new(&TrackerConfig::default());
        tracker.update(&[det_at(100.0, 100.0, 0)]);
        let tracks = tracker.update(&[det_at(250.0, 100.0, 0)]);

        assert_eq!(ids(&tracks), vec![1, 2]);
        assert_eq!(tracker.store().disappeared(1), Some(1));
        assert_eq!(tracker.store().disappeared(2), Some(0));
    }

    #[test]
    fn match_at_exact_threshold() {
        let mut tracker = CentroidTracker::new(&TrackerConfig::default());
        tracker.update(&[det_at(100.0, 100.0, 0)]);
        let tracks = tracker.update(&[det_at(200.0, 100.0, 0)]);

        assert_eq!(ids(&tracks), vec![1]);
    }

    #[test]
    fn class_does_not_affect_matching() {
        let mut tracker = CentroidTracker::new(&TrackerConfig::default());
        tracker.update(&[det_at(100.0, 100.0, 0)]);
        let tracks = tracker.update(&[det_at(110.0, 100.0, 7)]);

        assert_eq!(ids(&tracks), vec![1]);
        assert_eq!(tracks[0].class, 0);
    }

    #[test]
    fn evicted_after_max_disappeared_plus_one_misses() {
        let config = TrackerConfig {
            max_disappeared: 5,
            ..Default::default()
        };
        let mut tracker = CentroidTracker::new(&config);
        tracker.update(&[det_at(100.0, 100.0, 0)]);

        for _ in 0..5 {
            assert_eq!(tracker.update(&[]).len(), 1);
        }

        assert!(tracker.update(&[]).is_empty());

        let tracks = tracker.update(&[det_at(100.0, 100.0, 0)]);
        assert_eq!(ids(&tracks), vec![2]);
    }

    #[test]
    fn unmatched_rows_age_while_others_match() {
        let config = TrackerConfig {
            max_disappeared: 1,
            ..Default::default()
        };
        let mut tracker = CentroidTracker::new(&config);
        tracker.update(&[det_at(100.0, 100.0, 0), det_at(500.0, 100.0, 0)]);

        tracker.update(&[det_at(105.0, 100.0, 0)]);
        let tracks = tracker.update(&[det_at(110.0, 100.0, 0)]);

        assert_eq!(ids(&tracks), vec![1]);
    }

    #[test]
    fn greedy_contention_leaves_row_unmatched() {
        let mut tracker = CentroidTracker::new(&TrackerConfig::default());
        tracker.update(&[det_at(100.0, 100.0, 0), det_at(160.0, 100.0, 0)]);

        // both tracks are nearest to the single detection at 150; track 2 is
        // closer, wins it, track 1 is left unmatched
        let tracks = tracker.update(&[det_at(150.0, 100.0, 0), det_at(40.0, 100.0, 0)]);

        assert_eq!(ids(&tracks), vec![1, 2, 3]);
        assert_eq!(tracks[1].center.x, 150.0);
        assert_eq!(tracks[2].center.x, 40.0);
        assert_eq!(tracker.store().disappeared(1), Some(1));
    }

    #[test]
    fn munkres_strategy_resolves_contention() {
        let mut tracker = CentroidTracker::with_assignment(
            &TrackerConfig::default(),
            Box::new(MunkresAssignment),
        );
        tracker.update(&[det_at(100.0, 100.0, 0), det_at(160.0, 100.0, 0)]);
        let tracks = tracker.update(&[det_at(150.0, 100.0, 0), det_at(40.0, 100.0, 0)]);

        assert_eq!(ids(&tracks), vec![1, 2]);
        assert_eq!(tracks[0].center.x, 40.0);
        assert_eq!(tracks[1].center.x, 150.0);
    }
}
