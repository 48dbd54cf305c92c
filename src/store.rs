use nalgebra as na;

use crate::bbox::{BBox, Ltrb};
use crate::track::TrackedObject;

#[derive(Debug)]
struct Entry {
    object: TrackedObject,
    disappeared: u32,
}

/// Live tracks in registration order, each with its miss counter.
///
/// Identities start at 1 and are never handed out twice, even after the
/// track they belonged to has been evicted.
#[derive(Debug)]
pub struct TrackStore {
    entries: Vec<Entry>,
    next_id: u32,
    max_disappeared: u32,
}

impl TrackStore {
    pub fn new(max_disappeared: u32) -> Self {
        Self {
            entries: Vec::with_capacity(64),
            next_id: 1,
            max_disappeared,
        }
    }

    pub fn register(&mut self, center: na::Point2<f32>, bbox: BBox<Ltrb>, class: i32) -> u32 {
        let id = self.next_id;
        self.next_id += 1;

        log::debug!(
            "register track {} (class {}) at ({}, {})",
            id,
            class,
            center.x,
            center.y
        );

        self.entries.push(Entry {
            object: TrackedObject {
                id,
                center,
                bbox,
                class,
            },
            disappeared: 0,
        });

        id
    }

    /// Moves the track at `idx` to a fresh sighting and clears its miss counter.
    pub fn refresh(&mut self, idx: usize, center: na::Point2<f32>, bbox: BBox<Ltrb>) {
        let entry = &mut self.entries[idx];
        entry.object.center = center;
        entry.object.bbox = bbox;
        entry.disappeared = 0;
    }

    #[inline]
    pub fn mark_missing(&mut self, idx: usize) {
        self.entries[idx].disappeared += 1;
    }

    #[inline]
    pub fn mark_all_missing(&mut self) {
        self.entries.iter_mut().for_each(|e| e.disappeared += 1);
    }

    /// Drops every track missed more than `max_disappeared` frames in a row.
    pub fn evict_expired(&mut self) -> Vec<u32> {
        let max = self.max_disappeared;
        let mut evicted = Vec::new();

        self.entries.retain(|e| {
            if e.disappeared > max {
                evicted.push(e.object.id);
                false
            } else {
                true
            }
        });

        for id in &evicted {
            log::debug!("evict track {} after {} missed frames", id, max + 1);
        }

        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn disappeared(&self, id: u32) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.object.id == id)
            .map(|e| e.disappeared)
    }

    pub fn centers(&self) -> Vec<na::Point2<f32>> {
        self.entries.iter().map(|e| e.object.center).collect()
    }

    pub fn objects(&self) -> Vec<TrackedObject> {
        self.entries.iter().map(|e| e.object.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BBox<Ltrb> {
        BBox::ltrb(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn ids_are_sequential() {
        let mut store = TrackStore::new(30);
        assert_eq!(store.register(na::Point2::new(5.0, 5.0), bbox(), 0), 1);
        assert_eq!(store.register(na::Point2::new(5.0, 5.0), bbox(), 0), 2);
        assert_eq!(store.next_id(), 3);
    }

    #[test]
    fn eviction_happens_past_the_limit() {
        let mut store = TrackStore::new(2);
        store.register(na::Point2::new(5.0, 5.0), bbox(), 0);

        store.mark_all_missing();
        store.mark_all_missing();
        assert!(store.evict_expired().is_empty());
        assert_eq!(store.disappeared(1), Some(2));

        store.mark_all_missing();
        assert_eq!(store.evict_expired(), vec![1]);
        assert!(store.is_empty());
        assert_eq!(store.disappeared(1), None);
    }

    #[test]
    fn refresh_resets_counter() {
        let mut store = TrackStore::new(2);
        store.register(na::Point2::new(5.0, 5.0), bbox(), 0);
        store.mark_missing(0);
        store.refresh(0, na::Point2::new(7.0, 5.0), BBox::ltrb(2.0, 0.0, 12.0, 10.0));

        assert_eq!(store.disappeared(1), Some(0));
        assert_eq!(store.centers(), vec![na::Point2::new(7.0, 5.0)]);
    }

    #[test]
    fn ids_survive_eviction_without_reuse() {
        let mut store = TrackStore::new(0);
        store.register(na::Point2::new(5.0, 5.0), bbox(), 0);
        store.mark_all_missing();
        store.evict_expired();

        assert_eq!(store.register(na::Point2::new(5.0, 5.0), bbox(), 0), 2);
        assert_eq!(store.objects().len(), 1);
    }
}
