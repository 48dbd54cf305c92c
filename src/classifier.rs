use image::RgbImage;
use nalgebra as na;

use crate::behavior::{BehaviorEvent, BehaviorKind, Severity};
use crate::config::ClassifierConfig;
use crate::fire;
use crate::math;
use crate::motion::MotionHistory;
use crate::track::TrackedObject;

#[inline]
fn pixel(p: &na::Point2<f32>) -> na::Point2<i32> {
    na::Point2::new(p.x as i32, p.y as i32)
}

/// Heuristic safety classifier over tracked objects and raw frame pixels.
///
/// Runs every detector on every frame and returns their candidates in a
/// fixed order: altercation, fire, fall, crowd. The only state it keeps is
/// the motion history, which is refreshed after all detectors ran, so every
/// detector sees positions from the previous frame.
#[derive(Debug)]
pub struct BehaviorClassifier {
    config: ClassifierConfig,
    motion: MotionHistory,
}

impl BehaviorClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            motion: MotionHistory::new(),
        }
    }

    pub fn classify(&mut self, objects: &[TrackedObject], image: &RgbImage) -> Vec<BehaviorEvent> {
        let persons: Vec<_> = objects
            .iter()
            .filter(|o| o.class == self.config.person_class)
            .collect();

        let vehicles: Vec<_> = objects
            .iter()
            .filter(|o| self.config.vehicle_classes.contains(&o.class))
            .collect();

        let mut events = self.detect_altercation(&persons);
        events.extend(self.detect_fire(image));
        events.extend(self.detect_fall(&persons, &vehicles));
        events.extend(self.detect_crowd(&persons));

        self.motion.observe(objects);

        events
    }

    #[inline]
    pub fn motion(&self) -> &MotionHistory {
        &self.motion
    }

    fn detect_altercation(&self, persons: &[&TrackedObject]) -> Vec<BehaviorEvent> {
        let cfg = &self.config.altercation;
        let mut events = Vec::new();

        for (i, p1) in persons.iter().enumerate() {
            for p2 in &persons[i + 1..] {
                let dist = math::distance(&p1.center, &p2.center);
                if dist >= cfg.proximity {
                    continue;
                }

                let speeds = (
                    self.motion.displacement(p1.id, &p1.center),
                    self.motion.displacement(p2.id, &p2.center),
                );

                let (s1, s2) = match speeds {
                    (Some(s1), Some(s2)) => (s1, s2),
                    _ => continue,
                };

                let speed = s1.max(s2);
                if speed > cfg.min_speed && dist < cfg.strike_distance {
                    events.push(BehaviorEvent::new(
                        BehaviorKind::Altercation,
                        Severity::Critical,
                        math::midpoint_floor(&p1.center, &p2.center),
                        format!(
                            "ids {} and {}: {:.0}px apart, {:.0}px/frame",
                            p1.id, p2.id, dist, speed
                        ),
                        format!("altercation_{}_{}", p1.id, p2.id),
                    ));
                }
            }
        }

        events
    }

    fn detect_fire(&self, image: &RgbImage) -> Option<BehaviorEvent> {
        let sighting = fire::detect(image, &self.config.fire)?;

        Some(BehaviorEvent::new(
            BehaviorKind::Fire,
            Severity::Critical,
            sighting.location,
            format!(
                "{} flame pixels, {:.1}% of frame",
                sighting.lit_pixels,
                sighting.ratio * 100.0
            ),
            "fire".to_string(),
        ))
    }

    fn detect_fall(
        &mut self,
        persons: &[&TrackedObject],
        vehicles: &[&TrackedObject],
    ) -> Vec<BehaviorEvent> {
        let cfg = &self.config.fall;
        let mut events = Vec::new();

        for person in persons {
            let pid = person.id;

            for vehicle in vehicles {
                let dist = math::distance(&person.center, &vehicle.center);

                if dist < cfg.collision_distance {
                    events.push(BehaviorEvent::new(
                        BehaviorKind::Fall,
                        Severity::Critical,
                        pixel(&person.center),
                        format!("id {}: {:.0}px from vehicle {}", pid, dist, vehicle.id),
                        format!("collision_{}", pid),
                    ));
                }
            }

            let speed = match self.motion.displacement(pid, &person.center) {
                Some(speed) => speed,
                None => continue,
            };

            if let Some(prev) = self.motion.replace_speed(pid, speed) {
                if prev > cfg.fast_speed && speed < cfg.stop_speed {
                    events.push(BehaviorEvent::new(
                        BehaviorKind::Fall,
                        Severity::Critical,
                        pixel(&person.center),
                        format!("id {}: {:.0} -> {:.0}px/frame", pid, prev, speed),
                        format!("fall_{}", pid),
                    ));
                }
            }
        }

        events
    }

    fn detect_crowd(&self, persons: &[&TrackedObject]) -> Option<BehaviorEvent> {
        let cfg = &self.config.crowd;
        if persons.len() < cfg.min_persons {
            return None;
        }

        let center = persons.iter().enumerate().find_map(|(i, p1)| {
            let nearby = persons
                .iter()
                .enumerate()
                .filter(|&(j, p2)| i != j && math::distance(&p1.center, &p2.center) < cfg.radius)
                .count();

            (nearby >= cfg.min_neighbors).then(|| p1.center)
        })?;

        Some(BehaviorEvent::new(
            BehaviorKind::Crowd,
            Severity::Medium,
            pixel(&center),
            format!("{} persons", persons.len()),
            "crowd".to_string(),
        ))
    }
}
