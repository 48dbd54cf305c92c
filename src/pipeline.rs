use crate::assignment::Assignment;
use crate::behavior::BehaviorEvent;
use crate::classifier::BehaviorClassifier;
use crate::config::PipelineConfig;
use crate::cooldown::CooldownFilter;
use crate::error::Result;
use crate::track::TrackedObject;
use crate::tracker::CentroidTracker;
use crate::Frame;

/// Everything one video source needs, frame after frame.
///
/// All timing is counted in processed frames, never wall-clock time, so a
/// given detection sequence always yields the same events.
#[derive(Debug)]
pub struct Pipeline {
    tracker: CentroidTracker,
    classifier: BehaviorClassifier,
    cooldown: CooldownFilter,
    frame_index: u64,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            tracker: CentroidTracker::new(&config.tracker),
            classifier: BehaviorClassifier::new(config.classifier.clone()),
            cooldown: CooldownFilter::new(&config.cooldown),
            frame_index: 0,
        })
    }

    pub fn with_assignment(config: &PipelineConfig, assignment: Box<dyn Assignment>) -> Result<Self> {
        let mut pipeline = Self::new(config)?;
        pipeline.tracker = CentroidTracker::with_assignment(&config.tracker, assignment);

        Ok(pipeline)
    }

    /// Runs tracking, classification and deduplication for the next frame.
    ///
    /// A frame without pixels is rejected before any state changes.
    pub fn process(&mut self, frame: &Frame) -> Result<Vec<BehaviorEvent>> {
        frame.validate()?;
        self.frame_index += 1;

        let tracks = self.tracker.update(&frame.detections);
        let candidates = self.classifier.classify(&tracks, &frame.image);
        let events = self.cooldown.filter(candidates, self.frame_index);

        for event in &events {
            log::info!("frame {}: {}", self.frame_index, event);
        }

        Ok(events)
    }

    #[inline]
    pub fn tracks(&self) -> Vec<TrackedObject> {
        self.tracker.tracks()
    }

    /// Index of the last processed frame; the first frame is 1.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}
