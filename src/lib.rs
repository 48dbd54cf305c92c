pub mod alert;
pub mod assignment;
pub mod bbox;
pub mod behavior;
pub mod classifier;
pub mod config;
pub mod cooldown;
pub mod detection;
pub mod error;
pub mod fire;
pub mod frame;
pub mod math;
pub mod motion;
pub mod pipeline;
pub mod store;
pub mod tracker;

mod circular_queue;
mod track;

pub use behavior::{BehaviorEvent, BehaviorKind, Severity};
pub use config::PipelineConfig;
pub use detection::Detection;
pub use error::{Error, Result};
pub use frame::Frame;
pub use pipeline::Pipeline;
pub use track::TrackedObject;

use std::collections::HashMap;
use std::rc::Rc;

pub trait Monitoring {
    fn process(&mut self, src: &str, frame: &Frame) -> Result<Vec<BehaviorEvent>>;
    fn tracks(&self, src: &str) -> Rc<[TrackedObject]>;
}

/// Independent pipelines, one per video source, sharing only their config.
pub struct Monitor {
    config: PipelineConfig,
    pipelines: HashMap<String, Pipeline>,
}

impl Monitor {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            pipelines: HashMap::new(),
        })
    }

    /// Forgets everything known about `src`; returns whether it existed.
    pub fn reset(&mut self, src: &str) -> bool {
        self.pipelines.remove(src).is_some()
    }

    #[inline]
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.pipelines.keys().map(String::as_str)
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
            pipelines: HashMap::new(),
        }
    }
}

impl crate::Monitoring for Monitor {
    fn process(&mut self, src: &str, frame: &Frame) -> Result<Vec<BehaviorEvent>> {
        let pipeline = if let Some(pipeline) = self.pipelines.get_mut(src) {
            pipeline
        } else {
            log::info!("new source `{}`", src);

            let pipeline = Pipeline::new(&self.config)?;
            self.pipelines.entry(src.to_string()).or_insert(pipeline)
        };

        pipeline.process(frame)
    }

    #[inline]
    fn tracks(&self, src: &str) -> Rc<[TrackedObject]> {
        if let Some(pipeline) = self.pipelines.get(src) {
            return pipeline.tracks().into_boxed_slice().into();
        }

        Rc::new([])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn frame(x: f32) -> Frame {
        Frame::new(
            RgbImage::new(320, 240),
            vec![Detection::new(x - 10.0, 80.0, x + 10.0, 120.0, 0, 0.9)],
        )
    }

    #[test]
    fn sources_do_not_share_identities() {
        let mut monitor = Monitor::default();
        monitor.process("cam-a", &frame(50.0)).unwrap();
        monitor.process("cam-a", &frame(200.0)).unwrap();
        monitor.process("cam-b", &frame(50.0)).unwrap();

        let a: Vec<_> = monitor.tracks("cam-a").iter().map(|t| t.id).collect();
        let b: Vec<_> = monitor.tracks("cam-b").iter().map(|t| t.id).collect();

        assert_eq!(a, vec![1, 2]);
        assert_eq!(b, vec![1]);
        assert!(monitor.tracks("cam-c").is_empty());
    }

    #[test]
    fn reset_drops_a_source() {
        let mut monitor = Monitor::default();
        monitor.process("cam", &frame(50.0)).unwrap();

        assert!(monitor.reset("cam"));
        assert!(!monitor.reset("cam"));
        assert_eq!(monitor.sources().count(), 0);

        monitor.process("cam", &frame(200.0)).unwrap();
        assert_eq!(monitor.tracks("cam")[0].id, 1);
    }
}
