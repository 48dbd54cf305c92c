//! Tunable constants of the pipeline.
//!
//! Every threshold is in pixels or frames of the incoming stream, so the
//! defaults assume the resolution they were chosen for. All sections use
//! `#[serde(default)]`; a config file only has to name what it overrides.

use serde_derive::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Largest centroid displacement (px) still accepted as the same object
    pub max_distance: f32,

    /// Consecutive missed frames a track survives
    pub max_disappeared: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            max_disappeared: 30,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AltercationConfig {
    pub proximity: f32,
    pub strike_distance: f32,
    pub min_speed: f32,
}

impl Default for AltercationConfig {
    fn default() -> Self {
        Self {
            proximity: 100.0,
            strike_distance: 80.0,
            min_speed: 20.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FireConfig {
    pub min_pixels: u32,

    /// Fraction of the frame area, 0.01 is 1%
    pub min_ratio: f32,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            min_pixels: 2000,
            min_ratio: 0.01,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FallConfig {
    pub collision_distance: f32,
    pub fast_speed: f32,
    pub stop_speed: f32,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            collision_distance: 160.0,
            fast_speed: 80.0,
            stop_speed: 20.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CrowdConfig {
    pub min_persons: usize,
    pub radius: f32,
    pub min_neighbors: usize,
}

impl Default for CrowdConfig {
    fn default() -> Self {
        Self {
            min_persons: 6,
            radius: 150.0,
            min_neighbors: 4,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub person_class: i32,

    // COCO: car, motorcycle, bus, truck
    pub vehicle_classes: Vec<i32>,

    pub altercation: AltercationConfig,
    pub fire: FireConfig,
    pub fall: FallConfig,
    pub crowd: CrowdConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            person_class: 0,
            vehicle_classes: vec![2, 3, 5, 7],
            altercation: AltercationConfig::default(),
            fire: FireConfig::default(),
            fall: FallConfig::default(),
            crowd: CrowdConfig::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CooldownConfig {
    /// Frames a key stays silent after firing
    pub window: u64,

    /// Entries untouched for this many windows are dropped
    pub retention_windows: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            window: 30,
            retention_windows: 4,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub tracker: TrackerConfig,
    pub classifier: ClassifierConfig,
    pub cooldown: CooldownConfig,
}

impl PipelineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let distances = [
            ("tracker.max_distance", self.tracker.max_distance),
            ("altercation.proximity", self.classifier.altercation.proximity),
            ("altercation.strike_distance", self.classifier.altercation.strike_distance),
            ("fall.collision_distance", self.classifier.fall.collision_distance),
            ("crowd.radius", self.classifier.crowd.radius),
        ];

        for (name, value) in distances {
            if !(value > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.classifier.fire.min_ratio) {
            return Err(Error::InvalidConfig(format!(
                "fire.min_ratio must be within [0, 1], got {}",
                self.classifier.fire.min_ratio
            )));
        }

        if self.cooldown.window == 0 {
            return Err(Error::InvalidConfig("cooldown.window must be non-zero".into()));
        }

        if self.cooldown.retention_windows == 0 {
            return Err(Error::InvalidConfig(
                "cooldown.retention_windows must be non-zero".into(),
            ));
        }

        Ok(())
    }
}
