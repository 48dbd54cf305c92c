use nalgebra as na;
use serde_derive::Serialize;
use std::fmt;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    Altercation,
    Fire,
    Fall,
    Crowd,
}

impl BehaviorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorKind::Altercation => "altercation",
            BehaviorKind::Fire => "fire",
            BehaviorKind::Fall => "fall",
            BehaviorKind::Crowd => "crowd",
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Critical => "critical",
            Severity::Medium => "medium",
            Severity::Low => "low",
        })
    }
}

/// A located, typed safety condition, ready to be rendered or announced.
///
/// The deduplication key only matters to the cooldown filter and is left
/// out of the serialized form.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BehaviorEvent {
    pub kind: BehaviorKind,
    pub severity: Severity,
    pub location: na::Point2<i32>,
    pub detail: String,
    #[serde(skip)]
    key: String,
}

impl BehaviorEvent {
    pub fn new(
        kind: BehaviorKind,
        severity: Severity,
        location: na::Point2<i32>,
        detail: String,
        key: String,
    ) -> Self {
        Self {
            kind,
            severity,
            location,
            detail,
            key,
        }
    }

    #[inline]
    pub fn dedup_key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for BehaviorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] at ({}, {}): {}",
            self.kind, self.severity, self.location.x, self.location.y, self.detail
        )
    }
}
