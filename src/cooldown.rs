use std::collections::HashMap;

use crate::behavior::BehaviorEvent;
use crate::config::CooldownConfig;

/// Suppresses repeats of the same condition within a frame window.
///
/// A key fires when it was never seen or when more than `window` frames
/// passed since it last fired. Keys idle for `retention_windows` windows are
/// pruned; they would fire again anyway, so pruning only bounds memory.
#[derive(Debug)]
pub struct CooldownFilter {
    window: u64,
    retention: u64,
    last_fired: HashMap<String, u64>,
    last_prune: u64,
}

impl CooldownFilter {
    pub fn new(config: &CooldownConfig) -> Self {
        Self {
            window: config.window,
            retention: config.window.saturating_mul(config.retention_windows.max(1)),
            last_fired: HashMap::new(),
            last_prune: 0,
        }
    }

    pub fn filter(&mut self, candidates: Vec<BehaviorEvent>, frame_index: u64) -> Vec<BehaviorEvent> {
        self.prune(frame_index);

        let mut emitted = Vec::with_capacity(candidates.len());

        for event in candidates {
            match self.last_fired.get(event.dedup_key()) {
                Some(&last) if frame_index.saturating_sub(last) <= self.window => {
                    log::debug!(
                        "suppress {} (key {}, fired at frame {})",
                        event.kind,
                        event.dedup_key(),
                        last
                    );
                }
                _ => {
                    self.last_fired
                        .insert(event.dedup_key().to_string(), frame_index);
                    emitted.push(event);
                }
            }
        }

        emitted
    }

    fn prune(&mut self, frame_index: u64) {
        if frame_index < self.last_prune + self.window {
            return;
        }

        let before = self.last_fired.len();
        let retention = self.retention;
        self.last_fired
            .retain(|_, last| frame_index.saturating_sub(*last) <= retention);
        self.last_prune = frame_index;

        let dropped = before - self.last_fired.len();
        if dropped > 0 {
            log::debug!("pruned {} cooldown entries at frame {}", dropped, frame_index);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.last_fired.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.last_fired.is_empty()
    }
}
