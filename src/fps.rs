// src/fps.rs
use std::time::{SystemTime, UNIX_EPOCH};

/// Instantaneous frame rate from consecutive wall-clock stamps. The first
/// stamp is measured against the epoch, so the first value is meaningless.
#[derive(Debug, Default)]
pub struct FpsMeter {
    prev_secs: f64,
}

impl FpsMeter {
    pub fn tick(&mut self) -> f64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        self.tick_at(now)
    }

    pub fn tick_at(&mut self, now_secs: f64) -> f64 {
        let fps = 1.0 / (now_secs - self.prev_secs);
        self.prev_secs = now_secs;
        fps
    }
}
