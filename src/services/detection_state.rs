/// Temporal confirmation and alert debounce
///
/// A per-session counter of consecutive frames in which any person matched
/// the target pose. The pose is confirmed while the counter is at or above
/// the configured threshold; a single non-matching frame resets it to 0.
/// Alert cooldown is tracked separately on a wall clock.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::config::DetectionConfig;
use crate::models::pose::DetectionSnapshot;

/// Frames kept in the rolling history
pub const HISTORY_CAPACITY: usize = 10;

/// Source of "now" for cooldown checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic replays and tests
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now = *now + by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct DetectionState<C: Clock = SystemClock> {
    consecutive_detections: u32,
    detection_history: VecDeque<bool>,
    last_alert_time: Option<DateTime<Utc>>,
    consecutive_frames_threshold: u32,
    alert_duration: Duration,
    clock: C,
}

impl DetectionState<SystemClock> {
    pub fn new(config: &DetectionConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> DetectionState<C> {
    pub fn with_clock(config: &DetectionConfig, clock: C) -> Self {
        Self {
            consecutive_detections: 0,
            detection_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            last_alert_time: None,
            consecutive_frames_threshold: config.consecutive_frames_threshold,
            alert_duration: config.alert_duration(),
            clock,
        }
    }

    /// Record one frame's aggregate match and report whether the pose is confirmed
    pub fn update(&mut self, frame_aggregate_match: bool) -> bool {
        if frame_aggregate_match {
            self.consecutive_detections = self.consecutive_detections.saturating_add(1);
        } else {
            self.consecutive_detections = 0;
        }

        self.detection_history.push_back(frame_aggregate_match);
        while self.detection_history.len() > HISTORY_CAPACITY {
            self.detection_history.pop_front();
        }

        self.is_confirmed()
    }

    pub fn is_confirmed(&self) -> bool {
        self.consecutive_detections >= self.consecutive_frames_threshold
    }

    /// Cooldown gate: true once more than the alert duration has passed
    /// since the last alert. Independent of confirmation.
    pub fn should_show_alert(&self) -> bool {
        match self.last_alert_time {
            None => true,
            Some(last) => self.clock.now() - last > self.alert_duration,
        }
    }

    /// Restart the cooldown from now
    pub fn trigger_alert(&mut self) {
        self.last_alert_time = Some(self.clock.now());
    }

    pub fn consecutive_detections(&self) -> u32 {
        self.consecutive_detections
    }

    pub fn detection_history(&self) -> impl Iterator<Item = bool> + '_ {
        self.detection_history.iter().copied()
    }

    pub fn last_alert_time(&self) -> Option<DateTime<Utc>> {
        self.last_alert_time
    }

    /// Clear the counter and history; the alert cooldown is kept
    pub fn reset(&mut self) {
        self.consecutive_detections = 0;
        self.detection_history.clear();
    }

    pub fn snapshot(&self) -> DetectionSnapshot {
        DetectionSnapshot {
            consecutive_detections: self.consecutive_detections,
            confirmed: self.is_confirmed(),
            detection_history: self.detection_history().collect(),
            last_alert_time: self.last_alert_time,
            should_alert: self.should_show_alert(),
        }
    }
}
