/// Registry of detector sessions, one per video stream
///
/// Sessions share nothing with each other. Each is behind its own lock so
/// frames for one stream are processed strictly in order while other
/// streams proceed independently. Sessions nobody has touched for the idle
/// TTL are evicted, and the registry refuses new sessions once full.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::config::{DetectionConfig, LimitsConfig};
use crate::services::detection_state::{Clock, SystemClock};
use crate::services::pose_detector::PoseDetector;

pub type SharedDetector = Arc<Mutex<PoseDetector>>;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Session limit of {max_sessions} reached")]
pub struct SessionLimitReached {
    pub max_sessions: usize,
}

struct SessionEntry {
    detector: SharedDetector,
    last_used: DateTime<Utc>,
}

pub struct SessionStore<C: Clock = SystemClock> {
    config: DetectionConfig,
    max_sessions: usize,
    idle_ttl: Duration,
    clock: C,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl SessionStore<SystemClock> {
    pub fn new(config: DetectionConfig, limits: &LimitsConfig) -> Self {
        Self::with_clock(config, limits, SystemClock)
    }
}

impl<C: Clock> SessionStore<C> {
    pub fn with_clock(config: DetectionConfig, limits: &LimitsConfig, clock: C) -> Self {
        Self {
            config,
            max_sessions: limits.max_sessions,
            idle_ttl: limits.session_idle_ttl(),
            clock,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new session with a fresh detector
    pub async fn create(&self) -> Result<Uuid, SessionLimitReached> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        self.evict_idle_locked(&mut sessions, now);

        if sessions.len() >= self.max_sessions {
            return Err(SessionLimitReached {
                max_sessions: self.max_sessions,
            });
        }

        let id = Uuid::new_v4();
        let detector = Arc::new(Mutex::new(PoseDetector::new(&self.config)));
        sessions.insert(
            id,
            SessionEntry {
                detector,
                last_used: now,
            },
        );
        info!("Created detection session {}", id);
        Ok(id)
    }

    /// Look up a live session and mark it as used
    pub async fn get(&self, id: &Uuid) -> Option<SharedDetector> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;

        let expired = sessions
            .get(id)
            .is_some_and(|entry| self.is_idle(entry, now));
        if expired {
            sessions.remove(id);
            info!("Detection session {} expired", id);
            return None;
        }

        sessions.get_mut(id).map(|entry| {
            entry.last_used = now;
            entry.detector.clone()
        })
    }

    /// Returns false if the session did not exist
    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!("Closed detection session {}", id);
        }
        removed
    }

    /// Drop every session idle for longer than the TTL; returns how many
    pub async fn evict_idle(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        self.evict_idle_locked(&mut sessions, now)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_idle(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.last_used > self.idle_ttl
    }

    fn evict_idle_locked(&self, sessions: &mut HashMap<Uuid, SessionEntry>, now: DateTime<Utc>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_idle(entry, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle detection sessions", evicted);
        }
        evicted
    }
}
