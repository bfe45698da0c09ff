use anyhow::{ensure, Result};
use serde::Serialize;

use super::detection::env_or;

const MAX_SESSION_IDLE_TTL_SECS: u64 = 24 * 60 * 60;

/// Request size and session registry limits
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitsConfig {
    /// Largest accepted request body; batches of base64 frames get big
    pub max_body_bytes: usize,
    /// Sessions with no frames for this long are dropped
    pub session_idle_ttl_secs: u64,
    /// Open sessions allowed at once
    pub max_sessions: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 64 * 1024 * 1024,
            session_idle_ttl_secs: 300,
            max_sessions: 256,
        }
    }
}

impl LimitsConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            max_body_bytes: env_or("MAX_BODY_BYTES", defaults.max_body_bytes)?,
            session_idle_ttl_secs: env_or("SESSION_IDLE_TTL_SECS", defaults.session_idle_ttl_secs)?,
            max_sessions: env_or("MAX_SESSIONS", defaults.max_sessions)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_body_bytes >= 1024,
            "max_body_bytes must be at least 1024, got {}",
            self.max_body_bytes
        );
        ensure!(
            (1..=MAX_SESSION_IDLE_TTL_SECS).contains(&self.session_idle_ttl_secs),
            "session_idle_ttl_secs must be within [1, {}], got {}",
            MAX_SESSION_IDLE_TTL_SECS,
            self.session_idle_ttl_secs
        );
        ensure!(self.max_sessions >= 1, "max_sessions must be at least 1");
        Ok(())
    }

    pub fn session_idle_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_idle_ttl_secs.min(MAX_SESSION_IDLE_TTL_SECS) as i64)
    }
}
