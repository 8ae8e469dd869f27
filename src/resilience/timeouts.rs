//! Timeout enforcement for stage-to-stage calls.

use std::future::Future;
use std::time::Duration;

use crate::config::TimeoutConfig;
use crate::pipeline::{HopError, Stage};

/// Deadlines applied to one outbound hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopTimeouts {
    pub connect: Duration,
    pub total: Duration,
}

impl From<&TimeoutConfig> for HopTimeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_secs),
            total: Duration::from_secs(config.hop_secs),
        }
    }
}

/// Run `call` against `target`, failing with [`HopError::Timeout`] after `limit`.
pub async fn with_deadline<T, F>(target: Stage, limit: Duration, call: F) -> Result<T, HopError>
where
    F: Future<Output = Result<T, HopError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(HopError::Timeout {
            target,
            timeout: limit,
        }),
    }
}
