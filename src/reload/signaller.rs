// src/reload/signaller.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::errors::{PlugwatchError, Result};
use crate::reload::request::{Credentials, ReloadRequest};
use crate::reload::transport::{AttemptError, ReloadTransport};

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Tells the running service to swap in a freshly built artifact.
///
/// Only unreachable/timeout failures are retried; the service may still be
/// booting when the first reload is attempted. Rejections fail immediately.
#[derive(Clone)]
pub struct ReloadSignaller {
    transport: Arc<dyn ReloadTransport>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ReloadSignaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadSignaller")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ReloadSignaller {
    pub fn new(transport: Arc<dyn ReloadTransport>, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Build a [`ReloadRequest`] and send it.
    pub async fn reload_plugin(
        &self,
        plugin_name: &str,
        artifact: impl Into<PathBuf>,
        host: &str,
        credentials: &Credentials,
    ) -> Result<()> {
        let request = ReloadRequest {
            plugin_name: plugin_name.to_string(),
            artifact: artifact.into(),
            target_host: host.to_string(),
            credentials: credentials.clone(),
        };
        self.reload(&request).await
    }

    pub async fn reload(&self, request: &ReloadRequest) -> Result<()> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.transport.send(request).await {
                Ok(()) => {
                    info!(
                        plugin = %request.plugin_name,
                        artifact = ?request.artifact,
                        attempt,
                        "plugin reloaded"
                    );
                    return Ok(());
                }
                Err(AttemptError::Rejected { status, body }) => {
                    return Err(PlugwatchError::ReloadRejectedError { status, body });
                }
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Unreachable(msg)) => {
                    warn!(
                        plugin = %request.plugin_name,
                        attempt,
                        max_attempts,
                        error = %msg,
                        "reload endpoint unreachable"
                    );
                    last_error = msg;
                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry.backoff).await;
                    }
                }
            }
        }

        Err(PlugwatchError::ReloadUnreachableError {
            attempts: max_attempts,
            last_error,
        })
    }
}
