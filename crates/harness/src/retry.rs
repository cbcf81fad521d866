/*
 * SPDX-FileCopyrightText: 2026 LDAP Registry FAT Project
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Bounded retry-with-timeout polling
//!
//! The one retry primitive the harness uses anywhere. Exhausting the
//! bounded wait is reported as [`RetryOutcome::TimedOut`], a value rather
//! than an error, so callers can distinguish "not ready yet" from an
//! unrecoverable failure in the polled operation itself.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::trace;

/// Timing for a bounded wait: total budget plus the pause between polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total wait budget
    pub timeout: Duration,
    /// Pause between polls
    pub interval: Duration,
}

/// Result of a bounded wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    /// The condition was met within the budget
    Ready(T),
    /// The budget ran out with the condition still unmet
    TimedOut { attempts: u32, elapsed: Duration },
}

impl<T> RetryOutcome<T> {
    /// True when the wait succeeded
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The produced value, if the wait succeeded
    pub fn into_ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::TimedOut { .. } => None,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // Matches the server's own startup wait budget
        Self {
            timeout: Duration::from_secs(120),
            interval: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given budget and poll interval
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Poll a synchronous operation until it yields a value or the budget
    /// runs out. `Err` from the operation is unrecoverable and returned
    /// as-is; `Ok(None)` means "not ready, poll again".
    pub async fn poll_until<T, E>(
        &self,
        mut op: impl FnMut() -> Result<Option<T>, E>,
    ) -> Result<RetryOutcome<T>, E> {
        let start = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            if let Some(value) = op()? {
                trace!(attempts, elapsed = ?start.elapsed(), "condition met");
                return Ok(RetryOutcome::Ready(value));
            }
            if start.elapsed() >= self.timeout {
                return Ok(RetryOutcome::TimedOut {
                    attempts,
                    elapsed: start.elapsed(),
                });
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Poll an async operation until it yields a value or the budget runs
    /// out. Same contract as [`RetryPolicy::poll_until`].
    pub async fn poll_until_async<T, E, F, Fut>(&self, mut op: F) -> Result<RetryOutcome<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let start = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            if let Some(value) = op().await? {
                trace!(attempts, elapsed = ?start.elapsed(), "condition met");
                return Ok(RetryOutcome::Ready(value));
            }
            if start.elapsed() >= self.timeout {
                return Ok(RetryOutcome::TimedOut {
                    attempts,
                    elapsed: start.elapsed(),
                });
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Wait for a boolean condition
    pub async fn wait_until<E>(
        &self,
        mut cond: impl FnMut() -> Result<bool, E>,
    ) -> Result<RetryOutcome<()>, E> {
        self.poll_until(|| Ok(cond()?.then_some(()))).await
    }
}
