//! Bounded polling for asynchronous, non-deterministic UI state.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The condition never held within the attempt budget.
    #[error("max retries exceeded: {attempts}")]
    MaxRetriesExceeded { attempts: u32 },

    /// Evaluating the condition itself failed.
    #[error(transparent)]
    Probe(#[from] anyhow::Error),
}

/// Retry budget for one bounded wait: how often to look, and how long to
/// pause between looks.
#[derive(Debug, Clone, Copy)]
pub struct Waiter {
    attempts: NonZeroU32,
    delay: Duration,
}

impl Waiter {
    pub fn new(attempts: NonZeroU32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.get()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Evaluate `probe` until it reports true.
    ///
    /// The first evaluation is attempt 1 and happens immediately; the delay
    /// only runs between attempts, so a probe that succeeds on attempt k has
    /// slept k - 1 times. A probe error aborts the wait right away.
    pub async fn wait_until<F, Fut>(&self, mut probe: F) -> Result<(), PollError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<bool>>,
    {
        let max = self.attempts.get();

        for attempt in 1..=max {
            if probe().await? {
                return Ok(());
            }
            if attempt < max {
                debug!(attempt, max, "condition not met, waiting");
                tokio::time::sleep(self.delay).await;
            }
        }

        Err(PollError::MaxRetriesExceeded { attempts: max })
    }
}
