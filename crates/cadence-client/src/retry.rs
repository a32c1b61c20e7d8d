//! Backoff for collaborator HTTP calls.
//!
//! Only transient outcomes are retried: transport errors and 5xx replies.
//! A 4xx goes straight back to the caller, and so does whatever the final
//! attempt produced.

use std::future::Future;
use std::time::Duration;

type SendResult = Result<reqwest::Response, reqwest::Error>;

/// How many times to resend and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    /// Extra attempts after the first.
    pub retries: u32,
    /// Wait before the first retry; doubled for each one after.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

fn is_transient(outcome: &SendResult) -> bool {
    match outcome {
        Ok(resp) => resp.status().is_server_error(),
        Err(_) => true,
    }
}

impl RetryPolicy {
    fn delay(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(1 << retry.min(16))
    }

    /// Call `send` until it yields a non-transient outcome or the retries
    /// run out.
    pub(crate) async fn send<F, Fut>(&self, send: F) -> SendResult
    where
        F: Fn() -> Fut,
        Fut: Future<Output = SendResult>,
    {
        let mut retry = 0;
        loop {
            let outcome = send().await;
            if retry >= self.retries || !is_transient(&outcome) {
                return outcome;
            }
            let delay = self.delay(retry);
            match &outcome {
                Ok(resp) => tracing::warn!(
                    status = resp.status().as_u16(),
                    retry = retry + 1,
                    ?delay,
                    "collaborator server error, retrying"
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    retry = retry + 1,
                    ?delay,
                    "collaborator unreachable, retrying"
                ),
            }
            tokio::time::sleep(delay).await;
            retry += 1;
        }
    }
}
