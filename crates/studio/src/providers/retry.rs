use std::{future::Future, time::Duration};

use backon::{ConstantBuilder, Retryable};

use super::AdapterError;
use crate::config::RetrySettings;

/// Single bounded retry around one adapter call. Only transient failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
}

impl RetryPolicy {
    pub const MAX_RETRIES: usize = 1;

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(Duration::from_millis(settings.delay_ms))
    }

    pub async fn call<T, F, Fut>(&self, operation: &str, f: F) -> Result<T, AdapterError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AdapterError>>,
    {
        f.retry(
            ConstantBuilder::default()
                .with_delay(self.delay)
                .with_max_times(Self::MAX_RETRIES),
        )
        .when(|e: &AdapterError| e.should_retry())
        .notify(|err: &AdapterError, dur: Duration| {
            tracing::warn!(
                "{} failed, retrying after {:.2}s: {}",
                operation,
                dur.as_secs_f64(),
                err
            );
        })
        .await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}
