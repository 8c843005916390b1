use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::sleep;

use crate::{
    transport::{Transport, TransportRequest},
    Parameters, Result,
};

/// Bookkeeping for one transport attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 0-based attempt number.
    pub index: u32,
    /// Backoff waited before this attempt started. Zero for the first one.
    pub delay_before: Duration,
}

/// Attempts made by a request so far, readable after it settles.
#[derive(Debug, Default)]
pub(crate) struct AttemptLog {
    records: Mutex<Vec<AttemptRecord>>,
}

impl AttemptLog {
    fn lock(&self) -> MutexGuard<'_, Vec<AttemptRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, record: AttemptRecord) {
        self.lock().push(record);
    }

    pub(crate) fn records(&self) -> Vec<AttemptRecord> {
        self.lock().clone()
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.lock().len() as u32
    }

    pub(crate) fn last_delay(&self) -> Duration {
        self.lock()
            .last()
            .map(|record| record.delay_before)
            .unwrap_or_default()
    }
}

/// Delay to wait after attempt `index` (0-based) has failed:
/// `base_delay_ms * backoff_factor^index`, rounded to whole milliseconds.
///
/// Saturates at `Duration::MAX` instead of overflowing.
pub fn backoff_delay(params: &Parameters, index: u32) -> Duration {
    if params.base_delay_ms == 0 {
        return Duration::ZERO;
    }
    let ms = params.base_delay_ms as f64 * params.backoff_factor.powf(f64::from(index));
    if !ms.is_finite() || ms >= u64::MAX as f64 {
        return Duration::MAX;
    }
    Duration::from_millis(ms.round() as u64)
}

/// Drives sequential attempts until one succeeds, a non-retryable error
/// occurs, or `max_attempts` is reached.
///
/// The error of the final attempt is returned on exhaustion. Attempts never
/// overlap: attempt `i + 1` starts only after attempt `i` failed and its
/// backoff has fully elapsed.
pub(crate) async fn run_with_retry(
    transport: &dyn Transport,
    request: &TransportRequest,
    params: &Parameters,
    log: &AttemptLog,
) -> Result<Vec<u8>> {
    let mut index = 0u32;
    let mut delay_before = Duration::ZERO;

    loop {
        log.push(AttemptRecord {
            index,
            delay_before,
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(attempt = index, url = %request.url, "sending license request");

        let err = match transport.execute(request).await {
            Ok(bytes) => return Ok(bytes),
            Err(err) => err,
        };

        if !err.is_retryable() || index + 1 >= params.max_attempts {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                attempts = index + 1,
                status = ?err.status(),
                "license request failed: {}",
                err
            );
            return Err(err);
        }

        let delay = backoff_delay(params, index);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt = index,
            status = ?err.status(),
            "retrying license request after {} ms",
            delay.as_millis()
        );

        sleep(delay).await;
        delay_before = delay;
        index += 1;
    }
}
