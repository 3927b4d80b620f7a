use chrono::{DateTime, SecondsFormat, Utc};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::models::retry::RetryConfig;

/// RFC 3339 in UTC with millisecond precision and a `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Runs `operation` until it succeeds or `max_attempts` is reached, sleeping a
/// fixed delay between attempts. The operation receives the 1-based attempt number.
///
/// Returns the last error once the budget is exhausted. A budget of zero still
/// makes one attempt.
pub async fn retry_with_fixed_delay<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    info!(attempt, max_attempts, "Retry succeeded");
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt >= max_attempts {
                    error!(
                        max_attempts,
                        error = %e,
                        "Retry failed after exhausting all attempts"
                    );
                    return Err(e);
                }

                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = config.delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );

                sleep(config.delay).await;
            }
        }
    }
}
