use anyhow::Error;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Browser-like user agent; some quote and favicon endpoints refuse library defaults.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Runs `operation` up to `retries + 1` times, sleeping `delay_ms` between attempts.
/// Returns the first success or the last error.
pub async fn with_retry<F, Fut, T, E>(mut operation: F, retries: usize, delay_ms: u64) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<Error>,
{
    let delay = Duration::from_millis(delay_ms);
    for attempt in 1.. {
        match operation().await.map_err(Into::into) {
            Ok(val) => return Ok(val),
            Err(err) if attempt > retries => return Err(err),
            Err(err) => {
                debug!(attempt, retries, error = %err, "Request failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
    unreachable!("retry loop only exits by returning")
}
