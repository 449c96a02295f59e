//! Retry loop for a single pipeline step.

use std::future::Future;

use donkeys_core::error::CoreError;
use donkeys_core::retry::RetryPolicy;
use donkeys_core::types::PurchaseId;

/// Run `op` until it succeeds, fails permanently, or the policy is spent.
///
/// Only [`CoreError::is_transient`] failures are retried; anything else
/// is returned after the first attempt. The last error is returned once
/// all attempts are used.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    step: &'static str,
    purchase_id: PurchaseId,
    mut op: F,
) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut delays = policy.delays().into_iter();
    let mut attempt = 1u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => match delays.next() {
                Some(delay) => {
                    tracing::warn!(
                        purchase_id,
                        step,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Step failed, retrying",
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return Err(e),
            },
            Err(e) => return Err(e),
        }
    }
}
