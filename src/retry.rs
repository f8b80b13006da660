use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::rpc::Error;

pub fn new_receipt_backoff(interval: Duration, attempts: usize) -> ExponentialBuilder {
    ExponentialBuilder::new()
        .with_min_delay(interval)
        .with_max_delay(interval.max(Duration::from_secs(5)))
        .with_max_times(attempts)
}

pub fn notify(action: &str) -> impl FnMut(&Error, Duration) {
    move |e, d| {
        debug!("Polling {} again after {:?}: {}", action, d, e);
    }
}

/// Only a pending transaction is worth polling again, and only while the run
/// has not been cancelled.
pub fn pollable(cancel_token: CancellationToken) -> impl FnMut(&Error) -> bool {
    move |e| matches!(e, Error::Pending(_)) && !cancel_token.is_cancelled()
}

pub async fn poll<T, F, Fut>(
    operation: F,
    action: &str,
    backoff: ExponentialBuilder,
    cancel_token: CancellationToken,
) -> Result<T, Error>
where
    Fut: Future<Output = Result<T, Error>>,
    F: FnMut() -> Fut,
{
    let polling = operation
        .retry(backoff)
        .notify(notify(action))
        .when(pollable(cancel_token.clone()));
    let result = select! {
        _ = cancel_token.cancelled() => return Err(Error::Cancelled),
        result = polling => result,
    };
    match result {
        Err(Error::Pending(_)) if cancel_token.is_cancelled() => Err(Error::Cancelled),
        Err(Error::Pending(hash)) => Err(Error::Timeout(hash)),
        other => other,
    }
}
