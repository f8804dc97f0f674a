use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

/// Sleep unless cancelled first. Returns `false` when the wait was cut short.
pub async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = sleep(duration) => true,
    }
}
