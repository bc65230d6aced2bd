use std::{future::Future, io};

use log::{error, info};

/// Resolves once `signal` fires.
///
/// If the signal can't be listened for the error is logged and this never resolves, so the
/// server keeps running instead of shutting down at once.
pub async fn on_signal<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("received ctrl-c, shutting down"),
        Err(e) => {
            error!("failed to listen for ctrl-c, graceful shutdown is disabled: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn resolves_when_the_signal_fires() {
        let fired = async { Ok::<_, io::Error>(()) };
        let fired = timeout(Duration::from_secs(1), on_signal(fired)).await;
        assert!(fired.is_ok());
    }

    #[tokio::test]
    async fn failed_listener_keeps_waiting() {
        let failed = async { Err::<(), _>(io::Error::other("no signal handler")) };
        let fired = timeout(Duration::from_millis(50), on_signal(failed)).await;
        assert!(fired.is_err());
    }
}
