//! Cancellation of a whole run on a shutdown signal

use std::future::Future;

/// Drive `work` to completion unless `shutdown` resolves first
///
/// Returns `None` when interrupted. `work` is dropped at its current await
/// point, so anything it already persisted stays persisted.
pub async fn until_shutdown<F, S>(work: F, shutdown: S) -> Option<F::Output>
where
    F: Future,
    S: Future<Output = ()>,
{
    tokio::select! {
        output = work => Some(output),
        _ = shutdown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_finished_work_is_returned() {
        let result = until_shutdown(async { 7 }, std::future::pending()).await;
        assert_eq!(result, Some(7));
    }

    #[tokio::test]
    async fn test_signal_during_startup_interrupts() {
        // Work that never gets past its first step, like a hung connection check
        let work = async {
            std::future::pending::<()>().await;
            "unreachable"
        };
        let shutdown = tokio::time::sleep(Duration::from_millis(20));

        assert_eq!(until_shutdown(work, shutdown).await, None);
    }

    #[tokio::test]
    async fn test_interrupt_keeps_completed_steps() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let work = async move {
            tx.send("saved").unwrap();
            std::future::pending::<()>().await;
        };

        let result = until_shutdown(work, tokio::time::sleep(Duration::from_millis(20))).await;
        assert!(result.is_none());
        assert_eq!(rx.recv().await, Some("saved"));
    }
}
