//! Cooperative cancellation built on a `tokio::sync::watch` flag.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

/// Marker returned when a guarded future lost the race against cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Owning side of a cancellation flag.
#[derive(Debug)]
pub struct CancelHandle {
    cancel_tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// Receiving side handed to sync operations. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    pub fn channel() -> (CancelHandle, CancelSignal) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        (
            CancelHandle { cancel_tx },
            CancelSignal {
                cancel_rx: Some(cancel_rx),
            },
        )
    }

    /// A signal that can never fire.
    pub fn never() -> Self {
        Self { cancel_rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_rx
            .as_ref()
            .map(|cancel_rx| *cancel_rx.borrow())
            .unwrap_or(false)
    }

    /// Resolves once the flag flips to `true`. A dropped handle means nobody can
    /// cancel anymore, so the future stays pending.
    pub async fn cancelled(&self) {
        let Some(cancel_rx) = self.cancel_rx.as_ref() else {
            return std::future::pending().await;
        };
        let mut cancel_rx = cancel_rx.clone();
        loop {
            if *cancel_rx.borrow_and_update() {
                return;
            }
            if cancel_rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }

    pub async fn run<F, T>(&self, future: F) -> Result<T, Cancelled>
    where
        F: Future<Output = T>,
    {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Cancelled),
            output = future => Ok(output),
        }
    }

    pub async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        self.run(tokio::time::sleep(duration)).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CancelSignal, Cancelled};

    #[tokio::test(start_paused = true)]
    async fn functional_sleep_completes_when_not_cancelled() {
        let signal = CancelSignal::never();
        assert_eq!(signal.sleep(Duration::from_secs(5)).await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn functional_cancel_interrupts_pending_sleep() {
        let (handle, signal) = CancelSignal::channel();
        let waiter = tokio::spawn(async move { signal.sleep(Duration::from_secs(3600)).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();
        assert_eq!(waiter.await.expect("join"), Err(Cancelled));
    }

    #[tokio::test]
    async fn unit_already_cancelled_signal_short_circuits() {
        let (handle, signal) = CancelSignal::channel();
        handle.cancel();
        assert!(signal.is_cancelled());
        assert_eq!(signal.run(async { 7 }).await, Err(Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn regression_dropped_handle_never_cancels() {
        let (handle, signal) = CancelSignal::channel();
        drop(handle);
        assert_eq!(signal.sleep(Duration::from_secs(1)).await, Ok(()));
    }
}
