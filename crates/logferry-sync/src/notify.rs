//! Best-effort import notifications.
//!
//! A single-slot channel: the importer never waits on observers, and any
//! number of merges between two reads collapse into one pending signal.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Create a connected notifier and signal receiver.
pub fn channel() -> (Notifier, ImportSignal) {
    let (tx, rx) = mpsc::channel(1);
    (Notifier { tx }, ImportSignal { rx })
}

/// Sending half, owned by the importer.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::Sender<()>,
}

impl Notifier {
    /// Signal that at least one merge happened.
    ///
    /// Returns `false` when a signal was already pending or nobody listens.
    pub fn notify(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) | Err(TrySendError::Closed(())) => false,
        }
    }
}

/// Receiving half, handed to observers.
///
/// A signal carries no payload; re-query the log for details.
#[derive(Debug)]
pub struct ImportSignal {
    rx: mpsc::Receiver<()>,
}

impl ImportSignal {
    /// Wait for the next signal. `None` once the importer is gone and no
    /// signal is pending.
    pub async fn recv(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Take a pending signal without waiting.
    pub fn try_recv(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signals_coalesce() {
        let (notifier, mut signal) = channel();
        assert!(notifier.notify());
        assert!(!notifier.notify());
        assert!(!notifier.notify());

        assert!(signal.try_recv());
        assert!(!signal.try_recv());
    }

    #[tokio::test]
    async fn test_recv_ends_after_importer_drops() {
        let (notifier, mut signal) = channel();
        notifier.notify();
        drop(notifier);

        assert_eq!(signal.recv().await, Some(()));
        assert_eq!(signal.recv().await, None);
    }

    #[test]
    fn test_notify_without_observer_is_silent() {
        let (notifier, signal) = channel();
        drop(signal);
        assert!(!notifier.notify());
    }
}
