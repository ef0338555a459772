//! Rate gate for outbound remote calls.
//!
//! A gate admits at most one caller per tick of a background ticker firing
//! every `1 / rate_per_second` seconds. Callers hand the ticker a reply
//! channel and wait for it to be answered, so admissions are serialized
//! behind the ticker: `M` calls through a gate of rate `R` take at least
//! `(M - 1) / R` seconds. There is no bursting and no permit is banked while
//! the gate is idle.

use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

type Permit = oneshot::Sender<()>;

/// A shared, cloneable rate gate.
///
/// Clones share one ticker. The ticker task exits once every clone has been
/// dropped.
#[derive(Debug, Clone)]
pub struct RateGate {
    requests: Option<mpsc::Sender<Permit>>,
}

impl RateGate {
    /// Create a gate admitting roughly `rate_per_second` calls per second.
    ///
    /// A rate `<= 0` yields a disabled gate. Must be called from within a
    /// tokio runtime because the ticker is spawned immediately.
    pub fn new(rate_per_second: i64) -> Self {
        if rate_per_second <= 0 {
            return Self::disabled();
        }

        let rate = rate_per_second.min(1_000_000_000) as u32;
        let period = Duration::from_secs(1) / rate;
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(drain(rx, period));

        tracing::debug!(rate_per_second, ?period, "rate gate started");
        Self { requests: Some(tx) }
    }

    /// A gate that never delays.
    pub const fn disabled() -> Self {
        Self { requests: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.requests.is_some()
    }

    /// Wait until the gate admits this call. Never fails.
    pub async fn acquire(&self) {
        let Some(requests) = &self.requests else {
            return;
        };

        let (permit, admitted) = oneshot::channel();
        if requests.send(permit).await.is_err() {
            return;
        }
        let _ = admitted.await;
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Answer at most one waiting caller per tick.
async fn drain(mut requests: mpsc::Receiver<Permit>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        loop {
            match requests.try_recv() {
                // A caller that gave up does not consume the tick.
                Ok(permit) => {
                    if permit.send(()).is_ok() {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::trace!("rate gate closed");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_rate_ceiling() {
        let gate = RateGate::new(10);
        let start = Instant::now();
        for _ in 0..5 {
            gate.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_is_shared_across_clones() {
        let gate = RateGate::new(20);
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                gate.acquire().await;
                gate.acquire().await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // 8 admissions at 20/s
        assert!(start.elapsed() >= Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_caller_does_not_block_others() {
        let gate = RateGate::new(1);
        let abandoned = tokio::time::timeout(Duration::from_millis(1), async {
            gate.acquire().await;
            gate.acquire().await;
        })
        .await;
        assert!(abandoned.is_err());

        tokio::time::timeout(Duration::from_secs(3), gate.acquire())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_disabled_gate_never_blocks() {
        for gate in [RateGate::new(0), RateGate::new(-3), RateGate::disabled()] {
            assert!(!gate.is_enabled());
            let start = std::time::Instant::now();
            for _ in 0..1000 {
                gate.acquire().await;
            }
            assert!(start.elapsed() < Duration::from_secs(1));
        }
    }
}
