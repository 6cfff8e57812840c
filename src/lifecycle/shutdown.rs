//! Graceful shutdown coordination.

use tokio::sync::broadcast;

/// Broadcast trigger shared by the server, the config reloader and tests.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscriber to stop. Safe to call more than once.
    pub fn trigger(&self) {
        if self.tx.send(()).is_err() {
            tracing::debug!("Shutdown triggered with no listeners");
        }
    }

    /// Tasks still waiting on the signal.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Resolves on `trigger()` or Ctrl+C, whichever comes first.
    pub async fn signalled(&self) {
        let mut rx = self.subscribe();
        tokio::select! {
            _ = rx.recv() => tracing::info!("Shutdown requested"),
            res = tokio::signal::ctrl_c() => match res {
                Ok(()) => tracing::info!("Ctrl+C received"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C; waiting for trigger");
                    let _ = rx.recv().await;
                }
            },
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_waiter() {
        let shutdown = Shutdown::new();
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.signalled().await })
        };

        // Let the waiter subscribe before triggering.
        while shutdown.receiver_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter did not finish")
            .unwrap();
    }
}
