//! Shutdown coordination for the service.

use tokio::sync::broadcast;

/// One-shot stop signal fanned out to the server and any background task.
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

    /// Subscribers that already left are ignored.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Tasks still waiting.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
