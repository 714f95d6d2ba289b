use tokio::sync::mpsc;

use crate::models::TradeSignal;

/// Work item flowing from the pollers to the execution engine.
#[derive(Debug)]
pub enum QueueItem {
    Signal(Box<TradeSignal>),
    /// Graceful shutdown sentinel; the engine drains and exits.
    Stop,
}

/// Cloneable producer handle over the unbounded signal channel.
///
/// Pollers never block on submission; ordering is preserved per sender and
/// the single consumer serializes execution.
#[derive(Clone)]
pub struct ExecutionQueue {
    tx: mpsc::UnboundedSender<QueueItem>,
}

impl ExecutionQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<QueueItem>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn submit(&self, signal: TradeSignal) {
        // Send only fails when the engine is gone, which means shutdown.
        if self.tx.send(QueueItem::Signal(Box::new(signal))).is_err() {
            tracing::warn!("Execution queue closed — signal dropped");
        }
    }

    pub fn stop(&self) {
        let _ = self.tx.send(QueueItem::Stop);
    }
}
