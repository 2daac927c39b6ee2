use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tracing::{trace, warn};
use uuid::Uuid;

use super::event::Event;

/// Frames a connection may have queued before it counts as stalled.
pub const OUTBOX_CAPACITY: usize = 256;

/// Sending half of one live connection. Pushing never blocks; the websocket
/// task drains the queue into the socket in order.
///
/// When the queue is full the frame is refused and [`Overflow`] fires. The
/// connection task then ends the session, which leaves the room the same way
/// a disconnect does.
#[derive(Debug, Clone)]
pub struct Outbox {
    id: Uuid,
    tx: mpsc::Sender<String>,
    overflow: Overflow,
}

/// Fires once the peer stopped draining its queue.
#[derive(Debug, Clone, Default)]
pub struct Overflow(Arc<Notify>);

impl Overflow {
    pub async fn wait(&self) {
        self.0.notified().await
    }
}

impl Outbox {
    pub fn new() -> (Outbox, mpsc::Receiver<String>) {
        Outbox::with_capacity(OUTBOX_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Outbox, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Outbox { id: Uuid::now_v7(), tx, overflow: Overflow::default() }, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Does not keep the connection open, unlike a clone of the outbox.
    pub fn overflow(&self) -> Overflow {
        self.overflow.clone()
    }

    /// Queues an already encoded frame. Returns false when the connection is
    /// gone or stalled.
    pub fn push(&self, frame: String) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(session = %self.id, "outbound queue full, cutting the connection");
                self.overflow.0.notify_one();
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                trace!(session = %self.id, "dropping frame for closed connection");
                false
            }
        }
    }

    pub fn send(&self, event: &Event) -> bool {
        match event.encode() {
            Ok(frame) => self.push(frame),
            Err(err) => {
                warn!(session = %self.id, "failed to encode event: {err}");
                false
            }
        }
    }
}
