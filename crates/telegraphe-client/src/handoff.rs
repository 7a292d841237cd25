//! Single-slot hand-off between the transport and the dispatcher.
//!
//! This is a rendezvous mailbox, not a FIFO: at most one decoded frame is
//! ever in flight. A producer that outruns the consumer blocks on the next
//! `push` until the previous value is popped, which is the engine's only
//! backpressure mechanism and the source of its ordering guarantee (the
//! dispatcher finishes frame N before frame N+1 is handed over).

use tokio::sync::{Mutex, Notify};

/// Strictly-alternating single-producer / single-consumer slot.
pub struct HandoffQueue<T> {
    slot: Mutex<Option<T>>,
    available: Notify,
    consumed: Notify,
}

impl<T> HandoffQueue<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            available: Notify::new(),
            consumed: Notify::new(),
        }
    }

    /// Hand a value to the consumer.
    ///
    /// Waits until any previously pushed value has been popped, then
    /// records `value` and wakes a pending [`HandoffQueue::pop`].
    pub async fn push(&self, value: T) {
        let mut value = Some(value);
        loop {
            {
                let mut slot = self.slot.lock().await;
                if slot.is_none() {
                    *slot = value.take();
                    self.available.notify_one();
                    return;
                }
            }
            self.consumed.notified().await;
        }
    }

    /// Take the next value, waking a producer blocked in
    /// [`HandoffQueue::push`].
    pub async fn pop(&self) -> T {
        loop {
            {
                let mut slot = self.slot.lock().await;
                if let Some(value) = slot.take() {
                    self.consumed.notify_one();
                    return value;
                }
            }
            self.available.notified().await;
        }
    }
}

impl<T> Default for HandoffQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pop values forever and feed them to `handle`, one at a time.
///
/// The handler runs to completion before the next value is accepted; the
/// embedding connection manager owns any timeout or shutdown policy around
/// this loop.
pub async fn pump<T>(queue: &HandoffQueue<T>, mut handle: impl FnMut(T)) {
    loop {
        handle(queue.pop().await);
    }
}
