//! The shared channel state and producer surface.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::subscriber::Subscriber;

/// Shared state between the producer and all subscribers.
struct Shared<T, E> {
    /// Most recent item, replayed to new subscribers.
    last: Option<Result<T, E>>,

    /// Live subscriber queues. Entries for dropped subscribers are pruned
    /// on the next publish.
    listeners: Vec<mpsc::UnboundedSender<Result<T, E>>>,
}

/// A multicast channel with replay of the most recent item.
///
/// Cloning the channel produces another handle to the same underlying state,
/// so a producer task and a subscription-handing-out handle can coexist.
///
/// # Semantics
///
/// - `publish` delivers the value to every live subscriber and stores it as
///   the current cell value.
/// - `subscribe` registers a new listener; if the cell holds a value it is
///   delivered immediately, before anything published later.
/// - `fail` delivers the error to every subscriber and closes their streams.
///   Subscribers attaching after a failure receive the error immediately and
///   end. `reset` clears the cell so the channel can be reused for a fresh
///   run of values.
///
/// # Example
///
/// ```rust
/// use replay_channel::ReplayChannel;
///
/// let channel: ReplayChannel<u32, String> = ReplayChannel::new();
/// channel.publish(1);
///
/// // Late subscriber still sees the latest value.
/// let mut sub = channel.subscribe();
/// assert_eq!(sub.try_recv(), Some(Ok(1)));
/// ```
pub struct ReplayChannel<T, E> {
    shared: Arc<Mutex<Shared<T, E>>>,
}

impl<T, E> ReplayChannel<T, E>
where
    T: Clone,
    E: Clone,
{
    /// Create a new channel with an empty cell and no subscribers.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                last: None,
                listeners: Vec::new(),
            })),
        }
    }

    /// Publish a value to all subscribers and store it in the cell.
    pub fn publish(&self, value: T) {
        let mut shared = self.shared.lock();
        shared.last = Some(Ok(value.clone()));
        shared
            .listeners
            .retain(|tx| tx.send(Ok(value.clone())).is_ok());
    }

    /// Deliver a terminal error to all subscribers and end their streams.
    ///
    /// The error becomes the cell value, so subscribers attaching afterwards
    /// observe it too (and end immediately), until `reset` or the next
    /// `publish` replaces it.
    pub fn fail(&self, error: E) {
        let mut shared = self.shared.lock();
        shared.last = Some(Err(error.clone()));
        // Dropping the senders closes every subscriber's stream once the
        // error has been consumed.
        for tx in shared.listeners.drain(..) {
            let _ = tx.send(Err(error.clone()));
        }
    }

    /// Clear the cell without touching live subscribers.
    pub fn reset(&self) {
        self.shared.lock().last = None;
    }

    /// Register a new subscriber.
    ///
    /// If the cell currently holds a value, the subscriber receives it
    /// immediately. If it holds a terminal error, the subscriber receives the
    /// error and its stream ends without being registered for future items.
    pub fn subscribe(&self) -> Subscriber<T, E> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut shared = self.shared.lock();
        match &shared.last {
            Some(Ok(value)) => {
                let _ = tx.send(Ok(value.clone()));
                shared.listeners.push(tx);
            }
            Some(Err(error)) => {
                // Terminal: replay the error, do not register. The sender is
                // dropped here, ending the stream after the error.
                let _ = tx.send(Err(error.clone()));
            }
            None => shared.listeners.push(tx),
        }
        Subscriber::new(rx)
    }

    /// The most recently published value, if the cell holds one.
    ///
    /// Returns `None` when nothing has been published yet or the channel is
    /// in a failed state.
    pub fn latest(&self) -> Option<T> {
        match &self.shared.lock().last {
            Some(Ok(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Number of currently registered subscribers.
    ///
    /// Subscribers that were dropped but not yet pruned by a publish are
    /// still counted.
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().listeners.len()
    }
}

impl<T, E> Default for ReplayChannel<T, E>
where
    T: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for ReplayChannel<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> std::fmt::Debug for ReplayChannel<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("ReplayChannel")
            .field("has_value", &shared.last.is_some())
            .field("subscriber_count", &shared.listeners.len())
            .finish()
    }
}
