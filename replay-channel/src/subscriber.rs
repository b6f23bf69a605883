//! Consumer side of a [`ReplayChannel`](crate::ReplayChannel).

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// A subscription to a `ReplayChannel`.
///
/// Items arrive as `Result<T, E>`: `Ok` for published values, `Err` exactly
/// once when the producer reports a terminal failure. After an `Err`, or
/// after the producer side is dropped, the stream ends (`recv` returns
/// `None`).
///
/// Also implements [`futures::Stream`] for use with stream combinators.
pub struct Subscriber<T, E> {
    rx: mpsc::UnboundedReceiver<Result<T, E>>,

    /// Items pulled off the channel by a probe (`is_closed`) but not yet
    /// handed to the consumer.
    buffered: VecDeque<Result<T, E>>,

    /// Set once the underlying channel reported disconnection.
    consumed: bool,
}

impl<T, E> Subscriber<T, E> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Result<T, E>>) -> Self {
        Self {
            rx,
            buffered: VecDeque::new(),
            consumed: false,
        }
    }

    /// Receive the next item, waiting until one is available.
    ///
    /// Returns `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Result<T, E>> {
        if let Some(item) = self.buffered.pop_front() {
            return Some(item);
        }
        if self.consumed {
            return None;
        }
        match self.rx.recv().await {
            Some(item) => Some(item),
            None => {
                self.consumed = true;
                None
            }
        }
    }

    /// Receive the next item without waiting.
    ///
    /// Returns `None` when no item is currently available or the stream has
    /// ended; use [`is_closed`](Self::is_closed) to tell the two apart.
    pub fn try_recv(&mut self) -> Option<Result<T, E>> {
        if let Some(item) = self.buffered.pop_front() {
            return Some(item);
        }
        if self.consumed {
            return None;
        }
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.consumed = true;
                None
            }
        }
    }

    /// Whether the stream has ended.
    ///
    /// Probes the channel without losing items: anything found during the
    /// probe is buffered for the next `recv`/`try_recv`.
    pub fn is_closed(&mut self) -> bool {
        if self.consumed {
            return true;
        }
        if !self.buffered.is_empty() {
            return false;
        }
        match self.rx.try_recv() {
            Ok(item) => {
                self.buffered.push_back(item);
                false
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.consumed = true;
                true
            }
        }
    }
}

impl<T: Unpin, E: Unpin> Stream for Subscriber<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if let Some(item) = this.buffered.pop_front() {
            return Poll::Ready(Some(item));
        }
        if this.consumed {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(item)) => Poll::Ready(Some(item)),
            Poll::Ready(None) => {
                this.consumed = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E> std::fmt::Debug for Subscriber<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("buffered", &self.buffered.len())
            .field("consumed", &self.consumed)
            .finish()
    }
}
