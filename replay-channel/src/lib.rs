//! # replay-channel
//!
//! A small multicast primitive: one producer, any number of consumers, with
//! replay-of-last-value semantics. The channel keeps a single current-value
//! cell; a subscriber attaching after a value was published immediately
//! receives that value before any newer ones. A terminal error is delivered
//! to every subscriber and ends their streams.
//!
//! This crate is intentionally generic and carries no domain dependencies.

mod channel;
mod subscriber;

pub use channel::ReplayChannel;
pub use subscriber::Subscriber;
