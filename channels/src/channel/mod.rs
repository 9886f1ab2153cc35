// src/channel/mod.rs

//! A CSP-style channel with selectable buffering and explicit close/cancel.
//!
//! A [`Channel`] is a single cloneable handle: every clone can send, receive,
//! close and cancel. Operations that cannot complete at once leave a waiter in
//! one of two FIFO queues and return a future that a later matching operation
//! (or `close`/`cancel`) settles.
//!
//! ### Buffering
//!
//! The [`BufferPolicy`] decides what a send does when no receiver is waiting:
//!
//! - **Rendezvous**: the sender suspends until a receiver takes the value.
//! - **Bounded(N)**: up to `N` values are buffered, then senders suspend.
//! - **Unlimited**: values are always buffered; sends never suspend.
//! - **Conflated**: one slot holding the latest value; older unread values are
//!   replaced and sends never suspend.
//!
//! ### Close vs. cancel
//!
//! [`close`](Channel::close) stops new sends but lets receivers drain whatever
//! was already sent, including values of senders that were suspended at the
//! time of closing. Receivers already waiting are rejected with
//! [`RecvError::Closed`] since nothing new can arrive for them.
//!
//! [`cancel`](Channel::cancel) abandons everything: buffered values are
//! discarded, waiting receivers fail with [`RecvError::Cancelled`], and waiting
//! senders complete successfully without their value being delivered.
//!
//! ### Eager operations
//!
//! Unlike most Rust futures, `send` and `receive` take effect when called and
//! the returned future only reports the outcome. This is what makes matching
//! strictly FIFO: queue position is fixed at call time, not at first poll.

mod core;
mod future;
mod result;
mod stream;
mod waiter;

#[cfg(test)]
mod tests;

pub use self::future::{ReceiveCatchingFuture, ReceiveFuture, SendFuture};
pub use self::result::ChannelResult;
pub use self::stream::ChannelStream;

use self::core::ChannelShared;
use crate::error::{TryRecvError, TrySendError};
#[cfg(doc)]
use crate::error::RecvError;
use crate::policy::BufferPolicy;

use std::fmt;
use std::sync::Arc;

/// Where a channel is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
  /// Accepting sends.
  Open,
  /// Closed for send; values sent before the close are still receivable.
  Closing,
  /// Closed and fully drained. Every receive fails.
  Drained,
  /// Cancelled. Every receive fails and nothing further is delivered.
  Cancelled,
}

/// A typed channel handle. Cloning it yields another handle to the same channel.
pub struct Channel<T> {
  shared: Arc<ChannelShared<T>>,
}

impl<T> Channel<T> {
  /// Creates a channel from a capacity value: [`RENDEZVOUS`](crate::RENDEZVOUS),
  /// [`UNLIMITED`](crate::UNLIMITED), [`CONFLATED`](crate::CONFLATED), or any
  /// other number for a bounded buffer of that size.
  pub fn new(capacity: usize) -> Self {
    Self::with_policy(BufferPolicy::from_capacity(capacity))
  }

  /// Creates a channel with the given buffering policy.
  pub fn with_policy(policy: BufferPolicy) -> Self {
    Channel {
      shared: Arc::new(ChannelShared::new(policy)),
    }
  }

  /// Creates a channel without a buffer.
  pub fn rendezvous() -> Self {
    Self::with_policy(BufferPolicy::Rendezvous)
  }

  /// Creates a channel buffering up to `capacity` values. A capacity of `0`
  /// creates a rendezvous channel.
  pub fn bounded(capacity: usize) -> Self {
    Self::with_policy(BufferPolicy::bounded(capacity))
  }

  /// Creates a channel whose buffer grows without bound.
  ///
  /// In reality, the channel is bounded by available memory.
  pub fn unlimited() -> Self {
    Self::with_policy(BufferPolicy::Unlimited)
  }

  /// Creates a channel that keeps only the most recent unread value.
  pub fn conflated() -> Self {
    Self::with_policy(BufferPolicy::Conflated)
  }

  /// Sends a value.
  ///
  /// The value is handed to the oldest waiting receiver, buffered, or (for a
  /// conflated channel) written over the unread value, and the future is ready
  /// at once. Otherwise the sender is queued and the future completes when a
  /// receive takes the value or the channel is cancelled.
  ///
  /// Fails with [`SendError::Closed`](crate::SendError::Closed) if the channel
  /// was already closed or cancelled; the value is dropped.
  ///
  /// Dropping the future while it is suspended withdraws the value.
  pub fn send(&self, value: T) -> SendFuture<T> {
    SendFuture::new(Arc::clone(&self.shared), value)
  }

  /// Sends a value if that is possible without suspending.
  pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
    self.shared.try_send_core(value)
  }

  /// Receives the next value.
  ///
  /// Takes the oldest buffered value, or the value of the oldest suspended
  /// sender. Otherwise the receive is queued until a value is sent, or until the
  /// channel is closed ([`RecvError::Closed`]) or cancelled
  /// ([`RecvError::Cancelled`]).
  ///
  /// Dropping the future before it yields gives any value it already took
  /// back to the channel, ahead of the values still waiting.
  pub fn receive(&self) -> ReceiveFuture<T> {
    ReceiveFuture::new(Arc::clone(&self.shared))
  }

  /// Like [`receive`](Self::receive), but a closed channel yields
  /// [`ChannelResult::Closed`] instead of an error.
  pub fn receive_catching(&self) -> ReceiveCatchingFuture<T> {
    ReceiveCatchingFuture::new(Arc::clone(&self.shared))
  }

  /// Receives a value if one is available without suspending.
  pub fn try_receive(&self) -> Result<T, TryRecvError> {
    self.shared.try_recv_core()
  }

  /// Closes the channel for sending.
  ///
  /// Already-sent values stay receivable. Suspended receivers are rejected.
  /// Returns `true` if this call closed the channel, `false` if it was already
  /// closed or cancelled.
  pub fn close(&self) -> bool {
    self.shared.close()
  }

  /// Cancels the channel.
  ///
  /// Discards buffered values, rejects suspended receivers and completes
  /// suspended senders without delivering their values. Returns `true` if this
  /// call cancelled the channel, `false` if it was already cancelled.
  pub fn cancel(&self) -> bool {
    self.shared.cancel()
  }

  /// Returns `true` once `close` or `cancel` has been called.
  pub fn is_closed_for_send(&self) -> bool {
    self.shared.internal.lock().closed_for_send
  }

  /// Returns `true` once no value can ever be received again.
  pub fn is_closed_for_receive(&self) -> bool {
    self.shared.internal.lock().is_closed_for_receive()
  }

  /// Returns `true` once `cancel` has been called.
  pub fn is_cancelled(&self) -> bool {
    self.shared.internal.lock().cancelled
  }

  /// The channel's current lifecycle state.
  pub fn state(&self) -> ChannelState {
    let guard = self.shared.internal.lock();
    if guard.cancelled {
      ChannelState::Cancelled
    } else if !guard.closed_for_send {
      ChannelState::Open
    } else if guard.is_closed_for_receive() {
      ChannelState::Drained
    } else {
      ChannelState::Closing
    }
  }

  /// Returns the number of values currently buffered.
  /// Values held by suspended senders are not counted.
  #[inline]
  pub fn len(&self) -> usize {
    self.shared.internal.lock().buffer.len()
  }

  /// Returns `true` if a receive issued now would find nothing to take.
  #[inline]
  pub fn is_empty(&self) -> bool {
    let guard = self.shared.internal.lock();
    guard.buffer.is_empty() && guard.sender_waiters.is_empty()
  }

  /// Returns the buffer capacity. `None` for unlimited channels.
  pub fn capacity(&self) -> Option<usize> {
    self.shared.policy.capacity()
  }

  /// Returns the buffering policy the channel was created with.
  pub fn policy(&self) -> BufferPolicy {
    self.shared.policy
  }

  /// Returns a stream over the values received from this channel.
  pub fn stream(&self) -> ChannelStream<T> {
    ChannelStream::new(self.clone())
  }

  /// Turns this handle into a stream over the received values.
  pub fn into_stream(self) -> ChannelStream<T> {
    ChannelStream::new(self)
  }
}

impl<T> Clone for Channel<T> {
  fn clone(&self) -> Self {
    Channel {
      shared: Arc::clone(&self.shared),
    }
  }
}

impl<T> Default for Channel<T> {
  fn default() -> Self {
    Self::rendezvous()
  }
}

impl<T> fmt::Debug for Channel<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Channel").field("shared", &self.shared).finish()
  }
}
