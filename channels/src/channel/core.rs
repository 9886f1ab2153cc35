// src/channel/core.rs

//! The shared state of a channel and the matching logic behind every operation.
//!
//! ### Design Principles:
//!
//! 1.  **Central Mutex**: a `parking_lot::Mutex` guards the buffer, both waiter
//!     queues and the lifecycle flags, so every public operation is one atomic
//!     step with respect to them.
//! 2.  **Match before queueing**: a send first looks for a waiting receiver and a
//!     receive first looks at the buffer and then at waiting senders. A waiter is
//!     only queued when nothing can be matched, so at most one of the two queues
//!     is ever non-empty.
//! 3.  **Settle outside the lock**: waiters are popped under the lock (which fixes
//!     FIFO order) but woken, and discarded values dropped, after it is released.
//!     A value handed to a receiver is stored in its cell before the lock is
//!     released, so a receive dropped at that moment can still give it back.
//! 4.  **No value is lost to a dropped receive**: a value that was matched to a
//!     receive whose future is dropped unobserved goes back to the head of the
//!     channel (see `ChannelShared::restore`).

use super::waiter::{ReceiverWaiter, SenderWaiter, Settlement, WaiterId};
use crate::error::{RecvError, SendError, TryRecvError, TrySendError};
use crate::policy::{BufferPolicy, Overflow};

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::sync::Arc;
use tracing::{debug, trace};

/// The mutex-protected state of a channel.
pub(crate) struct ChannelInternal<T> {
  /// Values accepted but not yet received, oldest first.
  pub(crate) buffer: VecDeque<T>,
  /// Suspended senders, oldest first.
  pub(crate) sender_waiters: VecDeque<SenderWaiter<T>>,
  /// Suspended receivers, oldest first.
  pub(crate) receiver_waiters: VecDeque<ReceiverWaiter<T>>,
  pub(crate) closed_for_send: bool,
  /// Implies `closed_for_send`.
  pub(crate) cancelled: bool,
  next_waiter_id: WaiterId,
}

impl<T> ChannelInternal<T> {
  fn next_id(&mut self) -> WaiterId {
    let id = self.next_waiter_id;
    self.next_waiter_id = self.next_waiter_id.wrapping_add(1);
    id
  }

  /// No value is buffered or offered, and none can arrive any more.
  pub(crate) fn is_closed_for_receive(&self) -> bool {
    self.cancelled
      || (self.closed_for_send && self.buffer.is_empty() && self.sender_waiters.is_empty())
  }
}

/// The result of offering a value, computed under the lock and completed after it.
enum Offered<T> {
  /// A waiting receiver was popped and its cell filled; it must be woken.
  Handed(Arc<Settlement<Result<T, RecvError>>>),
  Buffered,
  /// The conflated slot was overwritten; the stale value must be dropped.
  Overwrote(T),
  Full(T),
  Closed(T),
}

impl<T> Offered<T> {
  fn complete(self) -> Result<(), TrySendError<T>> {
    match self {
      Offered::Handed(cell) => {
        cell.wake();
        Ok(())
      }
      Offered::Buffered => Ok(()),
      Offered::Overwrote(stale) => {
        drop(stale);
        Ok(())
      }
      Offered::Full(value) => Err(TrySendError::Full(value)),
      Offered::Closed(value) => Err(TrySendError::Closed(value)),
    }
  }
}

/// The result of trying to take a value under the lock.
enum Taken<T> {
  /// A value, plus a sender whose value was moved into the slot it freed.
  Value(T, Option<Arc<Settlement<Result<(), SendError>>>>),
  /// A value taken straight from a suspended sender.
  FromSender(SenderWaiter<T>),
  Empty,
  Failed(RecvError),
}

/// Where a value given back by a dropped receive ended up.
enum Restored<T> {
  /// Handed to a waiting receiver, whose cell must be woken.
  Handed(Arc<Settlement<Result<T, RecvError>>>),
  Kept,
  /// Channel closed for receive, or a conflated slot holding a newer value.
  Dropped(T),
}

impl<T> Restored<T> {
  fn complete(self) {
    match self {
      Restored::Handed(cell) => cell.wake(),
      Restored::Kept => {}
      Restored::Dropped(value) => drop(value),
    }
  }
}

/// Outcome of a suspending `send` at call time.
pub(crate) enum SendAttempt {
  Done(Result<(), SendError>),
  Queued {
    id: WaiterId,
    settle: Arc<Settlement<Result<(), SendError>>>,
  },
}

/// Outcome of a suspending `receive` at call time.
pub(crate) enum RecvAttempt<T> {
  Done(Result<T, RecvError>),
  Queued {
    id: WaiterId,
    settle: Arc<Settlement<Result<T, RecvError>>>,
  },
}

/// The shared owner of a channel's state, wrapped in an `Arc` by every handle.
pub(crate) struct ChannelShared<T> {
  pub(crate) internal: Mutex<ChannelInternal<T>>,
  pub(crate) policy: BufferPolicy,
}

impl<T> fmt::Debug for ChannelShared<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let guard = self.internal.lock();
    f.debug_struct("ChannelShared")
      .field("policy", &self.policy)
      .field("buffered", &guard.buffer.len())
      .field("waiting_senders", &guard.sender_waiters.len())
      .field("waiting_receivers", &guard.receiver_waiters.len())
      .field("closed_for_send", &guard.closed_for_send)
      .field("cancelled", &guard.cancelled)
      .finish()
  }
}

impl<T> ChannelShared<T> {
  pub(crate) fn new(policy: BufferPolicy) -> Self {
    let initial = match policy.capacity() {
      Some(cap) => cap.min(32),
      None => 32,
    };
    ChannelShared {
      internal: Mutex::new(ChannelInternal {
        buffer: VecDeque::with_capacity(initial),
        sender_waiters: VecDeque::new(),
        receiver_waiters: VecDeque::new(),
        closed_for_send: false,
        cancelled: false,
        next_waiter_id: 0,
      }),
      policy,
    }
  }

  /// Tries, in order: hand the value to the oldest waiting receiver, push it into
  /// a free buffer slot, overwrite the conflated slot.
  fn offer_locked(&self, guard: &mut ChannelInternal<T>, value: T) -> Offered<T> {
    if guard.closed_for_send {
      return Offered::Closed(value);
    }

    if let Some(receiver) = guard.receiver_waiters.pop_front() {
      return Offered::Handed(receiver.fulfill(value));
    }

    if !self.policy.is_full(guard.buffer.len()) {
      guard.buffer.push_back(value);
      return Offered::Buffered;
    }

    match self.policy.overflow() {
      Overflow::Overwrite => match guard.buffer.front_mut() {
        Some(slot) => Offered::Overwrote(mem::replace(slot, value)),
        None => {
          guard.buffer.push_back(value);
          Offered::Buffered
        }
      },
      Overflow::Suspend => Offered::Full(value),
    }
  }

  /// Tries, in order: pop the buffer (refilling the freed slot from the oldest
  /// suspended sender while still open), take from a suspended sender directly.
  fn take_locked(guard: &mut ChannelInternal<T>) -> Taken<T> {
    if guard.cancelled {
      return Taken::Failed(RecvError::Cancelled);
    }

    if let Some(value) = guard.buffer.pop_front() {
      let mut refilled = None;
      // After close no value may enter the buffer; queued senders are then
      // drained directly once the buffer is empty.
      if !guard.closed_for_send {
        if let Some(sender) = guard.sender_waiters.pop_front() {
          let SenderWaiter { value: next, settle, .. } = sender;
          guard.buffer.push_back(next);
          refilled = Some(settle);
        }
      }
      return Taken::Value(value, refilled);
    }

    if let Some(sender) = guard.sender_waiters.pop_front() {
      return Taken::FromSender(sender);
    }

    if guard.closed_for_send {
      return Taken::Failed(RecvError::Closed);
    }

    Taken::Empty
  }

  /// Puts a value back at the head of the channel, ahead of everything else.
  ///
  /// The oldest waiting receiver gets it if there is one. Otherwise it goes to
  /// the front of the buffer; when the buffer has no room, its newest value
  /// moves to the front of the sender queue to make space, which keeps the
  /// overall receive order. A conflated slot that already holds a newer value
  /// keeps it, and a channel already closed for receive never reopens.
  fn restore_locked(&self, guard: &mut ChannelInternal<T>, value: T) -> Restored<T> {
    if guard.is_closed_for_receive() {
      return Restored::Dropped(value);
    }

    if let Some(receiver) = guard.receiver_waiters.pop_front() {
      return Restored::Handed(receiver.fulfill(value));
    }

    if !self.policy.is_full(guard.buffer.len()) {
      guard.buffer.push_front(value);
      return Restored::Kept;
    }

    match self.policy.overflow() {
      Overflow::Overwrite => Restored::Dropped(value),
      Overflow::Suspend => {
        let displaced = match guard.buffer.pop_back() {
          Some(newest) => {
            guard.buffer.push_front(value);
            newest
          }
          None => value,
        };
        // Nobody awaits this sender; its value was accepted long ago.
        let id = guard.next_id();
        guard.sender_waiters.push_front(SenderWaiter {
          id,
          value: displaced,
          settle: Settlement::new(),
        });
        Restored::Kept
      }
    }
  }

  fn complete_take(taken: Taken<T>) -> Result<T, TryRecvError> {
    match taken {
      Taken::Value(value, refilled) => {
        if let Some(settle) = refilled {
          settle.settle(Ok(()));
        }
        Ok(value)
      }
      Taken::FromSender(sender) => Ok(sender.deliver()),
      Taken::Empty => Err(TryRecvError::Empty),
      Taken::Failed(err) => Err(err.into()),
    }
  }

  pub(crate) fn try_send_core(&self, value: T) -> Result<(), TrySendError<T>> {
    let offered = {
      let mut guard = self.internal.lock();
      self.offer_locked(&mut guard, value)
    };
    offered.complete()
  }

  pub(crate) fn send_core(&self, value: T) -> SendAttempt {
    let offered = {
      let mut guard = self.internal.lock();
      match self.offer_locked(&mut guard, value) {
        Offered::Full(value) => {
          let id = guard.next_id();
          let settle = Settlement::new();
          guard.sender_waiters.push_back(SenderWaiter {
            id,
            value,
            settle: Arc::clone(&settle),
          });
          trace!(waiter = id, queued = guard.sender_waiters.len(), "sender suspended");
          return SendAttempt::Queued { id, settle };
        }
        offered => offered,
      }
    };

    match offered.complete() {
      Ok(()) => SendAttempt::Done(Ok(())),
      Err(_) => SendAttempt::Done(Err(SendError::Closed)),
    }
  }

  pub(crate) fn try_recv_core(&self) -> Result<T, TryRecvError> {
    let taken = {
      let mut guard = self.internal.lock();
      Self::take_locked(&mut guard)
    };
    Self::complete_take(taken)
  }

  pub(crate) fn recv_core(&self) -> RecvAttempt<T> {
    let taken = {
      let mut guard = self.internal.lock();
      match Self::take_locked(&mut guard) {
        Taken::Empty => {
          let id = guard.next_id();
          let settle = Settlement::new();
          guard.receiver_waiters.push_back(ReceiverWaiter {
            id,
            settle: Arc::clone(&settle),
          });
          trace!(waiter = id, queued = guard.receiver_waiters.len(), "receiver suspended");
          return RecvAttempt::Queued { id, settle };
        }
        taken => taken,
      }
    };

    match Self::complete_take(taken) {
      Ok(value) => RecvAttempt::Done(Ok(value)),
      Err(TryRecvError::Cancelled) => RecvAttempt::Done(Err(RecvError::Cancelled)),
      Err(TryRecvError::Closed) => RecvAttempt::Done(Err(RecvError::Closed)),
      Err(TryRecvError::Empty) => unreachable!("an empty take is queued under the lock"),
    }
  }

  /// Closes the channel for send and rejects every suspended receiver.
  /// Returns `false` if it was already closed.
  pub(crate) fn close(&self) -> bool {
    let receivers = {
      let mut guard = self.internal.lock();
      if guard.closed_for_send {
        return false;
      }
      guard.closed_for_send = true;
      debug!(
        policy = %self.policy,
        buffered = guard.buffer.len(),
        waiting_senders = guard.sender_waiters.len(),
        waiting_receivers = guard.receiver_waiters.len(),
        "channel closed"
      );
      mem::take(&mut guard.receiver_waiters)
    };

    for receiver in receivers {
      receiver.reject(RecvError::Closed);
    }
    true
  }

  /// Cancels the channel: rejects suspended receivers, resolves suspended
  /// senders without delivery and discards the buffer.
  /// Returns `false` if it was already cancelled.
  pub(crate) fn cancel(&self) -> bool {
    let (receivers, senders, buffer) = {
      let mut guard = self.internal.lock();
      if guard.cancelled {
        return false;
      }
      guard.cancelled = true;
      guard.closed_for_send = true;
      debug!(
        policy = %self.policy,
        discarded = guard.buffer.len(),
        waiting_senders = guard.sender_waiters.len(),
        waiting_receivers = guard.receiver_waiters.len(),
        "channel cancelled"
      );
      (
        mem::take(&mut guard.receiver_waiters),
        mem::take(&mut guard.sender_waiters),
        mem::take(&mut guard.buffer),
      )
    };

    for receiver in receivers {
      receiver.reject(RecvError::Cancelled);
    }
    for sender in senders {
      sender.discard();
    }
    drop(buffer);
    true
  }

  /// Removes a suspended sender whose future was dropped, returning its value.
  /// `None` if the sender was already settled.
  pub(crate) fn withdraw_sender(&self, id: WaiterId) -> Option<T> {
    let mut guard = self.internal.lock();
    let pos = guard.sender_waiters.iter().position(|w| w.id == id)?;
    trace!(waiter = id, "sender withdrawn");
    guard.sender_waiters.remove(pos).map(|w| w.value)
  }

  /// Returns a value taken by a receive whose future was dropped before
  /// yielding it.
  pub(crate) fn restore(&self, value: T) {
    let restored = {
      let mut guard = self.internal.lock();
      trace!("undelivered value restored");
      self.restore_locked(&mut guard, value)
    };
    restored.complete();
  }

  /// Removes a suspended receiver whose future was dropped. If a value was
  /// already handed to it, the value is restored to the channel.
  pub(crate) fn withdraw_receiver(&self, id: WaiterId, settle: &Settlement<Result<T, RecvError>>) {
    let restored = {
      let mut guard = self.internal.lock();
      if let Some(pos) = guard.receiver_waiters.iter().position(|w| w.id == id) {
        guard.receiver_waiters.remove(pos);
        trace!(waiter = id, "receiver withdrawn");
        return;
      }
      // Cells holding values are only filled under this lock, so an
      // undelivered value is always visible here.
      match settle.take() {
        Some(Ok(value)) => {
          trace!(waiter = id, "undelivered value restored");
          self.restore_locked(&mut guard, value)
        }
        _ => return,
      }
    };
    restored.complete();
  }
}
