// src/channel/waiter.rs

//! Waiter records and the one-shot cells that settle them.
//!
//! A suspended `send`/`receive` leaves a waiter in the channel's queue and keeps
//! the other half, an `Arc<Settlement<R>>`, inside its future. Whoever pops the
//! waiter (a matching operation, `close` or `cancel`) settles the cell exactly once.

use crate::async_util::AtomicWaker;
use crate::error::{RecvError, SendError};

use core::task::{Context, Poll};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Identifies a waiter so a dropped future can withdraw it from its queue.
pub(crate) type WaiterId = u64;

/// A single-use result slot shared between a queued waiter and its future.
pub(crate) struct Settlement<R> {
  outcome: Mutex<Option<R>>,
  waker: AtomicWaker,
}

impl<R> Settlement<R> {
  pub(crate) fn new() -> Arc<Self> {
    Arc::new(Settlement {
      outcome: Mutex::new(None),
      waker: AtomicWaker::new(),
    })
  }

  /// Stores the outcome and wakes the task awaiting it.
  pub(crate) fn settle(&self, outcome: R) {
    self.fulfill(outcome);
    self.wake();
  }

  /// Stores the outcome without waking anyone; pair with [`wake`](Self::wake).
  pub(crate) fn fulfill(&self, outcome: R) {
    let mut slot = self.outcome.lock();
    debug_assert!(slot.is_none(), "waiter settled twice");
    *slot = Some(outcome);
  }

  #[inline]
  pub(crate) fn wake(&self) {
    self.waker.wake();
  }

  /// Takes an outcome that was stored but never polled.
  pub(crate) fn take(&self) -> Option<R> {
    self.outcome.lock().take()
  }

  pub(crate) fn poll_settled(&self, cx: &mut Context<'_>) -> Poll<R> {
    // Register before checking so a settle racing with us is never missed.
    self.waker.register(cx.waker());
    match self.outcome.lock().take() {
      Some(outcome) => Poll::Ready(outcome),
      None => Poll::Pending,
    }
  }
}

impl<R> fmt::Debug for Settlement<R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Settlement")
      .field("settled", &self.outcome.lock().is_some())
      .finish_non_exhaustive()
  }
}

/// A suspended send: the offered value plus the cell its future waits on.
///
/// Settled with `Ok(())` both when the value is taken and when the channel is
/// cancelled while the waiter is still queued.
pub(crate) struct SenderWaiter<T> {
  pub(crate) id: WaiterId,
  pub(crate) value: T,
  pub(crate) settle: Arc<Settlement<Result<(), SendError>>>,
}

impl<T> SenderWaiter<T> {
  /// Settles the sender and hands its value to the caller.
  #[inline]
  pub(crate) fn deliver(self) -> T {
    self.settle.settle(Ok(()));
    self.value
  }

  /// Settles the sender successfully without delivering its value.
  #[inline]
  pub(crate) fn discard(self) {
    let SenderWaiter { value, settle, .. } = self;
    settle.settle(Ok(()));
    drop(value);
  }
}

/// A suspended receive waiting for a value or a terminal transition.
pub(crate) struct ReceiverWaiter<T> {
  pub(crate) id: WaiterId,
  pub(crate) settle: Arc<Settlement<Result<T, RecvError>>>,
}

impl<T> ReceiverWaiter<T> {
  /// Stores the value in the receiver's cell and returns the cell to wake.
  ///
  /// Must run under the channel lock: a future dropped at the same time takes
  /// the value back out of the cell under that lock instead of losing it.
  #[inline]
  pub(crate) fn fulfill(self, value: T) -> Arc<Settlement<Result<T, RecvError>>> {
    self.settle.fulfill(Ok(value));
    self.settle
  }

  #[inline]
  pub(crate) fn reject(self, err: RecvError) {
    self.settle.settle(Err(err));
  }
}

impl<T> fmt::Debug for SenderWaiter<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SenderWaiter").field("id", &self.id).finish_non_exhaustive()
  }
}

impl<T> fmt::Debug for ReceiverWaiter<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ReceiverWaiter").field("id", &self.id).finish_non_exhaustive()
  }
}
