// src/channel/future.rs
//! Futures returned by the suspending channel operations.
//!
//! The matching step of `send`/`receive` runs when the method is called, so the
//! returned future only observes how that call was settled. A future that is
//! still waiting withdraws its waiter from the channel when dropped, and a
//! receive dropped while holding an unyielded value returns it to the channel.

use super::core::{ChannelShared, RecvAttempt, SendAttempt};
use super::result::ChannelResult;
use super::waiter::{Settlement, WaiterId};
use crate::error::{RecvError, SendError};

use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

enum Stage<R> {
  /// Settled when the operation was issued.
  Ready(R),
  /// Queued as a waiter.
  Waiting {
    id: WaiterId,
    settle: Arc<Settlement<R>>,
  },
  Finished,
}

impl<R> Stage<R> {
  fn poll_stage(&mut self, cx: &mut Context<'_>, what: &'static str) -> Poll<R> {
    if let Stage::Waiting { settle, .. } = self {
      let outcome = match settle.poll_settled(cx) {
        Poll::Ready(outcome) => outcome,
        Poll::Pending => return Poll::Pending,
      };
      *self = Stage::Finished;
      return Poll::Ready(outcome);
    }

    match mem::replace(self, Stage::Finished) {
      Stage::Ready(outcome) => Poll::Ready(outcome),
      Stage::Finished => panic!("{} polled after completion", what),
      Stage::Waiting { .. } => unreachable!(),
    }
  }

  fn is_waiting(&self) -> bool {
    matches!(self, Stage::Waiting { .. })
  }
}

// --- SendFuture ---

/// A future that completes when a value passed to [`Channel::send`](crate::Channel::send)
/// has been accepted, or when the channel was cancelled while the send was suspended.
#[must_use = "dropping a suspended send withdraws the value"]
pub struct SendFuture<T> {
  shared: Arc<ChannelShared<T>>,
  stage: Stage<Result<(), SendError>>,
}

impl<T> SendFuture<T> {
  pub(super) fn new(shared: Arc<ChannelShared<T>>, value: T) -> Self {
    let stage = match shared.send_core(value) {
      SendAttempt::Done(res) => Stage::Ready(res),
      SendAttempt::Queued { id, settle } => Stage::Waiting { id, settle },
    };
    SendFuture { shared, stage }
  }

  /// Returns `true` while the value sits in the channel's sender queue.
  pub fn is_suspended(&self) -> bool {
    self.stage.is_waiting()
  }
}

impl<T> Future for SendFuture<T> {
  type Output = Result<(), SendError>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    self.stage.poll_stage(cx, "SendFuture")
  }
}

impl<T> Drop for SendFuture<T> {
  fn drop(&mut self) {
    if let Stage::Waiting { id, .. } = self.stage {
      // The value is dropped here, outside the channel lock.
      let _withdrawn = self.shared.withdraw_sender(id);
    }
  }
}

// No field is ever pinned.
impl<T> Unpin for SendFuture<T> {}

impl<T> fmt::Debug for SendFuture<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SendFuture")
      .field("suspended", &self.is_suspended())
      .finish_non_exhaustive()
  }
}

// --- ReceiveFuture ---

/// A future that completes with the next value from the channel, or with a
/// [`RecvError`] once no value can ever arrive.
#[must_use = "futures do nothing unless you .await or poll them"]
pub struct ReceiveFuture<T> {
  shared: Arc<ChannelShared<T>>,
  stage: Stage<Result<T, RecvError>>,
}

impl<T> ReceiveFuture<T> {
  pub(super) fn new(shared: Arc<ChannelShared<T>>) -> Self {
    let stage = match shared.recv_core() {
      RecvAttempt::Done(res) => Stage::Ready(res),
      RecvAttempt::Queued { id, settle } => Stage::Waiting { id, settle },
    };
    ReceiveFuture { shared, stage }
  }

  /// Returns `true` while this receive sits in the channel's receiver queue.
  pub fn is_suspended(&self) -> bool {
    self.stage.is_waiting()
  }
}

impl<T> Future for ReceiveFuture<T> {
  type Output = Result<T, RecvError>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    self.stage.poll_stage(cx, "ReceiveFuture")
  }
}

impl<T> Drop for ReceiveFuture<T> {
  fn drop(&mut self) {
    // A value this receive took but never yielded goes back to the channel.
    match mem::replace(&mut self.stage, Stage::Finished) {
      Stage::Ready(Ok(value)) => self.shared.restore(value),
      Stage::Waiting { id, settle } => self.shared.withdraw_receiver(id, &settle),
      Stage::Ready(Err(_)) | Stage::Finished => {}
    }
  }
}

impl<T> Unpin for ReceiveFuture<T> {}

impl<T> fmt::Debug for ReceiveFuture<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ReceiveFuture")
      .field("suspended", &self.is_suspended())
      .finish_non_exhaustive()
  }
}

// --- ReceiveCatchingFuture ---

/// Like [`ReceiveFuture`], but reports a closed channel as
/// [`ChannelResult::Closed`] instead of an error.
#[must_use = "futures do nothing unless you .await or poll them"]
#[derive(Debug)]
pub struct ReceiveCatchingFuture<T> {
  inner: ReceiveFuture<T>,
}

impl<T> ReceiveCatchingFuture<T> {
  pub(super) fn new(shared: Arc<ChannelShared<T>>) -> Self {
    ReceiveCatchingFuture {
      inner: ReceiveFuture::new(shared),
    }
  }

  /// Returns `true` while this receive sits in the channel's receiver queue.
  pub fn is_suspended(&self) -> bool {
    self.inner.is_suspended()
  }
}

impl<T> Future for ReceiveCatchingFuture<T> {
  type Output = ChannelResult<T>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    Pin::new(&mut self.inner).poll(cx).map(ChannelResult::from)
  }
}
