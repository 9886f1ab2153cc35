// src/channel/stream.rs
//! Lazy, single-pass iteration over a channel.

use super::future::ReceiveCatchingFuture;
use super::result::ChannelResult;
use super::Channel;

use futures_core::stream::{FusedStream, Stream};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A [`Stream`] of the values received from a [`Channel`].
///
/// Each item is one `receive_catching`. The stream ends, without error, once the
/// channel is closed and drained or cancelled, and it never restarts. While the
/// channel stays open the stream simply waits for the next value.
#[must_use = "streams do nothing unless polled"]
#[derive(Debug)]
pub struct ChannelStream<T> {
  channel: Channel<T>,
  pending: Option<ReceiveCatchingFuture<T>>,
  terminated: bool,
}

impl<T> ChannelStream<T> {
  pub(super) fn new(channel: Channel<T>) -> Self {
    ChannelStream {
      channel,
      pending: None,
      terminated: false,
    }
  }

  /// The channel this stream receives from.
  pub fn channel(&self) -> &Channel<T> {
    &self.channel
  }
}

impl<T> Stream for ChannelStream<T> {
  type Item = T;

  fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let this = &mut *self;
    if this.terminated {
      return Poll::Ready(None);
    }

    let channel = &this.channel;
    let pending = this.pending.get_or_insert_with(|| channel.receive_catching());
    let polled = Pin::new(pending).poll(cx);
    match polled {
      Poll::Ready(ChannelResult::Value(value)) => {
        this.pending = None;
        Poll::Ready(Some(value))
      }
      Poll::Ready(ChannelResult::Closed(_)) => {
        this.pending = None;
        this.terminated = true;
        Poll::Ready(None)
      }
      Poll::Pending => Poll::Pending,
    }
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    if self.terminated {
      (0, Some(0))
    } else {
      (0, None)
    }
  }
}

impl<T> FusedStream for ChannelStream<T> {
  fn is_terminated(&self) -> bool {
    self.terminated
  }
}
