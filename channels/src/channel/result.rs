// src/channel/result.rs

use crate::error::RecvError;

/// The outcome of [`Channel::receive_catching`](crate::Channel::receive_catching):
/// either a value or the reason no value will ever arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelResult<T> {
  /// A value was received.
  Value(T),
  /// The channel is closed and drained, or cancelled.
  Closed(RecvError),
}

impl<T> ChannelResult<T> {
  /// Returns `true` if no value was received because the channel is closed.
  #[inline]
  pub fn is_closed(&self) -> bool {
    matches!(self, ChannelResult::Closed(_))
  }

  /// Returns `true` if a value was received.
  #[inline]
  pub fn is_success(&self) -> bool {
    matches!(self, ChannelResult::Value(_))
  }

  /// Borrows the received value, if any.
  pub fn value(&self) -> Option<&T> {
    match self {
      ChannelResult::Value(v) => Some(v),
      ChannelResult::Closed(_) => None,
    }
  }

  /// The received value, or `None` if the channel is closed.
  pub fn into_value(self) -> Option<T> {
    match self {
      ChannelResult::Value(v) => Some(v),
      ChannelResult::Closed(_) => None,
    }
  }

  /// Why the channel is closed, if it is.
  pub fn closed_cause(&self) -> Option<RecvError> {
    match self {
      ChannelResult::Value(_) => None,
      ChannelResult::Closed(err) => Some(*err),
    }
  }

  /// Converts into the `Result` a plain `receive` would have produced.
  pub fn into_result(self) -> Result<T, RecvError> {
    self.into()
  }
}

impl<T> From<Result<T, RecvError>> for ChannelResult<T> {
  fn from(res: Result<T, RecvError>) -> Self {
    match res {
      Ok(v) => ChannelResult::Value(v),
      Err(err) => ChannelResult::Closed(err),
    }
  }
}

impl<T> From<ChannelResult<T>> for Result<T, RecvError> {
  fn from(res: ChannelResult<T>) -> Self {
    match res {
      ChannelResult::Value(v) => Ok(v),
      ChannelResult::Closed(err) => Err(err),
    }
  }
}
