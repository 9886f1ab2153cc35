// src/error.rs

//! Error types returned by channel operations.

use core::fmt;

// Generates `into_inner`, `Display` and `Error` for error enums whose every
// variant carries the rejected value.
macro_rules! impl_error_for_enum_with_inner {
    (
        $enum_name:ident < $generic_param:ident >,
        $($variant:ident ( $message:expr ) ),+
        $(,)?
    ) => {
        impl<$generic_param> $enum_name<$generic_param> {
            /// Consumes the error, returning the value that could not be sent.
            #[inline]
            pub fn into_inner(self) -> $generic_param {
                match self {
                    $( $enum_name::$variant(v) => v, )+
                }
            }
        }

        impl<$generic_param> fmt::Display for $enum_name<$generic_param> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( $enum_name::$variant(_) => f.write_str($message), )+
                }
            }
        }

        impl<$generic_param: fmt::Debug> std::error::Error for $enum_name<$generic_param> {}
    };
}

/// Error returned by [`Channel::try_send`](crate::Channel::try_send) when the value
/// could not be accepted immediately. The value is handed back.
#[derive(PartialEq, Eq, Clone)]
pub enum TrySendError<T> {
  /// No receiver is waiting and the buffer is full (always the case for a
  /// rendezvous channel without a waiting receiver).
  Full(T),
  /// The channel was closed or cancelled.
  Closed(T),
}

impl<T> fmt::Debug for TrySendError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrySendError::Full(_) => write!(f, "TrySendError::Full(..)"),
      TrySendError::Closed(_) => write!(f, "TrySendError::Closed(..)"),
    }
  }
}

impl_error_for_enum_with_inner!(
  TrySendError<T>,
  Full("channel full"),
  Closed("channel closed for send"),
);

impl<T> TrySendError<T> {
  /// Returns `true` if the send failed because the buffer was full.
  pub fn is_full(&self) -> bool {
    matches!(self, TrySendError::Full(_))
  }

  /// Returns `true` if the send failed because the channel is closed.
  pub fn is_closed(&self) -> bool {
    matches!(self, TrySendError::Closed(_))
  }
}

/// Error produced by a [`SendFuture`](crate::SendFuture).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SendError {
  /// `send` was called after `close()` or `cancel()`. Nothing was buffered.
  Closed,
}
impl std::error::Error for SendError {}
impl fmt::Display for SendError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SendError::Closed => write!(f, "channel closed for send"),
    }
  }
}

/// Error produced by a [`ReceiveFuture`](crate::ReceiveFuture) when no value can
/// ever arrive.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RecvError {
  /// The channel was closed and everything sent before the close was received.
  Closed,
  /// The channel was cancelled. Buffered values were discarded.
  Cancelled,
}
impl std::error::Error for RecvError {}
impl fmt::Display for RecvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RecvError::Closed => write!(f, "channel closed for receive"),
      RecvError::Cancelled => write!(f, "channel cancelled"),
    }
  }
}

/// Error returned by [`Channel::try_receive`](crate::Channel::try_receive).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TryRecvError {
  /// Nothing is buffered and no sender is waiting, but the channel is still open.
  Empty,
  /// The channel is closed and drained.
  Closed,
  /// The channel was cancelled.
  Cancelled,
}
impl std::error::Error for TryRecvError {}
impl fmt::Display for TryRecvError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TryRecvError::Empty => write!(f, "channel empty"),
      TryRecvError::Closed => write!(f, "channel closed for receive"),
      TryRecvError::Cancelled => write!(f, "channel cancelled"),
    }
  }
}

impl From<RecvError> for TryRecvError {
  fn from(err: RecvError) -> Self {
    match err {
      RecvError::Closed => TryRecvError::Closed,
      RecvError::Cancelled => TryRecvError::Cancelled,
    }
  }
}
