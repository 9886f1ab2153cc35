//! CSP-style channels for cooperative async tasks.
//!
//! A [`Channel`] moves values between tasks under one of four buffering
//! policies (rendezvous, bounded, unlimited, conflated), with strict FIFO
//! matching of suspended senders and receivers, a draining `close` and an
//! abandoning `cancel`, and a [`Stream`](futures_core::Stream) adapter that
//! ends when the channel is closed and drained.
//!
//! ```
//! use csp_channel::Channel;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let chan = Channel::bounded(2);
//! chan.send(1).await.unwrap();
//! chan.send(2).await.unwrap();
//! chan.close();
//!
//! assert_eq!(chan.receive().await, Ok(1));
//! assert_eq!(chan.receive().await, Ok(2));
//! assert!(chan.receive().await.is_err());
//! # }
//! ```

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod error;
pub mod policy;

mod async_util;
mod channel;

pub use channel::{
  Channel, ChannelResult, ChannelState, ChannelStream, ReceiveCatchingFuture, ReceiveFuture,
  SendFuture,
};
pub use error::{RecvError, SendError, TryRecvError, TrySendError};
pub use policy::{BufferPolicy, Overflow, CONFLATED, RENDEZVOUS, UNLIMITED};
