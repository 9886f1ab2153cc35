// src/policy.rs

//! Buffering disciplines for a [`Channel`](crate::Channel).
//!
//! A policy is pure capacity arithmetic: it says how many values may sit in the
//! buffer and what a `send` does when the buffer is full. All waiter handling
//! lives in the channel core.

use core::fmt;
use core::num::NonZeroUsize;

/// Capacity value requesting a [`BufferPolicy::Rendezvous`] channel.
pub const RENDEZVOUS: usize = 0;
/// Capacity value requesting a [`BufferPolicy::Unlimited`] channel.
pub const UNLIMITED: usize = usize::MAX;
/// Capacity value requesting a [`BufferPolicy::Conflated`] channel.
pub const CONFLATED: usize = usize::MAX - 1;

/// How a channel buffers values that no receiver is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BufferPolicy {
  /// No buffer. A send completes only when a receiver takes the value.
  #[default]
  Rendezvous,
  /// Up to `N` buffered values; further sends suspend until a slot frees up.
  Bounded(NonZeroUsize),
  /// The buffer grows without bound; sends never suspend.
  Unlimited,
  /// A single slot holding the most recent unread value; sends overwrite it.
  Conflated,
}

/// What a send does when it finds the buffer full and no receiver waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
  /// Queue the sender until a receive makes room.
  Suspend,
  /// Replace the buffered value and complete immediately.
  Overwrite,
}

impl BufferPolicy {
  /// Maps a capacity value to a policy. `0` is [`RENDEZVOUS`], [`UNLIMITED`] and
  /// [`CONFLATED`] select their variants, and anything else is a bounded buffer.
  pub const fn from_capacity(capacity: usize) -> Self {
    match capacity {
      RENDEZVOUS => BufferPolicy::Rendezvous,
      UNLIMITED => BufferPolicy::Unlimited,
      CONFLATED => BufferPolicy::Conflated,
      n => match NonZeroUsize::new(n) {
        Some(n) => BufferPolicy::Bounded(n),
        None => BufferPolicy::Rendezvous,
      },
    }
  }

  /// A bounded policy; `0` degrades to a rendezvous.
  pub const fn bounded(capacity: usize) -> Self {
    match NonZeroUsize::new(capacity) {
      Some(n) => BufferPolicy::Bounded(n),
      None => BufferPolicy::Rendezvous,
    }
  }

  /// Effective buffer capacity. `None` for [`BufferPolicy::Unlimited`].
  pub const fn capacity(&self) -> Option<usize> {
    match self {
      BufferPolicy::Rendezvous => Some(0),
      BufferPolicy::Bounded(n) => Some(n.get()),
      BufferPolicy::Unlimited => None,
      BufferPolicy::Conflated => Some(1),
    }
  }

  /// Returns `true` if a buffer holding `len` values has no free slot.
  #[inline]
  pub const fn is_full(&self, len: usize) -> bool {
    match self.capacity() {
      Some(cap) => len >= cap,
      None => false,
    }
  }

  /// What a send does when [`is_full`](Self::is_full) holds.
  #[inline]
  pub const fn overflow(&self) -> Overflow {
    match self {
      BufferPolicy::Conflated => Overflow::Overwrite,
      _ => Overflow::Suspend,
    }
  }

  /// Returns `true` if a send under this policy may ever suspend.
  #[inline]
  pub const fn may_suspend(&self) -> bool {
    matches!(self, BufferPolicy::Rendezvous | BufferPolicy::Bounded(_))
  }
}

impl From<usize> for BufferPolicy {
  fn from(capacity: usize) -> Self {
    BufferPolicy::from_capacity(capacity)
  }
}

impl fmt::Display for BufferPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BufferPolicy::Rendezvous => write!(f, "rendezvous"),
      BufferPolicy::Bounded(n) => write!(f, "bounded({})", n),
      BufferPolicy::Unlimited => write!(f, "unlimited"),
      BufferPolicy::Conflated => write!(f, "conflated"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn capacity_constants_select_variants() {
    assert_eq!(BufferPolicy::from(RENDEZVOUS), BufferPolicy::Rendezvous);
    assert_eq!(BufferPolicy::from(UNLIMITED), BufferPolicy::Unlimited);
    assert_eq!(BufferPolicy::from(CONFLATED), BufferPolicy::Conflated);
    assert_eq!(BufferPolicy::from(3).capacity(), Some(3));
    assert_eq!(BufferPolicy::bounded(0), BufferPolicy::Rendezvous);
    assert_eq!(BufferPolicy::default(), BufferPolicy::Rendezvous);
  }

  #[test]
  fn fullness_per_policy() {
    assert!(BufferPolicy::Rendezvous.is_full(0));
    assert!(!BufferPolicy::bounded(2).is_full(1));
    assert!(BufferPolicy::bounded(2).is_full(2));
    assert!(!BufferPolicy::Unlimited.is_full(1_000_000));
    assert!(!BufferPolicy::Conflated.is_full(0));
    assert!(BufferPolicy::Conflated.is_full(1));
  }

  #[test]
  fn only_conflated_overwrites() {
    assert_eq!(BufferPolicy::Conflated.overflow(), Overflow::Overwrite);
    assert_eq!(BufferPolicy::bounded(4).overflow(), Overflow::Suspend);
    assert_eq!(BufferPolicy::Rendezvous.overflow(), Overflow::Suspend);
    assert!(!BufferPolicy::Unlimited.may_suspend());
    assert!(!BufferPolicy::Conflated.may_suspend());
    assert!(BufferPolicy::Rendezvous.may_suspend());
  }

  #[test]
  fn display_names() {
    assert_eq!(BufferPolicy::bounded(8).to_string(), "bounded(8)");
    assert_eq!(BufferPolicy::Conflated.to_string(), "conflated");
  }
}
