//! Async plumbing shared by the channel futures.

// Wakes the task awaiting a waiter's settlement.
pub(crate) use futures_util::task::AtomicWaker;
