use super::*; // Channel, ChannelState, ChannelResult, futures
use crate::error::{RecvError, SendError, TryRecvError, TrySendError};
use crate::policy::{BufferPolicy, CONFLATED, RENDEZVOUS, UNLIMITED};

use futures_util::FutureExt;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

// Both waiter queues must never hold entries at the same time.
fn assert_queues_exclusive<T>(chan: &Channel<T>) {
  let guard = chan.shared.internal.lock();
  assert!(
    guard.sender_waiters.is_empty() || guard.receiver_waiters.is_empty(),
    "senders and receivers queued simultaneously"
  );
}

fn waiting_senders<T>(chan: &Channel<T>) -> usize {
  chan.shared.internal.lock().sender_waiters.len()
}

fn waiting_receivers<T>(chan: &Channel<T>) -> usize {
  chan.shared.internal.lock().receiver_waiters.len()
}

#[test]
fn bounded_delivers_in_send_order() {
  let chan = Channel::<i32>::new(2);
  assert_eq!(chan.send(1).now_or_never(), Some(Ok(())));
  assert_eq!(chan.send(2).now_or_never(), Some(Ok(())));
  assert_eq!(chan.receive().now_or_never(), Some(Ok(1)));
  assert_eq!(chan.receive().now_or_never(), Some(Ok(2)));
}

#[test]
fn conflated_keeps_only_latest() {
  let chan = Channel::<i32>::new(CONFLATED);
  for v in 1..=3 {
    assert_eq!(chan.send(v).now_or_never(), Some(Ok(())));
  }
  assert_eq!(chan.len(), 1);
  assert_eq!(chan.receive().now_or_never(), Some(Ok(3)));
  assert_eq!(chan.try_receive(), Err(TryRecvError::Empty));
}

#[test]
fn conflated_drops_overwritten_value() {
  let drops = Arc::new(AtomicUsize::new(0));
  struct DropCounter(Arc<AtomicUsize>);
  impl Drop for DropCounter {
    fn drop(&mut self) {
      self.0.fetch_add(1, AtomicOrdering::SeqCst);
    }
  }

  let chan = Channel::conflated();
  chan.try_send(DropCounter(drops.clone())).unwrap();
  chan.try_send(DropCounter(drops.clone())).unwrap();
  assert_eq!(drops.load(AtomicOrdering::SeqCst), 1);
  drop(chan);
  assert_eq!(drops.load(AtomicOrdering::SeqCst), 2);
}

#[test]
fn rendezvous_send_waits_for_receiver() {
  let chan = Channel::<&str>::new(RENDEZVOUS);
  let mut send = chan.send("ping");
  assert!(send.is_suspended());
  assert!((&mut send).now_or_never().is_none());
  assert_eq!(chan.len(), 0);

  assert_eq!(chan.receive().now_or_never(), Some(Ok("ping")));
  assert_eq!(send.now_or_never(), Some(Ok(())));
  assert_eq!(waiting_senders(&chan), 0);
}

#[test]
fn rendezvous_receive_first_is_handed_value() {
  let chan = Channel::<u8>::rendezvous();
  let mut recv = chan.receive();
  assert!((&mut recv).now_or_never().is_none());
  assert_eq!(waiting_receivers(&chan), 1);

  assert_eq!(chan.send(9).now_or_never(), Some(Ok(())));
  assert_eq!(recv.now_or_never(), Some(Ok(9)));
  assert_eq!(chan.len(), 0);
}

#[test]
fn unlimited_never_suspends() {
  let chan = Channel::<usize>::new(UNLIMITED);
  for i in 0..10_000 {
    let send = chan.send(i);
    assert!(!send.is_suspended());
    assert_eq!(send.now_or_never(), Some(Ok(())));
  }
  assert_eq!(chan.len(), 10_000);
  assert_eq!(chan.capacity(), None);
  assert_eq!(chan.receive().now_or_never(), Some(Ok(0)));
}

#[test]
fn bounded_sender_suspends_until_slot_frees() {
  let chan = Channel::<i32>::bounded(1);
  chan.try_send(1).unwrap();
  let mut blocked = chan.send(2);
  assert!((&mut blocked).now_or_never().is_none());
  assert_eq!(chan.try_send(3), Err(TrySendError::Full(3)));

  // Freeing the slot moves the suspended value into the buffer.
  assert_eq!(chan.receive().now_or_never(), Some(Ok(1)));
  assert_eq!(blocked.now_or_never(), Some(Ok(())));
  assert_eq!(chan.len(), 1);
  assert_eq!(chan.receive().now_or_never(), Some(Ok(2)));
}

#[test]
fn receivers_are_served_fifo() {
  let chan = Channel::<i32>::rendezvous();
  let first = chan.receive();
  let second = chan.receive();
  let third = chan.receive();
  assert_queues_exclusive(&chan);

  for v in [10, 20, 30] {
    assert_eq!(chan.send(v).now_or_never(), Some(Ok(())));
  }
  assert_eq!(first.now_or_never(), Some(Ok(10)));
  assert_eq!(second.now_or_never(), Some(Ok(20)));
  assert_eq!(third.now_or_never(), Some(Ok(30)));
}

#[test]
fn senders_are_served_fifo() {
  let chan = Channel::<i32>::bounded(1);
  chan.try_send(0).unwrap();
  let a = chan.send(1);
  let b = chan.send(2);
  assert_eq!(waiting_senders(&chan), 2);
  assert_queues_exclusive(&chan);

  let received: Vec<i32> = (0..3).map(|_| chan.try_receive().unwrap()).collect();
  assert_eq!(received, vec![0, 1, 2]);
  assert_eq!(a.now_or_never(), Some(Ok(())));
  assert_eq!(b.now_or_never(), Some(Ok(())));
}

#[test]
fn close_is_idempotent() {
  let chan = Channel::<i32>::bounded(4);
  chan.try_send(1).unwrap();
  assert!(chan.close());
  assert!(!chan.close());
  assert!(chan.is_closed_for_send());
  assert_eq!(chan.len(), 1);
  assert_eq!(chan.state(), ChannelState::Closing);
}

#[test]
fn close_drains_buffer_then_fails() {
  let chan = Channel::<i32>::bounded(3);
  for v in 1..=3 {
    chan.try_send(v).unwrap();
  }
  chan.close();
  assert!(!chan.is_closed_for_receive());

  for v in 1..=3 {
    assert_eq!(chan.receive().now_or_never(), Some(Ok(v)));
  }
  assert_eq!(chan.receive().now_or_never(), Some(Err(RecvError::Closed)));
  assert!(chan.is_closed_for_receive());
  assert_eq!(chan.state(), ChannelState::Drained);
}

#[test]
fn close_rejects_pending_receiver() {
  let chan = Channel::<i32>::new(RENDEZVOUS);
  let mut pending = chan.receive();
  assert!((&mut pending).now_or_never().is_none());

  chan.close();
  assert_eq!(pending.now_or_never(), Some(Err(RecvError::Closed)));
  assert_eq!(waiting_receivers(&chan), 0);
}

#[test]
fn send_after_close_fails_without_buffering() {
  let chan = Channel::<i32>::unlimited();
  chan.close();
  assert_eq!(chan.send(1).now_or_never(), Some(Err(SendError::Closed)));
  assert_eq!(chan.try_send(2), Err(TrySendError::Closed(2)));
  assert_eq!(chan.len(), 0);
}

#[test]
fn senders_suspended_at_close_remain_deliverable() {
  let chan = Channel::<i32>::bounded(1);
  chan.try_send(1).unwrap();
  let mut late = chan.send(2);
  chan.close();
  assert!((&mut late).now_or_never().is_none());
  assert_eq!(chan.state(), ChannelState::Closing);

  assert_eq!(chan.receive().now_or_never(), Some(Ok(1)));
  // Closed channels never refill the buffer from suspended senders.
  assert_eq!(chan.len(), 0);
  assert!(!chan.is_closed_for_receive());
  assert_eq!(chan.receive().now_or_never(), Some(Ok(2)));
  assert_eq!(late.now_or_never(), Some(Ok(())));
  assert_eq!(chan.receive().now_or_never(), Some(Err(RecvError::Closed)));
}

#[test]
fn cancel_resolves_pending_sender_without_delivery() {
  let chan = Channel::<i32>::rendezvous();
  let mut blocked = chan.send(42);
  assert!((&mut blocked).now_or_never().is_none());

  assert!(chan.cancel());
  assert_eq!(blocked.now_or_never(), Some(Ok(())));
  assert_eq!(chan.receive().now_or_never(), Some(Err(RecvError::Cancelled)));
  assert_eq!(chan.try_receive(), Err(TryRecvError::Cancelled));
}

#[test]
fn cancel_rejects_every_pending_receiver() {
  let chan = Channel::<i32>::bounded(2);
  let pending: Vec<_> = (0..5).map(|_| chan.receive()).collect();
  assert_eq!(waiting_receivers(&chan), 5);

  chan.cancel();
  for fut in pending {
    assert_eq!(fut.now_or_never(), Some(Err(RecvError::Cancelled)));
  }
}

#[test]
fn cancel_discards_buffer() {
  let chan = Channel::<i32>::bounded(4);
  chan.try_send(1).unwrap();
  chan.try_send(2).unwrap();
  chan.cancel();
  assert!(!chan.cancel());
  assert_eq!(chan.len(), 0);
  assert!(chan.is_cancelled());
  assert!(chan.is_closed_for_send());
  assert_eq!(chan.state(), ChannelState::Cancelled);
  assert_eq!(chan.receive().now_or_never(), Some(Err(RecvError::Cancelled)));
}

#[test]
fn cancel_after_close_still_abandons_queued_senders() {
  let chan = Channel::<i32>::bounded(1);
  chan.try_send(1).unwrap();
  let late = chan.send(2);
  chan.close();
  chan.cancel();
  assert_eq!(late.now_or_never(), Some(Ok(())));
  assert_eq!(chan.receive().now_or_never(), Some(Err(RecvError::Cancelled)));
}

#[test]
fn receive_catching_reports_closure() {
  let chan = Channel::<i32>::bounded(1);
  chan.try_send(5).unwrap();
  chan.close();
  let got = chan.receive_catching().now_or_never().unwrap();
  assert!(got.is_success());
  assert_eq!(got.value(), Some(&5));
  assert_eq!(got, ChannelResult::Value(5));

  let closed = chan.receive_catching().now_or_never().unwrap();
  assert!(closed.is_closed());
  assert!(!closed.is_success());
  assert_eq!(closed.value(), None);
  assert_eq!(closed.closed_cause(), Some(RecvError::Closed));
  assert_eq!(closed.into_value(), None);
}

#[test]
fn dropped_suspended_send_withdraws_value() {
  let chan = Channel::<i32>::rendezvous();
  let send = chan.send(1);
  assert_eq!(waiting_senders(&chan), 1);
  drop(send);
  assert_eq!(waiting_senders(&chan), 0);
  assert_eq!(chan.try_receive(), Err(TryRecvError::Empty));
}

#[test]
fn dropped_suspended_receive_is_skipped() {
  let chan = Channel::<i32>::bounded(1);
  let abandoned = chan.receive();
  let live = chan.receive();
  drop(abandoned);
  assert_eq!(waiting_receivers(&chan), 1);

  chan.try_send(7).unwrap();
  assert_eq!(live.now_or_never(), Some(Ok(7)));
  assert_eq!(chan.len(), 0);
}

#[test]
fn value_handed_to_dropped_receive_is_restored() {
  let chan = Channel::<i32>::rendezvous();
  let pending = chan.receive();
  assert_eq!(chan.send(7).now_or_never(), Some(Ok(())));
  drop(pending);
  assert_eq!(chan.try_receive(), Ok(7));
}

#[test]
fn restored_value_goes_to_next_waiting_receiver() {
  let chan = Channel::<i32>::rendezvous();
  let first = chan.receive();
  let second = chan.receive();
  chan.try_send(8).unwrap();
  drop(first);
  assert_eq!(waiting_receivers(&chan), 0);
  assert_eq!(second.now_or_never(), Some(Ok(8)));
}

#[test]
fn dropped_ready_receive_keeps_order() {
  let chan = Channel::<i32>::bounded(2);
  chan.try_send(1).unwrap();
  chan.try_send(2).unwrap();
  let taken = chan.receive();
  assert_eq!(chan.len(), 1);
  drop(taken);
  assert_eq!(chan.len(), 2);
  assert_eq!(chan.try_receive(), Ok(1));
  assert_eq!(chan.try_receive(), Ok(2));
}

#[test]
fn restore_into_refilled_buffer_respects_capacity() {
  let chan = Channel::<i32>::bounded(1);
  chan.try_send(1).unwrap();
  let blocked = chan.send(2);
  // Takes 1 and moves 2 from the suspended sender into the buffer.
  let taken = chan.receive();
  assert_eq!(blocked.now_or_never(), Some(Ok(())));
  drop(taken);

  assert_eq!(chan.len(), 1);
  assert_queues_exclusive(&chan);
  assert_eq!(chan.try_receive(), Ok(1));
  assert_eq!(chan.try_receive(), Ok(2));
  assert_eq!(chan.try_receive(), Err(TryRecvError::Empty));
}

#[test]
fn restore_while_closing_stays_receivable() {
  let chan = Channel::<i32>::bounded(2);
  chan.try_send(4).unwrap();
  chan.try_send(5).unwrap();
  let taken = chan.receive();
  chan.close();
  drop(taken);

  assert_eq!(chan.state(), ChannelState::Closing);
  assert_eq!(chan.try_receive(), Ok(4));
  assert_eq!(chan.try_receive(), Ok(5));
  assert_eq!(chan.try_receive(), Err(TryRecvError::Closed));
}

#[test]
fn restore_never_reopens_drained_channel() {
  let chan = Channel::<i32>::bounded(1);
  chan.try_send(4).unwrap();
  let taken = chan.receive();
  chan.close();
  assert_eq!(chan.state(), ChannelState::Drained);
  drop(taken);

  assert_eq!(chan.state(), ChannelState::Drained);
  assert_eq!(chan.try_receive(), Err(TryRecvError::Closed));
}

#[test]
fn conflated_restore_yields_to_newer_value() {
  let chan = Channel::<i32>::conflated();
  chan.try_send(1).unwrap();
  let stale = chan.receive();
  chan.try_send(2).unwrap();
  drop(stale);
  assert_eq!(chan.try_receive(), Ok(2));
  assert_eq!(chan.try_receive(), Err(TryRecvError::Empty));
}

#[test]
fn restore_after_cancel_drops_value() {
  let chan = Channel::<i32>::bounded(1);
  chan.try_send(3).unwrap();
  let taken = chan.receive();
  chan.cancel();
  drop(taken);
  assert_eq!(chan.len(), 0);
  assert_eq!(chan.try_receive(), Err(TryRecvError::Cancelled));
}

#[test]
fn try_operations_never_queue() {
  let chan = Channel::<i32>::rendezvous();
  assert_eq!(chan.try_send(1), Err(TrySendError::Full(1)));
  assert_eq!(chan.try_receive(), Err(TryRecvError::Empty));
  assert_eq!(waiting_senders(&chan), 0);
  assert_eq!(waiting_receivers(&chan), 0);

  let waiting = chan.receive();
  chan.try_send(3).unwrap();
  assert_eq!(waiting.now_or_never(), Some(Ok(3)));

  let blocked = chan.send(4);
  assert!(!chan.is_empty());
  assert_eq!(chan.try_receive(), Ok(4));
  assert_eq!(blocked.now_or_never(), Some(Ok(())));

  chan.close();
  assert_eq!(chan.try_receive(), Err(TryRecvError::Closed));
}

#[test]
fn clones_share_one_channel() {
  let tx = Channel::<String>::bounded(1);
  let rx = tx.clone();
  tx.try_send("shared".to_string()).unwrap();
  assert_eq!(rx.try_receive().unwrap(), "shared");
  rx.close();
  assert!(tx.is_closed_for_send());
  assert_eq!(tx.policy(), BufferPolicy::bounded(1));
}

#[test]
#[should_panic(expected = "ReceiveFuture polled after completion")]
fn receive_future_panics_when_polled_twice() {
  let chan = Channel::<i32>::unlimited();
  chan.try_send(1).unwrap();
  let mut fut = chan.receive();
  assert_eq!((&mut fut).now_or_never(), Some(Ok(1)));
  let _ = (&mut fut).now_or_never();
}
