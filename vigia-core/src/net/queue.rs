//! Bounded outbound queue
//!
//! Producer side never waits: a full queue drops the new message. The
//! consumer waits at most the dequeue timeout.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_time::{with_timeout, Duration};

use super::message::OutgoingMessage;

/// Queue depth
pub const QUEUE_CAPACITY: usize = 10;

/// Outcome of [`OutboundQueue::enqueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Enqueued {
    Accepted,
    /// Queue was full; the message is gone
    Dropped,
}

/// Dequeue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// Nothing arrived within the timeout
    Empty,
}

/// FIFO of outgoing messages with drop-on-full semantics
pub struct OutboundQueue<M: RawMutex, const N: usize = QUEUE_CAPACITY> {
    channel: Channel<M, OutgoingMessage, N>,
    dropped: BlockingMutex<M, Cell<u32>>,
}

impl<M: RawMutex, const N: usize> OutboundQueue<M, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: BlockingMutex::new(Cell::new(0)),
        }
    }

    /// Add a message without waiting
    pub fn enqueue(&self, message: OutgoingMessage) -> Enqueued {
        match self.channel.try_send(message) {
            Ok(()) => Enqueued::Accepted,
            Err(TrySendError::Full(_)) => {
                self.dropped
                    .lock(|dropped| dropped.set(dropped.get().wrapping_add(1)));
                Enqueued::Dropped
            }
        }
    }

    /// Wait up to `timeout` for the oldest message
    pub async fn dequeue(&self, timeout: Duration) -> Result<OutgoingMessage, QueueError> {
        with_timeout(timeout, self.channel.receive())
            .await
            .map_err(|_| QueueError::Empty)
    }

    /// Messages currently queued
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Messages dropped on a full queue since boot
    pub fn dropped(&self) -> u32 {
        self.dropped.lock(Cell::get)
    }
}

impl<M: RawMutex, const N: usize> Default for OutboundQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    const SHORT: Duration = Duration::from_millis(10);

    fn numbered(i: usize) -> OutgoingMessage {
        OutgoingMessage::new("pico/dados", &format!("{}", i))
    }

    #[test]
    fn test_overflow_drops_newest() {
        let queue: OutboundQueue<NoopRawMutex> = OutboundQueue::new();
        for i in 0..10 {
            assert_eq!(queue.enqueue(numbered(i)), Enqueued::Accepted);
        }
        assert_eq!(queue.enqueue(numbered(10)), Enqueued::Dropped);
        assert_eq!(queue.len(), 10);
        assert_eq!(queue.dropped(), 1);

        block_on(async {
            for i in 0..10 {
                let msg = queue.dequeue(SHORT).await.unwrap();
                assert_eq!(msg.payload.as_str(), format!("{}", i));
            }
        });
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dequeue_empty_times_out() {
        let queue: OutboundQueue<NoopRawMutex> = OutboundQueue::new();
        assert_eq!(block_on(queue.dequeue(SHORT)), Err(QueueError::Empty));
    }

    #[test]
    fn test_space_frees_after_dequeue() {
        let queue: OutboundQueue<NoopRawMutex, 2> = OutboundQueue::new();
        queue.enqueue(numbered(0));
        queue.enqueue(numbered(1));
        assert_eq!(queue.enqueue(numbered(2)), Enqueued::Dropped);
        block_on(queue.dequeue(SHORT)).unwrap();
        assert_eq!(queue.enqueue(numbered(3)), Enqueued::Accepted);
        assert_eq!(queue.dropped(), 1);
    }
}
