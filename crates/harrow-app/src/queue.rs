//! Unbounded FIFO shared by the discovery task and every destination worker.
//!
//! # Design
//! - Producers never block; consumers suspend until an item is available.
//! - Requeue is a plain `push`: the item goes to the tail.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

/// Asynchronous multi-consumer FIFO.
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Notify,
}

impl<T> WorkQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Notify::new(),
        }
    }

    /// Append `item` to the tail and wake one waiting consumer.
    pub fn push(&self, item: T) {
        self.lock().push_back(item);
        self.available.notify_one();
    }

    /// Remove the head, waiting for a producer when the queue is empty.
    pub async fn pop(&self) -> T {
        loop {
            let notified = self.available.notified();
            if let Some(item) = self.lock().pop_front() {
                return item;
            }
            notified.await;
        }
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::timeout;

    #[tokio::test]
    async fn pops_in_fifo_order() {
        let queue = WorkQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().await, 1);
        queue.push(1);
        assert_eq!(queue.pop().await, 2);
        assert_eq!(queue.pop().await, 3);
        assert_eq!(queue.pop().await, 1);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn consumer_waits_for_producer() -> Result<(), Box<dyn std::error::Error>> {
        let queue = Arc::new(WorkQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.pop().await })
        };
        tokio::task::yield_now().await;
        assert!(!consumer.is_finished());

        queue.push("unit");
        let popped = timeout(Duration::from_secs(1), consumer).await??;
        assert_eq!(popped, "unit");
        Ok(())
    }

    #[tokio::test]
    async fn every_item_reaches_exactly_one_consumer() -> Result<(), Box<dyn std::error::Error>> {
        let queue = Arc::new(WorkQueue::new());
        let mut consumers = Vec::new();
        for _ in 0..3 {
            let queue = Arc::clone(&queue);
            consumers.push(tokio::spawn(async move {
                let first = queue.pop().await;
                let second = queue.pop().await;
                vec![first, second]
            }));
        }
        for item in 0..6 {
            queue.push(item);
            tokio::task::yield_now().await;
        }
        let mut seen = Vec::new();
        for consumer in consumers {
            seen.extend(timeout(Duration::from_secs(1), consumer).await??);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
        Ok(())
    }
}
