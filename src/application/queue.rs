use crate::domain::transaction::Transaction;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Mutex;
use tokio::sync::Notify;

/// Thread-safe, unbounded priority queue over transactions, ordered by the
/// eligibility-first total order defined on `Transaction`.
///
/// This is the single rendezvous point between submission, retry re-entry and
/// worker consumption. Consumers park on a `Notify` instead of spinning.
#[derive(Default)]
pub struct SchedulingQueue {
    heap: Mutex<BinaryHeap<Reverse<Transaction>>>,
    available: Notify,
}

impl SchedulingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a transaction and wakes one blocked consumer, if any.
    pub fn push(&self, tx: Transaction) {
        self.heap
            .lock()
            .expect("scheduling queue mutex poisoned")
            .push(Reverse(tx));
        self.available.notify_one();
    }

    /// Removes and returns the minimum element, waiting until one exists.
    ///
    /// Cancel-safe: there is no await point after an element is removed, so
    /// dropping the future never loses a transaction.
    pub async fn take_min(&self) -> Transaction {
        loop {
            // Register for a wakeup before checking, so a push racing with
            // the check cannot be missed.
            let notified = self.available.notified();
            if let Some(Reverse(tx)) = self
                .heap
                .lock()
                .expect("scheduling queue mutex poisoned")
                .pop()
            {
                return tx;
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.heap
            .lock()
            .expect("scheduling queue mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_take_min_returns_eligibility_order() {
        let queue = SchedulingQueue::new();
        let now = Instant::now();

        let mut late = Transaction::new("tx-late", "acct-a", 1, 100);
        late.next_eligible_at = Some(now + Duration::from_secs(5));
        let immediate = Transaction::new("tx-now", "acct-b", 7, 100);

        queue.push(late);
        queue.push(immediate);

        assert_eq!(queue.take_min().await.id, "tx-now");
        assert_eq!(queue.take_min().await.id, "tx-late");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_take_min_orders_by_sequence_within_account() {
        let queue = SchedulingQueue::new();
        for seq in [3u64, 1, 2] {
            queue.push(Transaction::new(format!("tx-{seq}"), "acct-a", seq, 100));
        }

        assert_eq!(queue.take_min().await.sequence, 1);
        assert_eq!(queue.take_min().await.sequence, 2);
        assert_eq!(queue.take_min().await.sequence, 3);
    }

    #[tokio::test]
    async fn test_blocked_consumer_is_woken_by_push() {
        let queue = Arc::new(SchedulingQueue::new());

        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.take_min().await })
        };

        // Give the consumer a chance to park on the empty queue first.
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push(Transaction::new("tx-1", "acct-a", 1, 100));

        let tx = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer was not woken")
            .unwrap();
        assert_eq!(tx.id, "tx-1");
    }
}
