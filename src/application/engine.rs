use crate::application::locks::AccountLocks;
use crate::application::queue::SchedulingQueue;
use crate::domain::outcome::Outcome;
use crate::domain::ports::{ProcessorRef, StateStoreRef};
use crate::domain::retry::RetryPolicy;
use crate::domain::transaction::{Transaction, TxState};
use crate::error::{EngineError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

/// The main entry point for the transaction-processing engine.
///
/// `TransactionEngine` owns the scheduling queue, the per-account lock
/// registry and a fixed pool of worker tasks. It drives every submitted
/// transaction from `Received` through `Succeeded` or `FailedFinal`,
/// retrying transient failures with capped exponential backoff.
///
/// The queue decides liveness (which transaction a free worker looks at
/// next); the account lock is what enforces per-account ordering. Among
/// transactions of one account that have not yet started processing,
/// processing order is non-decreasing in `sequence`. If an earlier
/// transaction needs a retry, a later one may complete before the retry
/// fires; ordering does not reorder around retries.
///
/// Delivery to the processor is at-least-once; shutdown is best-effort and
/// does not drain in-flight work.
pub struct TransactionEngine {
    inner: Arc<EngineInner>,
    worker_count: usize,
    started: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

struct EngineInner {
    queue: SchedulingQueue,
    locks: AccountLocks,
    policy: RetryPolicy,
    processor: ProcessorRef,
    store: StateStoreRef,
    shutdown_rx: watch::Receiver<bool>,
}

impl TransactionEngine {
    /// Creates a new engine. Fails fast on invalid configuration, before
    /// any worker is spawned.
    ///
    /// # Arguments
    ///
    /// * `worker_count` - Number of worker tasks; must be greater than zero.
    /// * `policy` - Retry budget and backoff schedule.
    /// * `processor` - The injected processing operation.
    /// * `store` - Destination for per-transaction state records.
    pub fn new(
        worker_count: usize,
        policy: RetryPolicy,
        processor: ProcessorRef,
        store: StateStoreRef,
    ) -> Result<Self> {
        if worker_count == 0 {
            return Err(EngineError::Config(
                "worker_count must be greater than zero".to_string(),
            ));
        }
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(EngineInner {
                queue: SchedulingQueue::new(),
                locks: AccountLocks::new(),
                policy,
                processor,
                store,
                shutdown_rx,
            }),
            worker_count,
            started: AtomicBool::new(false),
            shutdown_tx,
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Spawns the worker pool. Idempotent; a second call is a no-op.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        if *self.shutdown_tx.borrow() {
            return;
        }
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        debug!(workers = self.worker_count, "starting engine");
        let mut workers = self.workers.lock().expect("worker handle mutex poisoned");
        for _ in 0..self.worker_count {
            workers.push(tokio::spawn(worker_loop(self.inner.clone())));
        }
    }

    /// Records the transaction as `Received` and hands it to the scheduler.
    /// Never blocks on processing.
    pub async fn submit(&self, tx: Transaction) -> Result<()> {
        if *self.shutdown_tx.borrow() {
            return Err(EngineError::Stopped);
        }
        self.inner
            .store
            .upsert(&tx.id, TxState::Received, tx.attempt, "received")
            .await?;
        self.inner.queue.push(tx);
        Ok(())
    }

    /// Stops the engine: no new submissions are accepted, workers blocked on
    /// the queue are woken and terminated, and pending deferred re-push
    /// timers are cancelled. In-flight processor calls are not drained.
    /// Idempotent.
    pub fn stop(&self) {
        if self.shutdown_tx.send_replace(true) {
            return;
        }
        debug!("stopping engine");
        let mut workers = self.workers.lock().expect("worker handle mutex poisoned");
        for handle in workers.drain(..) {
            handle.abort();
        }
    }

    pub fn state_store(&self) -> StateStoreRef {
        self.inner.store.clone()
    }
}

impl Drop for TransactionEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn worker_loop(inner: Arc<EngineInner>) {
    let mut shutdown = inner.shutdown_rx.clone();
    loop {
        if *shutdown.borrow() {
            return;
        }
        let tx = tokio::select! {
            tx = inner.queue.take_min() => tx,
            _ = shutdown.changed() => return,
        };

        // Not yet eligible: defer a re-push of the same transaction and move
        // on to other work. The worker never sleeps in place.
        if let Some(eta) = tx.next_eligible_at {
            let now = Instant::now();
            if eta > now {
                let delay = (eta - now).max(Duration::from_millis(1));
                trace!(tx_id = %tx.id, ?delay, "deferring re-push until eligible");
                let timer_inner = inner.clone();
                let mut timer_shutdown = inner.shutdown_rx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => timer_inner.queue.push(tx),
                        _ = timer_shutdown.changed() => {}
                    }
                });
                continue;
            }
        }

        process_one(&inner, tx).await;
    }
}

/// Runs a single eligible transaction under its account lock and applies the
/// outcome transition.
async fn process_one(inner: &Arc<EngineInner>, mut tx: Transaction) {
    let lock = inner.locks.lock_for(&tx.account_id);
    let guard = lock.lock().await;

    record(inner, &tx.id, TxState::Processing, tx.attempt, "processing").await;

    // The processor runs in its own task so that a panic surfaces as a
    // JoinError instead of unwinding through the worker. A fault terminates
    // the transaction without consuming retry budget; the lock guard is on
    // this side and is released normally.
    let outcome = {
        let processor = inner.processor.clone();
        let job = tx.clone();
        match tokio::spawn(async move { processor.process(job).await }).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(tx_id = %tx.id, %err, "processor fault");
                Outcome::FinalFailure(format!("processor fault: {err}"))
            }
        }
    };

    match outcome {
        Outcome::Success(message) => {
            record(inner, &tx.id, TxState::Succeeded, tx.attempt, &message).await;
        }
        Outcome::RetryableFailure(message) if tx.attempt < inner.policy.max_retries() => {
            tx.attempt += 1;
            let backoff = inner.policy.backoff_for_attempt(tx.attempt);
            tx.next_eligible_at = Some(Instant::now() + backoff);
            debug!(tx_id = %tx.id, attempt = tx.attempt, ?backoff, "transient failure, will retry");
            record(inner, &tx.id, TxState::FailedRetryable, tx.attempt, &message).await;
            drop(guard);
            inner.queue.push(tx);
        }
        Outcome::RetryableFailure(message) | Outcome::FinalFailure(message) => {
            record(inner, &tx.id, TxState::FailedFinal, tx.attempt, &message).await;
        }
    }
}

async fn record(inner: &EngineInner, tx_id: &str, state: TxState, attempts: u32, message: &str) {
    if let Err(err) = inner.store.upsert(tx_id, state, attempts, message).await {
        warn!(tx_id, %err, "state store upsert failed");
    }
}
