use super::outcome::Outcome;
use super::transaction::{Transaction, TxState};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::SystemTime;

/// The injected processing operation.
///
/// Invoked by a worker while the transaction's account lock is held. Retries
/// re-invoke it with the same identity and payload, so implementations must
/// be idempotent. The engine imposes no timeout; a call that never returns
/// stalls its account.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, tx: Transaction) -> Outcome;
}

/// Plain closures work as processors.
#[async_trait]
impl<F> Processor for F
where
    F: Fn(&Transaction) -> Outcome + Send + Sync,
{
    async fn process(&self, tx: Transaction) -> Outcome {
        (self)(&tx)
    }
}

/// Latest known state of a transaction, as recorded by the state store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TxRecord {
    pub state: TxState,
    pub attempts: u32,
    pub updated_at: SystemTime,
    pub message: String,
}

/// Fire-and-forget record of per-transaction state.
///
/// Recording may lag queue mutation briefly; callers must not assume
/// atomicity between a read and the transaction's true in-queue status.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn upsert(
        &self,
        tx_id: &str,
        state: TxState,
        attempts: u32,
        message: &str,
    ) -> Result<()>;
    async fn get(&self, tx_id: &str) -> Result<Option<TxRecord>>;
    async fn len(&self) -> Result<usize>;
}

pub type ProcessorRef = Arc<dyn Processor>;
pub type StateStoreRef = Arc<dyn StateStore>;
