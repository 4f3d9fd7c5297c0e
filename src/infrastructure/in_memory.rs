use crate::domain::ports::{StateStore, TxRecord};
use crate::domain::transaction::TxState;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;

/// A thread-safe in-memory state store.
///
/// Uses `Arc<RwLock<HashMap<String, TxRecord>>>` to allow shared concurrent
/// access. State is lost on drop; persistence across restarts is out of
/// scope for the engine.
#[derive(Default, Clone)]
pub struct InMemoryStateStore {
    records: Arc<RwLock<HashMap<String, TxRecord>>>,
}

impl InMemoryStateStore {
    /// Creates a new, empty in-memory state store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn upsert(
        &self,
        tx_id: &str,
        state: TxState,
        attempts: u32,
        message: &str,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(
            tx_id.to_owned(),
            TxRecord {
                state,
                attempts,
                updated_at: SystemTime::now(),
                message: message.to_owned(),
            },
        );
        Ok(())
    }

    async fn get(&self, tx_id: &str) -> Result<Option<TxRecord>> {
        let records = self.records.read().await;
        Ok(records.get(tx_id).cloned())
    }

    async fn len(&self) -> Result<usize> {
        let records = self.records.read().await;
        Ok(records.len())
    }
}
