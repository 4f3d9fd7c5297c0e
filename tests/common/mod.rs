use std::time::{Duration, Instant};
use txflow::domain::ports::{StateStore, StateStoreRef};
use txflow::domain::transaction::TxState;

/// Polls the state store until `tx_id` reaches `state` or the timeout passes.
pub async fn wait_for_state(
    store: &StateStoreRef,
    tx_id: &str,
    state: TxState,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(Some(record)) = store.get(tx_id).await
            && record.state == state
        {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
