use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-account mutual exclusion handles, created lazily on first reference
/// and shared by identity thereafter.
///
/// Entries are never evicted; the registry grows with the set of distinct
/// accounts seen, which is assumed bounded in practice. tokio's mutex queues
/// waiters in FIFO order, so no account starves another indefinitely.
#[derive(Default)]
pub struct AccountLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, account_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(account_id.to_owned())
            .or_default()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_account_yields_same_lock() {
        let registry = AccountLocks::new();
        let a = registry.lock_for("acct-1");
        let b = registry.lock_for("acct-1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_accounts_yield_distinct_locks() {
        let registry = AccountLocks::new();
        let a = registry.lock_for("acct-1");
        let b = registry.lock_for("acct-2");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_lock_serializes_holders() {
        let registry = AccountLocks::new();
        let lock = registry.lock_for("acct-1");

        let guard = lock.lock().await;
        assert!(registry.lock_for("acct-1").try_lock().is_err());
        drop(guard);
        assert!(registry.lock_for("acct-1").try_lock().is_ok());
    }
}
