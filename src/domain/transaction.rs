use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

/// Lifecycle of a transaction as recorded in the state store.
///
/// `FailedRetryable` is not terminal; the transaction re-enters `Processing`
/// once its backoff elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxState {
    Received,
    Processing,
    Succeeded,
    FailedRetryable,
    FailedFinal,
}

impl TxState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxState::Succeeded | TxState::FailedFinal)
    }
}

/// A unit of work submitted to the engine.
///
/// `id`, `account_id`, `sequence` and `amount_cents` are fixed at submission.
/// `attempt` and `next_eligible_at` are scheduling state, mutated only by the
/// single worker that currently owns the value: the transaction is moved into
/// the queue on push and moved out on pop, so no two tasks ever alias it.
/// `next_eligible_at = None` means immediately eligible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub sequence: u64,
    pub amount_cents: i64,
    #[serde(default)]
    pub attempt: u32,
    #[serde(skip)]
    pub next_eligible_at: Option<Instant>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        account_id: impl Into<String>,
        sequence: u64,
        amount_cents: i64,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            sequence,
            amount_cents,
            attempt: 0,
            next_eligible_at: None,
        }
    }
}

// Queue placement order: earliest eligibility first (`None` sorts before any
// `Some`), then account, sequence and id as deterministic tie-breakers. This
// order drives liveness only; per-account ordering is enforced by the account
// lock, not by the queue.
impl Ord for Transaction {
    fn cmp(&self, other: &Self) -> Ordering {
        self.next_eligible_at
            .cmp(&other.next_eligible_at)
            .then_with(|| self.account_id.cmp(&other.account_id))
            .then_with(|| self.sequence.cmp(&other.sequence))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Transaction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Transaction {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_transaction_is_immediately_eligible() {
        let tx = Transaction::new("tx-1", "acct-1", 1, 100);
        assert_eq!(tx.attempt, 0);
        assert!(tx.next_eligible_at.is_none());
    }

    #[test]
    fn test_eligibility_dominates_ordering() {
        let eligible = Transaction::new("tx-b", "acct-z", 99, 100);
        let mut delayed = Transaction::new("tx-a", "acct-a", 1, 100);
        delayed.next_eligible_at = Some(Instant::now() + Duration::from_secs(1));

        assert!(eligible < delayed);
    }

    #[test]
    fn test_ties_broken_by_account_then_sequence_then_id() {
        let a1 = Transaction::new("tx-1", "acct-a", 1, 100);
        let a2 = Transaction::new("tx-2", "acct-a", 2, 100);
        let b1 = Transaction::new("tx-3", "acct-b", 1, 100);
        assert!(a1 < a2);
        assert!(a2 < b1);

        let x = Transaction::new("tx-x", "acct-a", 1, 100);
        let y = Transaction::new("tx-y", "acct-a", 1, 100);
        assert!(x < y);
    }

    #[test]
    fn test_later_eligibility_sorts_last() {
        let now = Instant::now();
        let mut soon = Transaction::new("tx-1", "acct-a", 1, 100);
        soon.next_eligible_at = Some(now + Duration::from_millis(10));
        let mut late = Transaction::new("tx-2", "acct-a", 2, 100);
        late.next_eligible_at = Some(now + Duration::from_millis(500));

        assert!(soon < late);
    }

    #[test]
    fn test_state_terminality() {
        assert!(TxState::Succeeded.is_terminal());
        assert!(TxState::FailedFinal.is_terminal());
        assert!(!TxState::FailedRetryable.is_terminal());
        assert!(!TxState::Received.is_terminal());
        assert!(!TxState::Processing.is_terminal());
    }
}
