//! Domain types: the transaction work item and its scheduling order, the
//! processing outcome, the retry policy, and the collaborator ports.

pub mod outcome;
pub mod ports;
pub mod retry;
pub mod transaction;
