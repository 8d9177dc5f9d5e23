//! Pending-transaction registry.
//!
//! Controllers only ever write to the registry; reading and evicting entries
//! belongs to whatever view lists in-flight transactions.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a pending transaction does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionKind {
    RewardClaim,
    StakingApproval,
}

/// A submitted transaction awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
    pub kind: TransactionKind,
    /// Display amount (claims) or raw allowance (approvals)
    pub amount: String,
    /// The vault or asset the transaction concerns
    pub subject: String,
}

/// Sink for submitted transactions
pub trait PendingTransactionRegistry: Send + Sync {
    fn record(&self, transaction: PendingTransaction);
}

/// A recorded transaction with the time it was recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub transaction: PendingTransaction,
    pub recorded_at: DateTime<Utc>,
}

/// Shared in-process registry; clones see the same entries
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    entries: Arc<Mutex<Vec<RegistryEntry>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded entry, oldest first
    pub fn entries(&self) -> Vec<RegistryEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn transactions(&self) -> Vec<PendingTransaction> {
        self.entries()
            .into_iter()
            .map(|entry| entry.transaction)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PendingTransactionRegistry for InMemoryRegistry {
    fn record(&self, transaction: PendingTransaction) {
        tracing::info!(
            hash = %transaction.hash,
            kind = ?transaction.kind,
            subject = %transaction.subject,
            "Recorded pending transaction"
        );
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RegistryEntry {
                transaction,
                recorded_at: Utc::now(),
            });
    }
}
