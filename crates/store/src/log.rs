//! Transaction log contract.

use ledgerflow_core::{AccountId, RecordId, TransactionRecord};
use uuid::Uuid;

use crate::error::StoreResult;

/// Default page size for per-account history queries.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Append-only record of settled transactions, queryable per account.
///
/// Records are created only after the balance mutation committed and are
/// never mutated afterwards. The log doubles as the settlement dedup
/// index: `has_event` answers whether an intent was already applied.
pub trait TransactionLog: Send + Sync {
    /// Append a settled record; the log assigns and returns its id.
    fn append(&self, record: TransactionRecord) -> StoreResult<RecordId>;

    /// Settled history for an account, most recent first, excluding
    /// soft-deleted rows.
    fn list_by_account(&self, id: AccountId, limit: usize) -> StoreResult<Vec<TransactionRecord>>;

    /// Whether any record for this intent has been appended already.
    fn has_event(&self, event_id: Uuid) -> StoreResult<bool>;
}
