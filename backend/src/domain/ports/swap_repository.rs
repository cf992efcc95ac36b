//! Port abstraction for swap request persistence and atomic settlement.
//!
//! Adapters own the atomicity guarantees of the swap engine: every mutation
//! here is a single conditional write or a single transaction, so two
//! concurrent callers can never both observe a swap as `pending` and act on
//! it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ItemId, SettlementPlan, SwapId, SwapRequest, SwapStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by swap repository adapters.
    pub enum SwapRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "swap repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "swap repository query failed: {message}",
        /// A pending request from the same requester for the same item exists.
        DuplicatePending => "a pending swap for this item already exists",
        /// The swap was missing or had already left `pending`.
        NotPending => "swap is no longer pending",
        /// A settled item was already unavailable.
        ItemUnavailable { item_id: ItemId } => "item {item_id} is no longer available",
        /// The payer's balance no longer covers the transfer.
        InsufficientBalance { balance: u32 } => "balance {balance} does not cover the transfer",
    }
}

/// Result of a successful settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReceipt {
    /// The swap in its accepted state.
    pub swap: SwapRequest,
    /// Pending swaps rejected because they referenced a settled item.
    pub rejected: Vec<SwapId>,
}

/// Swap counts used by moderation statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapCounts {
    pub total: u64,
    pub accepted: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapRepository: Send + Sync {
    /// Fetch a swap by identifier.
    async fn find_by_id(&self, id: &SwapId) -> Result<Option<SwapRequest>, SwapRepositoryError>;

    /// Whether `requester` already has a pending request for `item`.
    async fn has_pending(
        &self,
        requester: &UserId,
        item: &ItemId,
    ) -> Result<bool, SwapRepositoryError>;

    /// Store a new pending swap, failing with
    /// [`SwapRepositoryError::DuplicatePending`] when a pending request from
    /// the same requester for the same item already exists.
    async fn insert_pending(&self, swap: &SwapRequest) -> Result<(), SwapRepositoryError>;

    /// Move a pending swap to `next` without further side effects.
    ///
    /// Fails with [`SwapRepositoryError::NotPending`] when the swap is no
    /// longer pending at write time.
    async fn transition(
        &self,
        id: &SwapId,
        next: SwapStatus,
        now: DateTime<Utc>,
    ) -> Result<SwapRequest, SwapRepositoryError>;

    /// Apply a settlement plan in one atomic unit.
    ///
    /// Pending swaps that reference any settled item are rejected as part of
    /// the same unit.
    async fn settle(&self, plan: &SettlementPlan)
    -> Result<SettlementReceipt, SwapRepositoryError>;

    /// Swaps created by `requester`, newest first.
    async fn list_by_requester(
        &self,
        requester: &UserId,
    ) -> Result<Vec<SwapRequest>, SwapRepositoryError>;

    /// Swaps whose requested item is owned by `owner`, newest first.
    async fn list_for_owner(&self, owner: &UserId)
    -> Result<Vec<SwapRequest>, SwapRepositoryError>;

    /// Aggregate counts across all swaps.
    async fn counts(&self) -> Result<SwapCounts, SwapRepositoryError>;

    /// Most recently created swaps.
    async fn recent(&self, limit: u64) -> Result<Vec<SwapRequest>, SwapRepositoryError>;
}
