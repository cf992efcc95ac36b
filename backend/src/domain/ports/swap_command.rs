//! Driving ports for the swap lifecycle.
//!
//! Inbound adapters call these to create and act on swap requests. Failures
//! carry a `details.code` naming the specific swap condition, for example
//! `insufficient_balance` or `invalid_state`.

use async_trait::async_trait;

use crate::domain::{Error, ItemId, SwapDetails, SwapId, SwapRole, SwapType, UserId};

/// Loosely validated input for creating a swap.
///
/// Shape checks (offer/type agreement, message length) happen in the service
/// so every entry point reports them identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSwapRequest {
    pub requester_id: UserId,
    pub item_requested_id: ItemId,
    pub swap_type: SwapType,
    pub item_offered_id: Option<ItemId>,
    pub points_offered: Option<u32>,
    pub message: Option<String>,
}

/// Swap write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapCommand: Send + Sync {
    /// Validate and store a new pending swap request.
    async fn create(&self, request: NewSwapRequest) -> Result<SwapDetails, Error>;

    /// Accept a pending swap as the owner of the requested item, settling it.
    async fn accept(&self, actor: &UserId, swap_id: &SwapId) -> Result<SwapDetails, Error>;

    /// Reject a pending swap as the owner of the requested item.
    async fn reject(&self, actor: &UserId, swap_id: &SwapId) -> Result<SwapDetails, Error>;

    /// Withdraw a pending swap as its requester.
    async fn cancel(&self, actor: &UserId, swap_id: &SwapId) -> Result<SwapDetails, Error>;
}

/// Swap read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapQuery: Send + Sync {
    /// Fetch one swap visible to `actor`.
    async fn get(&self, actor: &UserId, swap_id: &SwapId) -> Result<SwapDetails, Error>;

    /// Swaps where `actor` plays `role`, newest first.
    async fn list(&self, actor: &UserId, role: SwapRole) -> Result<Vec<SwapDetails>, Error>;
}
