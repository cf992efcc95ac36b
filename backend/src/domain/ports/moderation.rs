//! Driving ports for administrator moderation.
//!
//! Every operation takes the acting user and fails with `forbidden` unless
//! that account holds the admin role.

use async_trait::async_trait;

use crate::domain::{Error, ItemDetails, ItemId, Role, SwapRequest, UserAccount, UserId};

/// Number of entries per category in [`RecentActivity`].
pub const ACTIVITY_LIMIT: u64 = 10;

/// Platform-wide counters.
///
/// Rates are percentages rounded to one decimal place and are `0.0` when the
/// denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformStats {
    pub total_users: u64,
    pub total_items: u64,
    pub pending_items: u64,
    pub approved_items: u64,
    pub total_swaps: u64,
    pub completed_swaps: u64,
    pub approval_rate: f64,
    pub swap_success_rate: f64,
}

/// Newest records across the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentActivity {
    pub items: Vec<ItemDetails>,
    pub swaps: Vec<SwapRequest>,
    pub users: Vec<UserAccount>,
}

/// Moderation write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModerationCommand: Send + Sync {
    /// Approve a pending listing.
    async fn approve_item(&self, actor: &UserId, item_id: &ItemId) -> Result<ItemDetails, Error>;

    /// Reject a pending listing.
    async fn reject_item(&self, actor: &UserId, item_id: &ItemId) -> Result<ItemDetails, Error>;

    /// Delete a listing regardless of status.
    async fn remove_item(&self, actor: &UserId, item_id: &ItemId) -> Result<(), Error>;

    /// Change another account's role.
    async fn set_role(
        &self,
        actor: &UserId,
        user_id: &UserId,
        role: Role,
    ) -> Result<UserAccount, Error>;
}

/// Moderation read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModerationQuery: Send + Sync {
    /// Listings awaiting moderation, oldest first.
    async fn pending_items(&self, actor: &UserId) -> Result<Vec<ItemDetails>, Error>;

    /// Platform counters.
    async fn stats(&self, actor: &UserId) -> Result<PlatformStats, Error>;

    /// Every account, newest first.
    async fn users(&self, actor: &UserId) -> Result<Vec<UserAccount>, Error>;

    /// The newest listings, swaps and accounts.
    async fn activity(&self, actor: &UserId) -> Result<RecentActivity, Error>;
}
