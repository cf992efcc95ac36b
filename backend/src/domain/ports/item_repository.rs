//! Port abstraction for listing persistence adapters and their errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Category, GarmentType, Item, ItemId, ItemStatus, Size, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by item repository adapters.
    pub enum ItemRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "item repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "item repository query failed: {message}",
    }
}

/// Catalogue filter applied by [`ItemRepository::browse`].
///
/// Only approved, available items are ever returned. `search` matches the
/// title or description case-insensitively, or a tag exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemBrowseQuery {
    pub category: Option<Category>,
    pub garment_type: Option<GarmentType>,
    pub size: Option<Size>,
    pub search: Option<String>,
    pub offset: u64,
    pub limit: u64,
}

/// One page of catalogue results plus the unpaginated total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub total: u64,
}

/// Listing counts used by moderation statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemCounts {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Fetch a listing by identifier.
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, ItemRepositoryError>;

    /// Fetch every listing whose id appears in `ids`; missing ids are skipped.
    async fn find_many(&self, ids: &[ItemId]) -> Result<Vec<Item>, ItemRepositoryError>;

    /// Store a new listing.
    async fn insert(&self, item: &Item) -> Result<(), ItemRepositoryError>;

    /// Overwrite owner-editable content. Status and availability are left
    /// untouched. Returns `false` when the listing no longer exists.
    async fn update(&self, item: &Item) -> Result<bool, ItemRepositoryError>;

    /// Delete a listing and every swap request referencing it.
    async fn delete(&self, id: &ItemId) -> Result<bool, ItemRepositoryError>;

    /// Catalogue page ordered newest first.
    async fn browse(&self, query: &ItemBrowseQuery) -> Result<ItemPage, ItemRepositoryError>;

    /// Every listing owned by `owner`, newest first.
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Item>, ItemRepositoryError>;

    /// Listings in `status`, oldest first.
    async fn list_by_status(&self, status: ItemStatus) -> Result<Vec<Item>, ItemRepositoryError>;

    /// Move a listing from `expected` to `next`. Returns `false` when the
    /// listing is missing or no longer in `expected`.
    async fn set_status(
        &self,
        id: &ItemId,
        expected: ItemStatus,
        next: ItemStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, ItemRepositoryError>;

    /// Aggregate counts across all listings.
    async fn counts(&self) -> Result<ItemCounts, ItemRepositoryError>;

    /// Most recently created listings in any status.
    async fn recent(&self, limit: u64) -> Result<Vec<Item>, ItemRepositoryError>;
}
