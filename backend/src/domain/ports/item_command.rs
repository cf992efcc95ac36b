//! Driving ports for the listing catalogue.

use async_trait::async_trait;

use crate::domain::{Category, Error, GarmentType, ItemDetails, ItemDraft, ItemId, Size, UserId};

/// Default catalogue page size.
pub const DEFAULT_PAGE_LIMIT: u32 = 12;
/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 50;
/// Number of listings returned by [`ItemQuery::featured`].
pub const FEATURED_LIMIT: u32 = 6;

/// Catalogue filters and paging as supplied by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseItemsRequest {
    pub category: Option<Category>,
    pub garment_type: Option<GarmentType>,
    pub size: Option<Size>,
    pub search: Option<String>,
    /// One-based page number; defaults to 1.
    pub page: Option<u32>,
    /// Page size; defaults to [`DEFAULT_PAGE_LIMIT`], capped at [`MAX_PAGE_LIMIT`].
    pub limit: Option<u32>,
}

/// One catalogue page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCatalogPage {
    pub items: Vec<ItemDetails>,
    pub total: u64,
    pub current_page: u32,
    pub total_pages: u64,
}

/// Listing write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemCommand: Send + Sync {
    /// Create a pending listing owned by `owner`.
    async fn create(&self, owner: &UserId, draft: ItemDraft) -> Result<ItemDetails, Error>;

    /// Replace a listing's content as its owner.
    async fn update(
        &self,
        actor: &UserId,
        item_id: &ItemId,
        draft: ItemDraft,
    ) -> Result<ItemDetails, Error>;

    /// Delete a listing as its owner.
    async fn delete(&self, actor: &UserId, item_id: &ItemId) -> Result<(), Error>;
}

/// Listing read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemQuery: Send + Sync {
    /// Approved, available listings matching the filters, newest first.
    async fn browse(&self, request: BrowseItemsRequest) -> Result<ItemCatalogPage, Error>;

    /// The newest approved, available listings.
    async fn featured(&self) -> Result<Vec<ItemDetails>, Error>;

    /// A single listing in any status.
    async fn get(&self, item_id: &ItemId) -> Result<ItemDetails, Error>;

    /// Every listing owned by `owner`, newest first.
    async fn mine(&self, owner: &UserId) -> Result<Vec<ItemDetails>, Error>;
}
