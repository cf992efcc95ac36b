//! Listing catalogue services.
//!
//! Browsing only ever exposes approved, available listings. Owners may edit or
//! delete their listings until settlement moves them to `swapped` or
//! `redeemed`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    BrowseItemsRequest, DEFAULT_PAGE_LIMIT, FEATURED_LIMIT, ItemBrowseQuery, ItemCatalogPage,
    ItemCommand, ItemQuery, ItemRepository, ItemRepositoryError, MAX_PAGE_LIMIT,
    UserAccountRepository, UserAccountRepositoryError,
};
use crate::domain::{Error, Item, ItemDetails, ItemDraft, ItemId, UserAccount, UserId};

pub(crate) fn map_item_repository_error(error: ItemRepositoryError) -> Error {
    match error {
        ItemRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("item repository unavailable: {message}"))
        }
        ItemRepositoryError::Query { message } => {
            Error::internal(format!("item repository error: {message}"))
        }
    }
}

pub(crate) fn map_account_repository_error(error: UserAccountRepositoryError) -> Error {
    match error {
        UserAccountRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("account repository unavailable: {message}"))
        }
        UserAccountRepositoryError::Query { message } => {
            Error::internal(format!("account repository error: {message}"))
        }
        UserAccountRepositoryError::DuplicateUsername { username } => {
            Error::conflict(format!("username {username} is already taken"))
        }
    }
}

pub(crate) fn item_not_found(item_id: &ItemId) -> Error {
    Error::not_found(format!("item {item_id} not found"))
        .with_details(json!({ "code": "item_not_found" }))
}

fn not_item_owner(action: &str) -> Error {
    Error::forbidden(format!("only the owner may {action} this item"))
        .with_details(json!({ "code": "not_authorized" }))
}

fn item_settled(item: &Item, action: &str) -> Error {
    Error::conflict(format!("cannot {action} an item that is {}", item.status))
        .with_details(json!({ "code": "invalid_state" }))
}

/// Attach owner summaries to a batch of listings.
pub(crate) async fn with_owners<U>(users: &U, items: Vec<Item>) -> Result<Vec<ItemDetails>, Error>
where
    U: UserAccountRepository + ?Sized,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let mut owner_ids: Vec<UserId> = items.iter().map(|item| item.owner_id).collect();
    owner_ids.sort_by_key(|id| *id.as_uuid());
    owner_ids.dedup();
    let owners: HashMap<UserId, UserAccount> = users
        .find_many(&owner_ids)
        .await
        .map_err(map_account_repository_error)?
        .into_iter()
        .map(|account| (account.id, account))
        .collect();

    items
        .into_iter()
        .map(|item| {
            let owner = owners
                .get(&item.owner_id)
                .ok_or_else(|| Error::internal(format!("owner of item {} is missing", item.id)))?
                .summary();
            Ok(ItemDetails { item, owner })
        })
        .collect()
}

fn page_window(request: &BrowseItemsRequest) -> (u32, u32) {
    let page = request.page.unwrap_or(1).max(1);
    let limit = request
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    (page, limit)
}

/// Catalogue service implementing [`ItemCommand`] and [`ItemQuery`].
#[derive(Clone)]
pub struct ItemService<I, U> {
    items: Arc<I>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<I, U> ItemService<I, U> {
    /// Create a catalogue service over the item and account repositories.
    pub fn new(items: Arc<I>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            items,
            users,
            clock,
        }
    }
}

impl<I, U> ItemService<I, U>
where
    I: ItemRepository,
    U: UserAccountRepository,
{
    async fn load(&self, item_id: &ItemId) -> Result<Item, Error> {
        self.items
            .find_by_id(item_id)
            .await
            .map_err(map_item_repository_error)?
            .ok_or_else(|| item_not_found(item_id))
    }

    async fn load_owned(
        &self,
        actor: &UserId,
        item_id: &ItemId,
        action: &str,
    ) -> Result<Item, Error> {
        let item = self.load(item_id).await?;
        if !item.is_owned_by(actor) {
            return Err(not_item_owner(action));
        }
        if item.status.is_settled() {
            return Err(item_settled(&item, action));
        }
        Ok(item)
    }

    async fn describe(&self, item: Item) -> Result<ItemDetails, Error> {
        let item_id = item.id;
        with_owners(self.users.as_ref(), vec![item])
            .await?
            .pop()
            .ok_or_else(|| item_not_found(&item_id))
    }
}

#[async_trait]
impl<I, U> ItemCommand for ItemService<I, U>
where
    I: ItemRepository,
    U: UserAccountRepository,
{
    async fn create(&self, owner: &UserId, draft: ItemDraft) -> Result<ItemDetails, Error> {
        let item = Item::list(*owner, draft, self.clock.utc());
        self.items
            .insert(&item)
            .await
            .map_err(map_item_repository_error)?;
        info!(item_id = %item.id, owner_id = %owner, "item listed for moderation");
        self.describe(item).await
    }

    async fn update(
        &self,
        actor: &UserId,
        item_id: &ItemId,
        draft: ItemDraft,
    ) -> Result<ItemDetails, Error> {
        let mut item = self.load_owned(actor, item_id, "edit").await?;
        item.revise(draft, self.clock.utc());
        let updated = self
            .items
            .update(&item)
            .await
            .map_err(map_item_repository_error)?;
        if !updated {
            return Err(item_not_found(item_id));
        }
        self.describe(item).await
    }

    async fn delete(&self, actor: &UserId, item_id: &ItemId) -> Result<(), Error> {
        self.load_owned(actor, item_id, "delete").await?;
        let deleted = self
            .items
            .delete(item_id)
            .await
            .map_err(map_item_repository_error)?;
        if !deleted {
            return Err(item_not_found(item_id));
        }
        info!(item_id = %item_id, "item deleted by owner");
        Ok(())
    }
}

#[async_trait]
impl<I, U> ItemQuery for ItemService<I, U>
where
    I: ItemRepository,
    U: UserAccountRepository,
{
    async fn browse(&self, request: BrowseItemsRequest) -> Result<ItemCatalogPage, Error> {
        let (page, limit) = page_window(&request);
        let query = ItemBrowseQuery {
            category: request.category,
            garment_type: request.garment_type,
            size: request.size,
            search: request
                .search
                .map(|term| term.trim().to_owned())
                .filter(|term| !term.is_empty()),
            offset: u64::from(page - 1) * u64::from(limit),
            limit: u64::from(limit),
        };
        let result = self
            .items
            .browse(&query)
            .await
            .map_err(map_item_repository_error)?;
        let items = with_owners(self.users.as_ref(), result.items).await?;
        Ok(ItemCatalogPage {
            items,
            total: result.total,
            current_page: page,
            total_pages: result.total.div_ceil(u64::from(limit)),
        })
    }

    async fn featured(&self) -> Result<Vec<ItemDetails>, Error> {
        let query = ItemBrowseQuery {
            limit: u64::from(FEATURED_LIMIT),
            ..ItemBrowseQuery::default()
        };
        let result = self
            .items
            .browse(&query)
            .await
            .map_err(map_item_repository_error)?;
        with_owners(self.users.as_ref(), result.items).await
    }

    async fn get(&self, item_id: &ItemId) -> Result<ItemDetails, Error> {
        let item = self.load(item_id).await?;
        self.describe(item).await
    }

    async fn mine(&self, owner: &UserId) -> Result<Vec<ItemDetails>, Error> {
        let items = self
            .items
            .list_by_owner(owner)
            .await
            .map_err(map_item_repository_error)?;
        with_owners(self.users.as_ref(), items).await
    }
}

#[cfg(test)]
#[path = "item_service_tests.rs"]
mod tests;
