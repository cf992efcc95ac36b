//! In-process store implementing every repository port.
//!
//! All state lives behind a single mutex, so each port call (including a full
//! settlement) runs as one critical section. This gives the same atomicity the
//! Diesel adapters get from conditional updates and transactions. The store
//! backs development servers without a database URL and most integration
//! tests.

mod demo;

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    ItemBrowseQuery, ItemCounts, ItemPage, ItemRepository, ItemRepositoryError,
    SettlementReceipt, SwapCounts, SwapRepository, SwapRepositoryError, UserAccountRepository,
    UserAccountRepositoryError,
};
use crate::domain::{
    Item, ItemId, ItemStatus, Role, SettlementPlan, SwapId, SwapRequest, SwapStatus, UserAccount,
    UserId,
};

pub use demo::DemoDataError;

const POISONED: &str = "in-memory store lock poisoned";

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, UserAccount>,
    items: HashMap<ItemId, Item>,
    swaps: HashMap<SwapId, SwapRequest>,
}

impl State {
    fn owner_of(&self, item_id: &ItemId) -> Option<UserId> {
        self.items.get(item_id).map(|item| item.owner_id)
    }
}

/// Shared in-process store. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, &'static str> {
        self.state.lock().map_err(|_| POISONED)
    }
}

fn newest_first<T, K: Ord>(values: &mut [T], key: impl Fn(&T) -> K) {
    values.sort_by_key(|value| Reverse(key(value)));
}

fn take_limit<T>(values: Vec<T>, limit: u64) -> Vec<T> {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    values.into_iter().take(limit).collect()
}

fn browse_matches(item: &Item, query: &ItemBrowseQuery) -> bool {
    item.is_listed()
        && query.category.is_none_or(|category| item.category == category)
        && query
            .garment_type
            .is_none_or(|garment_type| item.garment_type == garment_type)
        && query.size.is_none_or(|size| item.size == size)
        && query
            .search
            .as_deref()
            .is_none_or(|term| item.matches_search(term))
}

#[async_trait]
impl ItemRepository for InMemoryStore {
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, ItemRepositoryError> {
        let state = self.lock().map_err(ItemRepositoryError::query)?;
        Ok(state.items.get(id).cloned())
    }

    async fn find_many(&self, ids: &[ItemId]) -> Result<Vec<Item>, ItemRepositoryError> {
        let state = self.lock().map_err(ItemRepositoryError::query)?;
        Ok(state
            .items
            .values()
            .filter(|item| ids.contains(&item.id))
            .cloned()
            .collect())
    }

    async fn insert(&self, item: &Item) -> Result<(), ItemRepositoryError> {
        let mut state = self.lock().map_err(ItemRepositoryError::query)?;
        if state.items.contains_key(&item.id) {
            return Err(ItemRepositoryError::query(format!(
                "item {} already exists",
                item.id
            )));
        }
        state.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update(&self, item: &Item) -> Result<bool, ItemRepositoryError> {
        let mut state = self.lock().map_err(ItemRepositoryError::query)?;
        let Some(stored) = state.items.get_mut(&item.id) else {
            return Ok(false);
        };
        let status = stored.status;
        let is_available = stored.is_available;
        *stored = item.clone();
        stored.status = status;
        stored.is_available = is_available;
        Ok(true)
    }

    async fn delete(&self, id: &ItemId) -> Result<bool, ItemRepositoryError> {
        let mut state = self.lock().map_err(ItemRepositoryError::query)?;
        if state.items.remove(id).is_none() {
            return Ok(false);
        }
        state
            .swaps
            .retain(|_, swap| !swap.referenced_items().contains(id));
        Ok(true)
    }

    async fn browse(&self, query: &ItemBrowseQuery) -> Result<ItemPage, ItemRepositoryError> {
        let state = self.lock().map_err(ItemRepositoryError::query)?;
        let mut matching: Vec<Item> = state
            .items
            .values()
            .filter(|item| browse_matches(item, query))
            .cloned()
            .collect();
        newest_first(&mut matching, |item| (item.created_at, *item.id.as_uuid()));
        let total = matching.len() as u64;
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let items = take_limit(matching.into_iter().skip(offset).collect(), query.limit);
        Ok(ItemPage { items, total })
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Item>, ItemRepositoryError> {
        let state = self.lock().map_err(ItemRepositoryError::query)?;
        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|item| item.is_owned_by(owner))
            .cloned()
            .collect();
        newest_first(&mut items, |item| (item.created_at, *item.id.as_uuid()));
        Ok(items)
    }

    async fn list_by_status(&self, status: ItemStatus) -> Result<Vec<Item>, ItemRepositoryError> {
        let state = self.lock().map_err(ItemRepositoryError::query)?;
        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|item| item.status == status)
            .cloned()
            .collect();
        items.sort_by_key(|item| (item.created_at, *item.id.as_uuid()));
        Ok(items)
    }

    async fn set_status(
        &self,
        id: &ItemId,
        expected: ItemStatus,
        next: ItemStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, ItemRepositoryError> {
        let mut state = self.lock().map_err(ItemRepositoryError::query)?;
        match state.items.get_mut(id) {
            Some(item) if item.status == expected => {
                item.status = next;
                item.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn counts(&self) -> Result<ItemCounts, ItemRepositoryError> {
        let state = self.lock().map_err(ItemRepositoryError::query)?;
        let count = |status: ItemStatus| {
            state
                .items
                .values()
                .filter(|item| item.status == status)
                .count() as u64
        };
        Ok(ItemCounts {
            total: state.items.len() as u64,
            pending: count(ItemStatus::Pending),
            approved: count(ItemStatus::Approved),
        })
    }

    async fn recent(&self, limit: u64) -> Result<Vec<Item>, ItemRepositoryError> {
        let state = self.lock().map_err(ItemRepositoryError::query)?;
        let mut items: Vec<Item> = state.items.values().cloned().collect();
        newest_first(&mut items, |item| (item.created_at, *item.id.as_uuid()));
        Ok(take_limit(items, limit))
    }
}

#[async_trait]
impl UserAccountRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<UserAccount>, UserAccountRepositoryError> {
        let state = self.lock().map_err(UserAccountRepositoryError::query)?;
        Ok(state.users.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, UserAccountRepositoryError> {
        let state = self.lock().map_err(UserAccountRepositoryError::query)?;
        Ok(state
            .users
            .values()
            .find(|account| account.username.as_ref() == username)
            .cloned())
    }

    async fn find_many(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<UserAccount>, UserAccountRepositoryError> {
        let state = self.lock().map_err(UserAccountRepositoryError::query)?;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn insert(&self, account: &UserAccount) -> Result<(), UserAccountRepositoryError> {
        let mut state = self.lock().map_err(UserAccountRepositoryError::query)?;
        let taken = state
            .users
            .values()
            .any(|existing| existing.username == account.username);
        if taken {
            return Err(UserAccountRepositoryError::duplicate_username(
                account.username.as_ref(),
            ));
        }
        state.users.insert(account.id, account.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<UserAccount>, UserAccountRepositoryError> {
        let state = self.lock().map_err(UserAccountRepositoryError::query)?;
        let mut users: Vec<UserAccount> = state.users.values().cloned().collect();
        newest_first(&mut users, |user| (user.created_at, *user.id.as_uuid()));
        Ok(users)
    }

    async fn recent(&self, limit: u64) -> Result<Vec<UserAccount>, UserAccountRepositoryError> {
        let users = UserAccountRepository::list(self).await?;
        Ok(take_limit(users, limit))
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<bool, UserAccountRepositoryError> {
        let mut state = self.lock().map_err(UserAccountRepositoryError::query)?;
        match state.users.get_mut(id) {
            Some(account) => {
                account.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> Result<u64, UserAccountRepositoryError> {
        let state = self.lock().map_err(UserAccountRepositoryError::query)?;
        Ok(state.users.len() as u64)
    }
}

/// Validate every guard of `plan` against `state` without mutating it.
fn check_settlement(state: &State, plan: &SettlementPlan) -> Result<(), SwapRepositoryError> {
    let pending = state
        .swaps
        .get(&plan.swap_id)
        .is_some_and(|swap| swap.status == SwapStatus::Pending);
    if !pending {
        return Err(SwapRepositoryError::not_pending());
    }
    for entry in &plan.items {
        let available = state
            .items
            .get(&entry.item_id)
            .is_some_and(|item| item.is_available);
        if !available {
            return Err(SwapRepositoryError::item_unavailable(entry.item_id));
        }
    }
    if let Some(transfer) = plan.points {
        let balance = state
            .users
            .get(&transfer.from)
            .map(|account| account.points)
            .ok_or_else(|| SwapRepositoryError::query(format!("payer {} missing", transfer.from)))?;
        if balance < transfer.amount {
            return Err(SwapRepositoryError::insufficient_balance(balance));
        }
        let credit_fits = state
            .users
            .get(&transfer.to)
            .ok_or_else(|| SwapRepositoryError::query(format!("payee {} missing", transfer.to)))?
            .points
            .checked_add(transfer.amount)
            .is_some();
        if !credit_fits {
            return Err(SwapRepositoryError::query("payee balance overflow"));
        }
    }
    Ok(())
}

fn apply_settlement(
    state: &mut State,
    plan: &SettlementPlan,
) -> Result<SettlementReceipt, SwapRepositoryError> {
    let now = plan.completed_at;
    let swap = state
        .swaps
        .get_mut(&plan.swap_id)
        .ok_or_else(SwapRepositoryError::not_pending)?;
    swap.status = SwapStatus::Accepted;
    swap.completed_at = Some(now);
    swap.updated_at = now;
    let accepted = swap.clone();

    for entry in &plan.items {
        if let Some(item) = state.items.get_mut(&entry.item_id) {
            item.is_available = false;
            item.status = entry.new_status;
            item.updated_at = now;
        }
    }
    if let Some(transfer) = plan.points {
        if let Some(payer) = state.users.get_mut(&transfer.from) {
            payer.points -= transfer.amount;
        }
        if let Some(payee) = state.users.get_mut(&transfer.to) {
            payee.points += transfer.amount;
        }
    }

    let settled_items = plan.item_ids();
    let mut rejected = Vec::new();
    for swap in state.swaps.values_mut() {
        let competing = swap.status == SwapStatus::Pending
            && swap
                .referenced_items()
                .iter()
                .any(|item_id| settled_items.contains(item_id));
        if competing {
            swap.status = SwapStatus::Rejected;
            swap.updated_at = now;
            rejected.push(swap.id);
        }
    }

    Ok(SettlementReceipt {
        swap: accepted,
        rejected,
    })
}

#[async_trait]
impl SwapRepository for InMemoryStore {
    async fn find_by_id(&self, id: &SwapId) -> Result<Option<SwapRequest>, SwapRepositoryError> {
        let state = self.lock().map_err(SwapRepositoryError::query)?;
        Ok(state.swaps.get(id).cloned())
    }

    async fn has_pending(
        &self,
        requester: &UserId,
        item: &ItemId,
    ) -> Result<bool, SwapRepositoryError> {
        let state = self.lock().map_err(SwapRepositoryError::query)?;
        Ok(state.swaps.values().any(|swap| {
            swap.status == SwapStatus::Pending
                && &swap.requester_id == requester
                && &swap.item_requested_id == item
        }))
    }

    async fn insert_pending(&self, swap: &SwapRequest) -> Result<(), SwapRepositoryError> {
        let mut state = self.lock().map_err(SwapRepositoryError::query)?;
        let duplicate = state.swaps.values().any(|existing| {
            existing.status == SwapStatus::Pending
                && existing.requester_id == swap.requester_id
                && existing.item_requested_id == swap.item_requested_id
        });
        if duplicate {
            return Err(SwapRepositoryError::duplicate_pending());
        }
        state.swaps.insert(swap.id, swap.clone());
        Ok(())
    }

    async fn transition(
        &self,
        id: &SwapId,
        next: SwapStatus,
        now: DateTime<Utc>,
    ) -> Result<SwapRequest, SwapRepositoryError> {
        let mut state = self.lock().map_err(SwapRepositoryError::query)?;
        match state.swaps.get_mut(id) {
            Some(swap) if swap.status == SwapStatus::Pending => {
                swap.status = next;
                swap.updated_at = now;
                Ok(swap.clone())
            }
            _ => Err(SwapRepositoryError::not_pending()),
        }
    }

    async fn settle(
        &self,
        plan: &SettlementPlan,
    ) -> Result<SettlementReceipt, SwapRepositoryError> {
        let mut state = self.lock().map_err(SwapRepositoryError::query)?;
        check_settlement(&state, plan)?;
        apply_settlement(&mut state, plan)
    }

    async fn list_by_requester(
        &self,
        requester: &UserId,
    ) -> Result<Vec<SwapRequest>, SwapRepositoryError> {
        let state = self.lock().map_err(SwapRepositoryError::query)?;
        let mut swaps: Vec<SwapRequest> = state
            .swaps
            .values()
            .filter(|swap| &swap.requester_id == requester)
            .cloned()
            .collect();
        newest_first(&mut swaps, |swap| (swap.created_at, *swap.id.as_uuid()));
        Ok(swaps)
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<SwapRequest>, SwapRepositoryError> {
        let state = self.lock().map_err(SwapRepositoryError::query)?;
        let mut swaps: Vec<SwapRequest> = state
            .swaps
            .values()
            .filter(|swap| state.owner_of(&swap.item_requested_id).as_ref() == Some(owner))
            .cloned()
            .collect();
        newest_first(&mut swaps, |swap| (swap.created_at, *swap.id.as_uuid()));
        Ok(swaps)
    }

    async fn counts(&self) -> Result<SwapCounts, SwapRepositoryError> {
        let state = self.lock().map_err(SwapRepositoryError::query)?;
        Ok(SwapCounts {
            total: state.swaps.len() as u64,
            accepted: state
                .swaps
                .values()
                .filter(|swap| swap.status == SwapStatus::Accepted)
                .count() as u64,
        })
    }

    async fn recent(&self, limit: u64) -> Result<Vec<SwapRequest>, SwapRepositoryError> {
        let state = self.lock().map_err(SwapRepositoryError::query)?;
        let mut swaps: Vec<SwapRequest> = state.swaps.values().cloned().collect();
        newest_first(&mut swaps, |swap| (swap.created_at, *swap.id.as_uuid()));
        Ok(take_limit(swaps, limit))
    }
}
