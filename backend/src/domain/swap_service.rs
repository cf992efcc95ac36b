//! Swap lifecycle engine.
//!
//! `SwapService` validates swap creation, enforces the
//! `pending -> accepted | rejected | cancelled` state machine and hands
//! settlement plans to the swap repository, which applies them atomically.
//! The service performs its checks against a snapshot read first, then relies
//! on the repository's conditional writes to detect lost races; a race lost at
//! write time surfaces as the same named condition a sequential caller would
//! have seen.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    ItemRepository, ItemRepositoryError, NewSwapRequest, SwapCommand, SwapQuery, SwapRepository,
    SwapRepositoryError, UserAccountRepository, UserAccountRepositoryError,
};
use crate::domain::{
    Error, Item, ItemId, ItemSummary, SettlementPlan, SwapAction, SwapDetails, SwapError, SwapId,
    SwapMessage, SwapOffer, SwapRequest, SwapRole, UserAccount, UserId,
};

fn item_store_failure(error: ItemRepositoryError) -> SwapError {
    let retryable = matches!(error, ItemRepositoryError::Connection { .. });
    SwapError::SettlementFailure {
        message: error.to_string(),
        retryable,
    }
}

fn user_store_failure(error: UserAccountRepositoryError) -> SwapError {
    let retryable = matches!(error, UserAccountRepositoryError::Connection { .. });
    SwapError::SettlementFailure {
        message: error.to_string(),
        retryable,
    }
}

fn swap_store_failure(error: SwapRepositoryError) -> SwapError {
    let retryable = matches!(error, SwapRepositoryError::Connection { .. });
    SwapError::SettlementFailure {
        message: error.to_string(),
        retryable,
    }
}

/// Swap engine implementing [`SwapCommand`] and [`SwapQuery`].
#[derive(Clone)]
pub struct SwapService<I, U, S> {
    items: Arc<I>,
    users: Arc<U>,
    swaps: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<I, U, S> SwapService<I, U, S> {
    /// Create a swap service over the item, account and swap repositories.
    pub fn new(items: Arc<I>, users: Arc<U>, swaps: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            items,
            users,
            swaps,
            clock,
        }
    }
}

impl<I, U, S> SwapService<I, U, S>
where
    I: ItemRepository,
    U: UserAccountRepository,
    S: SwapRepository,
{
    /// Validate and store a new pending swap.
    ///
    /// Checks run in a fixed order so callers always see the first failing
    /// rule: request shape, target availability, self-swap, offer validity,
    /// then duplicate detection.
    pub async fn create_swap(&self, request: NewSwapRequest) -> Result<SwapDetails, SwapError> {
        let offer = SwapOffer::from_parts(
            request.swap_type,
            request.item_offered_id,
            request.points_offered,
        )?;
        let message = SwapMessage::parse(request.message)?;
        let requester_id = request.requester_id;

        let requested = self
            .items
            .find_by_id(&request.item_requested_id)
            .await
            .map_err(item_store_failure)?
            .filter(|item| item.is_available)
            .ok_or(SwapError::NotAvailable {
                item_id: request.item_requested_id,
            })?;

        if requested.is_owned_by(&requester_id) {
            return Err(SwapError::SelfSwapForbidden);
        }

        match offer {
            SwapOffer::Direct { item_offered } => {
                self.check_offered_item(&requester_id, item_offered)
                    .await?;
            }
            SwapOffer::Points { points } => {
                let required = requested.points_value.get();
                if points < required {
                    return Err(SwapError::InsufficientOffer {
                        offered: points,
                        required,
                    });
                }
                let requester = self.load_user(&requester_id).await?;
                if requester.points < points {
                    return Err(SwapError::InsufficientBalance {
                        balance: requester.points,
                        offered: points,
                    });
                }
            }
        }

        let duplicate = self
            .swaps
            .has_pending(&requester_id, &requested.id)
            .await
            .map_err(swap_store_failure)?;
        if duplicate {
            return Err(SwapError::DuplicateRequest);
        }

        let swap = SwapRequest::propose(
            requester_id,
            requested.id,
            offer,
            message,
            self.clock.utc(),
        );
        self.swaps
            .insert_pending(&swap)
            .await
            .map_err(|error| match error {
                SwapRepositoryError::DuplicatePending => SwapError::DuplicateRequest,
                other => swap_store_failure(other),
            })?;

        info!(
            swap_id = %swap.id,
            requester_id = %swap.requester_id,
            item_id = %swap.item_requested_id,
            swap_type = swap.offer.swap_type().as_str(),
            "swap requested"
        );
        self.describe(swap).await
    }

    /// Accept a pending swap and apply its settlement atomically.
    pub async fn accept_swap(
        &self,
        actor: &UserId,
        swap_id: &SwapId,
    ) -> Result<SwapDetails, SwapError> {
        let (swap, requested) = self.load_for_owner(actor, swap_id, SwapAction::Accept).await?;
        swap.status.apply(SwapAction::Accept)?;

        let plan = SettlementPlan::for_swap(&swap, requested.owner_id, self.clock.utc());
        let receipt = match self.swaps.settle(&plan).await {
            Ok(receipt) => receipt,
            Err(error) => {
                return Err(self.settlement_error(&swap, SwapAction::Accept, error).await);
            }
        };

        info!(
            swap_id = %receipt.swap.id,
            owner_id = %requested.owner_id,
            auto_rejected = receipt.rejected.len(),
            "swap accepted and settled"
        );
        self.describe(receipt.swap).await
    }

    /// Reject a pending swap as the owner of the requested item.
    pub async fn reject_swap(
        &self,
        actor: &UserId,
        swap_id: &SwapId,
    ) -> Result<SwapDetails, SwapError> {
        let (swap, _) = self.load_for_owner(actor, swap_id, SwapAction::Reject).await?;
        self.close(swap, SwapAction::Reject).await
    }

    /// Withdraw a pending swap as its requester.
    pub async fn cancel_swap(
        &self,
        actor: &UserId,
        swap_id: &SwapId,
    ) -> Result<SwapDetails, SwapError> {
        let swap = self.load_swap(swap_id).await?;
        if &swap.requester_id != actor {
            return Err(SwapError::NotAuthorized {
                action: SwapAction::Cancel.as_str(),
            });
        }
        self.close(swap, SwapAction::Cancel).await
    }

    /// Fetch a swap visible to `actor`.
    pub async fn get_swap(
        &self,
        actor: &UserId,
        swap_id: &SwapId,
    ) -> Result<SwapDetails, SwapError> {
        let swap = self.load_swap(swap_id).await?;
        let details = self.describe(swap).await?;
        if &details.swap.requester_id == actor || &details.item_requested.owner.id == actor {
            return Ok(details);
        }
        let viewer = self.load_user(actor).await?;
        if viewer.is_admin() {
            return Ok(details);
        }
        Err(SwapError::NotAuthorized { action: "view" })
    }

    /// Swaps where `actor` plays `role`, newest first.
    pub async fn list_swaps(
        &self,
        actor: &UserId,
        role: SwapRole,
    ) -> Result<Vec<SwapDetails>, SwapError> {
        let swaps = match role {
            SwapRole::Requester => self.swaps.list_by_requester(actor).await,
            SwapRole::Owner => self.swaps.list_for_owner(actor).await,
        }
        .map_err(swap_store_failure)?;
        self.describe_many(swaps).await
    }

    async fn check_offered_item(
        &self,
        requester_id: &UserId,
        item_id: ItemId,
    ) -> Result<(), SwapError> {
        let offered = self
            .items
            .find_by_id(&item_id)
            .await
            .map_err(item_store_failure)?;
        let valid = offered
            .as_ref()
            .is_some_and(|item| item.is_owned_by(requester_id) && item.is_available);
        if valid {
            Ok(())
        } else {
            Err(SwapError::InvalidOffer { item_id })
        }
    }

    async fn load_swap(&self, swap_id: &SwapId) -> Result<SwapRequest, SwapError> {
        self.swaps
            .find_by_id(swap_id)
            .await
            .map_err(swap_store_failure)?
            .ok_or(SwapError::SwapNotFound { swap_id: *swap_id })
    }

    async fn load_user(&self, user_id: &UserId) -> Result<UserAccount, SwapError> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(user_store_failure)?
            .ok_or(SwapError::UnknownUser { user_id: *user_id })
    }

    /// Load a swap and its requested item, requiring `actor` to own the item.
    async fn load_for_owner(
        &self,
        actor: &UserId,
        swap_id: &SwapId,
        action: SwapAction,
    ) -> Result<(SwapRequest, Item), SwapError> {
        let swap = self.load_swap(swap_id).await?;
        let requested = self
            .items
            .find_by_id(&swap.item_requested_id)
            .await
            .map_err(item_store_failure)?
            .ok_or(SwapError::ItemNotFound {
                item_id: swap.item_requested_id,
            })?;
        if !requested.is_owned_by(actor) {
            return Err(SwapError::NotAuthorized {
                action: action.as_str(),
            });
        }
        Ok((swap, requested))
    }

    /// Move a pending swap to a terminal state without settlement effects.
    async fn close(&self, swap: SwapRequest, action: SwapAction) -> Result<SwapDetails, SwapError> {
        let next = swap.status.apply(action)?;
        let updated = match self.swaps.transition(&swap.id, next, self.clock.utc()).await {
            Ok(updated) => updated,
            Err(error) => return Err(self.settlement_error(&swap, action, error).await),
        };
        info!(swap_id = %updated.id, status = %updated.status, "swap closed");
        self.describe(updated).await
    }

    /// Translate a failed conditional write into the condition the caller
    /// would have seen had it arrived second.
    async fn settlement_error(
        &self,
        swap: &SwapRequest,
        action: SwapAction,
        error: SwapRepositoryError,
    ) -> SwapError {
        match error {
            SwapRepositoryError::NotPending => match self.load_swap(&swap.id).await {
                Ok(current) => SwapError::InvalidState {
                    status: current.status,
                    action,
                },
                Err(err) => err,
            },
            SwapRepositoryError::ItemUnavailable { item_id } => SwapError::NotAvailable { item_id },
            SwapRepositoryError::InsufficientBalance { balance } => {
                SwapError::InsufficientBalance {
                    balance,
                    offered: swap.offer.points_offered().unwrap_or_default(),
                }
            }
            other => swap_store_failure(other),
        }
    }

    async fn describe(&self, swap: SwapRequest) -> Result<SwapDetails, SwapError> {
        let swap_id = swap.id;
        self.describe_many(vec![swap])
            .await?
            .pop()
            .ok_or(SwapError::SwapNotFound { swap_id })
    }

    /// Resolve referenced items and users for a batch of swaps.
    async fn describe_many(&self, swaps: Vec<SwapRequest>) -> Result<Vec<SwapDetails>, SwapError> {
        if swaps.is_empty() {
            return Ok(Vec::new());
        }
        let item_ids: Vec<ItemId> = swaps
            .iter()
            .flat_map(SwapRequest::referenced_items)
            .collect();
        let items: HashMap<ItemId, Item> = self
            .items
            .find_many(&item_ids)
            .await
            .map_err(item_store_failure)?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        let mut user_ids: Vec<UserId> = items.values().map(|item| item.owner_id).collect();
        user_ids.extend(swaps.iter().map(|swap| swap.requester_id));
        user_ids.sort_by_key(|id| *id.as_uuid());
        user_ids.dedup();
        let users: HashMap<UserId, UserAccount> = self
            .users
            .find_many(&user_ids)
            .await
            .map_err(user_store_failure)?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        let summarise = |item_id: ItemId| -> Result<ItemSummary, SwapError> {
            let item = items
                .get(&item_id)
                .ok_or(SwapError::ItemNotFound { item_id })?;
            let owner = users
                .get(&item.owner_id)
                .ok_or(SwapError::UnknownUser {
                    user_id: item.owner_id,
                })?;
            Ok(ItemSummary::new(item, owner.summary()))
        };

        swaps
            .into_iter()
            .map(|swap| {
                let requester = users
                    .get(&swap.requester_id)
                    .ok_or(SwapError::UnknownUser {
                        user_id: swap.requester_id,
                    })?
                    .summary();
                let item_requested = summarise(swap.item_requested_id)?;
                let item_offered = swap.offer.item_offered().map(summarise).transpose()?;
                Ok(SwapDetails {
                    swap,
                    requester,
                    item_requested,
                    item_offered,
                })
            })
            .collect()
    }
}

#[async_trait]
impl<I, U, S> SwapCommand for SwapService<I, U, S>
where
    I: ItemRepository,
    U: UserAccountRepository,
    S: SwapRepository,
{
    async fn create(&self, request: NewSwapRequest) -> Result<SwapDetails, Error> {
        self.create_swap(request).await.map_err(Error::from)
    }

    async fn accept(&self, actor: &UserId, swap_id: &SwapId) -> Result<SwapDetails, Error> {
        self.accept_swap(actor, swap_id).await.map_err(Error::from)
    }

    async fn reject(&self, actor: &UserId, swap_id: &SwapId) -> Result<SwapDetails, Error> {
        self.reject_swap(actor, swap_id).await.map_err(Error::from)
    }

    async fn cancel(&self, actor: &UserId, swap_id: &SwapId) -> Result<SwapDetails, Error> {
        self.cancel_swap(actor, swap_id).await.map_err(Error::from)
    }
}

#[async_trait]
impl<I, U, S> SwapQuery for SwapService<I, U, S>
where
    I: ItemRepository,
    U: UserAccountRepository,
    S: SwapRepository,
{
    async fn get(&self, actor: &UserId, swap_id: &SwapId) -> Result<SwapDetails, Error> {
        self.get_swap(actor, swap_id).await.map_err(Error::from)
    }

    async fn list(&self, actor: &UserId, role: SwapRole) -> Result<Vec<SwapDetails>, Error> {
        self.list_swaps(actor, role).await.map_err(Error::from)
    }
}

#[cfg(test)]
#[path = "swap_service_tests.rs"]
mod tests;
