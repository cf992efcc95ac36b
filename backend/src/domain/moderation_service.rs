//! Administrator moderation services.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::item_service::{
    item_not_found, map_account_repository_error, map_item_repository_error, with_owners,
};
use crate::domain::ports::{
    ACTIVITY_LIMIT, ItemRepository, ModerationCommand, ModerationQuery, PlatformStats,
    RecentActivity, SwapRepository, SwapRepositoryError, UserAccountRepository,
};
use crate::domain::{Error, ItemDetails, ItemId, ItemStatus, Role, UserAccount, UserId};

fn map_swap_repository_error(error: SwapRepositoryError) -> Error {
    match error {
        SwapRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("swap repository unavailable: {message}"))
        }
        other => Error::internal(format!("swap repository error: {other}")),
    }
}

/// Percentage of `part` in `whole`, rounded to one decimal place.
///
/// Returns `0.0` when `whole` is zero.
///
/// # Examples
/// ```
/// use rewear_backend::domain::percentage;
///
/// assert_eq!(percentage(1, 3), 33.3);
/// assert_eq!(percentage(2, 3), 66.7);
/// assert_eq!(percentage(5, 0), 0.0);
/// ```
#[must_use]
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    // Integer rounding in tenths of a percent, widened so large counts cannot overflow.
    let whole = u128::from(whole);
    let tenths = (u128::from(part) * 1000 + whole / 2) / whole;
    tenths as f64 / 10.0
}

/// Moderation service implementing [`ModerationCommand`] and [`ModerationQuery`].
#[derive(Clone)]
pub struct ModerationService<I, U, S> {
    items: Arc<I>,
    users: Arc<U>,
    swaps: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<I, U, S> ModerationService<I, U, S> {
    /// Create a moderation service over the item, account and swap repositories.
    pub fn new(items: Arc<I>, users: Arc<U>, swaps: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            items,
            users,
            swaps,
            clock,
        }
    }
}

impl<I, U, S> ModerationService<I, U, S>
where
    I: ItemRepository,
    U: UserAccountRepository,
    S: SwapRepository,
{
    async fn require_admin(&self, actor: &UserId) -> Result<UserAccount, Error> {
        let account = self
            .users
            .find_by_id(actor)
            .await
            .map_err(map_account_repository_error)?
            .ok_or_else(|| Error::unauthorized("account not found"))?;
        if !account.is_admin() {
            return Err(Error::forbidden("admin role required"));
        }
        Ok(account)
    }

    async fn moderate(
        &self,
        actor: &UserId,
        item_id: &ItemId,
        next: ItemStatus,
    ) -> Result<ItemDetails, Error> {
        self.require_admin(actor).await?;
        let item = self
            .items
            .find_by_id(item_id)
            .await
            .map_err(map_item_repository_error)?
            .ok_or_else(|| item_not_found(item_id))?;
        let invalid_state = || {
            Error::conflict(format!("only pending items can be moderated; item is {}", item.status))
                .with_details(json!({ "code": "invalid_state" }))
        };
        if item.status != ItemStatus::Pending {
            return Err(invalid_state());
        }
        let now = self.clock.utc();
        let moved = self
            .items
            .set_status(item_id, ItemStatus::Pending, next, now)
            .await
            .map_err(map_item_repository_error)?;
        if !moved {
            return Err(invalid_state());
        }
        info!(item_id = %item_id, moderator_id = %actor, status = %next, "item moderated");

        let mut updated = item;
        updated.status = next;
        updated.updated_at = now;
        with_owners(self.users.as_ref(), vec![updated])
            .await?
            .pop()
            .ok_or_else(|| item_not_found(item_id))
    }
}

#[async_trait]
impl<I, U, S> ModerationCommand for ModerationService<I, U, S>
where
    I: ItemRepository,
    U: UserAccountRepository,
    S: SwapRepository,
{
    async fn approve_item(&self, actor: &UserId, item_id: &ItemId) -> Result<ItemDetails, Error> {
        self.moderate(actor, item_id, ItemStatus::Approved).await
    }

    async fn reject_item(&self, actor: &UserId, item_id: &ItemId) -> Result<ItemDetails, Error> {
        self.moderate(actor, item_id, ItemStatus::Rejected).await
    }

    async fn remove_item(&self, actor: &UserId, item_id: &ItemId) -> Result<(), Error> {
        self.require_admin(actor).await?;
        let deleted = self
            .items
            .delete(item_id)
            .await
            .map_err(map_item_repository_error)?;
        if !deleted {
            return Err(item_not_found(item_id));
        }
        info!(item_id = %item_id, moderator_id = %actor, "item removed by moderator");
        Ok(())
    }

    async fn set_role(
        &self,
        actor: &UserId,
        user_id: &UserId,
        role: Role,
    ) -> Result<UserAccount, Error> {
        self.require_admin(actor).await?;
        if actor == user_id && role != Role::Admin {
            return Err(Error::invalid_request("admins cannot remove their own admin role"));
        }
        let updated = self
            .users
            .set_role(user_id, role)
            .await
            .map_err(map_account_repository_error)?;
        if !updated {
            return Err(Error::not_found(format!("user {user_id} not found")));
        }
        info!(user_id = %user_id, moderator_id = %actor, role = %role, "role changed");
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_account_repository_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))
    }
}

#[async_trait]
impl<I, U, S> ModerationQuery for ModerationService<I, U, S>
where
    I: ItemRepository,
    U: UserAccountRepository,
    S: SwapRepository,
{
    async fn pending_items(&self, actor: &UserId) -> Result<Vec<ItemDetails>, Error> {
        self.require_admin(actor).await?;
        let items = self
            .items
            .list_by_status(ItemStatus::Pending)
            .await
            .map_err(map_item_repository_error)?;
        with_owners(self.users.as_ref(), items).await
    }

    async fn stats(&self, actor: &UserId) -> Result<PlatformStats, Error> {
        self.require_admin(actor).await?;
        let total_users = self
            .users
            .count()
            .await
            .map_err(map_account_repository_error)?;
        let items = self
            .items
            .counts()
            .await
            .map_err(map_item_repository_error)?;
        let swaps = self
            .swaps
            .counts()
            .await
            .map_err(map_swap_repository_error)?;
        Ok(PlatformStats {
            total_users,
            total_items: items.total,
            pending_items: items.pending,
            approved_items: items.approved,
            total_swaps: swaps.total,
            completed_swaps: swaps.accepted,
            approval_rate: percentage(items.approved, items.total),
            swap_success_rate: percentage(swaps.accepted, swaps.total),
        })
    }

    async fn users(&self, actor: &UserId) -> Result<Vec<UserAccount>, Error> {
        self.require_admin(actor).await?;
        self.users
            .list()
            .await
            .map_err(map_account_repository_error)
    }

    async fn activity(&self, actor: &UserId) -> Result<RecentActivity, Error> {
        self.require_admin(actor).await?;
        let items = self
            .items
            .recent(ACTIVITY_LIMIT)
            .await
            .map_err(map_item_repository_error)?;
        let swaps = self
            .swaps
            .recent(ACTIVITY_LIMIT)
            .await
            .map_err(map_swap_repository_error)?;
        let users = self
            .users
            .recent(ACTIVITY_LIMIT)
            .await
            .map_err(map_account_repository_error)?;
        Ok(RecentActivity {
            items: with_owners(self.users.as_ref(), items).await?,
            swaps,
            users,
        })
    }
}

#[cfg(test)]
#[path = "moderation_service_tests.rs"]
mod tests;
