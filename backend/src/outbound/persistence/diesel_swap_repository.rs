//! PostgreSQL-backed `SwapRepository` implementation using Diesel ORM.
//!
//! Every state change is a conditional update predicated on
//! `status = 'pending'`, so two requests racing on one swap cannot both win.
//! Settlement runs in a single transaction: the swap flip, each item flip
//! (conditional on `is_available`), the requester debit (conditional on
//! `points >= amount`), the owner credit and the rejection of competing
//! requests either all commit or all roll back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::ports::{SettlementReceipt, SwapCounts, SwapRepository, SwapRepositoryError};
use crate::domain::{ItemId, SettlementPlan, SwapId, SwapRequest, SwapStatus, UserId};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, violated_unique_constraint,
};
use super::models::{NewSwapRow, SwapRow, signed};
use super::pool::{DbPool, PoolError};
use super::schema::{items, swap_requests, users};

const PENDING: &str = SwapStatus::Pending.as_str();

/// Diesel-backed implementation of the [`SwapRepository`] port.
#[derive(Clone)]
pub struct DieselSwapRepository {
    pool: DbPool,
}

impl DieselSwapRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SwapRepositoryError {
    map_basic_pool_error(error, SwapRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> SwapRepositoryError {
    map_basic_diesel_error(
        error,
        SwapRepositoryError::query,
        SwapRepositoryError::connection,
    )
}

fn into_swap(row: SwapRow) -> Result<SwapRequest, SwapRepositoryError> {
    row.into_domain().map_err(SwapRepositoryError::query)
}

fn into_swaps(rows: Vec<SwapRow>) -> Result<Vec<SwapRequest>, SwapRepositoryError> {
    rows.into_iter().map(into_swap).collect()
}

fn from_sql_count(value: i64) -> Result<u64, SwapRepositoryError> {
    u64::try_from(value).map_err(|_| SwapRepositoryError::query("negative row count"))
}

/// Why a settlement transaction rolled back.
#[derive(Debug)]
enum SettlementAbort {
    /// A guard failed; the port error is reported as-is.
    Guard(SwapRepositoryError),
    /// The database itself failed.
    Database(diesel::result::Error),
}

impl From<diesel::result::Error> for SettlementAbort {
    fn from(error: diesel::result::Error) -> Self {
        Self::Database(error)
    }
}

impl From<SettlementAbort> for SwapRepositoryError {
    fn from(abort: SettlementAbort) -> Self {
        match abort {
            SettlementAbort::Guard(error) => error,
            SettlementAbort::Database(error) => map_diesel_error(error),
        }
    }
}

async fn accept_pending(
    conn: &mut AsyncPgConnection,
    plan: &SettlementPlan,
) -> Result<SwapRow, SettlementAbort> {
    let now = plan.completed_at;
    diesel::update(
        swap_requests::table
            .filter(swap_requests::id.eq(plan.swap_id.as_uuid()))
            .filter(swap_requests::status.eq(PENDING)),
    )
    .set((
        swap_requests::status.eq(SwapStatus::Accepted.as_str()),
        swap_requests::completed_at.eq(Some(now)),
        swap_requests::updated_at.eq(now),
    ))
    .returning(SwapRow::as_returning())
    .get_result(conn)
    .await
    .optional()?
    .ok_or(SettlementAbort::Guard(SwapRepositoryError::NotPending))
}

async fn flip_items(
    conn: &mut AsyncPgConnection,
    plan: &SettlementPlan,
) -> Result<(), SettlementAbort> {
    for entry in &plan.items {
        let updated = diesel::update(
            items::table
                .filter(items::id.eq(entry.item_id.as_uuid()))
                .filter(items::is_available.eq(true)),
        )
        .set((
            items::is_available.eq(false),
            items::status.eq(entry.new_status.as_str()),
            items::updated_at.eq(plan.completed_at),
        ))
        .execute(conn)
        .await?;
        if updated == 0 {
            return Err(SettlementAbort::Guard(
                SwapRepositoryError::item_unavailable(entry.item_id),
            ));
        }
    }
    Ok(())
}

async fn transfer_points(
    conn: &mut AsyncPgConnection,
    plan: &SettlementPlan,
) -> Result<(), SettlementAbort> {
    let Some(transfer) = plan.points else {
        return Ok(());
    };
    let amount = signed("points", transfer.amount)
        .map_err(|message| SettlementAbort::Guard(SwapRepositoryError::query(message)))?;

    let debited = diesel::update(
        users::table
            .filter(users::id.eq(transfer.from.as_uuid()))
            .filter(users::points.ge(amount)),
    )
    .set(users::points.eq(users::points - amount))
    .execute(conn)
    .await?;
    if debited == 0 {
        let balance: Option<i32> = users::table
            .filter(users::id.eq(transfer.from.as_uuid()))
            .select(users::points)
            .first(conn)
            .await
            .optional()?;
        let error = match balance.map(u32::try_from) {
            Some(Ok(balance)) => SwapRepositoryError::insufficient_balance(balance),
            Some(Err(_)) => SwapRepositoryError::query("negative balance stored"),
            None => SwapRepositoryError::query(format!("payer {} missing", transfer.from)),
        };
        return Err(SettlementAbort::Guard(error));
    }

    let credited = diesel::update(users::table.filter(users::id.eq(transfer.to.as_uuid())))
        .set(users::points.eq(users::points + amount))
        .execute(conn)
        .await?;
    if credited == 0 {
        return Err(SettlementAbort::Guard(SwapRepositoryError::query(format!(
            "payee {} missing",
            transfer.to
        ))));
    }
    Ok(())
}

async fn reject_competitors(
    conn: &mut AsyncPgConnection,
    plan: &SettlementPlan,
) -> Result<Vec<SwapId>, SettlementAbort> {
    let settled: Vec<Uuid> = plan.item_ids().iter().map(|id| *id.as_uuid()).collect();
    let rejected: Vec<Uuid> = diesel::update(
        swap_requests::table
            .filter(swap_requests::status.eq(PENDING))
            .filter(swap_requests::id.ne(plan.swap_id.as_uuid()))
            .filter(
                swap_requests::item_requested_id
                    .eq_any(settled.clone())
                    .or(swap_requests::item_offered_id.eq_any(settled)),
            ),
    )
    .set((
        swap_requests::status.eq(SwapStatus::Rejected.as_str()),
        swap_requests::updated_at.eq(plan.completed_at),
    ))
    .returning(swap_requests::id)
    .get_results(conn)
    .await?;
    Ok(rejected.into_iter().map(SwapId::from_uuid).collect())
}

#[async_trait]
impl SwapRepository for DieselSwapRepository {
    async fn find_by_id(&self, id: &SwapId) -> Result<Option<SwapRequest>, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SwapRow> = swap_requests::table
            .filter(swap_requests::id.eq(id.as_uuid()))
            .select(SwapRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(into_swap).transpose()
    }

    async fn has_pending(
        &self,
        requester: &UserId,
        item: &ItemId,
    ) -> Result<bool, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(
            swap_requests::table
                .filter(swap_requests::requester_id.eq(requester.as_uuid()))
                .filter(swap_requests::item_requested_id.eq(item.as_uuid()))
                .filter(swap_requests::status.eq(PENDING)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn insert_pending(&self, swap: &SwapRequest) -> Result<(), SwapRepositoryError> {
        let row = NewSwapRow::from_domain(swap).map_err(SwapRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        match diesel::insert_into(swap_requests::table)
            .values(&row)
            .execute(&mut conn)
            .await
        {
            Ok(_) => Ok(()),
            Err(error) if violated_unique_constraint(&error).is_some() => {
                debug!(swap_id = %swap.id, "pending swap request already exists");
                Err(SwapRepositoryError::duplicate_pending())
            }
            Err(error) => Err(map_diesel_error(error)),
        }
    }

    async fn transition(
        &self,
        id: &SwapId,
        next: SwapStatus,
        now: DateTime<Utc>,
    ) -> Result<SwapRequest, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SwapRow> = diesel::update(
            swap_requests::table
                .filter(swap_requests::id.eq(id.as_uuid()))
                .filter(swap_requests::status.eq(PENDING)),
        )
        .set((
            swap_requests::status.eq(next.as_str()),
            swap_requests::updated_at.eq(now),
        ))
        .returning(SwapRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        match row {
            Some(row) => into_swap(row),
            None => Err(SwapRepositoryError::not_pending()),
        }
    }

    async fn settle(
        &self,
        plan: &SettlementPlan,
    ) -> Result<SettlementReceipt, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (row, rejected) = conn
            .transaction::<_, SettlementAbort, _>(|conn| {
                async move {
                    let row = accept_pending(conn, plan).await?;
                    flip_items(conn, plan).await?;
                    transfer_points(conn, plan).await?;
                    let rejected = reject_competitors(conn, plan).await?;
                    Ok((row, rejected))
                }
                .scope_boxed()
            })
            .await?;
        info!(
            swap_id = %plan.swap_id,
            rejected = rejected.len(),
            "settlement committed"
        );
        Ok(SettlementReceipt {
            swap: into_swap(row)?,
            rejected,
        })
    }

    async fn list_by_requester(
        &self,
        requester: &UserId,
    ) -> Result<Vec<SwapRequest>, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SwapRow> = swap_requests::table
            .filter(swap_requests::requester_id.eq(requester.as_uuid()))
            .select(SwapRow::as_select())
            .order_by((swap_requests::created_at.desc(), swap_requests::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_swaps(rows)
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<SwapRequest>, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SwapRow> = swap_requests::table
            .inner_join(items::table.on(items::id.eq(swap_requests::item_requested_id)))
            .filter(items::owner_id.eq(owner.as_uuid()))
            .select(SwapRow::as_select())
            .order_by((swap_requests::created_at.desc(), swap_requests::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_swaps(rows)
    }

    async fn counts(&self) -> Result<SwapCounts, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = swap_requests::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let accepted: i64 = swap_requests::table
            .filter(swap_requests::status.eq(SwapStatus::Accepted.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(SwapCounts {
            total: from_sql_count(total)?,
            accepted: from_sql_count(accepted)?,
        })
    }

    async fn recent(&self, limit: u64) -> Result<Vec<SwapRequest>, SwapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SwapRow> = swap_requests::table
            .select(SwapRow::as_select())
            .order_by((swap_requests::created_at.desc(), swap_requests::id.desc()))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_swaps(rows)
    }
}
