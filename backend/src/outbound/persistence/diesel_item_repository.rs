//! PostgreSQL-backed `ItemRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    ItemBrowseQuery, ItemCounts, ItemPage, ItemRepository, ItemRepositoryError,
};
use crate::domain::{Item, ItemId, ItemStatus, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{ItemContentUpdate, ItemRow, NewItemRow};
use super::pool::{DbPool, PoolError};
use super::schema::items;

/// Diesel-backed implementation of the [`ItemRepository`] port.
///
/// Deleting a listing relies on `ON DELETE CASCADE` to drop the swap requests
/// that reference it.
#[derive(Clone)]
pub struct DieselItemRepository {
    pool: DbPool,
}

impl DieselItemRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ItemRepositoryError {
    map_basic_pool_error(error, ItemRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ItemRepositoryError {
    map_basic_diesel_error(
        error,
        ItemRepositoryError::query,
        ItemRepositoryError::connection,
    )
}

fn into_items(rows: Vec<ItemRow>) -> Result<Vec<Item>, ItemRepositoryError> {
    rows.into_iter()
        .map(ItemRow::into_domain)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ItemRepositoryError::query)
}

fn to_sql_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_count(value: i64) -> Result<u64, ItemRepositoryError> {
    u64::try_from(value).map_err(|_| ItemRepositoryError::query("negative row count"))
}

/// Escape `LIKE` wildcards so user input matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Listed items matching the catalogue filters, without ordering or paging.
fn listed_matching(query: &ItemBrowseQuery) -> items::BoxedQuery<'static, Pg> {
    let mut statement = items::table
        .filter(items::status.eq(ItemStatus::Approved.as_str()))
        .filter(items::is_available.eq(true))
        .into_boxed();
    if let Some(category) = query.category {
        statement = statement.filter(items::category.eq(category.as_str()));
    }
    if let Some(garment_type) = query.garment_type {
        statement = statement.filter(items::garment_type.eq(garment_type.as_str()));
    }
    if let Some(size) = query.size {
        statement = statement.filter(items::size.eq(size.as_str()));
    }
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let needle = term.to_lowercase();
        let pattern = like_pattern(&needle);
        statement = statement.filter(
            items::title
                .ilike(pattern.clone())
                .or(items::description.ilike(pattern))
                .or(items::tags.contains(vec![needle])),
        );
    }
    statement
}

#[async_trait]
impl ItemRepository for DieselItemRepository {
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ItemRow> = items::table
            .filter(items::id.eq(id.as_uuid()))
            .select(ItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(ItemRow::into_domain)
            .transpose()
            .map_err(ItemRepositoryError::query)
    }

    async fn find_many(&self, ids: &[ItemId]) -> Result<Vec<Item>, ItemRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ItemRow> = items::table
            .filter(items::id.eq_any(uuids))
            .select(ItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_items(rows)
    }

    async fn insert(&self, item: &Item) -> Result<(), ItemRepositoryError> {
        let row = NewItemRow::from_domain(item).map_err(ItemRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(items::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, item: &Item) -> Result<bool, ItemRepositoryError> {
        let changes = ItemContentUpdate::from_domain(item).map_err(ItemRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(items::table.filter(items::id.eq(item.id.as_uuid())))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: &ItemId) -> Result<bool, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(items::table.filter(items::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn browse(&self, query: &ItemBrowseQuery) -> Result<ItemPage, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = listed_matching(query)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<ItemRow> = listed_matching(query)
            .select(ItemRow::as_select())
            .order_by((items::created_at.desc(), items::id.desc()))
            .offset(to_sql_count(query.offset))
            .limit(to_sql_count(query.limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(ItemPage {
            items: into_items(rows)?,
            total: from_sql_count(total)?,
        })
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Item>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ItemRow> = items::table
            .filter(items::owner_id.eq(owner.as_uuid()))
            .select(ItemRow::as_select())
            .order_by((items::created_at.desc(), items::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_items(rows)
    }

    async fn list_by_status(&self, status: ItemStatus) -> Result<Vec<Item>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ItemRow> = items::table
            .filter(items::status.eq(status.as_str()))
            .select(ItemRow::as_select())
            .order_by((items::created_at.asc(), items::id.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_items(rows)
    }

    async fn set_status(
        &self,
        id: &ItemId,
        expected: ItemStatus,
        next: ItemStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            items::table
                .filter(items::id.eq(id.as_uuid()))
                .filter(items::status.eq(expected.as_str())),
        )
        .set((items::status.eq(next.as_str()), items::updated_at.eq(now)))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn counts(&self) -> Result<ItemCounts, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = items::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let pending: i64 = items::table
            .filter(items::status.eq(ItemStatus::Pending.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let approved: i64 = items::table
            .filter(items::status.eq(ItemStatus::Approved.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(ItemCounts {
            total: from_sql_count(total)?,
            pending: from_sql_count(pending)?,
            approved: from_sql_count(approved)?,
        })
    }

    async fn recent(&self, limit: u64) -> Result<Vec<Item>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ItemRow> = items::table
            .select(ItemRow::as_select())
            .order_by((items::created_at.desc(), items::id.desc()))
            .limit(to_sql_count(limit))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_items(rows)
    }
}
