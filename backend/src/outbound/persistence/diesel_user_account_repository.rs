//! PostgreSQL-backed `UserAccountRepository` implementation using Diesel ORM.
//!
//! Balances are never written here; only the swap repository's settlement
//! transaction moves points.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{UserAccountRepository, UserAccountRepositoryError};
use crate::domain::{Role, UserAccount, UserId};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, violated_unique_constraint,
};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the [`UserAccountRepository`] port.
#[derive(Clone)]
pub struct DieselUserAccountRepository {
    pool: DbPool,
}

impl DieselUserAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserAccountRepositoryError {
    map_basic_pool_error(error, UserAccountRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserAccountRepositoryError {
    map_basic_diesel_error(
        error,
        UserAccountRepositoryError::query,
        UserAccountRepositoryError::connection,
    )
}

fn into_accounts(rows: Vec<UserRow>) -> Result<Vec<UserAccount>, UserAccountRepositoryError> {
    rows.into_iter()
        .map(UserRow::into_domain)
        .collect::<Result<Vec<_>, _>>()
        .map_err(UserAccountRepositoryError::query)
}

#[async_trait]
impl UserAccountRepository for DieselUserAccountRepository {
    async fn find_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<UserAccount>, UserAccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(UserRow::into_domain)
            .transpose()
            .map_err(UserAccountRepositoryError::query)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, UserAccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(UserRow::into_domain)
            .transpose()
            .map_err(UserAccountRepositoryError::query)
    }

    async fn find_many(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<UserAccount>, UserAccountRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(uuids))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_accounts(rows)
    }

    async fn insert(&self, account: &UserAccount) -> Result<(), UserAccountRepositoryError> {
        let row = NewUserRow::from_domain(account).map_err(UserAccountRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        match diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
        {
            Ok(_) => Ok(()),
            Err(error) if violated_unique_constraint(&error).is_some() => {
                debug!(username = %account.username, "username already registered");
                Err(UserAccountRepositoryError::duplicate_username(
                    account.username.as_ref(),
                ))
            }
            Err(error) => Err(map_diesel_error(error)),
        }
    }

    async fn list(&self) -> Result<Vec<UserAccount>, UserAccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .select(UserRow::as_select())
            .order_by((users::created_at.desc(), users::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_accounts(rows)
    }

    async fn recent(&self, limit: u64) -> Result<Vec<UserAccount>, UserAccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .select(UserRow::as_select())
            .order_by((users::created_at.desc(), users::id.desc()))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_accounts(rows)
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<bool, UserAccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set((
                users::role.eq(role.as_str()),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn count(&self) -> Result<u64, UserAccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        u64::try_from(total).map_err(|_| UserAccountRepositoryError::query("negative row count"))
    }
}
