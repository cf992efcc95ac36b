//! Port abstraction for user account persistence.

use async_trait::async_trait;

use crate::domain::{Role, UserAccount, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by account repository adapters.
    pub enum UserAccountRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "account repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "account repository query failed: {message}",
        /// Another account already uses this username.
        DuplicateUsername { username: String } => "username {username} is already taken",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAccountRepository: Send + Sync {
    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: &UserId)
    -> Result<Option<UserAccount>, UserAccountRepositoryError>;

    /// Fetch an account by its lowercase username.
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, UserAccountRepositoryError>;

    /// Fetch every account whose id appears in `ids`; missing ids are skipped.
    async fn find_many(&self, ids: &[UserId])
    -> Result<Vec<UserAccount>, UserAccountRepositoryError>;

    /// Store a new account.
    async fn insert(&self, account: &UserAccount) -> Result<(), UserAccountRepositoryError>;

    /// Every account, newest first.
    async fn list(&self) -> Result<Vec<UserAccount>, UserAccountRepositoryError>;

    /// Most recently registered accounts.
    async fn recent(&self, limit: u64) -> Result<Vec<UserAccount>, UserAccountRepositoryError>;

    /// Change an account's role. Returns `false` when the account is missing.
    async fn set_role(&self, id: &UserId, role: Role) -> Result<bool, UserAccountRepositoryError>;

    /// Number of registered accounts.
    async fn count(&self) -> Result<u64, UserAccountRepositoryError>;
}
