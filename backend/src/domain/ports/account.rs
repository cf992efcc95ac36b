//! Driving ports for account registration and lookup.

use async_trait::async_trait;

use crate::domain::{DisplayName, Error, UserAccount, UserId, Username};

/// Account write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Register a new account with the starting points balance.
    ///
    /// Fails with `conflict` when the username is taken.
    async fn register(
        &self,
        username: Username,
        display_name: DisplayName,
    ) -> Result<UserAccount, Error>;
}

/// Account read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    /// The account behind an authenticated session.
    async fn me(&self, user_id: &UserId) -> Result<UserAccount, Error>;
}
