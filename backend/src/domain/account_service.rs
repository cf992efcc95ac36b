//! Account registration, lookup and development login.
//!
//! Password storage is out of scope for this service. Every registered
//! username authenticates with one shared password supplied by configuration,
//! which keeps local and test environments usable without a credential store.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use zeroize::Zeroizing;

use crate::domain::item_service::map_account_repository_error;
use crate::domain::ports::{AccountCommand, AccountQuery, LoginService, UserAccountRepository};
use crate::domain::{DisplayName, Error, LoginCredentials, UserAccount, UserId, Username};

/// Account service implementing [`AccountCommand`], [`AccountQuery`] and
/// [`LoginService`].
#[derive(Clone)]
pub struct AccountService<U> {
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    shared_password: Arc<Zeroizing<String>>,
}

impl<U> AccountService<U> {
    /// Create an account service accepting `shared_password` for every user.
    pub fn new(users: Arc<U>, clock: Arc<dyn Clock>, shared_password: impl Into<String>) -> Self {
        Self {
            users,
            clock,
            shared_password: Arc::new(Zeroizing::new(shared_password.into())),
        }
    }
}

#[async_trait]
impl<U> AccountCommand for AccountService<U>
where
    U: UserAccountRepository,
{
    async fn register(
        &self,
        username: Username,
        display_name: DisplayName,
    ) -> Result<UserAccount, Error> {
        let account = UserAccount::register(username, display_name, self.clock.utc());
        self.users
            .insert(&account)
            .await
            .map_err(map_account_repository_error)?;
        info!(user_id = %account.id, username = %account.username, "account registered");
        Ok(account)
    }
}

#[async_trait]
impl<U> AccountQuery for AccountService<U>
where
    U: UserAccountRepository,
{
    async fn me(&self, user_id: &UserId) -> Result<UserAccount, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_account_repository_error)?
            .ok_or_else(|| Error::unauthorized("account not found"))
    }
}

#[async_trait]
impl<U> LoginService for AccountService<U>
where
    U: UserAccountRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let account = self
            .users
            .find_by_username(credentials.username())
            .await
            .map_err(map_account_repository_error)?;
        match account {
            Some(account) if credentials.password() == self.shared_password.as_str() => {
                Ok(account.id)
            }
            _ => Err(Error::unauthorized("invalid credentials")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockUserAccountRepository, UserAccountRepositoryError};
    use crate::domain::Role;
    use crate::test_support::clock::MutableClock;
    use crate::test_support::fixtures::account;
    use rstest::rstest;

    fn service(users: MockUserAccountRepository) -> AccountService<MockUserAccountRepository> {
        AccountService::new(Arc::new(users), Arc::new(MutableClock::default()), "hunter2")
    }

    #[rstest]
    #[case("alice", "hunter2", true)]
    #[case("alice", "wrong", false)]
    #[case("nobody", "hunter2", false)]
    #[tokio::test]
    async fn login_accepts_shared_password_for_known_users(
        #[case] username: &str,
        #[case] password: &str,
        #[case] should_succeed: bool,
    ) {
        let alice = account("alice", Role::User, 100);
        let expected_id = alice.id;
        let mut users = MockUserAccountRepository::new();
        users
            .expect_find_by_username()
            .returning(move |name| Ok((name == "alice").then(|| alice.clone())));
        let creds =
            LoginCredentials::try_from_parts(username, password).expect("credentials shape");

        let result = service(users).authenticate(&creds).await;
        match (should_succeed, result) {
            (true, Ok(id)) => assert_eq!(id, expected_id),
            (false, Err(err)) => assert_eq!(err.code(), ErrorCode::Unauthorized),
            (true, Err(err)) => panic!("expected success, got error: {err:?}"),
            (false, Ok(id)) => panic!("expected failure, got success: {id}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn register_grants_starting_points() {
        let mut users = MockUserAccountRepository::new();
        users.expect_insert().times(1).returning(|_| Ok(()));

        let account = service(users)
            .register(
                Username::new("newbie").expect("username"),
                DisplayName::new("New Bie").expect("display name"),
            )
            .await
            .expect("registered");
        assert_eq!(account.points, crate::domain::STARTING_POINTS);
        assert_eq!(account.role, Role::User);
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_usernames_conflict() {
        let mut users = MockUserAccountRepository::new();
        users
            .expect_insert()
            .returning(|account| {
                Err(UserAccountRepositoryError::duplicate_username(
                    account.username.as_ref(),
                ))
            });

        let err = service(users)
            .register(
                Username::new("taken").expect("username"),
                DisplayName::new("Taken").expect("display name"),
            )
            .await
            .expect_err("conflict");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }
}
