//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    AccountCommand, AccountQuery, ItemCommand, ItemQuery, ItemRepository, LoginService,
    ModerationCommand, ModerationQuery, SwapCommand, SwapQuery, SwapRepository,
    UserAccountRepository,
};
use crate::domain::{AccountService, ItemService, ModerationService, SwapService};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub accounts: Arc<dyn AccountCommand>,
    pub account_query: Arc<dyn AccountQuery>,
    pub items: Arc<dyn ItemCommand>,
    pub item_query: Arc<dyn ItemQuery>,
    pub swaps: Arc<dyn SwapCommand>,
    pub swap_query: Arc<dyn SwapQuery>,
    pub moderation: Arc<dyn ModerationCommand>,
    pub moderation_query: Arc<dyn ModerationQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub accounts: Arc<dyn AccountCommand>,
    pub account_query: Arc<dyn AccountQuery>,
    pub items: Arc<dyn ItemCommand>,
    pub item_query: Arc<dyn ItemQuery>,
    pub swaps: Arc<dyn SwapCommand>,
    pub swap_query: Arc<dyn SwapQuery>,
    pub moderation: Arc<dyn ModerationCommand>,
    pub moderation_query: Arc<dyn ModerationQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            accounts,
            account_query,
            items,
            item_query,
            swaps,
            swap_query,
            moderation,
            moderation_query,
        } = ports;
        Self {
            login,
            accounts,
            account_query,
            items,
            item_query,
            swaps,
            swap_query,
            moderation,
            moderation_query,
        }
    }

    /// Wire the domain services over one set of repositories.
    ///
    /// Every service shares the same repository handles, so the in-process
    /// store and the Diesel adapters are interchangeable here.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use rewear_backend::inbound::http::state::HttpState;
    /// use rewear_backend::outbound::memory::InMemoryStore;
    ///
    /// let store = Arc::new(InMemoryStore::new());
    /// let state = HttpState::from_repositories(
    ///     store.clone(),
    ///     store.clone(),
    ///     store,
    ///     Arc::new(DefaultClock),
    ///     "password",
    /// );
    /// let _swaps = state.swaps.clone();
    /// ```
    pub fn from_repositories<I, U, S>(
        items: Arc<I>,
        users: Arc<U>,
        swaps: Arc<S>,
        clock: Arc<dyn Clock>,
        login_password: impl Into<String>,
    ) -> Self
    where
        I: ItemRepository + 'static,
        U: UserAccountRepository + 'static,
        S: SwapRepository + 'static,
    {
        let accounts = Arc::new(AccountService::new(
            users.clone(),
            clock.clone(),
            login_password,
        ));
        let catalogue = Arc::new(ItemService::new(items.clone(), users.clone(), clock.clone()));
        let engine = Arc::new(SwapService::new(
            items.clone(),
            users.clone(),
            swaps.clone(),
            clock.clone(),
        ));
        let moderation = Arc::new(ModerationService::new(items, users, swaps, clock));

        Self::new(HttpStatePorts {
            login: accounts.clone(),
            accounts: accounts.clone(),
            account_query: accounts,
            items: catalogue.clone(),
            item_query: catalogue,
            swaps: engine.clone(),
            swap_query: engine,
            moderation: moderation.clone(),
            moderation_query: moderation,
        })
    }
}
