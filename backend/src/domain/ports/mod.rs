//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`) are implemented by outbound adapters; driving
//! ports (`*Command`, `*Query`, [`LoginService`]) are implemented by domain
//! services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account;
mod item_command;
mod item_repository;
mod login_service;
mod moderation;
mod swap_command;
mod swap_repository;
mod user_account_repository;

#[cfg(test)]
pub use account::{MockAccountCommand, MockAccountQuery};
pub use account::{AccountCommand, AccountQuery};
#[cfg(test)]
pub use item_command::{MockItemCommand, MockItemQuery};
pub use item_command::{
    BrowseItemsRequest, DEFAULT_PAGE_LIMIT, FEATURED_LIMIT, ItemCatalogPage, ItemCommand,
    ItemQuery, MAX_PAGE_LIMIT,
};
#[cfg(test)]
pub use item_repository::MockItemRepository;
pub use item_repository::{
    ItemBrowseQuery, ItemCounts, ItemPage, ItemRepository, ItemRepositoryError,
};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use moderation::{MockModerationCommand, MockModerationQuery};
pub use moderation::{
    ACTIVITY_LIMIT, ModerationCommand, ModerationQuery, PlatformStats, RecentActivity,
};
#[cfg(test)]
pub use swap_command::{MockSwapCommand, MockSwapQuery};
pub use swap_command::{NewSwapRequest, SwapCommand, SwapQuery};
#[cfg(test)]
pub use swap_repository::MockSwapRepository;
pub use swap_repository::{SettlementReceipt, SwapCounts, SwapRepository, SwapRepositoryError};
#[cfg(test)]
pub use user_account_repository::MockUserAccountRepository;
pub use user_account_repository::{UserAccountRepository, UserAccountRepositoryError};

#[cfg(test)]
mod tests;
