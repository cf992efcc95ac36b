//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed entities for listings, accounts and swap
//! requests, the ports adapters implement, and the services that enforce the
//! swap lifecycle. Nothing here depends on Actix or Diesel.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: transport-agnostic failure payload.
//! - [`Item`], [`UserAccount`], [`SwapRequest`]: stored aggregates.
//! - [`SwapService`]: the swap lifecycle engine.
//! - [`ItemService`], [`ModerationService`], [`AccountService`]: supporting
//!   use-cases.

pub mod account_service;
pub mod error;
pub mod item;
pub mod item_service;
pub mod moderation_service;
pub mod ports;
pub mod swap;
pub mod swap_service;
pub mod trace_id;
pub mod user;

pub use self::account_service::AccountService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::item::{
    Category, Condition, GarmentType, Item, ItemAttributes, ItemDescription, ItemDetails,
    ItemDraft, ItemId, ItemStatus, ItemTitle, ItemValidationError, PointsValue, Size, Tags,
};
pub use self::item_service::ItemService;
pub use self::moderation_service::{ModerationService, percentage};
pub use self::swap::{
    ItemSettlement, ItemSummary, POINTS_OFFER_MAX, PointsTransfer, SWAP_MESSAGE_MAX,
    SettlementPlan, SwapAction, SwapDetails, SwapError, SwapId, SwapMessage, SwapOffer,
    SwapRequest, SwapRole, SwapStatus, SwapType,
};
pub use self::swap_service::SwapService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    DisplayName, LoginCredentials, LoginValidationError, Role, STARTING_POINTS, UserAccount,
    UserId, UserSummary, UserValidationError, Username,
};
