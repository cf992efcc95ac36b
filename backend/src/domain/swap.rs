//! Swap requests, their state machine and settlement plans.
//!
//! A swap starts `pending` and moves exactly once into a terminal state:
//!
//! ```text
//! pending ──accept──▶ accepted
//!    │ ────reject──▶ rejected
//!    └─────cancel──▶ cancelled
//! ```
//!
//! Accepting a swap produces a [`SettlementPlan`], the full set of
//! mutations persistence adapters must apply atomically.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use super::{Error, Item, ItemId, ItemStatus, UserId, UserSummary};

/// Maximum characters in the optional note attached to a request.
pub const SWAP_MESSAGE_MAX: usize = 500;
/// Upper bound on a single points offer.
pub const POINTS_OFFER_MAX: u32 = 1_000_000;

/// Stable swap identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwapId(Uuid);

impl SwapId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SwapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How the requester pays for the requested item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapType {
    Direct,
    Points,
}

impl SwapType {
    /// Stable storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Points => "points",
        }
    }
}

impl FromStr for SwapType {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "points" => Ok(Self::Points),
            other => Err(SwapError::validation(
                "swapType",
                format!("unknown swap type: {other}"),
            )),
        }
    }
}

/// Lifecycle status of a swap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl SwapStatus {
    /// Stable storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal states accept no further actions.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Apply `action`, returning the resulting status.
    ///
    /// # Examples
    /// ```
    /// use rewear_backend::domain::{SwapAction, SwapStatus};
    ///
    /// assert_eq!(
    ///     SwapStatus::Pending.apply(SwapAction::Accept).ok(),
    ///     Some(SwapStatus::Accepted),
    /// );
    /// assert!(SwapStatus::Accepted.apply(SwapAction::Cancel).is_err());
    /// ```
    pub fn apply(self, action: SwapAction) -> Result<Self, SwapError> {
        if self.is_terminal() {
            return Err(SwapError::InvalidState {
                status: self,
                action,
            });
        }
        Ok(action.target())
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapStatus {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(SwapError::validation(
                "status",
                format!("unknown swap status: {other}"),
            )),
        }
    }
}

/// Actions that move a swap out of `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapAction {
    Accept,
    Reject,
    Cancel,
}

impl SwapAction {
    /// Status reached when the action succeeds.
    pub const fn target(self) -> SwapStatus {
        match self {
            Self::Accept => SwapStatus::Accepted,
            Self::Reject => SwapStatus::Rejected,
            Self::Cancel => SwapStatus::Cancelled,
        }
    }

    /// Lowercase verb used in logs and messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for SwapAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the requester offers in return for the requested item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOffer {
    /// Item-for-item exchange.
    Direct { item_offered: ItemId },
    /// Points redemption.
    Points { points: u32 },
}

impl SwapOffer {
    /// Build an offer from the loosely typed request fields.
    ///
    /// Exactly one of `item_offered` / `points_offered` must be supplied and it
    /// must match `swap_type`.
    pub fn from_parts(
        swap_type: SwapType,
        item_offered: Option<ItemId>,
        points_offered: Option<u32>,
    ) -> Result<Self, SwapError> {
        match (swap_type, item_offered, points_offered) {
            (SwapType::Direct, Some(item_offered), None) => Ok(Self::Direct { item_offered }),
            (SwapType::Direct, None, _) => Err(SwapError::validation(
                "itemOffered",
                "itemOffered is required for direct swaps",
            )),
            (SwapType::Direct, Some(_), Some(_)) => Err(SwapError::validation(
                "pointsOffered",
                "pointsOffered is not allowed for direct swaps",
            )),
            (SwapType::Points, None, Some(points)) if points > POINTS_OFFER_MAX => {
                Err(SwapError::validation(
                    "pointsOffered",
                    format!("pointsOffered must be at most {POINTS_OFFER_MAX}"),
                ))
            }
            (SwapType::Points, None, Some(points)) => Ok(Self::Points { points }),
            (SwapType::Points, _, None) => Err(SwapError::validation(
                "pointsOffered",
                "pointsOffered is required for points swaps",
            )),
            (SwapType::Points, Some(_), Some(_)) => Err(SwapError::validation(
                "itemOffered",
                "itemOffered is not allowed for points swaps",
            )),
        }
    }

    /// Swap type implied by the offer.
    pub const fn swap_type(&self) -> SwapType {
        match self {
            Self::Direct { .. } => SwapType::Direct,
            Self::Points { .. } => SwapType::Points,
        }
    }

    /// Offered item, for direct swaps.
    pub const fn item_offered(&self) -> Option<ItemId> {
        match self {
            Self::Direct { item_offered } => Some(*item_offered),
            Self::Points { .. } => None,
        }
    }

    /// Offered points, for points swaps.
    pub const fn points_offered(&self) -> Option<u32> {
        match self {
            Self::Direct { .. } => None,
            Self::Points { points } => Some(*points),
        }
    }
}

/// Optional free-text note from the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapMessage(String);

impl SwapMessage {
    /// Trim and validate; blank input yields `None`.
    pub fn parse(value: Option<String>) -> Result<Option<Self>, SwapError> {
        let Some(raw) = value else {
            return Ok(None);
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if trimmed.chars().count() > SWAP_MESSAGE_MAX {
            return Err(SwapError::validation(
                "message",
                format!("message must be at most {SWAP_MESSAGE_MAX} characters"),
            ));
        }
        Ok(Some(Self(trimmed.to_owned())))
    }
}

impl AsRef<str> for SwapMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stored swap request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub id: SwapId,
    pub requester_id: UserId,
    pub item_requested_id: ItemId,
    pub offer: SwapOffer,
    pub status: SwapStatus,
    pub message: Option<SwapMessage>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SwapRequest {
    /// Build a new pending request.
    pub fn propose(
        requester_id: UserId,
        item_requested_id: ItemId,
        offer: SwapOffer,
        message: Option<SwapMessage>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SwapId::random(),
            requester_id,
            item_requested_id,
            offer,
            status: SwapStatus::Pending,
            message,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Items whose records this swap references.
    pub fn referenced_items(&self) -> Vec<ItemId> {
        let mut ids = vec![self.item_requested_id];
        ids.extend(self.offer.item_offered());
        ids
    }
}

/// Status change applied to one item during settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSettlement {
    pub item_id: ItemId,
    pub new_status: ItemStatus,
}

/// Points moved from requester to owner during settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsTransfer {
    pub from: UserId,
    pub to: UserId,
    pub amount: u32,
}

/// All mutations performed when a swap is accepted.
///
/// Adapters apply a plan atomically:
/// - the swap moves `pending -> accepted` only if it is still pending;
/// - every item flips `is_available = false` only if it is still available;
/// - the debit only succeeds if the payer holds at least `amount`.
///
/// Any guard failing aborts the whole plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    pub swap_id: SwapId,
    pub completed_at: DateTime<Utc>,
    pub items: Vec<ItemSettlement>,
    pub points: Option<PointsTransfer>,
}

impl SettlementPlan {
    /// Derive the plan for accepting `swap` on behalf of `owner_id`.
    pub fn for_swap(swap: &SwapRequest, owner_id: UserId, completed_at: DateTime<Utc>) -> Self {
        let (items, points) = match swap.offer {
            SwapOffer::Direct { item_offered } => (
                vec![
                    ItemSettlement {
                        item_id: swap.item_requested_id,
                        new_status: ItemStatus::Swapped,
                    },
                    ItemSettlement {
                        item_id: item_offered,
                        new_status: ItemStatus::Swapped,
                    },
                ],
                None,
            ),
            SwapOffer::Points { points } => (
                vec![ItemSettlement {
                    item_id: swap.item_requested_id,
                    new_status: ItemStatus::Redeemed,
                }],
                Some(PointsTransfer {
                    from: swap.requester_id,
                    to: owner_id,
                    amount: points,
                }),
            ),
        };
        Self {
            swap_id: swap.id,
            completed_at,
            items,
            points,
        }
    }

    /// Identifiers of every item the plan settles.
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|entry| entry.item_id).collect()
    }
}

/// Compact item view embedded in swap payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub id: ItemId,
    pub title: String,
    pub category: super::Category,
    pub condition: super::Condition,
    pub points_value: u32,
    pub status: ItemStatus,
    pub is_available: bool,
    pub owner: UserSummary,
}

impl ItemSummary {
    /// Combine an item with its resolved owner.
    pub fn new(item: &Item, owner: UserSummary) -> Self {
        Self {
            id: item.id,
            title: item.title.as_ref().to_owned(),
            category: item.category,
            condition: item.condition,
            points_value: item.points_value.get(),
            status: item.status,
            is_available: item.is_available,
            owner,
        }
    }
}

/// Swap with referenced items and users resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapDetails {
    pub swap: SwapRequest,
    pub requester: UserSummary,
    pub item_requested: ItemSummary,
    pub item_offered: Option<ItemSummary>,
}

/// Which side of a swap a listing is filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapRole {
    /// Swaps the user asked for.
    #[default]
    Requester,
    /// Swaps targeting items the user owns.
    Owner,
}

impl FromStr for SwapRole {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requester" => Ok(Self::Requester),
            "owner" => Ok(Self::Owner),
            other => Err(SwapError::validation(
                "role",
                format!("role must be requester or owner, got {other}"),
            )),
        }
    }
}

/// Named failure conditions of the swap engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwapError {
    /// The request is malformed.
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    /// The swap does not exist.
    #[error("swap {swap_id} not found")]
    SwapNotFound { swap_id: SwapId },
    /// A referenced item does not exist.
    #[error("item {item_id} not found")]
    ItemNotFound { item_id: ItemId },
    /// The acting account does not exist.
    #[error("account {user_id} not found")]
    UnknownUser { user_id: UserId },
    /// The actor is not allowed to act on this swap.
    #[error("not authorised to {action} this swap")]
    NotAuthorized { action: &'static str },
    /// The swap already reached a terminal state.
    #[error("cannot {action} a swap that is {status}")]
    InvalidState { status: SwapStatus, action: SwapAction },
    /// The requested item cannot be swapped right now.
    #[error("item {item_id} is not available for swap")]
    NotAvailable { item_id: ItemId },
    /// Requesting one's own item.
    #[error("cannot request a swap for your own item")]
    SelfSwapForbidden,
    /// The offered item is missing, foreign or unavailable.
    #[error("offered item {item_id} is not a valid offer")]
    InvalidOffer { item_id: ItemId },
    /// Points offered do not cover the item's value.
    #[error("must offer at least {required} points for this item")]
    InsufficientOffer { offered: u32, required: u32 },
    /// The requester cannot afford the offer.
    #[error("insufficient points: balance {balance}, offered {offered}")]
    InsufficientBalance { balance: u32, offered: u32 },
    /// A pending request for this item from this requester already exists.
    #[error("you already have a pending swap for this item")]
    DuplicateRequest,
    /// The store failed while applying a change.
    #[error("swap settlement failed: {message}")]
    SettlementFailure { message: String, retryable: bool },
}

impl SwapError {
    /// Shorthand for a [`SwapError::Validation`].
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Stable machine-readable condition name carried in error details.
    pub const fn condition(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::SwapNotFound { .. } => "swap_not_found",
            Self::ItemNotFound { .. } => "item_not_found",
            Self::UnknownUser { .. } => "unknown_user",
            Self::NotAuthorized { .. } => "not_authorized",
            Self::InvalidState { .. } => "invalid_state",
            Self::NotAvailable { .. } => "not_available",
            Self::SelfSwapForbidden => "self_swap_forbidden",
            Self::InvalidOffer { .. } => "invalid_offer",
            Self::InsufficientOffer { .. } => "insufficient_offer",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::DuplicateRequest => "duplicate_request",
            Self::SettlementFailure { .. } => "settlement_failure",
        }
    }
}

impl From<SwapError> for Error {
    fn from(value: SwapError) -> Self {
        let message = value.to_string();
        let condition = value.condition();
        let error = match &value {
            SwapError::Validation { field, .. } => {
                return Error::invalid_request(message)
                    .with_details(json!({ "field": field, "code": condition }));
            }
            SwapError::SelfSwapForbidden
            | SwapError::InvalidOffer { .. }
            | SwapError::InsufficientOffer { .. }
            | SwapError::InsufficientBalance { .. } => Error::invalid_request(message),
            SwapError::NotAuthorized { .. } => Error::forbidden(message),
            SwapError::UnknownUser { .. } => Error::unauthorized(message),
            SwapError::SwapNotFound { .. } | SwapError::ItemNotFound { .. } => {
                Error::not_found(message)
            }
            SwapError::InvalidState { .. }
            | SwapError::NotAvailable { .. }
            | SwapError::DuplicateRequest => Error::conflict(message),
            SwapError::SettlementFailure {
                retryable: true, ..
            } => Error::service_unavailable(message),
            SwapError::SettlementFailure { .. } => Error::internal(message),
        };
        error.with_details(json!({ "code": condition }))
    }
}
