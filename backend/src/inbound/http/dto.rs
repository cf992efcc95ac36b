//! JSON response shapes shared by the account, item, swap and admin handlers.
//!
//! Field names are camelCase; the garment style is exposed as `type`.
//! Timestamps are RFC 3339 strings.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ItemDetails, ItemSummary, SwapDetails, UserAccount, UserSummary};

/// Public view of a user embedded in other payloads.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[schema(example = "Ada")]
    pub display_name: String,
}

impl From<&UserSummary> for UserSummaryResponse {
    fn from(value: &UserSummary) -> Self {
        Self {
            id: value.id.to_string(),
            display_name: value.display_name.as_ref().to_owned(),
        }
    }
}

/// Full account view returned to its owner and to administrators.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    #[schema(example = "ada")]
    pub username: String,
    pub display_name: String,
    #[schema(example = "user")]
    pub role: String,
    #[schema(example = 100)]
    pub points: u32,
    pub created_at: String,
}

impl From<UserAccount> for AccountResponse {
    fn from(value: UserAccount) -> Self {
        Self {
            id: value.id.to_string(),
            username: value.username.as_ref().to_owned(),
            display_name: value.display_name.as_ref().to_owned(),
            role: value.role.as_str().to_owned(),
            points: value.points,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// Listing with its owner.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: String,
    pub owner: UserSummaryResponse,
    #[schema(example = "Wool coat")]
    pub title: String,
    pub description: String,
    #[schema(example = "outerwear")]
    pub category: String,
    #[serde(rename = "type")]
    #[schema(example = "casual")]
    pub garment_type: String,
    #[schema(example = "M")]
    pub size: String,
    #[schema(example = "like-new")]
    pub condition: String,
    #[schema(example = 150)]
    pub points_value: u32,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[schema(example = "approved")]
    pub status: String,
    pub is_available: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ItemDetails> for ItemResponse {
    fn from(value: ItemDetails) -> Self {
        let ItemDetails { item, owner } = value;
        Self {
            id: item.id.to_string(),
            owner: UserSummaryResponse::from(&owner),
            title: item.title.as_ref().to_owned(),
            description: item.description.as_ref().to_owned(),
            category: item.category.as_str().to_owned(),
            garment_type: item.garment_type.as_str().to_owned(),
            size: item.size.as_str().to_owned(),
            condition: item.condition.as_str().to_owned(),
            points_value: item.points_value.get(),
            tags: item.tags.as_slice().to_vec(),
            brand: item.attributes.brand,
            colour: item.attributes.colour,
            material: item.attributes.material,
            location: item.attributes.location,
            status: item.status.as_str().to_owned(),
            is_available: item.is_available,
            created_at: item.created_at.to_rfc3339(),
            updated_at: item.updated_at.to_rfc3339(),
        }
    }
}

/// Compact listing view nested in swap payloads.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummaryResponse {
    pub id: String,
    pub title: String,
    pub category: String,
    pub condition: String,
    pub points_value: u32,
    pub status: String,
    pub is_available: bool,
    pub owner: UserSummaryResponse,
}

impl From<&ItemSummary> for ItemSummaryResponse {
    fn from(value: &ItemSummary) -> Self {
        Self {
            id: value.id.to_string(),
            title: value.title.clone(),
            category: value.category.as_str().to_owned(),
            condition: value.condition.as_str().to_owned(),
            points_value: value.points_value,
            status: value.status.as_str().to_owned(),
            is_available: value.is_available,
            owner: UserSummaryResponse::from(&value.owner),
        }
    }
}

/// Swap request with resolved items and requester.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    pub id: String,
    pub requester: UserSummaryResponse,
    pub item_requested: ItemSummaryResponse,
    pub item_offered: Option<ItemSummaryResponse>,
    #[schema(example = "points")]
    pub swap_type: String,
    #[schema(example = 150)]
    pub points_offered: Option<u32>,
    pub message: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SwapDetails> for SwapResponse {
    fn from(value: SwapDetails) -> Self {
        let SwapDetails {
            swap,
            requester,
            item_requested,
            item_offered,
        } = value;
        Self {
            id: swap.id.to_string(),
            requester: UserSummaryResponse::from(&requester),
            item_requested: ItemSummaryResponse::from(&item_requested),
            item_offered: item_offered.as_ref().map(ItemSummaryResponse::from),
            swap_type: swap.offer.swap_type().as_str().to_owned(),
            points_offered: swap.offer.points_offered(),
            message: swap.message.as_ref().map(|m| m.as_ref().to_owned()),
            status: swap.status.as_str().to_owned(),
            completed_at: swap.completed_at.map(|at| at.to_rfc3339()),
            created_at: swap.created_at.to_rfc3339(),
            updated_at: swap.updated_at.to_rfc3339(),
        }
    }
}
